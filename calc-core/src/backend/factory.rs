use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::repository::{BackendError, SiteBackend};

/// Backend-agnostic connection configuration.
///
/// `backend` must match the [`BackendFactory::backend_name`] of a registered
/// factory. `connection_string` is passed through unchanged.
///
/// | backend  | connection_string examples      |
/// |----------|---------------------------------|
/// | `sqlite` | `calcsite.db`, `:memory:`       |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }
}

/// One per backend crate, registered with a [`BackendRegistry`] at startup.
#[async_trait]
pub trait BackendFactory: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Opens a connection and returns a ready backend. Implementations may run
    /// migrations here.
    async fn create(&self, config: &BackendConfig) -> Result<Box<dyn SiteBackend>, BackendError>;
}

pub struct BackendRegistry {
    factories: HashMap<&'static str, Box<dyn BackendFactory>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A factory with the same name replaces the previous one.
    pub fn register(
        &mut self,
        factory: Box<dyn BackendFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// # Errors
    /// * [`BackendError::Configuration`] when no factory matches `config.backend`.
    /// * Any error the chosen factory returns.
    pub async fn create(
        &self,
        config: &BackendConfig,
    ) -> Result<Box<dyn SiteBackend>, BackendError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                BackendError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::backend::testing::RecordingBackend;

    struct StubFactory {
        name: &'static str,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl BackendFactory for StubFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }

        async fn create(
            &self,
            _config: &BackendConfig,
        ) -> Result<Box<dyn SiteBackend>, BackendError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Box::new(RecordingBackend::default()))
        }
    }

    struct FailingFactory;

    #[async_trait]
    impl BackendFactory for FailingFactory {
        fn backend_name(&self) -> &'static str {
            "failing"
        }

        async fn create(
            &self,
            _config: &BackendConfig,
        ) -> Result<Box<dyn SiteBackend>, BackendError> {
            Err(BackendError::Unavailable("intentional failure".to_string()))
        }
    }

    fn stub_factory(name: &'static str) -> (Box<dyn BackendFactory>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Box::new(StubFactory {
                name,
                called: flag.clone(),
            }),
            flag,
        )
    }

    fn config(backend: &str) -> BackendConfig {
        BackendConfig {
            backend: backend.to_string(),
            connection_string: ":memory:".to_string(),
        }
    }

    #[test]
    fn default_config_is_sqlite_memory() {
        let cfg = BackendConfig::default();

        assert_eq!(cfg.backend, "sqlite");
        assert_eq!(cfg.connection_string, ":memory:");
    }

    #[test]
    fn available_backends_is_sorted() {
        let mut reg = BackendRegistry::new();
        let (f1, _) = stub_factory("sqlite");
        let (f2, _) = stub_factory("hosted");
        reg.register(f1);
        reg.register(f2);

        assert_eq!(reg.available_backends(), vec!["hosted", "sqlite"]);
    }

    #[test]
    fn duplicate_registration_replaces_previous() {
        let mut reg = BackendRegistry::new();
        let (old, _) = stub_factory("sqlite");
        let (new, _) = stub_factory("sqlite");
        reg.register(old);
        reg.register(new);

        assert_eq!(reg.available_backends(), vec!["sqlite"]);
    }

    #[tokio::test]
    async fn create_calls_only_matching_factory() {
        let mut reg = BackendRegistry::new();
        let (sqlite, sqlite_called) = stub_factory("sqlite");
        let (hosted, hosted_called) = stub_factory("hosted");
        reg.register(sqlite);
        reg.register(hosted);

        reg.create(&config("sqlite")).await.unwrap();

        assert!(sqlite_called.load(Ordering::SeqCst));
        assert!(!hosted_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn unknown_backend_names_requested_and_available() {
        let mut reg = BackendRegistry::new();
        let (f, _) = stub_factory("sqlite");
        reg.register(f);

        match reg.create(&config("postgres")).await {
            Err(BackendError::Configuration(msg)) => {
                assert!(msg.contains("postgres"));
                assert!(msg.contains("sqlite"));
            }
            Err(other) => panic!("expected Configuration error, got {other:?}"),
            Ok(_) => panic!("expected Configuration error, got a backend"),
        }
    }

    #[tokio::test]
    async fn factory_errors_propagate() {
        let mut reg = BackendRegistry::new();
        reg.register(Box::new(FailingFactory));

        assert!(matches!(
            reg.create(&config("failing")).await,
            Err(BackendError::Unavailable(_))
        ));
    }
}
