use std::path::PathBuf;

use async_trait::async_trait;
use calc_core::backend::{BackendConfig, BackendError, BackendFactory, SiteBackend};
use tracing::info;

use crate::repository::SqliteBackend;

/// Resolve the seeds directory at runtime so it works in both development and
/// packaged distribution.
///
/// Resolution order:
/// 1. **`CALC_DB_SQLITE_SEEDS_DIR`**: if set, use this path.
/// 2. **`./seeds`**: if the directory exists in the current working directory.
/// 3. **Crate manifest dir**: `$CARGO_MANIFEST_DIR/seeds` as last resort
///    (dev/tests when run from the build tree).
fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CALC_DB_SQLITE_SEEDS_DIR") {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// [`BackendFactory`] for SQLite.
///
/// Register this with a [`calc_core::BackendRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use calc_core::BackendRegistry;
/// use calc_db_sqlite::SqliteBackendFactory;
///
/// let mut registry = BackendRegistry::new();
/// registry.register(Box::new(SqliteBackendFactory));
/// ```
pub struct SqliteBackendFactory;

#[async_trait]
impl BackendFactory for SqliteBackendFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string`, migrate it
    /// and apply the seed files.
    ///
    /// Accepted connection-string values:
    /// * A bare file path, e.g. `"calcsite.db"`. The file is created if it
    ///   does not exist.
    /// * A `sqlite:` URL.
    /// * `":memory:"`, an ephemeral in-memory database.
    async fn create(
        &self,
        config: &BackendConfig,
    ) -> Result<Box<dyn SiteBackend>, BackendError> {
        let backend = SqliteBackend::new(&config.connection_string)
            .await
            .map_err(|e| BackendError::Unavailable(format!("{e:#}")))?;
        backend
            .run_migrations()
            .await
            .map_err(|e| BackendError::Configuration(format!("{e:#}")))?;
        let seeds = seeds_dir();
        backend
            .run_seeds(&seeds)
            .await
            .map_err(|e| BackendError::Configuration(format!("{e:#}")))?;
        info!(
            connection = %config.connection_string,
            seeds = %seeds.display(),
            "SQLite backend ready"
        );
        Ok(Box::new(backend))
    }
}
