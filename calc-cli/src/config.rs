//! `calcsite.toml`. Every key is optional; a missing file means defaults.
//!
//! ```toml
//! [site]
//! base_url = "https://calculatorhub.example"
//! name = "Calculator Hub"
//!
//! [backend]
//! kind = "sqlite"
//! connection_string = "calcsite.db"
//!
//! [admin]
//! subscriber_limit = 200
//! message_limit = 200
//! analytics_limit = 300
//!
//! [logging]
//! level = "info"
//! file = "calcsite.log"
//!
//! [content]
//! function_url = "https://functions.example/generate-blog-post"
//! api_key = "..."
//!
//! [page]
//! result_policy = "sticky"        # or "clear-on-change"
//! calculating_delay_ms = 0
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use calc_core::admin::DashboardLimits;
use calc_core::backend::BackendConfig;
use calc_core::page::ResultPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "calcsite.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSection {
    pub base_url: String,
    pub name: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            base_url: "https://calculatorhub.example".to_string(),
            name: "Calculator Hub".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    pub kind: String,
    pub connection_string: String,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            kind: "sqlite".to_string(),
            connection_string: "calcsite.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSection {
    pub subscriber_limit: u32,
    pub message_limit: u32,
    pub analytics_limit: u32,
}

impl Default for AdminSection {
    fn default() -> Self {
        let limits = DashboardLimits::default();
        Self {
            subscriber_limit: limits.subscribers,
            message_limit: limits.messages,
            analytics_limit: limits.analytics,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSection {
    pub function_url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSection {
    pub result_policy: ResultPolicy,
    pub calculating_delay_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub site: SiteSection,
    pub backend: BackendSection,
    pub admin: AdminSection,
    pub logging: LoggingSection,
    pub content: ContentSection,
    pub page: PageSection,
}

impl SiteConfig {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            backend: self.backend.kind.clone(),
            connection_string: self.backend.connection_string.clone(),
        }
    }

    pub fn dashboard_limits(&self) -> DashboardLimits {
        DashboardLimits {
            subscribers: self.admin.subscriber_limit,
            messages: self.admin.message_limit,
            analytics: self.admin.analytics_limit,
        }
    }

    pub fn calculating_delay(&self) -> Duration {
        Duration::from_millis(self.page.calculating_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(SiteConfig::from_toml("").unwrap(), SiteConfig::default());
    }

    #[test]
    fn missing_file_is_all_defaults() {
        let config = SiteConfig::load(Path::new("./definitely-not-here.toml")).unwrap();

        assert_eq!(config.backend.kind, "sqlite");
        assert_eq!(config.dashboard_limits(), DashboardLimits::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = SiteConfig::from_toml(
            r#"
            [admin]
            analytics_limit = 50

            [page]
            result_policy = "clear-on-change"
            calculating_delay_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.admin.analytics_limit, 50);
        assert_eq!(config.admin.subscriber_limit, 200);
        assert_eq!(config.page.result_policy, ResultPolicy::ClearOnChange);
        assert_eq!(config.calculating_delay(), Duration::from_millis(250));
        assert_eq!(config.site.name, "Calculator Hub");
    }

    #[test]
    fn backend_section_maps_to_backend_config() {
        let config = SiteConfig::from_toml(
            r#"
            [backend]
            connection_string = ":memory:"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.backend_config(),
            BackendConfig {
                backend: "sqlite".to_string(),
                connection_string: ":memory:".to_string(),
            }
        );
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = SiteConfig::from_toml("[page]\nresult_policy = \"sometimes\"").unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
