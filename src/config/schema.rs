//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every section has defaults, so an empty file is a valid config.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment environment name (falls back to `APP_ENV`, then "production").
    pub environment: String,

    /// Environment names treated as development (stacks are logged).
    pub dev_environments: Vec<String>,

    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Logging settings.
    pub logging: LoggingConfig,

    /// Shutdown behaviour.
    pub shutdown: ShutdownSettings,
}

impl AppConfig {
    pub fn is_dev(&self) -> bool {
        self.dev_environments.iter().any(|env| env == &self.environment)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: std::env::var("APP_ENV").unwrap_or_else(|_| "production".to_string()),
            dev_environments: vec!["dev".to_string(), "development".to_string()],
            listener: ListenerConfig::default(),
            logging: LoggingConfig::default(),
            shutdown: ShutdownSettings::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,

    /// Include the event target in log lines.
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            with_target: true,
        }
    }
}

/// The serializable part of the shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownSettings {
    /// Exit when a detached task fails and nobody observes the error.
    pub exit_on_unhandled_rejection: bool,

    /// Exit when a panic escapes every handler.
    pub exit_on_uncaught_exception: bool,

    /// Deadline for each cleanup task in milliseconds.
    pub max_timeout_ms: u64,
}

impl ShutdownSettings {
    pub fn max_timeout(&self) -> Duration {
        Duration::from_millis(self.max_timeout_ms)
    }
}

impl Default for ShutdownSettings {
    fn default() -> Self {
        Self {
            exit_on_unhandled_rejection: true,
            exit_on_uncaught_exception: true,
            max_timeout_ms: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8080");
        assert_eq!(config.logging.filter, "info");
        assert!(config.shutdown.exit_on_uncaught_exception);
        assert_eq!(config.shutdown.max_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            environment = "development"

            [shutdown]
            exit_on_unhandled_rejection = false
            "#,
        )
        .unwrap();

        assert!(config.is_dev());
        assert!(!config.shutdown.exit_on_unhandled_rejection);
        assert!(config.shutdown.exit_on_uncaught_exception);
        assert_eq!(config.shutdown.max_timeout_ms, 10_000);
    }

    #[test]
    fn production_is_not_dev() {
        let config = AppConfig {
            environment: "production".to_string(),
            ..AppConfig::default()
        };
        assert!(!config.is_dev());
    }
}
