//! Layered configuration for clientele.
//!
//! Configuration is loaded with precedence: CLI args > Env vars > Config file > Defaults
//!
//! # Example config file (clientele.toml)
//! ```toml
//! include_anonymous = false
//! log_filter = "clientele_rs=debug"
//!
//! [output]
//! pretty = true
//! ```
//!
//! Only `include_anonymous` reaches the reconciliation core; the rest shapes
//! the command-line tool.

mod defaults;

pub use defaults::*;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The single option the reconciliation core recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileOptions {
    /// Keep aggregates that carry no phone, no email and only telemetry.
    pub include_anonymous: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            include_anonymous: DEFAULT_INCLUDE_ANONYMOUS,
        }
    }
}

impl ReconcileOptions {
    pub fn include_anonymous(include_anonymous: bool) -> Self {
        Self { include_anonymous }
    }
}

/// Main configuration for the clientele tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Keep anonymous aggregates in the output
    pub include_anonymous: bool,
    /// `tracing` filter directive, used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Output formatting
    pub output: OutputConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            include_anonymous: DEFAULT_INCLUDE_ANONYMOUS,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            output: OutputConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration with precedence: CLI args > Env > File > Defaults
    ///
    /// # Arguments
    /// * `config_path` - Optional path to TOML config file
    /// * `overrides` - CLI overrides to apply on top
    pub fn load(config_path: Option<&str>, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split(ENV_NESTING_SEPARATOR));
        figment = figment.merge(Serialized::defaults(overrides));

        Ok(figment.extract()?)
    }

    /// Load from environment and optional config file only (no CLI overrides)
    pub fn from_env(config_path: Option<&str>) -> Result<Self, ConfigError> {
        Self::load(config_path, ConfigOverrides::default())
    }

    /// Options handed to the reconciliation core.
    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions::include_anonymous(self.include_anonymous)
    }
}

/// Output formatting configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: DEFAULT_PRETTY_OUTPUT,
        }
    }
}

/// CLI overrides that take precedence over file and env config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_anonymous: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputOverrides>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretty: Option<bool>,
}

/// Configuration error.
#[derive(Debug, Error)]
#[error("configuration error: {0}")]
pub struct ConfigError(#[from] figment::Error);

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(!config.include_anonymous);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert!(!config.output.pretty);
        assert_eq!(config.reconcile_options(), ReconcileOptions::default());
    }

    #[test]
    fn test_file_then_env_then_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "clientele.toml",
                r#"
                    include_anonymous = true
                    log_filter = "info"

                    [output]
                    pretty = true
                "#,
            )?;
            jail.set_env("CLIENTELE_LOG_FILTER", "debug");
            jail.set_env("CLIENTELE_OUTPUT__PRETTY", "false");

            let overrides = ConfigOverrides {
                include_anonymous: Some(false),
                ..Default::default()
            };
            let config = AppConfig::load(Some("clientele.toml"), overrides).map_err(|err| err.0)?;

            assert!(!config.include_anonymous);
            assert_eq!(config.log_filter, "debug");
            assert!(!config.output.pretty);
            Ok(())
        });
    }

    #[test]
    fn test_env_enables_anonymous() {
        Jail::expect_with(|jail| {
            jail.set_env("CLIENTELE_INCLUDE_ANONYMOUS", "true");
            let config = AppConfig::from_env(None).map_err(|err| err.0)?;
            assert!(config.reconcile_options().include_anonymous);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_value_is_reported() {
        Jail::expect_with(|jail| {
            jail.set_env("CLIENTELE_INCLUDE_ANONYMOUS", "sometimes");
            let err = AppConfig::from_env(None).unwrap_err();
            assert!(err.to_string().starts_with("configuration error:"));
            Ok(())
        });
    }
}
