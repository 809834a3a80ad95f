//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `autoresume.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

use autoresume_adapter_virtual_dom::DemoConfig;
use autoresume_domain::error::AutoResumeError;
use autoresume_domain::layout::HostLayout;
use autoresume_domain::settings::AutomationSettings;

const CONFIG_FILE: &str = "autoresume.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Detection cadence, cooldown, session bound and scenario table.
    pub automation: AutomationSettings,
    /// Host selectors.
    pub layout: HostLayout,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Simulated host cadence.
    pub demo: DemoConfig,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "autoresumed=info,autoresume=info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `autoresume.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, if an
    /// override does not parse, or if the result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(CONFIG_FILE)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let number = |key: &'static str| -> Result<Option<u64>, ConfigError> {
            var(key)
                .map(|value| {
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::Env { key, value })
                })
                .transpose()
        };

        if let Some(ms) = number("AUTORESUME_POLL_INTERVAL_MS")? {
            self.automation.poll_interval_ms = ms;
        }
        if let Some(ms) = number("AUTORESUME_COOLDOWN_MS")? {
            self.automation.cooldown_ms = ms;
        }
        if let Some(ms) = number("AUTORESUME_MAX_DURATION_MS")? {
            self.automation.max_duration_ms = Some(ms);
        }
        if let Some(value) = var("AUTORESUME_PROFILE") {
            self.automation.profile = value.parse().map_err(|_| ConfigError::Env {
                key: "AUTORESUME_PROFILE",
                value,
            })?;
        }
        if let Some(filter) = var("AUTORESUME_LOG") {
            self.logging.filter = filter;
        }
        if let Some(filter) = var("RUST_LOG") {
            self.logging.filter = filter;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.automation.validate()?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {key}")]
    Env { key: &'static str, value: String },
    /// Semantic validation failure.
    #[error("invalid configuration")]
    Validation(#[from] AutoResumeError),
}
