//! Logging setup
//!
//! The library only emits `tracing` events; applications opt into output by
//! calling [`init_tracing`] once at startup (or by installing their own
//! subscriber). `RUST_LOG` overrides the configured level when set.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::LlmError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracingConfig {
    /// Default filter directive, e.g. `"info"` or `"unillm=debug"`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    pub with_target: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::minimal()
    }
}

impl TracingConfig {
    /// Debug output for this crate, readable format
    pub fn development() -> Self {
        Self {
            level: "info,unillm=debug".to_string(),
            json: false,
            with_target: true,
        }
    }

    /// Warnings and errors only
    pub fn minimal() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
            with_target: false,
        }
    }

    /// Info level, JSON lines for log shippers
    pub fn json_production() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
            with_target: true,
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    fn filter(&self) -> Result<EnvFilter, LlmError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.level).map_err(|e| {
                LlmError::Configuration(format!("invalid log filter {:?}: {e}", self.level))
            }),
        }
    }
}

/// Install a global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<(), LlmError> {
    let filter = config.filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    installed.map_err(|e| LlmError::Configuration(format!("failed to install tracing subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        assert!(TracingConfig::json_production().json);
        assert!(!TracingConfig::development().json);
        assert_eq!(TracingConfig::default(), TracingConfig::minimal());
    }

    #[test]
    fn invalid_level_is_a_configuration_error() {
        // Only meaningful when RUST_LOG does not override the level
        if std::env::var_os("RUST_LOG").is_none() {
            let config = TracingConfig::minimal().with_level("unillm=[");
            assert!(matches!(config.filter(), Err(LlmError::Configuration(_))));
        }
    }
}
