//! Application configuration schemas.
//!
//! Configuration is deserialized from an optional TOML file merged with
//! `MCPGUARD__*` environment variables via the `config` crate. Each
//! sub-module represents a logical configuration section.

pub mod logging;
pub mod pipeline;

use serde::{Deserialize, Serialize};

pub use self::logging::LoggingConfig;
pub use self::pipeline::{DocumentFormat, PipelineConfig};

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Plugin chain settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file and the environment.
    ///
    /// The file is optional; every field has a default. Environment
    /// variables prefixed with `MCPGUARD` override file values, e.g.
    /// `MCPGUARD__PIPELINE__PLUGINS_PATH=/etc/guard/plugins.json`.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("MCPGUARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
