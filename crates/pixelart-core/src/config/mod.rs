//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every section has defaults, so an empty file is a valid
//! (if idle) configuration.

pub mod dependency;
pub mod logging;
pub mod matrix;
pub mod pipeline;
pub mod plugin;
pub mod scheduler;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use self::dependency::DependencyConfig;
pub use self::logging::LoggingConfig;
pub use self::matrix::MatrixConfig;
pub use self::pipeline::PipelineConfig;
pub use self::plugin::PluginConfig;
pub use self::scheduler::SchedulerConfig;

use crate::error::AppError;

/// Environment variable prefix for overrides (`PIXELART__SCHEDULER__POLL_INTERVAL_MS`).
pub const ENV_PREFIX: &str = "PIXELART";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Display pipeline include-list.
    #[serde(default)]
    pub display: PipelineConfig,
    /// Cognitive (and game) pipeline include-list.
    #[serde(default)]
    pub cognitive: PipelineConfig,
    /// Plugin discovery settings.
    #[serde(default)]
    pub plugins: PluginConfig,
    /// Plugin dependency installation settings.
    #[serde(default)]
    pub dependencies: DependencyConfig,
    /// Scheduler timing settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// LED matrix settings.
    #[serde(default)]
    pub matrix: MatrixConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `base` (default `config/default`), an optional
    /// `config/<env>` overlay, and environment variables prefixed with
    /// `PIXELART__`.
    pub fn load(base: Option<&str>, env: &str) -> Result<Self, AppError> {
        let base = base.unwrap_or("config/default");
        let config = config::Config::builder()
            .add_source(config::File::with_name(base).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("display.include")
                    .with_list_parse_key("cognitive.include")
                    .with_list_parse_key("dependencies.command")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Checks section-level constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        self.matrix
            .validate()
            .map_err(|e| AppError::configuration(format!("Invalid matrix config: {e}")))?;

        if self.scheduler.channel_capacity == 0 {
            return Err(AppError::configuration(
                "scheduler.channel_capacity must be at least 1",
            ));
        }

        if self.dependencies.install && self.dependencies.command.is_empty() {
            return Err(AppError::configuration(
                "dependencies.command must not be empty when install is enabled",
            ));
        }

        Ok(())
    }

    /// Union of both include-lists: the loader's allow-list.
    pub fn allow_list(&self) -> Vec<String> {
        self.display
            .include
            .iter()
            .chain(self.cognitive.include.iter())
            .cloned()
            .collect()
    }
}
