//! Plugin context: resources available to a plugin factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;

use pixelart_core::traits::RenderTarget;
use pixelart_core::{AppError, AppResult};
use pixelart_pipeline::SchedulerState;

/// Shared dependencies given to every factory of one module.
///
/// Display plugins keep the render handle; cognitive and game plugins must
/// publish through [`SchedulerState::publish`] instead of drawing.
#[derive(Clone)]
pub struct PluginContext {
    module: String,
    directory: PathBuf,
    config: toml::Table,
    render: Arc<dyn RenderTarget>,
    state: Arc<SchedulerState>,
}

impl std::fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginContext")
            .field("module", &self.module)
            .field("directory", &self.directory)
            .field("config_keys", &self.config.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PluginContext {
    /// Creates a context for one module.
    pub fn new(
        module: impl Into<String>,
        directory: impl Into<PathBuf>,
        config: toml::Table,
        render: Arc<dyn RenderTarget>,
        state: Arc<SchedulerState>,
    ) -> Self {
        Self {
            module: module.into(),
            directory: directory.into(),
            config,
            render,
            state,
        }
    }

    /// Module stem the plugin was loaded from.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Directory holding the module manifest.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The module's `assets` directory.
    pub fn assets_dir(&self) -> PathBuf {
        self.directory.join("assets")
    }

    /// The panel.
    pub fn render(&self) -> &Arc<dyn RenderTarget> {
        &self.render
    }

    /// Scheduler state of the current run.
    pub fn state(&self) -> &Arc<SchedulerState> {
        &self.state
    }

    /// Raw per-plugin configuration table.
    pub fn config(&self) -> &toml::Table {
        &self.config
    }

    /// Reads one setting, `None` if absent.
    pub fn setting<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        match self.config.get(key) {
            None => Ok(None),
            Some(value) => value.clone().try_into().map(Some).map_err(|e| {
                AppError::plugin(format!(
                    "Invalid setting '{}' for module '{}': {}",
                    key, self.module, e
                ))
            }),
        }
    }

    /// Reads one setting, falling back to `default` if absent.
    pub fn setting_or<T: DeserializeOwned>(&self, key: &str, default: T) -> AppResult<T> {
        Ok(self.setting(key)?.unwrap_or(default))
    }
}
