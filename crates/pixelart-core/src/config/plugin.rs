//! Plugin discovery configuration.

use serde::{Deserialize, Serialize};

/// Where plugin module manifests live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Root directory walked for `*.plugin.toml` module manifests.
    #[serde(default = "default_plugin_directory")]
    pub directory: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: default_plugin_directory(),
        }
    }
}

fn default_plugin_directory() -> String {
    "./plugins".to_string()
}
