//! Plugin dependency installation configuration.

use serde::{Deserialize, Serialize};

/// Controls how consolidated plugin requirements are installed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyConfig {
    /// Whether to run the package manager at startup.
    #[serde(default = "default_true")]
    pub install: bool,
    /// Package manager command; requirements are appended as arguments.
    #[serde(default = "default_command")]
    pub command: Vec<String>,
    /// Upper bound for a single install run, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            install: default_true(),
            command: default_command(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_command() -> Vec<String> {
    ["python3", "-m", "pip", "install"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_timeout() -> u64 {
    600
}
