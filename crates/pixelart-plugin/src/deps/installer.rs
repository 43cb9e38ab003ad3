//! Installs consolidated requirements through an external package manager.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;

use pixelart_core::config::DependencyConfig;
use pixelart_core::{AppError, AppResult};

use super::requirement::VersionedPackage;

/// Something that can make a set of requirements available.
#[async_trait]
pub trait DependencyInstaller: Send + Sync + std::fmt::Debug {
    /// Installs every requirement. An empty slice is a no-op.
    async fn install(&self, packages: &[VersionedPackage]) -> AppResult<()>;
}

/// Runs a command with every requirement appended as an argument
/// (`python3 -m pip install pkgA>=1.5.0 pkgB~2.0.0`).
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandInstaller {
    /// Creates an installer from a command line and a timeout.
    pub fn new(command: &[String], timeout: Duration) -> AppResult<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| AppError::configuration("Dependency install command is empty"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
        })
    }

    /// Creates an installer from the `dependencies` config section.
    pub fn from_config(config: &DependencyConfig) -> AppResult<Self> {
        Self::new(&config.command, Duration::from_secs(config.timeout_seconds))
    }
}

#[async_trait]
impl DependencyInstaller for CommandInstaller {
    async fn install(&self, packages: &[VersionedPackage]) -> AppResult<()> {
        if packages.is_empty() {
            tracing::info!("No plugin requirements to install");
            return Ok(());
        }

        let requirements: Vec<String> = packages.iter().map(ToString::to_string).collect();
        tracing::info!(
            "Installing plugin requirements: command='{}', packages={:?}",
            self.program,
            requirements
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .args(&requirements)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let result = tokio::time::timeout(self.timeout, cmd.output()).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(output)) if output.status.success() => {
                tracing::info!(
                    "Plugin requirements installed: count={}, duration={}ms",
                    requirements.len(),
                    duration_ms
                );
                Ok(())
            }
            Ok(Ok(output)) => {
                let code = output.status.code().unwrap_or(-1);
                let stderr = String::from_utf8_lossy(&output.stderr);
                tracing::error!(
                    "Requirement install failed: command='{}', exit_code={}, stderr='{}'",
                    self.program,
                    code,
                    stderr.chars().take(500).collect::<String>()
                );
                Err(AppError::dependency(format!(
                    "Installing {:?} failed with exit code {}: {}",
                    requirements,
                    code,
                    stderr.chars().take(2000).collect::<String>()
                )))
            }
            Ok(Err(e)) => {
                tracing::error!(
                    "Failed to execute install command '{}': {}",
                    self.program,
                    e
                );
                Err(AppError::with_source(
                    pixelart_core::ErrorKind::Dependency,
                    format!("Failed to run '{}'", self.program),
                    e,
                ))
            }
            Err(_) => {
                tracing::error!(
                    "Requirement install timed out after {}s: command='{}'",
                    self.timeout.as_secs(),
                    self.program
                );
                Err(AppError::dependency(format!(
                    "Installing requirements timed out after {:?}",
                    self.timeout
                )))
            }
        }
    }
}

/// Installer used when `dependencies.install` is off: logs and succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInstaller;

#[async_trait]
impl DependencyInstaller for NoopInstaller {
    async fn install(&self, packages: &[VersionedPackage]) -> AppResult<()> {
        if !packages.is_empty() {
            tracing::info!(
                "Dependency installation disabled; skipping {} requirement(s)",
                packages.len()
            );
        }
        Ok(())
    }
}
