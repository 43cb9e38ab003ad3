//! Print consolidated plugin requirements.

use std::sync::Arc;

use clap::Args;

use pixelart_core::AppResult;
use pixelart_core::config::AppConfig;
use pixelart_plugin::PluginManager;
use pixelart_plugin::deps::NoopInstaller;

use super::OutputFormat;

/// Arguments for the deps command
#[derive(Debug, Args)]
pub struct DepsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Execute the deps command
pub fn execute(args: &DepsArgs, config: &AppConfig) -> AppResult<()> {
    let manager = PluginManager::new(plugin_builtin::catalog(), Arc::new(NoopInstaller));
    let modules = manager.scan(config)?;
    let requirements = PluginManager::requirements(&modules);

    match args.format {
        OutputFormat::Text => {
            if requirements.is_empty() {
                println!("No requirements declared.");
            }
            for package in &requirements {
                println!("{}", package);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&requirements)?);
        }
    }
    Ok(())
}
