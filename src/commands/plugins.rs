//! Inspect plugins without starting the scheduler.

use std::sync::Arc;

use clap::Args;
use serde_json::json;

use pixelart_core::AppResult;
use pixelart_core::config::AppConfig;
use pixelart_core::matrix::HeadlessMatrix;
use pixelart_core::traits::RenderTarget;
use pixelart_pipeline::SchedulerState;
use pixelart_plugin::{PluginManager, PluginSet};

use super::OutputFormat;

/// Arguments for the plugins command
#[derive(Debug, Args)]
pub struct PluginsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Execute the plugins command
pub fn execute(args: &PluginsArgs, config: &AppConfig) -> AppResult<()> {
    let matrix: Arc<dyn RenderTarget> = Arc::new(HeadlessMatrix::from_config(&config.matrix));
    let state = Arc::new(SchedulerState::new(&config.scheduler));
    let manager = PluginManager::new(
        plugin_builtin::catalog(),
        Arc::new(pixelart_plugin::deps::NoopInstaller),
    );
    let plugins = manager.load_without_install(config, &matrix, &state)?;

    match args.format {
        OutputFormat::Text => print_text(&plugins),
        OutputFormat::Json => {
            let value = json!({
                "modules": plugins.modules.iter().map(|m| json!({
                    "stem": m.stem,
                    "path": m.path.display().to_string(),
                })).collect::<Vec<_>>(),
                "plugins": plugins.registry.descriptors(),
                "pipelines": {
                    "display": plugins.pipelines.display.names(),
                    "cognitive": plugins.pipelines.cognitive.names(),
                },
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}

fn print_text(plugins: &PluginSet) {
    println!("Modules:");
    if plugins.modules.is_empty() {
        println!("  (none)");
    }
    for module in &plugins.modules {
        println!("  {:<24} {}", module.stem, module.path.display());
    }

    println!("Plugins:");
    for descriptor in plugins.registry.descriptors() {
        println!("  {:<40} {}", descriptor.id, descriptor.capability);
        for hook in &descriptor.hooks {
            println!("    - {}", hook);
        }
    }

    for (label, pipeline) in [
        ("Display pipeline", &plugins.pipelines.display),
        ("Cognitive pipeline", &plugins.pipelines.cognitive),
    ] {
        println!("{}:", label);
        if pipeline.is_empty() {
            println!("  (empty)");
        }
        for (index, name) in pipeline.names().iter().enumerate() {
            println!("  {}. {}", index + 1, name);
        }
    }
}
