//! CLI command definitions and dispatch.

pub mod deps;
pub mod plugins;
pub mod run;

use clap::{Parser, Subcommand, ValueEnum};

use pixelart_core::AppResult;
use pixelart_core::config::AppConfig;

/// Pixel Art — LED matrix display engine
#[derive(Debug, Parser)]
#[command(name = "pixel-art", version, about, long_about = None)]
pub struct Cli {
    /// Base configuration file, without extension (default `config/default`)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Environment overlay loaded from `config/<env>.toml`
    #[arg(short, long, global = true, default_value = "development")]
    pub env: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load plugins and run both pipelines until interrupted
    Run(run::RunArgs),
    /// List discovered modules, loaded plugins and composed pipelines
    Plugins(plugins::PluginsArgs),
    /// Print the consolidated plugin requirements without installing them
    Deps(deps::DepsArgs),
}

/// Output format for inspection commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> AppResult<()> {
        match &self.command {
            None => run::execute(&run::RunArgs::default(), config).await,
            Some(Commands::Run(args)) => run::execute(args, config).await,
            Some(Commands::Plugins(args)) => plugins::execute(args, &config),
            Some(Commands::Deps(args)) => deps::execute(args, &config),
        }
    }
}
