//! Run the engine.

use std::sync::Arc;

use clap::Args;
use tracing::{info, warn};

use pixelart_core::config::AppConfig;
use pixelart_core::matrix::HeadlessMatrix;
use pixelart_core::traits::RenderTarget;
use pixelart_core::{AppError, AppResult};
use pixelart_pipeline::{Scheduler, SchedulerState};
use pixelart_plugin::PluginManager;

/// Arguments for the run command
#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Skip installing plugin requirements
    #[arg(long)]
    pub skip_install: bool,

    /// Stop after this many display iterations
    #[arg(long)]
    pub iterations: Option<u64>,
}

/// Execute the run command
pub async fn execute(args: &RunArgs, config: AppConfig) -> AppResult<()> {
    info!("Starting pixel-art v{}", env!("CARGO_PKG_VERSION"));

    let matrix: Arc<dyn RenderTarget> = Arc::new(HeadlessMatrix::from_config(&config.matrix));
    info!(
        rows = config.matrix.rows,
        cols = config.matrix.cols,
        brightness = config.matrix.brightness,
        "Render target ready (headless)"
    );
    let state = Arc::new(SchedulerState::new(&config.scheduler));

    // ── Plugins ──────────────────────────────────────────────────
    let manager = PluginManager::from_config(plugin_builtin::catalog(), &config.dependencies)?;
    let plugins = if args.skip_install {
        manager.load_without_install(&config, &matrix, &state)?
    } else {
        manager.load(&config, &matrix, &state).await?
    };
    let display = plugins.pipelines.display.to_stages();
    let cognitive = plugins.pipelines.cognitive.to_stages();
    if display.is_empty() && cognitive.is_empty() {
        warn!("Both pipelines are empty; the engine will idle until interrupted");
    }

    // ── Ctrl+C ───────────────────────────────────────────────────
    let interrupt = Arc::clone(&state);
    ctrlc::set_handler(move || {
        info!("Interrupt received, stopping pipelines...");
        interrupt.request_shutdown();
    })
    .map_err(|e| AppError::internal(format!("Failed to install Ctrl+C handler: {}", e)))?;

    // ── Scheduler ────────────────────────────────────────────────
    let mut scheduler = Scheduler::new(Arc::clone(&state), display, cognitive);
    if let Some(iterations) = args.iterations {
        scheduler = scheduler.with_display_iterations(iterations);
    }
    let handle = scheduler.start()?;

    let summary = tokio::task::spawn_blocking(move || handle.join())
        .await
        .map_err(|e| AppError::internal(format!("Scheduler join task failed: {}", e)))??;

    // Display stages blank the panel before their thread exits.
    info!(
        display_iterations = summary.display.iterations,
        display_failures = summary.display.failures,
        cognitive_iterations = summary.cognitive.iterations,
        cognitive_failures = summary.cognitive.failures,
        "Pixel art engine stopped"
    );
    Ok(())
}
