//! End-to-end runs of the engine over built-in plugins discovered from a
//! temporary plugin directory.

use std::path::Path;
use std::sync::Arc;

use image::{Rgb, RgbImage};
use tempfile::TempDir;

use pixelart_core::config::{AppConfig, PipelineConfig, SchedulerConfig};
use pixelart_core::matrix::HeadlessMatrix;
use pixelart_core::traits::RenderTarget;
use pixelart_pipeline::{Scheduler, SchedulerState, TraceOp};
use pixelart_plugin::{PluginManager, PluginSet};

const GREEN: [u8; 3] = [0, 200, 0];

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

/// Plugin tree with every built-in module configured for fast runs.
fn plugin_root() -> TempDir {
    let root = tempfile::tempdir().unwrap();
    let image = root.path().join("ai/image_source/assets/examples/tree.png");
    std::fs::create_dir_all(image.parent().unwrap()).unwrap();
    RgbImage::from_pixel(8, 8, Rgb(GREEN)).save(&image).unwrap();

    write(
        root.path(),
        "rgb/display_image/display_image_plugins.plugin.toml",
        "[plugin]\nimage_display_time = 0\nloading_interval_ms = 5\n",
    );
    write(
        root.path(),
        "ai/image_source/image_source.plugin.toml",
        "[plugin]\npath = \"assets/examples/tree.png\"\ndelay_ms = 60\n",
    );
    write(
        root.path(),
        "game/bounce/bounce_game.plugin.toml",
        "[plugin]\nruntime = 1\nfps = 10\n",
    );
    write(root.path(), "game/bounce/requirements.txt", "pygame>=2.5.0\n");
    root
}

fn config(root: &TempDir, display: &[&str], cognitive: &[&str]) -> AppConfig {
    let mut config = AppConfig::default();
    config.display = PipelineConfig::from_include(display.iter().copied());
    config.cognitive = PipelineConfig::from_include(cognitive.iter().copied());
    config.plugins.directory = root.path().display().to_string();
    config.dependencies.install = false;
    config.scheduler = SchedulerConfig {
        poll_interval_ms: 2,
        channel_timeout_ms: 100,
        channel_capacity: 64,
    };
    config
}

async fn load(
    config: &AppConfig,
    matrix: &Arc<HeadlessMatrix>,
    state: &Arc<SchedulerState>,
) -> PluginSet {
    let render: Arc<dyn RenderTarget> = matrix.clone();
    PluginManager::from_config(plugin_builtin::catalog(), &config.dependencies)
        .unwrap()
        .load(config, &render, state)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_loading_screen_until_image_arrives() {
    let root = plugin_root();
    let config = config(
        &root,
        &["display_image_plugins.DisplayImagePlugins.loading_screen"],
        &["image_source.ImageSource.produce_path"],
    );
    let matrix = Arc::new(HeadlessMatrix::new(16, 16).with_history(4096));
    let state = Arc::new(SchedulerState::with_trace(&config.scheduler));

    let plugins = load(&config, &matrix, &state).await;
    assert_eq!(plugins.pipelines.display.len(), 1);
    assert_eq!(plugins.pipelines.cognitive.len(), 1);

    let summary = Scheduler::new(
        Arc::clone(&state),
        plugins.pipelines.display.to_stages(),
        plugins.pipelines.cognitive.to_stages(),
    )
    .with_display_iterations(1)
    .run()
    .unwrap();
    assert_eq!(summary.display.iterations, 1);
    assert_eq!(summary.display.failures, 0);
    assert_eq!(summary.cognitive.failures, 0);

    // The path was taken off the channel exactly once, before the display
    // wrapper cleared cognitive_done.
    let events = state.trace().unwrap().events();
    let first_clear = events
        .iter()
        .position(|e| e.source == "cognitive_done" && e.op == TraceOp::Clear)
        .expect("cognitive_done cleared");
    let receives_before = events[..first_clear]
        .iter()
        .filter(|e| e.source == "channel" && e.op == TraceOp::Receive)
        .count();
    assert_eq!(receives_before, 1);
    assert_eq!(state.trace().unwrap().ops_for("channel"), vec![TraceOp::Send, TraceOp::Receive]);
    assert!(state.channel.is_empty());

    // Loading frames first, the produced image last.
    let history = matrix.history();
    let (image, loading) = history.split_last().unwrap();
    assert!(!loading.is_empty());
    assert_eq!(
        loading[0],
        plugin_builtin::canvas::loading_frame(16, 16, [255, 255, 255], 0)
    );
    assert!(loading.iter().all(|f| f.get_pixel(0, 0).0 != GREEN));
    assert_eq!(image.get_pixel(0, 0).0, GREEN);

    // Blanked on exit.
    assert_eq!(matrix.current_frame(), RgbImage::new(16, 16));
}

#[tokio::test]
async fn test_game_frames_reach_display() {
    let root = plugin_root();
    let config = config(
        &root,
        &["display_image_plugins.DisplayImagePlugins.display_game"],
        &["bounce_game.BounceGame.play"],
    );
    let matrix = Arc::new(HeadlessMatrix::new(16, 16).with_history(64));
    let state = Arc::new(SchedulerState::new(&config.scheduler));

    let plugins = load(&config, &matrix, &state).await;
    assert_eq!(plugins.requirements.len(), 1);
    assert_eq!(plugins.requirements[0].name, "pygame");

    let summary = Scheduler::new(
        Arc::clone(&state),
        plugins.pipelines.display.to_stages(),
        plugins.pipelines.cognitive.to_stages(),
    )
    .with_display_iterations(1)
    .run()
    .unwrap();

    assert_eq!(summary.cognitive.failures, 0);
    assert!(matrix.write_count() >= 1);
    let shown = matrix.history();
    assert!(shown.iter().any(|f| f.get_pixel(0, 0).0 == [0, 0, 255]));
}

#[tokio::test]
async fn test_unresolved_entries_are_skipped() {
    let root = plugin_root();
    let config = config(
        &root,
        &[
            "display_image_plugins.DisplayImagePlugins.display_nothing",
            "image_source.ImageSource.produce_path",
            "display_image_plugins.DisplayImagePlugins.loading_screen",
        ],
        &[
            "display_image_plugins.DisplayImagePlugins.display_image",
            "image_source.ImageSource.produce_path",
        ],
    );
    let matrix = Arc::new(HeadlessMatrix::new(16, 16));
    let state = Arc::new(SchedulerState::new(&config.scheduler));

    let plugins = load(&config, &matrix, &state).await;
    assert_eq!(
        plugins.pipelines.display.names(),
        vec!["display_image_plugins.DisplayImagePlugins.loading_screen"]
    );
    assert_eq!(
        plugins.pipelines.cognitive.names(),
        vec!["image_source.ImageSource.produce_path"]
    );
    // bounce_game is not referenced by either include-list
    assert!(plugins.modules.iter().all(|m| m.stem != "bounce_game"));
}

#[tokio::test]
async fn test_no_render_writes_after_join() {
    let root = plugin_root();
    let config = config(
        &root,
        &["display_image_plugins.DisplayImagePlugins.loading_screen"],
        &["image_source.ImageSource.produce_path"],
    );
    let matrix = Arc::new(HeadlessMatrix::new(16, 16).with_history(4096));
    let state = Arc::new(SchedulerState::new(&config.scheduler));

    let plugins = load(&config, &matrix, &state).await;
    let handle = Scheduler::new(
        Arc::clone(&state),
        plugins.pipelines.display.to_stages(),
        plugins.pipelines.cognitive.to_stages(),
    )
    .with_display_iterations(2)
    .start()
    .unwrap();
    let summary = tokio::task::spawn_blocking(move || handle.join())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(summary.display.iterations, 2);

    // The panel is already blank when join returns.
    let writes = matrix.write_count();
    let clears = matrix.clear_count();
    assert!(clears >= 2);
    assert_eq!(matrix.current_frame(), RgbImage::new(16, 16));

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(matrix.write_count(), writes);
    assert_eq!(matrix.clear_count(), clears);
    assert!(state.is_shutdown());
}
