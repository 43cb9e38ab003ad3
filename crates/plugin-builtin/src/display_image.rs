//! Image, GIF, game-frame and avatar viewers.
//!
//! These effects consume what the cognitive side publishes on the result
//! channel and show a loading indicator while nothing is available.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, info, warn};

use pixelart_core::AppResult;
use pixelart_core::traits::RenderTarget;
use pixelart_core::types::Payload;
use pixelart_pipeline::StageResult;
use pixelart_plugin::loader::unknown_hook;
use pixelart_plugin::{DisplayPlugin, Plugin, PluginContext};

use crate::canvas::{self, GifFrame};

/// Module stem.
pub const MODULE: &str = "display_image_plugins";

const TYPE_NAME: &str = "DisplayImagePlugins";
const GAMEPLAY_FPS: u32 = 30;
const GAMEPLAY_SECONDS: usize = 5;
const DEFAULT_EMOTION: &str = "neutral";
const EMOTIONS: [&str; 6] = ["joy", "anger", "confusion", "fear", "sadness", "surprise"];

/// Viewer effects for content produced by cognitive stages.
#[derive(Debug)]
pub struct DisplayImagePlugins {
    ctx: PluginContext,
    image_display_time: Duration,
    save_gameplay: bool,
    loading_color: [u8; 3],
    loading_interval: Duration,
}

impl DisplayImagePlugins {
    /// Reads settings from the module's `[plugin]` table.
    pub fn from_context(ctx: &PluginContext) -> AppResult<Self> {
        Ok(Self {
            ctx: ctx.clone(),
            image_display_time: Duration::from_secs(ctx.setting_or("image_display_time", 5u64)?),
            save_gameplay: ctx.setting_or("save_gameplay", false)?,
            loading_color: ctx.setting_or("loading_color", [255u8, 255, 255])?,
            loading_interval: Duration::from_millis(ctx.setting_or("loading_interval_ms", 250u64)?),
        })
    }

    fn panel_size(&self) -> (u32, u32) {
        let render = self.ctx.render();
        (render.width(), render.height())
    }

    fn show_loading(&self, tick: usize) -> StageResult<()> {
        let (width, height) = self.panel_size();
        let frame = canvas::loading_frame(width, height, self.loading_color, tick);
        self.ctx.render().set_frame(&frame)?;
        Ok(())
    }

    fn view_image(&self, path: &Path, duration: Duration) -> StageResult<()> {
        info!(path = %path.display(), "Displaying image");
        let image = canvas::load_rgb(path)?;
        canvas::show_image(&self.ctx, &image)?;
        self.ctx.state().pause(duration)
    }

    fn view_gif(&self, path: &Path, default_delay_ms: u64, peak_ms: u64) -> StageResult<()> {
        let (width, height) = self.panel_size();
        let mut frames = canvas::decode_gif(path, width, height, default_delay_ms)?;
        override_peak(&mut frames, peak_ms);
        debug!(path = %path.display(), frames = frames.len(), "Playing GIF");
        canvas::play_frames(&self.ctx, &frames)
    }

    /// Shows one payload taken off the channel.
    fn present(&self, payload: Payload) -> StageResult<()> {
        match payload {
            Payload::Path(path) if is_gif(&path) => self.view_gif(&path, 100, 0),
            Payload::Path(path) => self.view_image(&path, self.image_display_time),
            Payload::Frame(frame) => canvas::show_image(&self.ctx, &frame),
            other => {
                warn!(kind = other.kind(), "Viewer cannot present payload, dropping");
                Ok(())
            }
        }
    }

    /// Loading indicator until the paired cognitive stage finishes, then the
    /// result it published.
    fn loading_screen(&self) -> StageResult<()> {
        let state = self.ctx.state();
        let mut tick = 0;
        while !state.display_should_stop() {
            self.show_loading(tick)?;
            tick += 1;
            canvas::idle(state, self.loading_interval)?;
        }

        if state.is_shutdown() {
            return Ok(());
        }
        match state.try_receive() {
            Some(payload) => self.present(payload),
            None => {
                debug!("Cognitive stage finished without a result");
                Ok(())
            }
        }
    }

    fn display_image(&self) -> StageResult<()> {
        self.view_loop(|path| self.view_image(path, self.image_display_time))
    }

    fn display_gif(&self) -> StageResult<()> {
        self.view_loop(|path| self.view_gif(path, 100, 0))
    }

    fn view_loop(&self, mut view: impl FnMut(&Path) -> StageResult<()>) -> StageResult<()> {
        let state = self.ctx.state();
        let render = self.ctx.render();
        let mut tick = 0;
        while !state.display_should_stop() {
            match state.try_receive() {
                Some(Payload::Path(path)) => view(&path)?,
                Some(other) => self.present(other)?,
                None => {
                    self.show_loading(tick)?;
                    tick += 1;
                    canvas::idle(state, self.loading_interval)?;
                }
            }
            render.clear()?;
        }
        Ok(())
    }

    fn display_game(&self) -> StageResult<()> {
        let state = self.ctx.state();
        let limit = GAMEPLAY_SECONDS * GAMEPLAY_FPS as usize;
        let mut recorded = Vec::new();

        while !state.display_should_stop() {
            match state.try_receive() {
                Some(Payload::Frame(frame)) => {
                    canvas::show_image(&self.ctx, &frame)?;
                    if self.save_gameplay && recorded.len() < limit {
                        recorded.push(frame);
                    }
                }
                Some(other) => debug!(kind = other.kind(), "Ignoring non-frame payload"),
                None => canvas::idle(state, Duration::from_millis(10))?,
            }
        }

        if self.save_gameplay {
            canvas::save_gif(
                &recorded,
                &self.ctx.assets_dir(),
                "gameplay",
                1000 / GAMEPLAY_FPS,
            )?;
        }
        Ok(())
    }

    fn display_emotion_avatar(&self) -> StageResult<()> {
        let state = self.ctx.state();
        let avatar = self.ctx.assets_dir().join("avatar");
        let mut rng = rand::thread_rng();
        let mut next_blink = Instant::now() + Duration::from_secs(rng.gen_range(3..=10));

        self.view_image(&avatar.join("base.png"), Duration::from_millis(100))?;

        while !state.display_should_stop() {
            match state.try_receive() {
                Some(Payload::Emotion { tag, duration_ms }) => {
                    info!(emotion = %tag, "Avatar received emotion");
                    if tag == "think" {
                        self.view_image(&avatar.join("think.png"), Duration::from_secs(1))?;
                        next_blink = Instant::now() + Duration::from_secs(15);
                    } else {
                        self.view_gif(&emotion_asset(&avatar, &tag), 50, duration_ms)?;
                        next_blink =
                            Instant::now() + Duration::from_secs(rng.gen_range(3..=10));
                    }
                }
                Some(other) => debug!(kind = other.kind(), "Ignoring non-emotion payload"),
                None if Instant::now() >= next_blink => {
                    debug!("Blinking");
                    self.view_gif(&avatar.join("blink.gif"), 100, 0)?;
                    next_blink = Instant::now() + Duration::from_secs(rng.gen_range(3..=10));
                }
                None => {}
            }
            canvas::idle(state, Duration::from_millis(100))?;
        }
        Ok(())
    }
}

fn is_gif(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gif"))
}

/// Avatar animation for an emotion tag; unknown tags use the neutral face.
fn emotion_asset(avatar: &Path, tag: &str) -> PathBuf {
    let name = if EMOTIONS.contains(&tag) { tag } else { DEFAULT_EMOTION };
    // neutral has no animation of its own
    let file = if name == DEFAULT_EMOTION { "surprise" } else { name };
    avatar.join(format!("{file}.gif"))
}

/// Holds the middle frame for `peak_ms` minus the transition time.
fn override_peak(frames: &mut [GifFrame], peak_ms: u64) {
    if peak_ms == 0 || frames.is_empty() {
        return;
    }
    let peak = frames.len() / 2;
    frames[peak].delay_ms = peak_ms.saturating_sub(200);
}

impl Plugin for DisplayImagePlugins {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn as_display(self: Arc<Self>) -> Option<Arc<dyn DisplayPlugin>> {
        Some(self)
    }
}

impl DisplayPlugin for DisplayImagePlugins {
    fn display_hooks(&self) -> Vec<&'static str> {
        vec![
            "loading_screen",
            "display_image",
            "display_gif",
            "display_game",
            "display_emotion_avatar",
        ]
    }

    fn show(&self, hook: &str) -> StageResult<()> {
        let outcome = match hook {
            "loading_screen" => self.loading_screen(),
            "display_image" => self.display_image(),
            "display_gif" => self.display_gif(),
            "display_game" => self.display_game(),
            "display_emotion_avatar" => self.display_emotion_avatar(),
            other => return Err(unknown_hook(TYPE_NAME, other)),
        };
        canvas::finish(&self.ctx, outcome)
    }
}
