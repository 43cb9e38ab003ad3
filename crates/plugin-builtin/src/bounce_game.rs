//! Minimal game: a pixel bouncing around the panel.
//!
//! Frames are streamed to the display side through [`GamePlugin::draw`];
//! pair it with the `display_game` effect.

use std::sync::Arc;
use std::time::Duration;

use image::{Rgb, RgbImage};
use tracing::info;

use pixelart_core::types::Payload;
use pixelart_core::{AppError, AppResult};
use pixelart_pipeline::{StageError, StageResult};
use pixelart_plugin::loader::unknown_hook;
use pixelart_plugin::{CognitivePlugin, GamePlugin, Plugin, PluginContext};

/// Module stem.
pub const MODULE: &str = "bounce_game";

const TYPE_NAME: &str = "BounceGame";
const BACKGROUND: [u8; 3] = [0, 0, 255];
const BALL: [u8; 3] = [255, 0, 0];

/// Bouncing-pixel game.
#[derive(Debug)]
pub struct BounceGame {
    ctx: PluginContext,
    runtime: Duration,
    fps: u32,
}

/// Ball position and velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ball {
    x: i64,
    y: i64,
    dx: i64,
    dy: i64,
}

impl Ball {
    fn step(&mut self, width: i64, height: i64) {
        if !(0..width).contains(&(self.x + self.dx)) {
            self.dx = -self.dx;
        }
        if !(0..height).contains(&(self.y + self.dy)) {
            self.dy = -self.dy;
        }
        self.x = (self.x + self.dx).clamp(0, width - 1);
        self.y = (self.y + self.dy).clamp(0, height - 1);
    }
}

impl BounceGame {
    /// Reads `runtime` (seconds) and `fps`.
    pub fn from_context(ctx: &PluginContext) -> AppResult<Self> {
        let fps: u32 = ctx.setting_or("fps", 30)?;
        if fps == 0 {
            return Err(AppError::plugin(format!(
                "Module '{}': fps must be at least 1",
                ctx.module()
            )));
        }
        Ok(Self {
            ctx: ctx.clone(),
            runtime: Duration::from_secs(ctx.setting_or("runtime", 15u64)?),
            fps,
        })
    }

    fn frame_count(&self) -> u64 {
        self.runtime.as_secs() * u64::from(self.fps)
    }

    fn play(&self) -> StageResult<Option<Payload>> {
        let state = self.ctx.state();
        let (width, height) = self.screen_size();
        let frame_time = Duration::from_secs(1) / self.fps;
        let mut ball = Ball {
            x: i64::from(width / 2),
            y: i64::from(height / 2),
            dx: 1,
            dy: 1,
        };

        info!(frames = self.frame_count(), fps = self.fps, "Game started");
        for _ in 0..self.frame_count() {
            if state.is_shutdown() {
                return Err(StageError::Terminated);
            }
            let mut frame = RgbImage::from_pixel(width, height, Rgb(BACKGROUND));
            frame.put_pixel(ball.x as u32, ball.y as u32, Rgb(BALL));
            self.draw(frame)?;
            ball.step(i64::from(width), i64::from(height));
            state.pause(frame_time)?;
        }
        info!("Game over");
        Ok(None)
    }
}

impl Plugin for BounceGame {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn as_cognitive(self: Arc<Self>) -> Option<Arc<dyn CognitivePlugin>> {
        Some(self)
    }

    fn as_game(self: Arc<Self>) -> Option<Arc<dyn GamePlugin>> {
        Some(self)
    }
}

impl CognitivePlugin for BounceGame {
    fn cognitive_hooks(&self) -> Vec<&'static str> {
        vec!["play"]
    }

    fn process(&self, hook: &str, _input: Option<Payload>) -> StageResult<Option<Payload>> {
        match hook {
            "play" => self.play(),
            other => Err(unknown_hook(TYPE_NAME, other)),
        }
    }
}

impl GamePlugin for BounceGame {
    fn context(&self) -> &PluginContext {
        &self.ctx
    }
}
