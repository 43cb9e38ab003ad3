//! Sprites drawn at random positions.

use std::sync::Arc;
use std::time::Duration;

use image::{Rgb, RgbImage};
use rand::Rng;
use rand::seq::SliceRandom;

use pixelart_core::AppResult;
use pixelart_core::traits::RenderTarget;
use pixelart_pipeline::StageResult;
use pixelart_plugin::loader::unknown_hook;
use pixelart_plugin::{DisplayPlugin, Plugin, PluginContext};

use crate::canvas;
use crate::palette::{FUNKY_FUTURE, SODA_CAP};

/// Module stem.
pub const MODULE: &str = "random_pixel_plugins";

const TYPE_NAME: &str = "RandomPixelPlugins";

const HEART_SIZE: (u32, u32) = (7, 6);
#[rustfmt::skip]
const HEART_GAPS: [(u32, u32); 15] = [
    (0, 0), (3, 0), (6, 0),
    (0, 3), (6, 3),
    (0, 4), (1, 4), (5, 4), (6, 4),
    (0, 5), (1, 5), (2, 5), (4, 5), (5, 5), (6, 5),
];

const SMILEY_SIZE: u32 = 9;
const SMILEY_FACE: [u8; 3] = [255, 215, 0];
#[rustfmt::skip]
const SMILEY_CORNERS: [(u32, u32); 12] = [
    (0, 0), (1, 0), (7, 0), (8, 0), (0, 1), (8, 1),
    (0, 7), (8, 7), (0, 8), (1, 8), (7, 8), (8, 8),
];
const SMILEY_FEATURES: [([u8; 3], &[(u32, u32)]); 3] = [
    ([255, 255, 255], &[(2, 2), (5, 2), (2, 3), (3, 3), (5, 3), (6, 3)]),
    ([0, 0, 139], &[(3, 2), (6, 2)]),
    ([210, 4, 45], &[(2, 5), (3, 5), (4, 5), (5, 5), (6, 5), (3, 6), (4, 6), (5, 6)]),
];

#[rustfmt::skip]
const SNAKE_MOVES: [(i32, i32); 8] = [
    (-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0), (1, 1),
];
const SNAKE_RUN: usize = 5;
const SNAKE_MAX_LEN: usize = 500;

/// Random pixels, hearts, smileys and a wandering snake.
#[derive(Debug)]
pub struct RandomPixelPlugins {
    ctx: PluginContext,
    save_gif: bool,
    num_sprites: usize,
}

impl RandomPixelPlugins {
    /// Reads settings from the module's `[plugin]` table.
    pub fn from_context(ctx: &PluginContext) -> AppResult<Self> {
        Ok(Self {
            ctx: ctx.clone(),
            save_gif: ctx.setting_or("save_gif", false)?,
            num_sprites: ctx.setting_or("num_sprites", 3usize)?,
        })
    }

    /// Redraws a fresh frame from `draw` once per `interval` until stopped.
    fn animate<F>(&self, interval: Duration, keep: usize, mut draw: F) -> StageResult<Vec<RgbImage>>
    where
        F: FnMut(&mut RgbImage),
    {
        let state = self.ctx.state();
        let render = self.ctx.render();
        let mut captured = Vec::new();
        let mut buffer = render.create_buffer();

        while !state.display_should_stop() {
            let mut frame = RgbImage::new(render.width(), render.height());
            draw(&mut frame);
            buffer.set_image(&frame);
            buffer = render.swap_buffer(buffer)?;
            if self.save_gif && captured.len() < keep {
                captured.push(frame);
            }
            canvas::idle(state, interval)?;
        }
        Ok(captured)
    }

    fn save(&self, captured: &[RgbImage], delay_ms: u32) -> StageResult<()> {
        if self.save_gif {
            canvas::save_gif(captured, &self.ctx.assets_dir(), "out", delay_ms)?;
        }
        Ok(())
    }

    fn display_pixel_rand(&self) -> StageResult<()> {
        let mut rng = rand::thread_rng();
        let colors: Vec<[u8; 3]> = (0..self.num_sprites)
            .map(|_| FUNKY_FUTURE.random(&mut rng))
            .collect();

        let captured = self.animate(Duration::from_secs(1), 5, |frame| {
            for color in &colors {
                let x = rng.gen_range(0..frame.width());
                let y = rng.gen_range(0..frame.height());
                frame.put_pixel(x, y, Rgb(*color));
            }
        })?;
        self.save(&captured, 1000)
    }

    fn display_heart_rand(&self) -> StageResult<()> {
        let mut rng = rand::thread_rng();
        let captured = self.animate(Duration::from_secs(1), 5, |frame| {
            for _ in 0..self.num_sprites {
                let color = FUNKY_FUTURE.random(&mut rng);
                let origin = random_origin(&mut rng, frame, HEART_SIZE);
                draw_heart(frame, origin, color);
            }
        })?;
        self.save(&captured, 1000)
    }

    fn display_smiley_rand(&self) -> StageResult<()> {
        let mut rng = rand::thread_rng();
        let captured = self.animate(Duration::from_secs(1), 5, |frame| {
            let origin = random_origin(&mut rng, frame, (SMILEY_SIZE, SMILEY_SIZE));
            draw_smiley(frame, origin);
        })?;
        self.save(&captured, 1000)
    }

    fn display_snake_rand(&self) -> StageResult<()> {
        let state = self.ctx.state();
        let render = self.ctx.render();
        let mut rng = rand::thread_rng();
        let mut snake = Snake::new(render.width(), render.height());
        let mut captured = Vec::new();
        let mut buffer = render.create_buffer();

        while !state.display_should_stop() {
            snake.reset_if_long();
            let Some(&direction) = SNAKE_MOVES.choose(&mut rng) else {
                break;
            };
            for _ in 0..SNAKE_RUN {
                if !snake.advance(direction) {
                    break;
                }
                let frame = snake.render(render.width(), render.height());
                buffer.set_image(&frame);
                buffer = render.swap_buffer(buffer)?;
                if self.save_gif && captured.len() < 50 {
                    captured.push(frame);
                }
                canvas::idle(state, Duration::from_millis(100))?;
                if state.display_should_stop() {
                    break;
                }
            }
        }
        self.save(&captured, 10)
    }
}

fn random_origin<R: Rng>(rng: &mut R, frame: &RgbImage, size: (u32, u32)) -> (u32, u32) {
    (
        rng.gen_range(0..=frame.width().saturating_sub(size.0)),
        rng.gen_range(0..=frame.height().saturating_sub(size.1)),
    )
}

fn put_clipped(frame: &mut RgbImage, x: u32, y: u32, color: [u8; 3]) {
    if x < frame.width() && y < frame.height() {
        frame.put_pixel(x, y, Rgb(color));
    }
}

fn draw_heart(frame: &mut RgbImage, origin: (u32, u32), color: [u8; 3]) {
    for x in 0..HEART_SIZE.0 {
        for y in 0..HEART_SIZE.1 {
            if !HEART_GAPS.contains(&(x, y)) {
                put_clipped(frame, origin.0 + x, origin.1 + y, color);
            }
        }
    }
}

fn draw_smiley(frame: &mut RgbImage, origin: (u32, u32)) {
    for x in 0..SMILEY_SIZE {
        for y in 0..SMILEY_SIZE {
            if SMILEY_CORNERS.contains(&(x, y)) {
                continue;
            }
            let color = SMILEY_FEATURES
                .iter()
                .find(|(_, pixels)| pixels.contains(&(x, y)))
                .map_or(SMILEY_FACE, |(color, _)| *color);
            put_clipped(frame, origin.0 + x, origin.1 + y, color);
        }
    }
}

/// Snake walking in straight runs. Crossing its own body switches to the
/// next Soda-Cap colour and drops the crossed segment.
#[derive(Debug)]
struct Snake {
    width: i32,
    height: i32,
    body: Vec<((i32, i32), [u8; 3])>,
    color_index: usize,
    recolor_armed: bool,
}

impl Snake {
    fn new(width: u32, height: u32) -> Self {
        let start = ((width / 2) as i32, (height / 2) as i32);
        Self {
            width: width as i32,
            height: height as i32,
            body: vec![(start, SODA_CAP.color(0))],
            color_index: 0,
            recolor_armed: true,
        }
    }

    fn head(&self) -> (i32, i32) {
        self.body.last().map_or((0, 0), |(p, _)| *p)
    }

    fn reset_if_long(&mut self) {
        if self.body.len() > SNAKE_MAX_LEN {
            let head = self.head();
            self.body.clear();
            self.body.push((head, SODA_CAP.color(self.color_index)));
        }
    }

    /// Moves one step; false when the step would reverse or leave the panel.
    fn advance(&mut self, (dx, dy): (i32, i32)) -> bool {
        let (x, y) = self.head();
        let next = (x + dx, y + dy);

        let reverses = self.body.len() > 1 && self.body[self.body.len() - 2].0 == next;
        let outside = next.0 < 0 || next.1 < 0 || next.0 >= self.width || next.1 >= self.height;
        if reverses || outside {
            return false;
        }

        let hit = self.body.iter().position(|(p, _)| *p == next);
        if let Some(index) = hit {
            if self.recolor_armed {
                self.color_index = (self.color_index + 1) % SODA_CAP.len();
                self.body.remove(index);
            }
        }
        // consecutive hits while running along the body only recolour once
        self.recolor_armed = hit.is_none();

        self.body.push((next, SODA_CAP.color(self.color_index)));
        true
    }

    fn render(&self, width: u32, height: u32) -> RgbImage {
        let mut frame = RgbImage::new(width, height);
        for ((x, y), color) in &self.body {
            put_clipped(&mut frame, *x as u32, *y as u32, *color);
        }
        frame
    }
}

impl Plugin for RandomPixelPlugins {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn as_display(self: Arc<Self>) -> Option<Arc<dyn DisplayPlugin>> {
        Some(self)
    }
}

impl DisplayPlugin for RandomPixelPlugins {
    fn display_hooks(&self) -> Vec<&'static str> {
        vec![
            "display_pixel_rand",
            "display_heart_rand",
            "display_smiley_rand",
            "display_snake_rand",
        ]
    }

    fn show(&self, hook: &str) -> StageResult<()> {
        let outcome = match hook {
            "display_pixel_rand" => self.display_pixel_rand(),
            "display_heart_rand" => self.display_heart_rand(),
            "display_smiley_rand" => self.display_smiley_rand(),
            "display_snake_rand" => self.display_snake_rand(),
            other => return Err(unknown_hook(TYPE_NAME, other)),
        };
        canvas::finish(&self.ctx, outcome)
    }
}
