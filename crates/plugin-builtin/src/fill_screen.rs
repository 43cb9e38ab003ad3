//! Full-panel fill effects.

use std::sync::Arc;
use std::time::Duration;

use image::RgbImage;
use tracing::debug;

use pixelart_core::AppResult;
use pixelart_core::traits::RenderTarget;
use pixelart_pipeline::StageResult;
use pixelart_plugin::loader::unknown_hook;
use pixelart_plugin::{DisplayPlugin, Plugin, PluginContext};

use crate::canvas;
use crate::palette::{MOONLIGHT_GB, SODA_CAP};

/// Module stem.
pub const MODULE: &str = "fill_screen_plugins";

const TYPE_NAME: &str = "FillScreenPlugins";
const STROBE_STEPS: u32 = 100;

/// Fade and scatter fills.
#[derive(Debug)]
pub struct FillScreenPlugins {
    ctx: PluginContext,
    save_gif: bool,
    strobe_color: Option<[u8; 3]>,
}

impl FillScreenPlugins {
    /// Reads settings from the module's `[plugin]` table.
    pub fn from_context(ctx: &PluginContext) -> AppResult<Self> {
        Ok(Self {
            ctx: ctx.clone(),
            save_gif: ctx.setting_or("save_gif", false)?,
            strobe_color: ctx.setting("strobe_color")?,
        })
    }

    /// Fades one colour in and out. Without `strobe_color` a Soda-Cap colour
    /// is picked per run.
    fn display_strobe_fill(&self) -> StageResult<()> {
        let state = self.ctx.state();
        let render = self.ctx.render();
        let color = self
            .strobe_color
            .unwrap_or_else(|| SODA_CAP.random(&mut rand::thread_rng()));
        debug!(?color, "Strobe colour");

        let mut captured = Vec::new();
        let mut buffer = render.create_buffer();
        let mut rising = false;

        while !state.display_should_stop() {
            for step in strobe_steps(rising) {
                if state.display_should_stop() {
                    break;
                }
                let shade = strobe_shade(color, step);
                buffer.fill(shade);
                buffer = render.swap_buffer(buffer)?;
                if self.save_gif && captured.len() < 18 && step % (STROBE_STEPS / 10) == 0 {
                    captured.push(RgbImage::from_pixel(
                        render.width(),
                        render.height(),
                        image::Rgb(shade),
                    ));
                }
                state.pause(strobe_delay(step))?;
            }
            rising = !rising;
        }

        if self.save_gif {
            canvas::save_gif(&captured, &self.ctx.assets_dir(), "out", 1000)?;
        }
        Ok(())
    }

    /// Every pixel a random Moonlight GB colour, once per second.
    fn display_scatter_fill(&self) -> StageResult<()> {
        let state = self.ctx.state();
        let render = self.ctx.render();
        let mut rng = rand::thread_rng();
        let mut captured = Vec::new();
        let mut buffer = render.create_buffer();

        while !state.display_should_stop() {
            let frame = RgbImage::from_fn(render.width(), render.height(), |_, _| {
                image::Rgb(MOONLIGHT_GB.random(&mut rng))
            });
            buffer.set_image(&frame);
            buffer = render.swap_buffer(buffer)?;
            if self.save_gif && captured.len() < 5 {
                captured.push(frame);
            }
            canvas::idle(state, Duration::from_secs(1))?;
        }

        if self.save_gif {
            canvas::save_gif(&captured, &self.ctx.assets_dir(), "out", 1000)?;
        }
        Ok(())
    }
}

/// Step sequence of one half-cycle: 99..=1 falling, 1..=99 rising.
fn strobe_steps(rising: bool) -> Box<dyn Iterator<Item = u32>> {
    if rising {
        Box::new(1..STROBE_STEPS)
    } else {
        Box::new((1..STROBE_STEPS).rev())
    }
}

fn strobe_shade(color: [u8; 3], step: u32) -> [u8; 3] {
    // step < STROBE_STEPS, so the result fits in u8
    color.map(|c| (u32::from(c) * step / STROBE_STEPS) as u8)
}

/// Short steps near full brightness, long ones near black.
fn strobe_delay(step: u32) -> Duration {
    let divisor = if step > STROBE_STEPS / 2 {
        step
    } else {
        STROBE_STEPS - step
    };
    Duration::from_secs_f64(0.1 / f64::from(divisor))
}

impl Plugin for FillScreenPlugins {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn as_display(self: Arc<Self>) -> Option<Arc<dyn DisplayPlugin>> {
        Some(self)
    }
}

impl DisplayPlugin for FillScreenPlugins {
    fn display_hooks(&self) -> Vec<&'static str> {
        vec!["display_strobe_fill", "display_scatter_fill"]
    }

    fn show(&self, hook: &str) -> StageResult<()> {
        let outcome = match hook {
            "display_strobe_fill" => self.display_strobe_fill(),
            "display_scatter_fill" => self.display_scatter_fill(),
            other => return Err(unknown_hook(TYPE_NAME, other)),
        };
        canvas::finish(&self.ctx, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture, stop_after};

    #[test]
    fn test_strobe_shades() {
        assert_eq!(strobe_shade([200, 100, 0], 50), [100, 50, 0]);
        assert_eq!(strobe_shade([255, 255, 255], 99), [252, 252, 252]);
        assert_eq!(strobe_steps(true).next(), Some(1));
        assert_eq!(strobe_steps(false).next(), Some(99));
        assert_eq!(strobe_steps(false).count(), 99);
    }

    #[test]
    fn test_strobe_delay_is_shortest_at_extremes() {
        assert!(strobe_delay(99) < strobe_delay(60));
        assert!(strobe_delay(1) < strobe_delay(40));
    }

    #[test]
    fn test_strobe_uses_configured_color() {
        let fx = fixture(MODULE, "strobe_color = [200, 0, 0]\n");
        let plugin = FillScreenPlugins::from_context(&fx.ctx).unwrap();
        let stopper = stop_after(&fx.state, Duration::from_millis(60));

        plugin.show("display_strobe_fill").unwrap();
        stopper.join().unwrap();

        let history = fx.matrix.history();
        assert!(!history.is_empty());
        assert!(history.iter().all(|f| {
            let [r, g, b] = f.get_pixel(0, 0).0;
            g == 0 && b == 0 && r <= 200
        }));
        assert_eq!(fx.matrix.clear_count(), 1);
    }

    #[test]
    fn test_scatter_uses_palette_and_saves_gif() {
        let fx = fixture(MODULE, "save_gif = true\n");
        let plugin = FillScreenPlugins::from_context(&fx.ctx).unwrap();
        let stopper = stop_after(&fx.state, Duration::from_millis(30));

        plugin.show("display_scatter_fill").unwrap();
        stopper.join().unwrap();

        let frame = fx.matrix.history().remove(0);
        let palette: Vec<[u8; 3]> = (0..MOONLIGHT_GB.len()).map(|i| MOONLIGHT_GB.color(i)).collect();
        assert!(frame.pixels().all(|p| palette.contains(&p.0)));
        assert!(fx.ctx.assets_dir().join("response").exists());
    }
}
