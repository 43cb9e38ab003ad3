//! Drawing helpers shared by the display effects.
//!
//! Everything here writes through the [`RenderTarget`] held by a
//! [`PluginContext`]; cognitive and game plugins never call into this module.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::imageops::FilterType;
use image::{AnimationDecoder, Delay, DynamicImage, Frame, Rgb, RgbImage};
use tracing::{debug, info};

use pixelart_core::AppResult;
use pixelart_core::traits::RenderTarget;
use pixelart_pipeline::{SchedulerState, StageResult};
use pixelart_plugin::PluginContext;

/// One decoded animation frame.
#[derive(Debug, Clone)]
pub struct GifFrame {
    /// Frame contents, already fitted to the panel.
    pub image: RgbImage,
    /// Time the frame stays on screen.
    pub delay_ms: u64,
}

/// Shrinks `image` to fit the panel, keeping its aspect ratio. Images that
/// already fit are returned unchanged.
pub fn fit(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    if image.width() <= width && image.height() <= height {
        return image.clone();
    }
    DynamicImage::ImageRgb8(image.clone())
        .resize(width, height, FilterType::Lanczos3)
        .to_rgb8()
}

/// Opens any still image and converts it to RGB.
pub fn load_rgb(path: &Path) -> AppResult<RgbImage> {
    Ok(image::open(path)?.to_rgb8())
}

/// Decodes every frame of a GIF. Frames without a delay use `default_delay_ms`.
pub fn decode_gif(
    path: &Path,
    width: u32,
    height: u32,
    default_delay_ms: u64,
) -> AppResult<Vec<GifFrame>> {
    let reader = BufReader::new(File::open(path)?);
    let frames = GifDecoder::new(reader)?.into_frames().collect_frames()?;

    Ok(frames
        .into_iter()
        .map(|frame| {
            let (numer, denom) = frame.delay().numer_denom_ms();
            let delay_ms = match numer.checked_div(denom) {
                Some(0) | None => default_delay_ms,
                Some(ms) => u64::from(ms),
            };
            let image = DynamicImage::ImageRgba8(frame.into_buffer()).to_rgb8();
            GifFrame {
                image: fit(&image, width, height),
                delay_ms,
            }
        })
        .collect())
}

/// Writes `frames` as a looping GIF under
/// `<base>/response/<YYYY-MM-DD>/<name>_<hh-mm-ssPM>.gif`.
///
/// Returns `None` without touching the filesystem when there are no frames.
pub fn save_gif(
    frames: &[RgbImage],
    base: &Path,
    name: &str,
    delay_ms: u32,
) -> AppResult<Option<PathBuf>> {
    if frames.is_empty() {
        debug!("No frames captured for '{}', skipping GIF", name);
        return Ok(None);
    }

    let now = chrono::Local::now();
    let dir = base.join("response").join(now.format("%Y-%m-%d").to_string());
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{}_{}.gif", name, now.format("%I-%M-%S%p")));

    let mut encoder = GifEncoder::new(File::create(&path)?);
    encoder.set_repeat(Repeat::Infinite)?;
    encoder.encode_frames(frames.iter().map(|image| {
        Frame::from_parts(
            DynamicImage::ImageRgb8(image.clone()).to_rgba8(),
            0,
            0,
            Delay::from_numer_denom_ms(delay_ms, 1),
        )
    }))?;

    info!(path = %path.display(), frames = frames.len(), "Saved GIF");
    Ok(Some(path))
}

/// The "busy" indicator: three dots, the `tick`-th one lit.
pub fn loading_frame(width: u32, height: u32, color: [u8; 3], tick: usize) -> RgbImage {
    const DOT: u32 = 3;
    const GAP: u32 = 3;

    let dim = color.map(|c| c / 4);
    let mut frame = RgbImage::new(width, height);
    let left = width.saturating_sub(3 * DOT + 2 * GAP) / 2;
    let top = height.saturating_sub(DOT) / 2;

    for dot in 0..3u32 {
        let fill = if dot as usize == tick % 3 { color } else { dim };
        let x0 = left + dot * (DOT + GAP);
        for y in top..(top + DOT).min(height) {
            for x in x0..(x0 + DOT).min(width) {
                frame.put_pixel(x, y, Rgb(fill));
            }
        }
    }
    frame
}

/// Sleeps up to `duration`, returning early once the display side should stop.
pub fn idle(state: &SchedulerState, duration: Duration) -> StageResult<()> {
    let deadline = Instant::now() + duration;
    while !state.display_should_stop() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        state.pause(remaining.min(state.poll_interval()))?;
    }
    Ok(())
}

/// Fits and shows one image.
pub fn show_image(ctx: &PluginContext, image: &RgbImage) -> StageResult<()> {
    let render = ctx.render();
    let fitted = fit(image, render.width(), render.height());
    render.set_frame(&fitted)?;
    Ok(())
}

/// Plays decoded frames through the panel's back buffer.
///
/// Frame delays run to completion; only shutdown cuts them short.
pub fn play_frames(ctx: &PluginContext, frames: &[GifFrame]) -> StageResult<()> {
    let render = ctx.render();
    let mut buffer = render.create_buffer();
    for (index, frame) in frames.iter().enumerate() {
        buffer.fill([0, 0, 0]);
        buffer.set_image(&frame.image);
        buffer = render.swap_buffer(buffer)?;
        debug!(frame = index, delay_ms = frame.delay_ms, "GIF frame");
        ctx.state().pause(Duration::from_millis(frame.delay_ms))?;
    }
    Ok(())
}

/// Blanks the panel after an effect and passes its outcome through.
pub fn finish(ctx: &PluginContext, outcome: StageResult<()>) -> StageResult<()> {
    let cleared = ctx.render().clear();
    outcome?;
    cleared?;
    Ok(())
}
