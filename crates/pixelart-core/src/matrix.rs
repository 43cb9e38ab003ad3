//! Headless LED matrix.
//!
//! An in-memory [`RenderTarget`] used when no panel driver is linked. It
//! keeps the currently shown frame and counts every write, which is what
//! the scheduler tests assert on.

use image::RgbImage;
use parking_lot::Mutex;
use tracing::trace;

use crate::config::MatrixConfig;
use crate::result::AppResult;
use crate::traits::render::{FrameBuffer, RenderTarget};

#[derive(Debug)]
struct MatrixState {
    /// What the panel currently shows.
    front: RgbImage,
    /// Buffer handed back on the next swap.
    back: FrameBuffer,
    /// Frames written via `set_frame` or `swap_buffer`.
    writes: u64,
    /// Calls to `clear`.
    clears: u64,
    /// Most recent frames, oldest first.
    history: Vec<RgbImage>,
}

/// In-memory panel.
#[derive(Debug)]
pub struct HeadlessMatrix {
    width: u32,
    height: u32,
    /// Number of frames kept in `history` (0 disables it).
    history_limit: usize,
    state: Mutex<MatrixState>,
}

impl HeadlessMatrix {
    /// Creates a blank panel of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            history_limit: 0,
            state: Mutex::new(MatrixState {
                front: RgbImage::new(width, height),
                back: FrameBuffer::new(width, height),
                writes: 0,
                clears: 0,
                history: Vec::new(),
            }),
        }
    }

    /// Creates a panel sized from configuration.
    pub fn from_config(config: &MatrixConfig) -> Self {
        Self::new(config.cols, config.rows)
    }

    /// Keeps the last `limit` written frames for inspection.
    pub fn with_history(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Total frames written so far.
    pub fn write_count(&self) -> u64 {
        self.state.lock().writes
    }

    /// Total clears so far.
    pub fn clear_count(&self) -> u64 {
        self.state.lock().clears
    }

    /// Copy of the frame currently shown.
    pub fn current_frame(&self) -> RgbImage {
        self.state.lock().front.clone()
    }

    /// Copy of the retained frame history, oldest first.
    pub fn history(&self) -> Vec<RgbImage> {
        self.state.lock().history.clone()
    }

    fn record(&self, state: &mut MatrixState, frame: RgbImage) {
        state.writes += 1;
        if self.history_limit > 0 {
            if state.history.len() == self.history_limit {
                state.history.remove(0);
            }
            state.history.push(frame.clone());
        }
        state.front = frame;
        trace!(writes = state.writes, "Headless matrix frame written");
    }
}

impl RenderTarget for HeadlessMatrix {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_frame(&self, frame: &RgbImage) -> AppResult<()> {
        let mut shown = FrameBuffer::new(self.width, self.height);
        shown.set_image(frame);
        let mut state = self.state.lock();
        self.record(&mut state, shown.into_image());
        Ok(())
    }

    fn swap_buffer(&self, buffer: FrameBuffer) -> AppResult<FrameBuffer> {
        let mut shown = FrameBuffer::new(self.width, self.height);
        shown.set_image(buffer.image());
        let mut state = self.state.lock();
        let previous = std::mem::replace(&mut state.back, buffer);
        self.record(&mut state, shown.into_image());
        Ok(previous)
    }

    fn clear(&self) -> AppResult<()> {
        let mut state = self.state.lock();
        state.front = RgbImage::new(self.width, self.height);
        state.clears += 1;
        Ok(())
    }
}
