//! Render-hardware contract.
//!
//! The LED panel driver is a process-wide singleton: two writers on the
//! same panel corrupt output. Only display plugins hold a handle to it.

use image::{Rgb, RgbImage};

use crate::result::AppResult;

/// Off-screen canvas prepared by a display plugin and swapped onto the panel.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    image: RgbImage,
}

impl FrameBuffer {
    /// Creates a black buffer of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::new(width, height),
        }
    }

    /// Fills every pixel with one color.
    pub fn fill(&mut self, color: [u8; 3]) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgb(color);
        }
    }

    /// Copies an image into the buffer, cropping anything outside it.
    pub fn set_image(&mut self, image: &RgbImage) {
        let width = self.image.width().min(image.width());
        let height = self.image.height().min(image.height());
        for y in 0..height {
            for x in 0..width {
                self.image.put_pixel(x, y, *image.get_pixel(x, y));
            }
        }
    }

    /// Sets one pixel; out-of-bounds coordinates are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        if x < self.image.width() && y < self.image.height() {
            self.image.put_pixel(x, y, Rgb(color));
        }
    }

    /// Borrows the buffer contents.
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Consumes the buffer, returning its contents.
    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

/// Operations the engine and display plugins need from the panel driver.
pub trait RenderTarget: Send + Sync + std::fmt::Debug {
    /// Panel width in pixels.
    fn width(&self) -> u32;

    /// Panel height in pixels.
    fn height(&self) -> u32;

    /// Shows a full frame immediately.
    fn set_frame(&self, frame: &RgbImage) -> AppResult<()>;

    /// Allocates an off-screen buffer matching the panel size.
    fn create_buffer(&self) -> FrameBuffer {
        FrameBuffer::new(self.width(), self.height())
    }

    /// Presents `buffer` on the next refresh and hands back the previous
    /// back buffer for reuse.
    fn swap_buffer(&self, buffer: FrameBuffer) -> AppResult<FrameBuffer>;

    /// Blanks the panel.
    fn clear(&self) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_set_pixel() {
        let mut buffer = FrameBuffer::new(4, 4);
        buffer.fill([10, 20, 30]);
        assert_eq!(buffer.image().get_pixel(3, 3).0, [10, 20, 30]);

        buffer.set_pixel(1, 2, [255, 0, 0]);
        buffer.set_pixel(99, 99, [255, 0, 0]);
        assert_eq!(buffer.image().get_pixel(1, 2).0, [255, 0, 0]);
    }

    #[test]
    fn test_set_image_crops() {
        let mut src = RgbImage::new(8, 8);
        src.put_pixel(1, 1, Rgb([1, 2, 3]));
        src.put_pixel(7, 7, Rgb([9, 9, 9]));

        let mut buffer = FrameBuffer::new(4, 4);
        buffer.set_image(&src);
        assert_eq!(buffer.image().get_pixel(1, 1).0, [1, 2, 3]);
        assert_eq!(buffer.image().dimensions(), (4, 4));
    }
}
