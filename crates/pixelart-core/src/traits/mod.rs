//! Core traits defined in `pixelart-core` and implemented by other crates.

pub mod render;

pub use render::{FrameBuffer, RenderTarget};
