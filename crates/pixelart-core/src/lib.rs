//! # pixelart-core
//!
//! Core crate for the pixel art engine. Contains configuration schemas,
//! the opaque payload carried between pipelines, the render-hardware
//! contract with its headless implementation, and the unified error system.
//!
//! This crate has **no** internal dependencies on other workspace crates.

pub mod config;
pub mod error;
pub mod matrix;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
