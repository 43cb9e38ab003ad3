//! Convenience result type alias for the pixel art engine.

use crate::error::AppError;

/// A specialized `Result` type for engine operations.
pub type AppResult<T> = Result<T, AppError>;
