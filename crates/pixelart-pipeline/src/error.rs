//! Stage-level errors.

use thiserror::Error;

/// Why a stage, or the rendezvous around it, did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    /// The shutdown flag was observed. Expected during teardown, never a fault.
    #[error("pipeline terminated")]
    Terminated,

    /// The stage body failed. The current outer iteration is abandoned.
    #[error("stage failed: {0}")]
    Failed(String),
}

impl StageError {
    /// Builds a failure from anything displayable.
    pub fn failed(message: impl std::fmt::Display) -> Self {
        Self::Failed(message.to_string())
    }

    /// Whether this is the shutdown condition rather than a fault.
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}

impl From<pixelart_core::AppError> for StageError {
    fn from(err: pixelart_core::AppError) -> Self {
        Self::Failed(err.to_string())
    }
}

/// Result of running one stage.
pub type StageResult<T> = Result<T, StageError>;
