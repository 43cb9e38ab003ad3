//! A named, invocable unit of work in a pipeline.

use std::fmt;
use std::sync::Arc;

use pixelart_core::types::Payload;

use crate::error::StageResult;

/// Stage body: takes the previous stage's result (cognitive chains only)
/// and returns this stage's result.
pub type StageFn = Arc<dyn Fn(Option<Payload>) -> StageResult<Option<Payload>> + Send + Sync>;

/// One step of a display or cognitive pipeline.
#[derive(Clone)]
pub struct Stage {
    name: String,
    invoke: StageFn,
}

impl Stage {
    /// Wraps a callable under a name.
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Option<Payload>) -> StageResult<Option<Payload>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            invoke: Arc::new(f),
        }
    }

    /// Wraps an already shared callable.
    pub fn from_fn(name: impl Into<String>, invoke: StageFn) -> Self {
        Self {
            name: name.into(),
            invoke,
        }
    }

    /// Hook id, `module.PluginName.function`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the stage body, without any rendezvous.
    pub fn invoke(&self, input: Option<Payload>) -> StageResult<Option<Payload>> {
        (self.invoke)(input)
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage").field("name", &self.name).finish()
    }
}
