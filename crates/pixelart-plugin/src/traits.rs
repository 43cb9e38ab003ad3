//! Plugin contracts.
//!
//! A plugin type implements [`Plugin`] plus exactly one capability trait.
//! Conformance is reported through the `as_*` upcasts, which the loader
//! calls once to classify the instance.

use std::sync::Arc;

use image::RgbImage;

use pixelart_core::types::Payload;
use pixelart_pipeline::StageResult;

use crate::api::context::PluginContext;

/// Base trait of every plugin type.
pub trait Plugin: Send + Sync + std::fmt::Debug {
    /// Type name used in hook ids (`module.TypeName.function`).
    fn type_name(&self) -> &str;

    /// Upcast to the display contract if implemented.
    fn as_display(self: Arc<Self>) -> Option<Arc<dyn DisplayPlugin>> {
        None
    }

    /// Upcast to the cognitive contract if implemented.
    fn as_cognitive(self: Arc<Self>) -> Option<Arc<dyn CognitivePlugin>> {
        None
    }

    /// Upcast to the game contract if implemented.
    fn as_game(self: Arc<Self>) -> Option<Arc<dyn GamePlugin>> {
        None
    }
}

/// Plugins that own the panel and render effects.
///
/// A display hook loops until
/// [`SchedulerState::display_should_stop`](pixelart_pipeline::SchedulerState::display_should_stop)
/// reports true, then returns.
pub trait DisplayPlugin: Plugin {
    /// Function names exposed as display hooks.
    fn display_hooks(&self) -> Vec<&'static str>;

    /// Runs one display hook.
    fn show(&self, hook: &str) -> StageResult<()>;
}

/// Plugins that perceive, think, or generate content.
pub trait CognitivePlugin: Plugin {
    /// Function names exposed as cognitive hooks.
    fn cognitive_hooks(&self) -> Vec<&'static str>;

    /// Runs one cognitive hook with the previous stage's result.
    fn process(&self, hook: &str, input: Option<Payload>) -> StageResult<Option<Payload>>;
}

/// Cognitive plugins that run an interactive game and stream frames.
pub trait GamePlugin: CognitivePlugin {
    /// The context the plugin was created with.
    fn context(&self) -> &PluginContext;

    /// Game canvas size in pixels.
    fn screen_size(&self) -> (u32, u32) {
        let render = self.context().render();
        (render.width(), render.height())
    }

    /// Sends a rendered frame to the display side.
    fn draw(&self, frame: RgbImage) -> StageResult<()> {
        self.context().state().publish(Payload::Frame(frame))
    }
}
