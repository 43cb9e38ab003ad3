//! Cognitive stage that hands a fixed image to the display side.
//!
//! Stands in for a generator (diffusion model, web search) when wiring a
//! pipeline or testing the rendezvous.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use pixelart_core::AppResult;
use pixelart_core::types::Payload;
use pixelart_pipeline::StageResult;
use pixelart_plugin::loader::unknown_hook;
use pixelart_plugin::{CognitivePlugin, Plugin, PluginContext};

/// Module stem.
pub const MODULE: &str = "image_source";

const TYPE_NAME: &str = "ImageSource";

/// Publishes a configured image path.
#[derive(Debug)]
pub struct ImageSource {
    ctx: PluginContext,
    path: PathBuf,
    delay: Duration,
}

impl ImageSource {
    /// Reads `path` (relative to the module directory) and `delay_ms`.
    pub fn from_context(ctx: &PluginContext) -> AppResult<Self> {
        let configured: PathBuf = ctx.setting_or("path", PathBuf::from("assets/examples/tree.png"))?;
        let path = if configured.is_absolute() {
            configured
        } else {
            ctx.directory().join(configured)
        };
        Ok(Self {
            ctx: ctx.clone(),
            path,
            delay: Duration::from_millis(ctx.setting_or("delay_ms", 0u64)?),
        })
    }

    /// The path this source produces.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Publishes the path for the display side and returns it to the next
    /// cognitive stage.
    fn produce_path(&self) -> StageResult<Option<Payload>> {
        let state = self.ctx.state();
        state.pause(self.delay)?;
        info!(path = %self.path.display(), "Producing image");
        state.publish(Payload::path(self.path.clone()))?;
        Ok(Some(Payload::path(self.path.clone())))
    }
}

impl Plugin for ImageSource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn as_cognitive(self: Arc<Self>) -> Option<Arc<dyn CognitivePlugin>> {
        Some(self)
    }
}

impl CognitivePlugin for ImageSource {
    fn cognitive_hooks(&self) -> Vec<&'static str> {
        vec!["produce_path"]
    }

    fn process(&self, hook: &str, _input: Option<Payload>) -> StageResult<Option<Payload>> {
        match hook {
            "produce_path" => self.produce_path(),
            other => Err(unknown_hook(TYPE_NAME, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture;

    #[test]
    fn test_relative_path_resolves_against_module_dir() {
        let fx = fixture(MODULE, "path = \"assets/cat.png\"\n");
        let source = ImageSource::from_context(&fx.ctx).unwrap();
        assert_eq!(source.path(), &fx.dir.path().join("assets/cat.png"));
    }

    #[test]
    fn test_produce_path_publishes_and_returns() {
        let fx = fixture(MODULE, "path = \"/srv/tree.png\"\n");
        let source = ImageSource::from_context(&fx.ctx).unwrap();

        let out = source.process("produce_path", None).unwrap();
        assert_eq!(out, Some(Payload::path("/srv/tree.png")));
        assert_eq!(fx.state.try_receive(), Some(Payload::path("/srv/tree.png")));
        assert!(fx.state.try_receive().is_none());
    }

    #[test]
    fn test_shutdown_during_delay_terminates() {
        let fx = fixture(MODULE, "delay_ms = 5000\n");
        fx.state.request_shutdown();
        let source = ImageSource::from_context(&fx.ctx).unwrap();
        let err = source.process("produce_path", None).unwrap_err();
        assert!(err.is_terminated());
        assert!(fx.state.channel.is_empty());
    }
}
