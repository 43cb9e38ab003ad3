//! Cognitive stage that drives the emotion avatar without a language model.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tracing::info;

use pixelart_core::types::Payload;
use pixelart_core::{AppError, AppResult};
use pixelart_pipeline::StageResult;
use pixelart_plugin::loader::unknown_hook;
use pixelart_plugin::{CognitivePlugin, Plugin, PluginContext};

/// Module stem.
pub const MODULE: &str = "emotion_cycler";

const TYPE_NAME: &str = "EmotionCycler";

fn default_emotions() -> Vec<String> {
    ["joy", "surprise", "sadness", "anger", "fear", "confusion", "think"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Emits emotions in a fixed rotation.
///
/// A text input naming one of the configured emotions (e.g. the output of
/// an upstream classifier) is emitted instead of the next one in rotation.
#[derive(Debug)]
pub struct EmotionCycler {
    ctx: PluginContext,
    emotions: Vec<String>,
    duration_ms: u64,
    interval: Duration,
    next: AtomicUsize,
}

impl EmotionCycler {
    /// Reads `emotions`, `duration_ms` and `interval_ms`. Emotion names are
    /// stored trimmed and lowercase.
    pub fn from_context(ctx: &PluginContext) -> AppResult<Self> {
        let emotions: Vec<String> = ctx
            .setting_or("emotions", default_emotions())?
            .into_iter()
            .map(|e: String| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        if emotions.is_empty() {
            return Err(AppError::plugin(format!(
                "Module '{}': emotions must not be empty",
                ctx.module()
            )));
        }
        Ok(Self {
            ctx: ctx.clone(),
            emotions,
            duration_ms: ctx.setting_or("duration_ms", 2000u64)?,
            interval: Duration::from_millis(ctx.setting_or("interval_ms", 0u64)?),
            next: AtomicUsize::new(0),
        })
    }

    fn pick(&self, input: Option<&Payload>) -> String {
        let requested = input
            .and_then(Payload::as_text)
            .map(|t| t.trim().to_lowercase())
            .filter(|t| self.emotions.contains(t));
        match requested {
            Some(tag) => tag,
            None => {
                let index = self.next.fetch_add(1, Ordering::Relaxed) % self.emotions.len();
                self.emotions[index].clone()
            }
        }
    }

    fn cycle_emotion(&self, input: Option<Payload>) -> StageResult<Option<Payload>> {
        let state = self.ctx.state();
        state.pause(self.interval)?;
        let tag = self.pick(input.as_ref());
        info!(emotion = %tag, "Emitting emotion");
        let payload = Payload::emotion(tag, self.duration_ms);
        state.publish(payload.clone())?;
        Ok(Some(payload))
    }
}

impl Plugin for EmotionCycler {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    fn as_cognitive(self: Arc<Self>) -> Option<Arc<dyn CognitivePlugin>> {
        Some(self)
    }
}

impl CognitivePlugin for EmotionCycler {
    fn cognitive_hooks(&self) -> Vec<&'static str> {
        vec!["cycle_emotion"]
    }

    fn process(&self, hook: &str, input: Option<Payload>) -> StageResult<Option<Payload>> {
        match hook {
            "cycle_emotion" => self.cycle_emotion(input),
            other => Err(unknown_hook(TYPE_NAME, other)),
        }
    }
}
