//! Payloads carried from cognitive stages to display stages.
//!
//! The engine never inspects a payload beyond [`Payload::is_empty`]; what a
//! payload means is agreed between the producing and consuming plugins.

use std::path::PathBuf;

use image::RgbImage;

/// Opaque transfer object moved through the result channel and threaded
/// between cognitive stages.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A rendered frame (game output, generated image).
    Frame(RgbImage),
    /// An emotion tag with the time the avatar should hold it.
    Emotion {
        /// Emotion name, e.g. `"joy"`.
        tag: String,
        /// Duration of the peak animation frame in milliseconds.
        duration_ms: u64,
    },
    /// A file on disk (image, GIF, audio).
    Path(PathBuf),
    /// Free text (transcripts, prompts).
    Text(String),
    /// PCM audio, 16-bit mono.
    Audio(Vec<i16>),
    /// Arbitrary small structured value.
    Value(serde_json::Value),
}

impl Payload {
    /// Builds a path payload.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Builds a text payload.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Builds an emotion payload.
    pub fn emotion(tag: impl Into<String>, duration_ms: u64) -> Self {
        Self::Emotion {
            tag: tag.into(),
            duration_ms,
        }
    }

    /// Whether the payload counts as "nothing" when chaining stages.
    ///
    /// An empty output is not forwarded: the next stage is invoked with no
    /// input instead.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Frame(img) => img.width() == 0 || img.height() == 0,
            Self::Emotion { .. } => false,
            Self::Path(p) => p.as_os_str().is_empty(),
            Self::Text(t) => t.is_empty(),
            Self::Audio(a) => a.is_empty(),
            Self::Value(v) => match v {
                serde_json::Value::Null => true,
                serde_json::Value::Bool(b) => !b,
                serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
                serde_json::Value::String(s) => s.is_empty(),
                serde_json::Value::Array(a) => a.is_empty(),
                serde_json::Value::Object(o) => o.is_empty(),
            },
        }
    }

    /// Short variant name for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Frame(_) => "frame",
            Self::Emotion { .. } => "emotion",
            Self::Path(_) => "path",
            Self::Text(_) => "text",
            Self::Audio(_) => "audio",
            Self::Value(_) => "value",
        }
    }

    /// Returns the path if this is a path payload.
    pub fn as_path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Path(p) => Some(p.as_path()),
            _ => None,
        }
    }

    /// Returns the text if this is a text payload.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }
}
