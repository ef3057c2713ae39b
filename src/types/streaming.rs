//! Stream chunk types

use super::usage::TokenUsage;
use crate::error::LlmError;

/// One unit of a streaming completion.
///
/// Chunks arrive in provider order. A `Usage` chunk, when present, is the last
/// chunk of a successful stream; an `Error` chunk is the last chunk of a
/// failed one.
#[derive(Debug)]
pub enum StreamChunk {
    /// Incremental output text
    Text { text: String },
    /// Incremental reasoning trace
    Reasoning { text: String },
    /// Final usage summary, with a cost when one was requested and computable
    Usage {
        usage: TokenUsage,
        cost: Option<f64>,
    },
    /// The stream ended abnormally
    Error(LlmError),
}

impl StreamChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn reasoning(text: impl Into<String>) -> Self {
        Self::Reasoning { text: text.into() }
    }

    /// Text carried by a `Text` chunk
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}
