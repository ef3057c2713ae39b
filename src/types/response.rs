//! Completion response types

use serde::{Deserialize, Serialize};

use super::message::ToolCall;
use super::usage::TokenUsage;

/// Result of a non-streaming completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub output: String,
    /// Reasoning trace, for providers that return one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Tool invocations requested by the model
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    /// Present when the request set `with_usage`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    /// Present when the request set `with_cost` and the model could be priced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}
