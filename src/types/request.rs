//! Completion request types

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::message::ModelMessage;

/// Reasoning effort hint for reasoning-capable models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

impl ReasoningEffort {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Output format requested from the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Plain text (provider default)
    Text,
    /// Any JSON object
    Json,
    /// JSON conforming to `schema`. A missing or null schema is rejected.
    JsonSchema {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default)]
        schema: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        strict: Option<bool>,
    },
}

impl ResponseFormat {
    pub fn json_schema(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self::JsonSchema {
            name: Some(name.into()),
            schema: Some(schema),
            strict: Some(true),
        }
    }

    /// Schema payload, treating an explicit JSON `null` as absent.
    pub fn schema(&self) -> Option<&serde_json::Value> {
        match self {
            Self::JsonSchema { schema, .. } => schema.as_ref().filter(|s| !s.is_null()),
            _ => None,
        }
    }
}

/// Per-call options.
///
/// Every numeric field is optional: `None` leaves the provider default in
/// place, while `Some(0.0)` is sent as an explicit zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct CompletionOptions {
    #[validate(range(min = 0.0, max = 2.0))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,

    #[validate(range(min = 1))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[validate(range(min = -2.0, max = 2.0))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,

    #[validate(range(min = -2.0, max = 2.0))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<ReasoningEffort>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,

    /// Report token usage (a usage chunk when streaming)
    #[serde(default)]
    pub with_usage: bool,

    /// Attach a cost to the reported usage. Only meaningful with `with_usage`.
    #[serde(default)]
    pub with_cost: bool,
}

/// A provider-independent completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    /// System prompt; omitted from the wire request when empty
    #[serde(default)]
    pub instructions: String,
    pub messages: Vec<ModelMessage>,
    #[serde(default)]
    pub options: CompletionOptions,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            instructions: String::new(),
            messages: Vec::new(),
            options: CompletionOptions::default(),
        }
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn message(mut self, message: ModelMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(mut self, messages: impl IntoIterator<Item = ModelMessage>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn top_p(mut self, top_p: f64) -> Self {
        self.options.top_p = Some(top_p);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.max_tokens = Some(max_tokens);
        self
    }

    pub fn seed(mut self, seed: i64) -> Self {
        self.options.seed = Some(seed);
        self
    }

    pub fn reasoning_effort(mut self, effort: ReasoningEffort) -> Self {
        self.options.reasoning_effort = Some(effort);
        self
    }

    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.options.response_format = Some(format);
        self
    }

    pub fn stop(mut self, sequence: impl Into<String>) -> Self {
        self.options.stop.push(sequence.into());
        self
    }

    pub fn with_usage(mut self, enabled: bool) -> Self {
        self.options.with_usage = enabled;
        self
    }

    pub fn with_cost(mut self, enabled: bool) -> Self {
        self.options.with_cost = enabled;
        self
    }
}
