//! OpenAI-compatible chat completions wire format
//!
//! Request types are serialized as-is. Response and stream types are lenient:
//! every field is optional and unknown fields are ignored, because
//! OpenAI-compatible providers add their own extensions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Chat completions request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
    /// Sampling parameters that were explicitly set
    #[serde(flatten)]
    pub params: Map<String, Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<StreamOptions>,
}

impl WireRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            response_format: None,
            params: Map::new(),
            stream: false,
            stream_options: None,
        }
    }

    /// Copy of this request configured for streaming.
    pub fn streaming(&self, include_usage: bool) -> Self {
        let mut req = self.clone();
        req.stream = true;
        req.stream_options = include_usage.then_some(StreamOptions {
            include_usage: true,
        });
        req
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamOptions {
    pub include_usage: bool,
}

/// One role-tagged turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<WireContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl WireMessage {
    pub fn text(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Some(WireContent::Text(text.into())),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Text of a plain-text turn
    pub fn text_content(&self) -> Option<&str> {
        match &self.content {
            Some(WireContent::Text(text)) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireContent {
    Text(String),
    Parts(Vec<WireContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireContentPart {
    Text { text: String },
    ImageUrl { image_url: WireImageUrl },
    File { file: WireFile },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Data URL (`data:<mime>;base64,<payload>`)
    pub file_data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: WireFunction,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFunction {
    pub name: String,
    /// JSON-encoded arguments
    #[serde(default)]
    pub arguments: String,
}

/// Non-streaming chat completions response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireResponse {
    pub id: Option<String>,
    pub model: Option<String>,
    pub choices: Vec<WireChoice>,
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireChoice {
    pub index: Option<u32>,
    pub message: Option<WireResponseMessage>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireResponseMessage {
    pub role: Option<String>,
    /// Usually a string; some providers return content parts
    pub content: Option<Value>,
    pub reasoning_content: Option<String>,
    pub reasoning: Option<String>,
    pub tool_calls: Option<Vec<WireToolCall>>,
}

/// Usage block, as attached to responses and to the final stream chunk.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WireUsage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
    pub prompt_tokens_details: Option<WirePromptTokensDetails>,
    pub completion_tokens_details: Option<WireCompletionTokensDetails>,
    /// DeepSeek cache accounting
    pub prompt_cache_hit_tokens: Option<u64>,
    /// Anthropic-compatible cache accounting
    pub cache_creation_input_tokens: Option<u64>,
    pub server_tool_use: Option<WireServerToolUse>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WirePromptTokensDetails {
    pub cached_tokens: Option<u64>,
    pub cache_write_tokens: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WireCompletionTokensDetails {
    pub reasoning_tokens: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WireServerToolUse {
    pub web_search_requests: Option<u64>,
}

/// One server-sent chunk of a streaming response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireStreamChunk {
    pub id: Option<String>,
    pub model: Option<String>,
    pub choices: Vec<WireStreamChoice>,
    pub usage: Option<WireUsage>,
    /// In-band error (OpenRouter and others report mid-stream failures this way)
    pub error: Option<WireError>,
}

impl WireStreamChunk {
    pub fn delta(&self) -> Option<&WireDelta> {
        self.choices.first().and_then(|c| c.delta.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireStreamChoice {
    pub index: Option<u32>,
    pub delta: Option<WireDelta>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireDelta {
    pub role: Option<String>,
    pub content: Option<String>,
    pub reasoning_content: Option<String>,
    pub reasoning: Option<String>,
    pub thinking: Option<String>,
    pub tool_calls: Option<Vec<Value>>,
}

impl WireDelta {
    /// Reasoning text from whichever side channel the provider uses.
    pub fn reasoning_text(&self) -> Option<&str> {
        [&self.reasoning_content, &self.reasoning, &self.thinking]
            .into_iter()
            .find_map(|field| field.as_deref().filter(|s| !s.is_empty()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireError {
    pub message: Option<String>,
    pub code: Option<Value>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = self.message.as_deref().unwrap_or("unknown provider error");
        match &self.code {
            Some(code) => write!(f, "{message} (code {code})"),
            None => f.write_str(message),
        }
    }
}

/// Error envelope of non-2xx responses (`{"error": {...}}`).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireErrorEnvelope {
    pub error: Option<WireError>,
}

/// `/embeddings` response body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireEmbeddingResponse {
    pub data: Vec<WireEmbedding>,
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireEmbedding {
    pub index: usize,
    pub embedding: Vec<f32>,
}

/// `/images/generations` response body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireImageResponse {
    pub data: Vec<WireImage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireImage {
    pub url: Option<String>,
    pub b64_json: Option<String>,
    pub revised_prompt: Option<String>,
}
