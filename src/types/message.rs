//! Chat message types

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Message role.
///
/// Roles arrive from callers as free text (for example when a conversation is
/// deserialized from storage), so unrecognized values are preserved in
/// [`MessageRole::Other`] and rejected by the request transformer instead of
/// failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageRole {
    User,
    Assistant,
    Tool,
    Other(String),
}

impl MessageRole {
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
            Self::Other(role) => role,
        }
    }
}

impl From<String> for MessageRole {
    fn from(value: String) -> Self {
        match value.as_str() {
            "user" => Self::User,
            "assistant" => Self::Assistant,
            "tool" => Self::Tool,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for MessageRole {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<MessageRole> for String {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::Other(role) => role,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool invocation (on assistant messages) or a tool result (on tool messages).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Arguments passed to the tool
    #[serde(default)]
    pub input: serde_json::Value,
    /// Tool output, set when the call is fed back as a result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Error reported by the tool instead of an output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        input: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
            output: None,
            error_message: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// Payload of a [`MessageArtifact`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ArtifactData {
    /// Remote resource fetched by the provider
    Url(String),
    /// Inline binary content, base64 encoded
    Base64(String),
    /// Inline text content
    Text(String),
}

/// Attachment carried alongside a message (image, document, text excerpt).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageArtifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Explicit MIME type; guessed from the data or name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub data: ArtifactData,
}

impl MessageArtifact {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            name: None,
            mime_type: None,
            data: ArtifactData::Url(url.into()),
        }
    }

    pub fn base64(data: impl Into<String>, mime_type: Option<String>) -> Self {
        Self {
            name: None,
            mime_type,
            data: ArtifactData::Base64(data.into()),
        }
    }

    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            mime_type: Some("text/plain".to_string()),
            data: ArtifactData::Text(content.into()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// One turn of a conversation.
///
/// A message must carry non-empty content, a tool call, or at least one
/// artifact. Use [`ModelMessage::new`] to construct a checked message, or
/// call [`ModelMessage::validate`] on one built field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMessage {
    pub role: MessageRole,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<MessageArtifact>,
}

impl ModelMessage {
    pub fn new(
        role: impl Into<MessageRole>,
        content: impl Into<String>,
        tool_call: Option<ToolCall>,
        artifacts: Vec<MessageArtifact>,
    ) -> Result<Self, LlmError> {
        let message = Self {
            role: role.into(),
            content: content.into(),
            tool_call,
            artifacts,
        };
        message.validate()?;
        Ok(message)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::Assistant, content)
    }

    /// Assistant turn that invokes a tool.
    pub fn tool_call(call: ToolCall) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: String::new(),
            tool_call: Some(call),
            artifacts: Vec::new(),
        }
    }

    /// Tool turn feeding a result back to the model.
    pub fn tool_result(call: ToolCall) -> Self {
        Self {
            role: MessageRole::Tool,
            content: String::new(),
            tool_call: Some(call),
            artifacts: Vec::new(),
        }
    }

    fn plain(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call: None,
            artifacts: Vec::new(),
        }
    }

    pub fn with_artifact(mut self, artifact: MessageArtifact) -> Self {
        self.artifacts.push(artifact);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Check the message carries something to send.
    pub fn validate(&self) -> Result<(), LlmError> {
        self.validate_at("message")
    }

    pub(crate) fn validate_at(&self, field: &str) -> Result<(), LlmError> {
        if self.content.is_empty() && self.tool_call.is_none() && self.artifacts.is_empty() {
            return Err(LlmError::validation(
                field,
                "message needs content, a tool call, or at least one artifact",
                None,
            ));
        }
        Ok(())
    }
}
