//! Request transformation
//!
//! Converts canonical requests into OpenAI-compatible chat completions bodies.
//! The transformation is pure: no I/O, no shared state.

use serde_json::{Map, Value, json};

use crate::error::LlmError;
use crate::provider::ToolEncoding;
use crate::provider::wire::{
    WireContent, WireContentPart, WireFile, WireFunction, WireImageUrl, WireMessage, WireRequest,
    WireToolCall,
};
use crate::types::{
    ArtifactData, CompletionOptions, CompletionRequest, MessageArtifact, MessageRole, ModelMessage,
    ResponseFormat, ToolCall,
};
use crate::utils::mime::{artifact_mime, data_url, is_image};

/// Transform a canonical request into a provider wire request
pub trait RequestTransformer: Send + Sync {
    /// Provider identifier used in error values
    fn provider_id(&self) -> &str;

    /// Build the non-streaming wire body for `req`
    fn transform_chat(&self, req: &CompletionRequest) -> Result<WireRequest, LlmError>;
}

/// Transformer for the OpenAI chat completions dialect.
#[derive(Debug, Clone)]
pub struct ChatCompletionsTransformer {
    provider_id: String,
    tool_encoding: ToolEncoding,
}

impl ChatCompletionsTransformer {
    pub fn new(provider_id: impl Into<String>, tool_encoding: ToolEncoding) -> Self {
        Self {
            provider_id: provider_id.into(),
            tool_encoding,
        }
    }

    /// Build a wire request from its canonical parts.
    ///
    /// Every message yields exactly one wire turn, in order, preceded by a
    /// system turn when `instructions` is non-empty.
    pub fn to_wire_request(
        &self,
        model: &str,
        instructions: &str,
        messages: &[ModelMessage],
        options: &CompletionOptions,
    ) -> Result<WireRequest, LlmError> {
        let mut wire = WireRequest::new(model);
        wire.messages.reserve(messages.len() + 1);

        if !instructions.is_empty() {
            wire.messages.push(WireMessage::text("system", instructions));
        }
        for (index, message) in messages.iter().enumerate() {
            wire.messages.push(self.map_message(index, message)?);
        }

        wire.params = sampling_params(options)?;
        wire.response_format = match &options.response_format {
            Some(format) => response_format(format)?,
            None => None,
        };
        Ok(wire)
    }

    fn map_message(&self, index: usize, message: &ModelMessage) -> Result<WireMessage, LlmError> {
        match (&message.role, &message.tool_call) {
            (MessageRole::User, _) | (MessageRole::Assistant, None) => {
                Ok(content_turn(message.role.as_str(), message))
            }
            (MessageRole::Assistant, Some(call)) => self.tool_invocation(message, call),
            (MessageRole::Tool, Some(call)) => self.tool_result(message, call),
            // No call id to answer, so there is no native slot for it
            (MessageRole::Tool, None) => Ok(WireMessage {
                role: "user".to_string(),
                content: Some(with_artifacts(
                    json!({ "tool_result": { "output": message.content } }).to_string(),
                    &message.artifacts,
                )),
                tool_calls: None,
                tool_call_id: None,
            }),
            (MessageRole::Other(role), _) => Err(LlmError::validation(
                format!("messages[{index}].role"),
                "unsupported message role",
                Some(role.clone()),
            )),
        }
    }

    fn tool_invocation(
        &self,
        message: &ModelMessage,
        call: &ToolCall,
    ) -> Result<WireMessage, LlmError> {
        match self.tool_encoding {
            ToolEncoding::Native => Ok(WireMessage {
                role: "assistant".to_string(),
                content: (!message.content.is_empty() || !message.artifacts.is_empty())
                    .then(|| with_artifacts(message.content.clone(), &message.artifacts)),
                tool_calls: Some(vec![WireToolCall {
                    id: call.id.clone(),
                    kind: "function".to_string(),
                    function: WireFunction {
                        name: call.name.clone(),
                        arguments: serde_json::to_string(&call.input)?,
                    },
                }]),
                tool_call_id: None,
            }),
            ToolEncoding::Inline => {
                let payload = json!({
                    "tool_call": {"id": call.id, "name": call.name, "input": call.input}
                });
                Ok(WireMessage {
                    role: "assistant".to_string(),
                    content: Some(with_artifacts(
                        join_text(&message.content, &payload.to_string()),
                        &message.artifacts,
                    )),
                    tool_calls: None,
                    tool_call_id: None,
                })
            }
        }
    }

    fn tool_result(&self, message: &ModelMessage, call: &ToolCall) -> Result<WireMessage, LlmError> {
        match self.tool_encoding {
            ToolEncoding::Native => {
                let body = match (&call.output, &call.error_message) {
                    (Some(output), _) => output.clone(),
                    (None, Some(error)) => json!({ "error": error }).to_string(),
                    (None, None) => message.content.clone(),
                };
                Ok(WireMessage {
                    role: "tool".to_string(),
                    content: Some(with_artifacts(body, &message.artifacts)),
                    tool_calls: None,
                    tool_call_id: Some(call.id.clone()),
                })
            }
            ToolEncoding::Inline => {
                let mut result = Map::new();
                result.insert("id".into(), json!(call.id));
                result.insert("name".into(), json!(call.name));
                if let Some(output) = &call.output {
                    result.insert("output".into(), json!(output));
                }
                if let Some(error) = &call.error_message {
                    result.insert("error".into(), json!(error));
                }
                let payload = json!({ "tool_result": result });
                Ok(WireMessage {
                    role: "user".to_string(),
                    content: Some(with_artifacts(
                        join_text(&message.content, &payload.to_string()),
                        &message.artifacts,
                    )),
                    tool_calls: None,
                    tool_call_id: None,
                })
            }
        }
    }
}

impl RequestTransformer for ChatCompletionsTransformer {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn transform_chat(&self, req: &CompletionRequest) -> Result<WireRequest, LlmError> {
        self.to_wire_request(&req.model, &req.instructions, &req.messages, &req.options)
    }
}

fn join_text(content: &str, payload: &str) -> String {
    if content.is_empty() {
        payload.to_string()
    } else {
        format!("{content}\n{payload}")
    }
}

/// Plain text turn, or a content-part list when the message has artifacts.
fn content_turn(role: &str, message: &ModelMessage) -> WireMessage {
    WireMessage {
        role: role.to_string(),
        content: Some(with_artifacts(message.content.clone(), &message.artifacts)),
        tool_calls: None,
        tool_call_id: None,
    }
}

/// `text` alone, or a leading text part followed by one part per artifact.
fn with_artifacts(text: String, artifacts: &[MessageArtifact]) -> WireContent {
    if artifacts.is_empty() {
        return WireContent::Text(text);
    }
    let mut parts = Vec::with_capacity(artifacts.len() + 1);
    if !text.is_empty() {
        parts.push(WireContentPart::Text { text });
    }
    parts.extend(artifacts.iter().map(artifact_part));
    WireContent::Parts(parts)
}

fn artifact_part(artifact: &MessageArtifact) -> WireContentPart {
    let mime = artifact_mime(artifact);
    match &artifact.data {
        ArtifactData::Text(text) => WireContentPart::Text {
            text: match &artifact.name {
                Some(name) => format!("[{name}]\n{text}"),
                None => text.clone(),
            },
        },
        ArtifactData::Url(url) if is_image(&mime) => WireContentPart::ImageUrl {
            image_url: WireImageUrl { url: url.clone() },
        },
        ArtifactData::Url(url) => WireContentPart::Text {
            text: match &artifact.name {
                Some(name) => format!("[{name}]({url})"),
                None => url.clone(),
            },
        },
        ArtifactData::Base64(payload) if is_image(&mime) => WireContentPart::ImageUrl {
            image_url: WireImageUrl {
                url: data_url(&mime, payload),
            },
        },
        ArtifactData::Base64(payload) => WireContentPart::File {
            file: WireFile {
                filename: artifact.name.clone(),
                file_data: data_url(&mime, payload),
            },
        },
    }
}

fn number(field: &str, value: f64) -> Result<Value, LlmError> {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| {
            LlmError::validation(
                format!("options.{field}"),
                "must be a finite number",
                Some(value.to_string()),
            )
        })
}

/// Only explicitly set options are sent; `Some(0.0)` is a real value.
fn sampling_params(options: &CompletionOptions) -> Result<Map<String, Value>, LlmError> {
    let mut params = Map::new();
    let floats = [
        ("temperature", options.temperature),
        ("top_p", options.top_p),
        ("presence_penalty", options.presence_penalty),
        ("frequency_penalty", options.frequency_penalty),
    ];
    for (field, value) in floats {
        if let Some(value) = value {
            params.insert(field.to_string(), number(field, value)?);
        }
    }
    if let Some(max_tokens) = options.max_tokens {
        params.insert("max_tokens".into(), json!(max_tokens));
    }
    if let Some(seed) = options.seed {
        params.insert("seed".into(), json!(seed));
    }
    if !options.stop.is_empty() {
        params.insert("stop".into(), json!(options.stop));
    }
    if let Some(effort) = options.reasoning_effort {
        params.insert("reasoning_effort".into(), json!(effort.as_str()));
    }
    Ok(params)
}

fn response_format(format: &ResponseFormat) -> Result<Option<Value>, LlmError> {
    match format {
        ResponseFormat::Text => Ok(None),
        ResponseFormat::Json => Ok(Some(json!({ "type": "json_object" }))),
        ResponseFormat::JsonSchema { name, strict, .. } => {
            let schema = format.schema().ok_or_else(|| {
                LlmError::validation(
                    "options.response_format.schema",
                    "json_schema mode requires a non-null schema",
                    None,
                )
            })?;
            let mut block = Map::new();
            block.insert(
                "name".into(),
                json!(name.as_deref().unwrap_or("response")),
            );
            block.insert("schema".into(), schema.clone());
            if let Some(strict) = strict {
                block.insert("strict".into(), json!(strict));
            }
            Ok(Some(json!({ "type": "json_schema", "json_schema": block })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReasoningEffort;
    use proptest::prelude::*;

    fn native() -> ChatCompletionsTransformer {
        ChatCompletionsTransformer::new("test", ToolEncoding::Native)
    }

    #[test]
    fn instructions_only_when_non_empty() {
        let messages = [ModelMessage::user("hi")];
        let opts = CompletionOptions::default();

        let wire = native().to_wire_request("m1", "", &messages, &opts).unwrap();
        assert_eq!(wire.messages.len(), 1);
        assert_eq!(wire.messages[0].role, "user");

        let wire = native().to_wire_request("m1", "sys", &messages, &opts).unwrap();
        assert_eq!(wire.messages[0].role, "system");
        assert_eq!(wire.messages[0].text_content(), Some("sys"));
        assert_eq!(wire.messages[1].text_content(), Some("hi"));
    }

    #[test]
    fn unknown_role_is_rejected_with_index() {
        let mut bad = ModelMessage::user("x");
        bad.role = MessageRole::Other("system".into());
        let messages = [ModelMessage::user("ok"), bad];
        let err = native()
            .to_wire_request("m1", "", &messages, &CompletionOptions::default())
            .unwrap_err();
        match err {
            LlmError::Validation { field, value, .. } => {
                assert_eq!(field, "messages[1].role");
                assert_eq!(value.as_deref(), Some("system"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn only_set_options_are_sent() {
        let messages = [ModelMessage::user("hi")];
        let wire = native()
            .to_wire_request("m1", "", &messages, &CompletionOptions::default())
            .unwrap();
        assert!(wire.params.is_empty());
        assert!(wire.response_format.is_none());

        let opts = CompletionOptions {
            temperature: Some(0.0),
            seed: Some(7),
            reasoning_effort: Some(ReasoningEffort::High),
            ..Default::default()
        };
        let wire = native().to_wire_request("m1", "", &messages, &opts).unwrap();
        assert_eq!(wire.params.get("temperature"), Some(&json!(0.0)));
        assert_eq!(wire.params.get("seed"), Some(&json!(7)));
        assert_eq!(wire.params.get("reasoning_effort"), Some(&json!("high")));
        assert!(!wire.params.contains_key("top_p"));
    }

    #[test]
    fn non_finite_option_is_rejected() {
        let opts = CompletionOptions {
            top_p: Some(f64::NAN),
            ..Default::default()
        };
        let err = native()
            .to_wire_request("m1", "", &[ModelMessage::user("hi")], &opts)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn response_formats() {
        let messages = [ModelMessage::user("hi")];
        let opts = CompletionOptions {
            response_format: Some(ResponseFormat::Json),
            ..Default::default()
        };
        let wire = native().to_wire_request("m1", "", &messages, &opts).unwrap();
        assert_eq!(wire.response_format, Some(json!({"type": "json_object"})));

        let schema = json!({"type": "object", "properties": {"a": {"type": "string"}}});
        let opts = CompletionOptions {
            response_format: Some(ResponseFormat::json_schema("answer", schema.clone())),
            ..Default::default()
        };
        let wire = native().to_wire_request("m1", "", &messages, &opts).unwrap();
        assert_eq!(
            wire.response_format,
            Some(json!({
                "type": "json_schema",
                "json_schema": {"name": "answer", "schema": schema, "strict": true}
            }))
        );
    }

    #[test]
    fn json_schema_without_schema_is_rejected() {
        for schema in [None, Some(Value::Null)] {
            let opts = CompletionOptions {
                response_format: Some(ResponseFormat::JsonSchema {
                    name: None,
                    schema,
                    strict: None,
                }),
                ..Default::default()
            };
            let err = native()
                .to_wire_request("m1", "", &[ModelMessage::user("hi")], &opts)
                .unwrap_err();
            assert!(matches!(err, LlmError::Validation { ref field, .. } if field == "options.response_format.schema"));
        }
    }

    #[test]
    fn native_tool_calls_use_wire_slots() {
        let call = ToolCall::new("call_1", "lookup", json!({"q": "rust"}));
        let messages = [
            ModelMessage::user("search"),
            ModelMessage::tool_call(call.clone()),
            ModelMessage::tool_result(call.with_output("found")),
        ];
        let wire = native()
            .to_wire_request("m1", "", &messages, &CompletionOptions::default())
            .unwrap();

        let invocation = &wire.messages[1];
        assert_eq!(invocation.role, "assistant");
        assert!(invocation.content.is_none());
        let calls = invocation.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "lookup");
        assert_eq!(calls[0].function.arguments, r#"{"q":"rust"}"#);

        let result = &wire.messages[2];
        assert_eq!(result.role, "tool");
        assert_eq!(result.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(result.text_content(), Some("found"));
    }

    #[test]
    fn inline_tool_calls_are_serialized_into_text() {
        let transformer = ChatCompletionsTransformer::new("test", ToolEncoding::Inline);
        let call = ToolCall::new("call_1", "lookup", json!({"q": "rust"}));
        let messages = [
            ModelMessage::tool_call(call.clone()),
            ModelMessage::tool_result(call.with_error("timeout")),
        ];
        let wire = transformer
            .to_wire_request("m1", "", &messages, &CompletionOptions::default())
            .unwrap();

        assert!(wire.messages.iter().all(|m| m.tool_calls.is_none()));
        let invocation: Value =
            serde_json::from_str(wire.messages[0].text_content().unwrap()).unwrap();
        assert_eq!(invocation["tool_call"]["name"], "lookup");
        assert_eq!(wire.messages[1].role, "user");
        let result: Value =
            serde_json::from_str(wire.messages[1].text_content().unwrap()).unwrap();
        assert_eq!(result["tool_result"]["error"], "timeout");
        assert!(result["tool_result"].get("output").is_none());
    }

    #[test]
    fn artifacts_become_content_parts() {
        let message = ModelMessage::user("describe")
            .with_artifact(MessageArtifact::url("https://img.test/cat.png"))
            .with_artifact(MessageArtifact::text("notes.txt", "a cat"))
            .with_artifact(MessageArtifact::base64(
                "JVBERi0x",
                Some("application/pdf".into()),
            ));
        let wire = native()
            .to_wire_request("m1", "", &[message], &CompletionOptions::default())
            .unwrap();
        let Some(WireContent::Parts(parts)) = &wire.messages[0].content else {
            panic!("expected content parts");
        };
        assert_eq!(parts.len(), 4);
        assert!(matches!(&parts[0], WireContentPart::Text { text } if text == "describe"));
        assert!(
            matches!(&parts[1], WireContentPart::ImageUrl { image_url } if image_url.url == "https://img.test/cat.png")
        );
        assert!(matches!(&parts[2], WireContentPart::Text { text } if text == "[notes.txt]\na cat"));
        assert!(
            matches!(&parts[3], WireContentPart::File { file } if file.file_data == "data:application/pdf;base64,JVBERi0x")
        );
    }

    fn part_urls(message: &WireMessage) -> Vec<String> {
        match &message.content {
            Some(WireContent::Parts(parts)) => parts
                .iter()
                .filter_map(|part| match part {
                    WireContentPart::ImageUrl { image_url } => Some(image_url.url.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn first_text(message: &WireMessage) -> Option<&str> {
        match &message.content {
            Some(WireContent::Parts(parts)) => parts.iter().find_map(|part| match part {
                WireContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            }),
            Some(WireContent::Text(text)) => Some(text),
            None => None,
        }
    }

    fn tool_turns_with_images() -> Vec<ModelMessage> {
        let call = ToolCall::new("call_1", "render", json!({"w": 2}));
        vec![
            ModelMessage::tool_call(call.clone())
                .with_artifact(MessageArtifact::url("https://img.test/a.png")),
            ModelMessage::tool_result(call.with_output("ok"))
                .with_artifact(MessageArtifact::url("https://img.test/b.png")),
        ]
    }

    #[test]
    fn native_tool_turns_keep_artifacts() {
        let wire = native()
            .to_wire_request("m1", "", &tool_turns_with_images(), &CompletionOptions::default())
            .unwrap();

        let invocation = &wire.messages[0];
        assert!(invocation.tool_calls.is_some());
        assert_eq!(part_urls(invocation), ["https://img.test/a.png"]);

        let result = &wire.messages[1];
        assert_eq!(result.role, "tool");
        assert_eq!(result.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(first_text(result), Some("ok"));
        assert_eq!(part_urls(result), ["https://img.test/b.png"]);
    }

    #[test]
    fn inline_tool_turns_keep_artifacts() {
        let transformer = ChatCompletionsTransformer::new("test", ToolEncoding::Inline);
        let wire = transformer
            .to_wire_request("m1", "", &tool_turns_with_images(), &CompletionOptions::default())
            .unwrap();

        let invocation: Value = serde_json::from_str(first_text(&wire.messages[0]).unwrap()).unwrap();
        assert_eq!(invocation["tool_call"]["name"], "render");
        assert_eq!(part_urls(&wire.messages[0]), ["https://img.test/a.png"]);

        let result: Value = serde_json::from_str(first_text(&wire.messages[1]).unwrap()).unwrap();
        assert_eq!(result["tool_result"]["output"], "ok");
        assert_eq!(part_urls(&wire.messages[1]), ["https://img.test/b.png"]);
    }

    #[test]
    fn content_only_tool_message_becomes_a_tool_result() {
        let message = ModelMessage::new(MessageRole::Tool, "42", None, vec![]).unwrap();
        for encoding in [ToolEncoding::Native, ToolEncoding::Inline] {
            let wire = ChatCompletionsTransformer::new("test", encoding)
                .to_wire_request("m1", "", &[message.clone()], &CompletionOptions::default())
                .unwrap();
            assert_eq!(wire.messages.len(), 1);
            assert_eq!(wire.messages[0].role, "user");
            assert!(wire.messages[0].tool_call_id.is_none());
            let body: Value = serde_json::from_str(wire.messages[0].text_content().unwrap()).unwrap();
            assert_eq!(body, json!({"tool_result": {"output": "42"}}));
        }
    }

    proptest! {
        #[test]
        fn messages_keep_their_order(turns in prop::collection::vec((any::<bool>(), "[a-z]{1,12}"), 0..24)) {
            let messages: Vec<ModelMessage> = turns
                .iter()
                .map(|(is_user, text)| {
                    if *is_user { ModelMessage::user(text.clone()) } else { ModelMessage::assistant(text.clone()) }
                })
                .collect();
            let wire = native()
                .to_wire_request("m1", "", &messages, &CompletionOptions::default())
                .unwrap();
            prop_assert_eq!(wire.messages.len(), messages.len());
            for (sent, original) in wire.messages.iter().zip(&messages) {
                prop_assert_eq!(sent.role.as_str(), original.role.as_str());
                prop_assert_eq!(sent.text_content(), Some(original.content.as_str()));
            }
        }
    }
}
