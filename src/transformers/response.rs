//! Response transformation
//!
//! Maps wire responses and usage blocks back into canonical types.

use serde_json::Value;

use crate::error::LlmError;
use crate::provider::wire::{WireResponse, WireToolCall, WireUsage};
use crate::types::{CompletionResponse, TokenUsage, ToolCall};

/// Map a non-streaming wire response. A response without choices is a
/// [`LlmError::Response`]. Usage and cost are filled in by the caller.
pub fn map_wire_response(provider: &str, wire: WireResponse) -> Result<CompletionResponse, LlmError> {
    let usage = wire.usage.as_ref().map(usage_from_wire);
    let choice = wire
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::response(provider, "response contained no choices"))?;
    let message = choice.message.unwrap_or_default();

    Ok(CompletionResponse {
        output: content_text(message.content.as_ref()),
        reasoning: message
            .reasoning_content
            .or(message.reasoning)
            .filter(|r| !r.is_empty()),
        tool_calls: message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(tool_call_from_wire)
            .collect(),
        finish_reason: choice.finish_reason,
        usage,
        cost: None,
    })
}

/// Convert a wire usage block. Each block accounts for exactly one request.
pub fn usage_from_wire(usage: &WireUsage) -> TokenUsage {
    let prompt_details = usage.prompt_tokens_details.as_ref();
    TokenUsage {
        input_tokens: usage.prompt_tokens.unwrap_or(0),
        output_tokens: usage.completion_tokens.unwrap_or(0),
        reasoning_tokens: usage
            .completion_tokens_details
            .as_ref()
            .and_then(|d| d.reasoning_tokens)
            .unwrap_or(0),
        cache_read_tokens: prompt_details
            .and_then(|d| d.cached_tokens)
            .or(usage.prompt_cache_hit_tokens)
            .unwrap_or(0),
        cache_write_tokens: prompt_details
            .and_then(|d| d.cache_write_tokens)
            .or(usage.cache_creation_input_tokens)
            .unwrap_or(0),
        images: 0,
        web_searches: usage
            .server_tool_use
            .as_ref()
            .and_then(|s| s.web_search_requests)
            .unwrap_or(0),
        requests: 1,
    }
}

/// String content, or the concatenated text of content parts.
fn content_text(content: Option<&Value>) -> String {
    match content {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect(),
        _ => String::new(),
    }
}

fn tool_call_from_wire(call: WireToolCall) -> ToolCall {
    let arguments = call.function.arguments;
    let input = if arguments.trim().is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_str(&arguments).unwrap_or(Value::String(arguments))
    };
    ToolCall::new(call.id, call.function.name, input)
}
