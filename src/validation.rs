//! Request validation
//!
//! Preconditions checked before any adapter state exists or any network call
//! is made. Failures are always [`LlmError::Validation`].

use validator::{Validate, ValidationErrors};

use crate::error::LlmError;
use crate::types::{CompletionOptions, CompletionRequest, EmbeddingRequest, ImageRequest};

/// Validate a request: model id, messages, and option ranges.
pub fn validate_request(request: &CompletionRequest) -> Result<(), LlmError> {
    non_empty_model(&request.model)?;
    if request.messages.is_empty() {
        return Err(LlmError::validation(
            "messages",
            "at least one message is required",
            None,
        ));
    }
    for (index, message) in request.messages.iter().enumerate() {
        message.validate_at(&format!("messages[{index}]"))?;
    }
    validate_options(&request.options)
}

/// Range checks on sampling options.
pub fn validate_options(options: &CompletionOptions) -> Result<(), LlmError> {
    let floats = [
        ("temperature", options.temperature),
        ("top_p", options.top_p),
        ("presence_penalty", options.presence_penalty),
        ("frequency_penalty", options.frequency_penalty),
    ];
    for (field, value) in floats {
        if let Some(value) = value
            && !value.is_finite()
        {
            return Err(LlmError::validation(
                format!("options.{field}"),
                "must be a finite number",
                Some(value.to_string()),
            ));
        }
    }
    options.validate().map_err(first_error)?;

    if let Some(index) = options.stop.iter().position(|s| s.is_empty()) {
        return Err(LlmError::validation(
            format!("options.stop[{index}]"),
            "stop sequences cannot be empty",
            None,
        ));
    }
    Ok(())
}

pub fn validate_embedding(request: &EmbeddingRequest) -> Result<(), LlmError> {
    non_empty_model(&request.model)?;
    if request.input.is_empty() {
        return Err(LlmError::validation("input", "at least one input is required", None));
    }
    Ok(())
}

pub fn validate_image(request: &ImageRequest) -> Result<(), LlmError> {
    non_empty_model(&request.model)?;
    if request.prompt.trim().is_empty() {
        return Err(LlmError::validation("prompt", "prompt cannot be empty", None));
    }
    if request.n == Some(0) {
        return Err(LlmError::validation("n", "must request at least one image", Some("0".into())));
    }
    Ok(())
}

fn non_empty_model(model: &str) -> Result<(), LlmError> {
    if model.trim().is_empty() {
        return Err(LlmError::validation(
            "model",
            "model id cannot be empty",
            Some(model.to_string()),
        ));
    }
    Ok(())
}

/// The first failing field, in name order, as a crate error.
fn first_error(errors: ValidationErrors) -> LlmError {
    let fields = errors.field_errors();
    let mut names: Vec<_> = fields.keys().cloned().collect();
    names.sort();
    let Some(name) = names.first() else {
        return LlmError::validation("options", errors.to_string(), None);
    };
    let detail = fields.get(name).and_then(|errs| errs.first());
    let message = detail
        .and_then(|e| e.message.as_ref().map(ToString::to_string))
        .unwrap_or_else(|| match detail.map(|e| &*e.code) {
            Some("range") => "value out of range".to_string(),
            Some(code) => code.to_string(),
            None => "invalid value".to_string(),
        });
    let value = detail
        .and_then(|e| e.params.get("value"))
        .map(ToString::to_string);
    LlmError::validation(format!("options.{name}"), message, value)
}
