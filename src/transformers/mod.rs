//! Canonical <-> wire transformations
//!
//! `request` turns a [`CompletionRequest`](crate::types::CompletionRequest) into
//! the provider's chat completions body; `response` maps the provider's reply
//! back into canonical types.

pub mod request;
pub mod response;

pub use request::{ChatCompletionsTransformer, RequestTransformer};
pub use response::{map_wire_response, usage_from_wire};
