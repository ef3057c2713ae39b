//! # unillm
//!
//! One completion API over many OpenAI-compatible LLM providers.
//!
//! A caller builds a [`CompletionRequest`], hands it to a [`CompletionService`],
//! and receives either a [`CompletionResponse`] or a [`CompletionStream`] of
//! [`StreamChunk`]s. Token usage and monetary cost are reported on request.
//!
//! ```rust,ignore
//! use unillm::prelude::*;
//!
//! let service = CompletionService::connect(presets::openrouter()).await?;
//! let request = CompletionRequest::new("openai/gpt-4o-mini")
//!     .instructions("Answer briefly.")
//!     .message(ModelMessage::user("What is Rust?"))
//!     .with_usage(true)
//!     .with_cost(true);
//!
//! let ctx = CancellationToken::new();
//! let mut stream = service.stream_complete(&ctx, &request).await?;
//! while let Some(chunk) = stream.recv().await {
//!     match chunk {
//!         StreamChunk::Text { text } => print!("{text}"),
//!         StreamChunk::Usage { usage, cost } => println!("\n{usage:?} ${cost:?}"),
//!         StreamChunk::Error(e) => eprintln!("stream failed: {e}"),
//!         StreamChunk::Reasoning { .. } => {}
//!     }
//! }
//! ```

#![deny(unsafe_code)]

pub mod cost;
pub mod error;
pub mod observability;
pub mod provider;
pub mod registry;
pub mod schema;
pub mod service;
pub mod streaming;
pub mod transformers;
pub mod types;
pub mod utils;
pub mod validation;

pub use cost::{cost, image_generation_cost};
pub use error::LlmError;
pub use provider::{ChatProvider, OpenAiCompatibleProvider, ProviderConfig, presets};
pub use registry::{ModelLookup, ModelRegistry};
pub use service::{CompletionService, ServiceConfig};
pub use streaming::{CompletionStream, StreamAdapter, StreamState};
pub use tokio_util::sync::CancellationToken;
pub use types::*;

/// Common imports
pub mod prelude {
    pub use crate::error::LlmError;
    pub use crate::provider::{ChatProvider, ProviderConfig, presets};
    pub use crate::registry::{ModelLookup, ModelRegistry};
    pub use crate::service::{CompletionService, ServiceConfig};
    pub use crate::streaming::CompletionStream;
    pub use crate::types::*;
    pub use tokio_util::sync::CancellationToken;
}
