//! Provider clients
//!
//! A provider performs the network I/O for one backend. The crate ships a
//! single implementation, [`OpenAiCompatibleProvider`], parameterized by
//! [`ProviderConfig`]; named backends are presets of that configuration.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::LlmError;
use crate::types::{EmbeddingRequest, EmbeddingResponse, ImageRequest, ImageResponse};

pub mod config;
pub mod openai_compatible;
pub mod presets;
pub mod wire;

pub use config::{AuthStyle, HttpConfig, ProviderCapabilities, ProviderConfig, ToolEncoding};
pub use openai_compatible::OpenAiCompatibleProvider;
use wire::{WireRequest, WireResponse, WireStreamChunk};

/// Incremental cursor returned by [`ChatProvider::create_stream`]
pub type WireChunkStream = Pin<Box<dyn Stream<Item = Result<WireStreamChunk, LlmError>> + Send>>;

/// Network client for one chat completions backend.
///
/// Cancellation is cooperative: callers drop the returned future or cursor,
/// which closes the underlying connection.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider identifier used in errors and logs
    fn id(&self) -> &str;

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::default()
    }

    fn tool_encoding(&self) -> ToolEncoding {
        ToolEncoding::default()
    }

    /// One-shot completion
    async fn create(&self, request: &WireRequest) -> Result<WireResponse, LlmError>;

    /// Streaming completion. Handshake failures (connection, non-2xx status)
    /// are returned here; later failures arrive through the cursor.
    async fn create_stream(&self, request: &WireRequest) -> Result<WireChunkStream, LlmError>;

    async fn embed(&self, _request: &EmbeddingRequest) -> Result<EmbeddingResponse, LlmError> {
        Err(LlmError::unsupported(self.id(), "embeddings"))
    }

    async fn generate_image(&self, _request: &ImageRequest) -> Result<ImageResponse, LlmError> {
        Err(LlmError::unsupported(self.id(), "image_generation"))
    }
}
