//! Canonical data model shared by every provider.

pub mod embedding;
pub mod image;
pub mod message;
pub mod model;
pub mod request;
pub mod response;
pub mod streaming;
pub mod usage;

pub use embedding::{EmbeddingRequest, EmbeddingResponse};
pub use image::{GeneratedImage, ImageRequest, ImageResponse};
pub use message::{ArtifactData, MessageArtifact, MessageRole, ModelMessage, ToolCall};
pub use model::{ModelCapabilities, ModelInfo, ModelPricing, Price, PricingUnit};
pub use request::{CompletionOptions, CompletionRequest, ReasoningEffort, ResponseFormat};
pub use response::CompletionResponse;
pub use streaming::StreamChunk;
pub use usage::TokenUsage;
