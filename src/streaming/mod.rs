//! Streaming support
//!
//! - `sse`: server-sent events byte stream -> wire chunk cursor
//! - `adapter`: wire chunk cursor -> cancellation-safe [`StreamChunk`](crate::types::StreamChunk) channel

pub mod adapter;
pub mod sse;

pub use adapter::{CompletionStream, DEFAULT_STREAM_BUFFER, StreamAdapter, StreamState};
pub use sse::sse_cursor;
