//! Server-sent events cursor
//!
//! Turns a chat completions SSE byte stream into typed wire chunks using
//! eventsource-stream, which handles UTF-8 boundaries and line buffering.

use eventsource_stream::{EventStreamError, Eventsource};
use futures::{Stream, StreamExt};

use crate::error::LlmError;
use crate::provider::WireChunkStream;
use crate::provider::wire::WireStreamChunk;

/// Parse an SSE byte stream into wire chunks.
///
/// `[DONE]` ends the cursor. Payloads that do not parse as a chunk are skipped
/// (logged at debug level); transport and framing errors end the cursor with a
/// [`LlmError::Stream`].
pub fn sse_cursor<S, B, E>(provider: impl Into<String>, bytes: S) -> WireChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: std::error::Error + Send + Sync + 'static,
{
    let provider = provider.into();
    Box::pin(async_stream::stream! {
        let mut events = Box::pin(bytes.eventsource());
        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(EventStreamError::Transport(e)) => {
                    yield Err(LlmError::stream(&provider, format!("connection error: {e}")).with_source(e));
                    break;
                }
                Err(e) => {
                    yield Err(LlmError::stream(&provider, format!("SSE parsing error: {e}")));
                    break;
                }
            };

            let data = event.data.trim();
            if data == "[DONE]" {
                break;
            }
            if data.is_empty() {
                continue;
            }
            match serde_json::from_str::<WireStreamChunk>(data) {
                Ok(chunk) => yield Ok(chunk),
                Err(e) => {
                    tracing::debug!(provider = %provider, error = %e, "skipping unparseable stream payload");
                }
            }
        }
    })
}
