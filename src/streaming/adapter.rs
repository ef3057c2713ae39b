//! Stream adapter
//!
//! Drives one provider streaming call from a background task and republishes
//! it as [`StreamChunk`]s on a bounded channel.
//!
//! States: `Created -> Streaming -> {Completed, Canceled, Errored}`. The task
//! owns the sender and is the only party that closes the channel. Every
//! suspension point (waiting on the provider, waiting for channel capacity)
//! is raced against the caller's [`CancellationToken`] and against the
//! receiver going away.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cost::cost;
use crate::error::LlmError;
use crate::provider::wire::{WireRequest, WireStreamChunk};
use crate::provider::{ChatProvider, WireChunkStream};
use crate::transformers::usage_from_wire;
use crate::types::{ModelInfo, StreamChunk, TokenUsage};

/// Default channel capacity
pub const DEFAULT_STREAM_BUFFER: usize = 10;

/// Lifecycle of one streaming call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Created,
    Streaming,
    Completed,
    Canceled,
    Errored,
}

impl StreamState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled | Self::Errored)
    }
}

/// How the provider loop ended
enum Outcome {
    Exhausted,
    Canceled,
    Failed(LlmError),
}

/// One-shot adapter for a single streaming call.
pub struct StreamAdapter {
    provider: Arc<dyn ChatProvider>,
    with_usage: bool,
    with_cost: bool,
    model: Option<Arc<ModelInfo>>,
    buffer: usize,
    state: StreamState,
}

impl StreamAdapter {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            provider,
            with_usage: false,
            with_cost: false,
            model: None,
            buffer: DEFAULT_STREAM_BUFFER,
            state: StreamState::Created,
        }
    }

    /// Emit a terminal `Usage` chunk on graceful completion
    pub fn with_usage(mut self, enabled: bool) -> Self {
        self.with_usage = enabled;
        self
    }

    /// Attach a cost to the usage chunk, priced against `model`
    /// (`None` prices to an absent cost).
    pub fn with_cost(mut self, model: Option<Arc<ModelInfo>>) -> Self {
        self.with_cost = true;
        self.model = model;
        self
    }

    pub fn with_buffer(mut self, capacity: usize) -> Self {
        self.buffer = capacity.max(1);
        self
    }

    /// Issue the streaming call and spawn the task that drains it.
    ///
    /// A provider without streaming support and handshake failures are
    /// returned directly, as is cancellation observed
    /// before the provider answered. Everything after that is reported in-band.
    pub async fn open(
        self,
        ctx: CancellationToken,
        request: WireRequest,
    ) -> Result<CompletionStream, LlmError> {
        if !self.provider.capabilities().streaming {
            return Err(LlmError::unsupported(self.provider.id(), "streaming"));
        }
        let cursor = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(LlmError::canceled(self.provider.id())),
            cursor = self.provider.create_stream(&request) => cursor?,
        };

        let (tx, rx) = mpsc::channel(self.buffer);
        let task = tokio::spawn(self.drive(ctx, cursor, tx));
        Ok(CompletionStream { receiver: rx, task })
    }

    async fn drive(
        mut self,
        ctx: CancellationToken,
        mut cursor: WireChunkStream,
        tx: mpsc::Sender<StreamChunk>,
    ) -> StreamState {
        self.transition(StreamState::Streaming);
        let mut usage: Option<TokenUsage> = None;

        let outcome = loop {
            let next = tokio::select! {
                biased;
                _ = ctx.cancelled() => break Outcome::Canceled,
                _ = tx.closed() => break Outcome::Canceled,
                next = cursor.next() => next,
            };
            let chunk = match next {
                None => break Outcome::Exhausted,
                Some(Err(error)) => break Outcome::Failed(error),
                Some(Ok(chunk)) => chunk,
            };
            if let Some(error) = &chunk.error {
                break Outcome::Failed(LlmError::stream(self.provider.id(), error.to_string()));
            }
            // Usage blocks are cumulative: the latest one wins
            if let Some(block) = &chunk.usage {
                usage = Some(usage_from_wire(block));
            }
            for out in increments(&chunk) {
                if !emit(&ctx, &tx, out).await {
                    break;
                }
            }
            if ctx.is_cancelled() || tx.is_closed() {
                break Outcome::Canceled;
            }
        };
        // No further provider interaction past this point
        drop(cursor);

        let terminal = match outcome {
            Outcome::Exhausted => self.complete(&ctx, &tx, usage).await,
            Outcome::Canceled => {
                self.notify_canceled(&tx);
                StreamState::Canceled
            }
            Outcome::Failed(error) if ctx.is_cancelled() => {
                tracing::debug!(provider = %self.provider.id(), %error, "suppressing stream error after cancellation");
                self.notify_canceled(&tx);
                StreamState::Canceled
            }
            Outcome::Failed(error) => {
                tracing::warn!(provider = %self.provider.id(), %error, "stream failed");
                let error = match error {
                    error @ LlmError::Stream { .. } => error,
                    other => LlmError::stream(self.provider.id(), other.to_string()).with_source(other),
                };
                if emit(&ctx, &tx, StreamChunk::Error(error)).await {
                    StreamState::Errored
                } else {
                    StreamState::Canceled
                }
            }
        };
        self.transition(terminal);
        terminal
    }

    async fn complete(
        &self,
        ctx: &CancellationToken,
        tx: &mpsc::Sender<StreamChunk>,
        usage: Option<TokenUsage>,
    ) -> StreamState {
        if !self.with_usage {
            return StreamState::Completed;
        }
        let usage = usage.unwrap_or_else(|| {
            tracing::debug!(provider = %self.provider.id(), "stream ended without a usage block");
            TokenUsage::default()
        });
        let cost = if self.with_cost {
            cost(self.model.as_deref(), &usage)
        } else {
            None
        };
        if emit(ctx, tx, StreamChunk::Usage { usage, cost }).await {
            StreamState::Completed
        } else {
            self.notify_canceled(tx);
            StreamState::Canceled
        }
    }

    /// Best effort: dropped when the channel is full or closed.
    fn notify_canceled(&self, tx: &mpsc::Sender<StreamChunk>) {
        let notice = StreamChunk::Error(LlmError::canceled(self.provider.id()));
        if tx.try_send(notice).is_err() {
            tracing::debug!(provider = %self.provider.id(), "cancellation notice dropped");
        }
    }

    fn transition(&mut self, next: StreamState) {
        tracing::debug!(provider = %self.provider.id(), from = ?self.state, to = ?next, "stream state");
        self.state = next;
    }
}

/// Text and reasoning increments carried by one wire chunk, in that order:
/// reasoning first, then visible output.
fn increments(chunk: &WireStreamChunk) -> Vec<StreamChunk> {
    let Some(delta) = chunk.delta() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(1);
    if let Some(reasoning) = delta.reasoning_text() {
        out.push(StreamChunk::reasoning(reasoning));
    }
    if let Some(text) = delta.content.as_deref().filter(|t| !t.is_empty()) {
        out.push(StreamChunk::text(text));
    }
    out
}

/// Send one chunk, giving up if the caller cancels or the receiver is gone.
async fn emit(ctx: &CancellationToken, tx: &mpsc::Sender<StreamChunk>, chunk: StreamChunk) -> bool {
    tokio::select! {
        biased;
        _ = ctx.cancelled() => false,
        sent = tx.send(chunk) => sent.is_ok(),
    }
}

/// Receiving side of a streaming completion.
///
/// Yields chunks until the background task closes the channel. Dropping the
/// stream stops the task at its next suspension point.
#[derive(Debug)]
pub struct CompletionStream {
    receiver: mpsc::Receiver<StreamChunk>,
    task: JoinHandle<StreamState>,
}

impl CompletionStream {
    /// Next chunk, or `None` once the stream is closed
    pub async fn recv(&mut self) -> Option<StreamChunk> {
        self.receiver.recv().await
    }

    /// Concatenate the remaining text chunks, stopping at the first error.
    pub async fn collect_text(&mut self) -> Result<String, LlmError> {
        let mut output = String::new();
        while let Some(chunk) = self.recv().await {
            match chunk {
                StreamChunk::Text { text } => output.push_str(&text),
                StreamChunk::Error(error) => return Err(error),
                StreamChunk::Reasoning { .. } | StreamChunk::Usage { .. } => {}
            }
        }
        Ok(output)
    }

    /// Stop receiving and wait for the background task to exit.
    pub async fn finish(mut self) -> Result<StreamState, LlmError> {
        self.receiver.close();
        self.task
            .await
            .map_err(|e| LlmError::stream("stream", format!("stream task failed: {e}")).with_source(e))
    }
}

impl Stream for CompletionStream {
    type Item = StreamChunk;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
