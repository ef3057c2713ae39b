//! Shared fixtures: a scripted in-memory provider and wire chunk builders.
#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use unillm::error::LlmError;
use unillm::provider::wire::{WireRequest, WireResponse, WireStreamChunk};
use unillm::provider::{ChatProvider, ProviderCapabilities, WireChunkStream};
use unillm::types::{GeneratedImage, ImageRequest, ImageResponse};

/// One scripted step of a streaming call
pub enum Step {
    Chunk(WireStreamChunk),
    Fail(LlmError),
    /// Cancel the token, then fail in the same poll
    CancelThenFail(CancellationToken, LlmError),
    Sleep(Duration),
    /// Never resolves
    Hang,
}

pub struct ScriptedProvider {
    response: Value,
    steps: Mutex<Option<Vec<Step>>>,
    capabilities: ProviderCapabilities,
    calls: AtomicUsize,
    last_request: Mutex<Option<WireRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            response: json!({"choices": [{"message": {"content": ""}}]}),
            steps: Mutex::new(None),
            capabilities: ProviderCapabilities::chat(),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn with_response(mut self, body: Value) -> Self {
        self.response = body;
        self
    }

    pub fn with_steps(self, steps: Vec<Step>) -> Self {
        *self.steps.lock().unwrap() = Some(steps);
        self
    }

    pub fn with_capabilities(mut self, capabilities: ProviderCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<WireRequest> {
        self.last_request.lock().unwrap().clone()
    }

    fn record(&self, request: &WireRequest) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        self.capabilities
    }

    async fn create(&self, request: &WireRequest) -> Result<WireResponse, LlmError> {
        self.record(request);
        Ok(serde_json::from_value(self.response.clone())?)
    }

    async fn create_stream(&self, request: &WireRequest) -> Result<WireChunkStream, LlmError> {
        self.record(request);
        let steps = self.steps.lock().unwrap().take().unwrap_or_default();
        Ok(Box::pin(async_stream::stream! {
            for step in steps {
                match step {
                    Step::Chunk(chunk) => yield Ok(chunk),
                    Step::Fail(error) => yield Err(error),
                    Step::CancelThenFail(token, error) => {
                        token.cancel();
                        yield Err(error);
                    }
                    Step::Sleep(duration) => tokio::time::sleep(duration).await,
                    Step::Hang => futures::future::pending::<()>().await,
                }
            }
        }))
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let n = request.n.unwrap_or(1) as usize;
        Ok(ImageResponse {
            images: vec![
                GeneratedImage {
                    url: Some("https://img.test/1.png".into()),
                    ..Default::default()
                };
                n
            ],
            usage: None,
            cost: None,
        })
    }
}

pub fn chunk(body: Value) -> Step {
    Step::Chunk(serde_json::from_value(body).unwrap())
}

pub fn text(text: &str) -> Step {
    chunk(json!({"choices": [{"index": 0, "delta": {"content": text}}]}))
}

pub fn reasoning(text: &str) -> Step {
    chunk(json!({"choices": [{"index": 0, "delta": {"reasoning_content": text}}]}))
}

pub fn usage(prompt: u64, completion: u64) -> Step {
    chunk(json!({
        "choices": [],
        "usage": {"prompt_tokens": prompt, "completion_tokens": completion}
    }))
}

/// Upper bound for the background task to exit after cancellation
pub const SHUTDOWN: Duration = Duration::from_secs(2);
