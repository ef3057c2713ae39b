//! OpenAI-compatible HTTP backend

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::config::{ProviderCapabilities, ProviderConfig, ToolEncoding};
use super::wire::{
    WireEmbeddingResponse, WireErrorEnvelope, WireImageResponse, WireRequest, WireResponse,
};
use super::{ChatProvider, WireChunkStream};
use crate::error::LlmError;
use crate::streaming::sse::sse_cursor;
use crate::transformers::usage_from_wire;
use crate::types::{
    EmbeddingRequest, EmbeddingResponse, GeneratedImage, ImageRequest, ImageResponse, TokenUsage,
};

/// Client for any backend speaking the OpenAI REST dialect.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    config: ProviderConfig,
    headers: HeaderMap,
    http: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    /// Validate `config` and build a dedicated HTTP client for it.
    pub fn new(config: ProviderConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.http.connect_timeout)
            .user_agent(config.http.user_agent.clone())
            .build()
            .map_err(|e| LlmError::Configuration(format!("{}: failed to build HTTP client: {e}", config.id)))?;
        Self::with_client(config, http)
    }

    /// Share an existing HTTP client (connection pool) across providers.
    pub fn with_client(config: ProviderConfig, http: reqwest::Client) -> Result<Self, LlmError> {
        config.validate()?;
        let headers = config.headers()?;
        Ok(Self {
            config,
            headers,
            http,
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> reqwest::RequestBuilder {
        self.http
            .post(self.config.endpoint(path))
            .query(&self.config.query_params)
            .headers(self.headers.clone())
            .json(body)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, LlmError> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(self.status_error(response).await)
        }
    }

    async fn send_json<R, T>(&self, path: &str, body: &T) -> Result<R, LlmError>
    where
        R: DeserializeOwned,
        T: Serialize + Sync + ?Sized,
    {
        let request = self.post(path, body).timeout(self.config.http.timeout);
        let response = self.send(request).await?;
        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_str(&text).map_err(|e| {
            LlmError::response(&self.config.id, format!("unexpected response body: {e}"))
                .with_source(e)
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> LlmError {
        match LlmError::from(e) {
            LlmError::Request {
                status,
                message,
                source,
                ..
            } => LlmError::Request {
                provider: self.config.id.clone(),
                status,
                message,
                source,
            },
            other => other,
        }
    }

    /// Non-2xx: prefer the provider's `error.message`, fall back to the raw body.
    async fn status_error(&self, response: reqwest::Response) -> LlmError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<WireErrorEnvelope>(&body)
            .ok()
            .and_then(|envelope| envelope.error)
            .map(|error| error.to_string())
            .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
        tracing::warn!(provider = %self.config.id, status = status.as_u16(), %message, "provider returned an error status");
        LlmError::request(&self.config.id, Some(status.as_u16()), message)
    }
}

#[async_trait]
impl ChatProvider for OpenAiCompatibleProvider {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn capabilities(&self) -> ProviderCapabilities {
        self.config.capabilities
    }

    fn tool_encoding(&self) -> ToolEncoding {
        self.config.tool_encoding
    }

    async fn create(&self, request: &WireRequest) -> Result<WireResponse, LlmError> {
        self.send_json("chat/completions", request).await
    }

    async fn create_stream(&self, request: &WireRequest) -> Result<WireChunkStream, LlmError> {
        let builder = self
            .post("chat/completions", request)
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"));
        let response = self.send(builder).await?;
        Ok(sse_cursor(&self.config.id, response.bytes_stream()))
    }

    async fn embed(&self, request: &EmbeddingRequest) -> Result<EmbeddingResponse, LlmError> {
        if !self.config.capabilities.embeddings {
            return Err(LlmError::unsupported(&self.config.id, "embeddings"));
        }
        let wire: WireEmbeddingResponse = self.send_json("embeddings", request).await?;
        let mut data = wire.data;
        data.sort_by_key(|e| e.index);
        Ok(EmbeddingResponse {
            embeddings: data.into_iter().map(|e| e.embedding).collect(),
            usage: wire.usage.as_ref().map(usage_from_wire),
        })
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageResponse, LlmError> {
        if !self.config.capabilities.image_generation {
            return Err(LlmError::unsupported(&self.config.id, "image_generation"));
        }
        let wire: WireImageResponse = self.send_json("images/generations", request).await?;
        let count = wire.data.len() as u64;
        Ok(ImageResponse {
            usage: Some(TokenUsage::for_images(count)),
            images: wire
                .data
                .into_iter()
                .map(|image| GeneratedImage {
                    url: image.url,
                    b64_json: image.b64_json,
                    revised_prompt: image.revised_prompt,
                })
                .collect(),
            cost: None,
        })
    }
}
