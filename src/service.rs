//! Completion service
//!
//! The composition root: validation, request transformation, the provider
//! call, response mapping or stream adaptation, and cost attachment. This is
//! the only type callers need to touch.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::cost::{cost, image_generation_cost};
use crate::error::LlmError;
use crate::provider::wire::WireRequest;
use crate::provider::{ChatProvider, OpenAiCompatibleProvider, ProviderConfig};
use crate::registry::{ModelLookup, ModelRegistry};
use crate::schema::{DEFAULT_SCHEMA_CACHE_CAPACITY, SchemaCache};
use crate::streaming::{CompletionStream, DEFAULT_STREAM_BUFFER, StreamAdapter};
use crate::transformers::{ChatCompletionsTransformer, RequestTransformer, map_wire_response};
use crate::types::{
    CompletionRequest, CompletionResponse, EmbeddingRequest, EmbeddingResponse, ImageRequest,
    ImageResponse, TokenUsage,
};
use crate::utils::mime::{artifact_mime, is_image};
use crate::validation::{validate_embedding, validate_image, validate_request};

/// Service-level settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Check non-streaming JSON output against the request's schema
    pub validate_structured_output: bool,
    pub schema_cache_capacity: usize,
    /// Capacity of each stream's chunk channel
    pub stream_buffer: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            validate_structured_output: false,
            schema_cache_capacity: DEFAULT_SCHEMA_CACHE_CAPACITY,
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }
}

pub struct CompletionService {
    provider: Arc<dyn ChatProvider>,
    models: Arc<dyn ModelLookup>,
    transformer: ChatCompletionsTransformer,
    schemas: SchemaCache,
    config: ServiceConfig,
}

static_assertions::assert_impl_all!(CompletionService: Send, Sync);
static_assertions::assert_impl_all!(CompletionStream: Send);

impl CompletionService {
    pub fn new(provider: Arc<dyn ChatProvider>, models: Arc<dyn ModelLookup>) -> Self {
        Self::with_config(provider, models, ServiceConfig::default())
    }

    pub fn with_config(
        provider: Arc<dyn ChatProvider>,
        models: Arc<dyn ModelLookup>,
        config: ServiceConfig,
    ) -> Self {
        let transformer = ChatCompletionsTransformer::new(provider.id(), provider.tool_encoding());
        Self {
            provider,
            models,
            transformer,
            schemas: SchemaCache::new(config.schema_cache_capacity),
            config,
        }
    }

    /// Build a service for an OpenAI-compatible backend.
    ///
    /// When the configuration names a catalog URL, the catalog is fetched
    /// once here and a fetch failure fails construction. Without one, costs
    /// are absent unless a registry is supplied via [`Self::with_config`].
    pub async fn connect(config: ProviderConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.http.connect_timeout)
            .user_agent(config.http.user_agent.clone())
            .build()
            .map_err(|e| LlmError::Configuration(format!("failed to build HTTP client: {e}")))?;
        let registry = match &config.catalog_url {
            Some(url) => ModelRegistry::fetch(&http, url).await?,
            None => ModelRegistry::new(),
        };
        let provider = OpenAiCompatibleProvider::with_client(config, http)?;
        Ok(Self::new(Arc::new(provider), Arc::new(registry)))
    }

    pub fn provider(&self) -> &Arc<dyn ChatProvider> {
        &self.provider
    }

    pub fn models(&self) -> &Arc<dyn ModelLookup> {
        &self.models
    }

    pub fn schemas(&self) -> &SchemaCache {
        &self.schemas
    }

    /// Reject requests that need a capability the provider lacks.
    fn check_capabilities(&self, request: &CompletionRequest, streaming: bool) -> Result<(), LlmError> {
        let caps = self.provider.capabilities();
        let missing = if streaming && !caps.streaming {
            Some("streaming")
        } else if !caps.tools && request.messages.iter().any(|m| m.tool_call.is_some()) {
            Some("tools")
        } else if !caps.vision
            && request
                .messages
                .iter()
                .flat_map(|m| &m.artifacts)
                .any(|artifact| is_image(&artifact_mime(artifact)))
        {
            Some("vision")
        } else {
            None
        };
        match missing {
            Some(capability) => Err(LlmError::unsupported(self.provider.id(), capability)),
            None => Ok(()),
        }
    }

    /// Validate and transform; never performs I/O.
    fn prepare(&self, request: &CompletionRequest, streaming: bool) -> Result<WireRequest, LlmError> {
        self.check_capabilities(request, streaming)?;
        validate_request(request)?;
        if let Some(schema) = request
            .options
            .response_format
            .as_ref()
            .and_then(|format| format.schema())
        {
            self.schemas.compile(schema)?;
        }
        self.transformer.transform_chat(request)
    }

    /// One-shot completion.
    ///
    /// Usage is reported only when `with_usage` is set; cost only when
    /// `with_cost` is also set and the model can be priced.
    pub async fn complete(
        &self,
        ctx: &CancellationToken,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        let wire = self.prepare(request, false)?;
        let call_id = Uuid::new_v4();
        tracing::debug!(%call_id, provider = %self.provider.id(), model = %request.model, "completion request");

        let reply = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(LlmError::canceled(self.provider.id())),
            reply = self.provider.create(&wire) => reply?,
        };
        let mut response = map_wire_response(self.provider.id(), reply)?;

        if self.config.validate_structured_output
            && let Some(schema) = request
                .options
                .response_format
                .as_ref()
                .and_then(|format| format.schema())
        {
            self.schemas
                .validate_output(self.provider.id(), schema, &response.output)?;
        }

        let options = &request.options;
        if !options.with_usage {
            response.usage = None;
        } else if options.with_cost {
            let info = self.models.get_model_info(&request.model);
            response.cost = response
                .usage
                .as_ref()
                .and_then(|usage| cost(info.as_deref(), usage));
        }
        tracing::debug!(%call_id, usage = ?response.usage, cost = ?response.cost, "completion finished");
        Ok(response)
    }

    /// Streaming completion.
    ///
    /// Capability, validation and handshake failures are returned directly; failures after
    /// the stream opens arrive as a final `StreamChunk::Error`.
    pub async fn stream_complete(
        &self,
        ctx: &CancellationToken,
        request: &CompletionRequest,
    ) -> Result<CompletionStream, LlmError> {
        let options = &request.options;
        let wire = self.prepare(request, true)?.streaming(options.with_usage);
        let call_id = Uuid::new_v4();
        tracing::debug!(%call_id, provider = %self.provider.id(), model = %request.model, "streaming request");

        let mut adapter = StreamAdapter::new(self.provider.clone())
            .with_usage(options.with_usage)
            .with_buffer(self.config.stream_buffer);
        if options.with_usage && options.with_cost {
            adapter = adapter.with_cost(self.models.get_model_info(&request.model));
        }
        adapter.open(ctx.clone(), wire).await
    }

    pub async fn embed(
        &self,
        ctx: &CancellationToken,
        request: &EmbeddingRequest,
    ) -> Result<EmbeddingResponse, LlmError> {
        if !self.provider.capabilities().embeddings {
            return Err(LlmError::unsupported(self.provider.id(), "embeddings"));
        }
        validate_embedding(request)?;
        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(LlmError::canceled(self.provider.id())),
            reply = self.provider.embed(request) => reply,
        }
    }

    /// Image generation, priced flat per image when the model is known.
    pub async fn generate_image(
        &self,
        ctx: &CancellationToken,
        request: &ImageRequest,
    ) -> Result<ImageResponse, LlmError> {
        if !self.provider.capabilities().image_generation {
            return Err(LlmError::unsupported(self.provider.id(), "image_generation"));
        }
        validate_image(request)?;
        let mut response = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(LlmError::canceled(self.provider.id())),
            reply = self.provider.generate_image(request) => reply?,
        };
        let images = response
            .usage
            .get_or_insert_with(|| TokenUsage::for_images(response.images.len() as u64))
            .images;
        let info = self.models.get_model_info(&request.model);
        response.cost = image_generation_cost(info.as_deref(), images);
        Ok(response)
    }
}

impl std::fmt::Debug for CompletionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionService")
            .field("provider", &self.provider.id())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
