//! Named provider configurations
//!
//! Each preset reads its API key from the conventional environment variable;
//! override it with [`ProviderConfig::with_api_key`].

use super::config::{AuthStyle, ProviderCapabilities, ProviderConfig};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const CLAUDE_BASE_URL: &str = "https://api.anthropic.com/v1";

pub fn openai() -> ProviderConfig {
    ProviderConfig::new("openai", OPENAI_BASE_URL)
        .with_api_key_from_env("OPENAI_API_KEY")
        .with_capabilities(
            ProviderCapabilities::chat()
                .with_vision()
                .with_embeddings()
                .with_image_generation(),
        )
}

pub fn deepseek() -> ProviderConfig {
    ProviderConfig::new("deepseek", DEEPSEEK_BASE_URL).with_api_key_from_env("DEEPSEEK_API_KEY")
}

/// OpenRouter, with its public `/models` listing as the pricing catalog.
pub fn openrouter() -> ProviderConfig {
    ProviderConfig::new("openrouter", OPENROUTER_BASE_URL)
        .with_api_key_from_env("OPENROUTER_API_KEY")
        .with_header("X-Title", "unillm")
        .with_capabilities(ProviderCapabilities::chat().with_vision())
        .with_catalog_url(format!("{OPENROUTER_BASE_URL}/models"))
}

/// Gemini through its OpenAI-compatible endpoint
pub fn gemini() -> ProviderConfig {
    ProviderConfig::new("gemini", GEMINI_BASE_URL)
        .with_api_key_from_env("GEMINI_API_KEY")
        .with_capabilities(
            ProviderCapabilities::chat()
                .with_vision()
                .with_embeddings()
                .with_image_generation(),
        )
}

/// Claude through Anthropic's OpenAI SDK compatibility endpoint
pub fn claude() -> ProviderConfig {
    ProviderConfig::new("claude", CLAUDE_BASE_URL)
        .with_api_key_from_env("ANTHROPIC_API_KEY")
        .with_capabilities(ProviderCapabilities::chat().with_vision())
}

/// Azure OpenAI deployment.
///
/// Requests go to `https://{resource}.openai.azure.com/openai/deployments/{deployment}`
/// with the key in the `api-key` header and `api-version` on the query string.
pub fn azure(resource: &str, deployment: &str, api_version: &str) -> ProviderConfig {
    ProviderConfig::new(
        "azure",
        format!("https://{resource}.openai.azure.com/openai/deployments/{deployment}"),
    )
    .with_api_key_from_env("AZURE_OPENAI_API_KEY")
    .with_auth(AuthStyle::Header("api-key".into()))
    .with_query_param("api-version", api_version)
    .with_capabilities(
        ProviderCapabilities::chat()
            .with_vision()
            .with_embeddings()
            .with_image_generation(),
    )
}
