//! Remote catalog loading (wiremock)

use serde_json::json;
use unillm::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn openrouter_listing() -> serde_json::Value {
    json!({
        "data": [
            {
                "id": "openai/gpt-4o-mini",
                "name": "OpenAI: GPT-4o-mini",
                "context_length": 128000,
                "pricing": {"prompt": "0.00000015", "completion": "0.0000006", "input_cache_read": "0.000000075"},
                "top_provider": {"max_completion_tokens": 16384},
                "supported_parameters": ["tools", "response_format"],
                "architecture": {"input_modalities": ["text", "image"]}
            },
            {"id": 42}
        ]
    })
}

#[tokio::test]
async fn fetch_builds_a_priced_registry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openrouter_listing()))
        .expect(1)
        .mount(&server)
        .await;

    let registry = ModelRegistry::fetch(
        &reqwest::Client::new(),
        &format!("{}/api/v1/models", server.uri()),
    )
    .await
    .unwrap();
    assert_eq!(registry.len(), 1);

    let info = registry.get_model_info("openai/gpt-4o-mini").unwrap();
    assert_eq!(info.context_window, Some(128000));
    assert!(info.capabilities.tools && info.capabilities.vision);
    // Display name and normalized ids resolve to the same entry
    assert!(registry.get_model_info("OpenAI: GPT-4o-mini").is_some());
    assert!(registry.get_model_info("openai/gpt-4o-mini:free").is_some());

    let usage = TokenUsage::new(1_000_000, 1_000_000);
    let cost = unillm::cost(Some(&*info), &usage).unwrap();
    assert!((cost - 0.75).abs() < 1e-9, "{cost}");
}

#[tokio::test]
async fn fetch_failure_is_a_configuration_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = ModelRegistry::fetch(&reqwest::Client::new(), &format!("{}/models", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Configuration(_)));
}

#[tokio::test]
async fn connect_fetches_the_catalog_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openrouter_listing()))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig::new("router", format!("{}/api/v1", server.uri()))
        .with_api_key("k")
        .with_catalog_url(format!("{}/api/v1/models", server.uri()));
    let service = CompletionService::connect(config).await.unwrap();
    assert!(service.models().get_model_info("openai/gpt-4o-mini").is_some());
}

#[tokio::test]
async fn connect_fails_when_the_catalog_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = ProviderConfig::new("router", server.uri())
        .with_api_key("k")
        .with_catalog_url(format!("{}/models", server.uri()));
    let err = CompletionService::connect(config).await.unwrap_err();
    assert!(matches!(err, LlmError::Configuration(_)));
}
