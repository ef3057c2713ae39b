//! OpenAI-compatible backend over HTTP (wiremock)

use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use unillm::prelude::*;
use unillm::provider::{OpenAiCompatibleProvider, ProviderCapabilities};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service_for(config: ProviderConfig) -> CompletionService {
    let registry = ModelRegistry::from_models([ModelInfo::new(
        "gpt-test",
        ModelPricing::per_million(1.0, 2.0),
    )]);
    let provider = OpenAiCompatibleProvider::new(config).unwrap();
    CompletionService::new(Arc::new(provider), Arc::new(registry))
}

fn config(server: &MockServer) -> ProviderConfig {
    ProviderConfig::new("mock", format!("{}/v1", server.uri())).with_api_key("test-key")
}

#[tokio::test]
async fn complete_posts_chat_completions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-test",
            "temperature": 0.0,
            "messages": [
                {"role": "system", "content": "sys"},
                {"role": "user", "content": "hi"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "hello"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 1000, "completion_tokens": 500, "total_tokens": 1500}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = CompletionRequest::new("gpt-test")
        .instructions("sys")
        .message(ModelMessage::user("hi"))
        .temperature(0.0)
        .with_usage(true)
        .with_cost(true);
    let response = service_for(config(&server))
        .complete(&CancellationToken::new(), &request)
        .await
        .unwrap();

    assert_eq!(response.output, "hello");
    assert_eq!(response.usage.unwrap().output_tokens, 500);
    assert!((response.cost.unwrap() - 0.002).abs() < 1e-12);
}

#[tokio::test]
async fn stream_complete_parses_sse() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
        "data: {\"choices\":[{\"index\":0,\"delta\":{\"reasoning_content\":\"hmm\"}}]}\n\n",
        "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hel\"}}]}\n\n",
        ": OPENROUTER PROCESSING\n\n",
        "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"lo\"},\"finish_reason\":\"stop\"}]}\n\n",
        "data: {\"choices\":[],\"usage\":{\"prompt_tokens\":1000,\"completion_tokens\":500}}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream": true, "stream_options": {"include_usage": true}})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let request = CompletionRequest::new("gpt-test")
        .message(ModelMessage::user("hi"))
        .with_usage(true)
        .with_cost(true);
    let stream = service_for(config(&server))
        .stream_complete(&CancellationToken::new(), &request)
        .await
        .unwrap();

    use futures::StreamExt;
    let chunks: Vec<StreamChunk> = stream.collect().await;
    assert_eq!(chunks.len(), 4, "{chunks:?}");
    assert!(matches!(&chunks[0], StreamChunk::Reasoning { text } if text == "hmm"));
    assert_eq!(chunks[1].as_text(), Some("Hel"));
    assert_eq!(chunks[2].as_text(), Some("lo"));
    match &chunks[3] {
        StreamChunk::Usage { usage, cost } => {
            assert_eq!(usage.input_tokens, 1000);
            assert!((cost.unwrap() - 0.002).abs() < 1e-12);
        }
        other => panic!("expected usage, got {other:?}"),
    }
}

#[tokio::test]
async fn error_status_is_a_request_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "Rate limit reached", "type": "rate_limit_error"}
        })))
        .mount(&server)
        .await;

    let service = service_for(config(&server));
    let request = CompletionRequest::new("gpt-test").message(ModelMessage::user("hi"));
    let ctx = CancellationToken::new();

    let err = service.complete(&ctx, &request).await.unwrap_err();
    match &err {
        LlmError::Request { provider, status, message, .. } => {
            assert_eq!(provider, "mock");
            assert_eq!(*status, Some(429));
            assert!(message.contains("Rate limit reached"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_retryable());

    // Streaming handshake failures are returned directly too
    let err = service.stream_complete(&ctx, &request).await.unwrap_err();
    assert_eq!(err.status_code(), Some(429));
}

#[tokio::test]
async fn plain_text_error_body_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let request = CompletionRequest::new("gpt-test").message(ModelMessage::user("hi"));
    let err = service_for(config(&server))
        .complete(&CancellationToken::new(), &request)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("upstream unavailable"), "{err}");
}

#[tokio::test]
async fn azure_style_auth_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt4o/chat/completions"))
        .and(query_param("api-version", "2024-10-21"))
        .and(header("api-key", "azure-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "ok"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = presets::azure("acme", "gpt4o", "2024-10-21").with_api_key("azure-key");
    config.base_url = format!("{}/openai/deployments/gpt4o", server.uri());

    let request = CompletionRequest::new("gpt4o").message(ModelMessage::user("hi"));
    let response = service_for(config)
        .complete(&CancellationToken::new(), &request)
        .await
        .unwrap();
    assert_eq!(response.output, "ok");
}

#[tokio::test]
async fn embeddings_keep_input_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(body_partial_json(json!({"model": "embed-1", "input": ["a", "b"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"index": 1, "embedding": [0.5, 0.5]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ],
            "usage": {"prompt_tokens": 2, "total_tokens": 2}
        })))
        .mount(&server)
        .await;

    let config = config(&server)
        .with_capabilities(ProviderCapabilities::chat().with_embeddings());
    let response = service_for(config)
        .embed(&CancellationToken::new(), &EmbeddingRequest::new("embed-1", ["a", "b"]))
        .await
        .unwrap();
    assert_eq!(response.embeddings, vec![vec![1.0_f32, 0.0], vec![0.5, 0.5]]);
    assert_eq!(response.usage.unwrap().input_tokens, 2);
}
