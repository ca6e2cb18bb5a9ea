//! Managed adapter tests against a mock Ollama server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use modelgate_service::providers::{BackendError, ChatProvider, OllamaProvider};

fn provider(url: &str) -> OllamaProvider {
    OllamaProvider::new(url, Duration::from_secs(5))
}

#[tokio::test]
async fn answer_comes_from_message_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "deepseek-coder-v2:latest",
            "stream": false,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "deepseek-coder-v2:latest",
            "message": {"role": "assistant", "content": "Ollama response"},
            "done": true,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = provider(&server.uri())
        .chat("deepseek-coder-v2:latest", "hello", None)
        .await
        .unwrap();

    assert_eq!(answer, "Ollama response");
}

#[tokio::test]
async fn system_prompt_leads_the_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hello"},
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": "ok"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = provider(&server.uri())
        .chat("some-model", "hello", Some("be brief"))
        .await
        .unwrap();

    assert_eq!(answer, "ok");
}

#[tokio::test]
async fn error_status_carries_the_remote_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "model not pulled"})),
        )
        .mount(&server)
        .await;

    let err = provider(&server.uri())
        .chat("unknown-model", "hello", None)
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::Managed(_)));
    let text = err.to_string();
    assert!(text.contains("HTTP 404"));
    assert!(text.contains("model not pulled"));
}

#[tokio::test]
async fn unexpected_shape_is_a_managed_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": true})))
        .mount(&server)
        .await;

    let err = provider(&server.uri())
        .chat("some-model", "hello", None)
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::Managed(_)));
    assert!(err.to_string().contains("unexpected response shape"));
}

#[tokio::test]
async fn unreachable_service_is_a_managed_failure() {
    let err = provider("http://127.0.0.1:1")
        .chat("some-model", "hello", None)
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::Managed(_)));
}
