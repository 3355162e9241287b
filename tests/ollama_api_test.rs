//! Tests for the Ollama service
//! Uses wiremock to mock HTTP responses

use prompt_enhancer::config::Config;
use prompt_enhancer::service::{
    generate, list_models, OllamaError, FALLBACK_MODEL, NO_RESPONSE_PLACEHOLDER,
};
use reqwest::Client;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .unwrap()
}

// ============================================================================
// list_models Tests
// ============================================================================

#[tokio::test]
async fn test_list_models_sorted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "models": [
                {"name": "mistral:latest", "size": 4109865159u64},
                {"name": "llama3:latest", "size": 4661224676u64},
                {"name": "codellama:7b"}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config::with_ollama_url(&mock_server.uri()).unwrap();
    let models = list_models(&create_test_client(), &config).await.unwrap();

    assert_eq!(models, vec!["codellama:7b", "llama3:latest", "mistral:latest"]);
}

#[tokio::test]
async fn test_list_models_single() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"models": [{"name": "llama3:latest"}]})),
        )
        .mount(&mock_server)
        .await;

    let config = Config::with_ollama_url(&mock_server.uri()).unwrap();
    let models = list_models(&create_test_client(), &config).await.unwrap();
    assert_eq!(models, vec!["llama3:latest"]);
}

#[tokio::test]
async fn test_list_models_empty_falls_back() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"models": []})))
        .mount(&mock_server)
        .await;

    let config = Config::with_ollama_url(&mock_server.uri()).unwrap();
    let models = list_models(&create_test_client(), &config).await.unwrap();
    assert_eq!(models, vec![FALLBACK_MODEL]);
}

#[tokio::test]
async fn test_list_models_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let config = Config::with_ollama_url(&mock_server.uri()).unwrap();
    let err = list_models(&create_test_client(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, OllamaError::Status { .. }));
    assert!(err.to_string().contains("boom"));
}

#[tokio::test]
async fn test_list_models_unreachable() {
    let config = Config::with_ollama_url("http://127.0.0.1:9").unwrap();
    let err = list_models(&create_test_client(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, OllamaError::Request(_)));
}

// ============================================================================
// generate Tests
// ============================================================================

#[tokio::test]
async fn test_generate_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_json(serde_json::json!({
            "model": "llama3",
            "prompt": "Why is the sky blue?",
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "llama3",
            "created_at": "2024-05-01T10:00:00Z",
            "response": "\n  Rayleigh scattering.  \n",
            "done": true
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config::with_ollama_url(&mock_server.uri()).unwrap();
    let text = generate(&create_test_client(), &config, "llama3", "Why is the sky blue?")
        .await
        .unwrap();

    assert_eq!(text, "Rayleigh scattering.");
}

#[tokio::test]
async fn test_generate_missing_response_field() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"done": true})))
        .mount(&mock_server)
        .await;

    let config = Config::with_ollama_url(&mock_server.uri()).unwrap();
    let text = generate(&create_test_client(), &config, "llama3", "hi")
        .await
        .unwrap();
    assert_eq!(text, NO_RESPONSE_PLACEHOLDER);
}

#[tokio::test]
async fn test_generate_model_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"error": "model 'nope' not found"})),
        )
        .mount(&mock_server)
        .await;

    let config = Config::with_ollama_url(&mock_server.uri()).unwrap();
    let err = generate(&create_test_client(), &config, "nope", "hi")
        .await
        .unwrap_err();

    match err {
        OllamaError::Status { status, body } => {
            assert_eq!(status.as_u16(), 404);
            assert!(body.contains("not found"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_generate_invalid_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let config = Config::with_ollama_url(&mock_server.uri()).unwrap();
    let err = generate(&create_test_client(), &config, "llama3", "hi")
        .await
        .unwrap_err();
    assert!(matches!(err, OllamaError::Decode { .. }));
    assert!(err.to_string().contains("not json"));
}
