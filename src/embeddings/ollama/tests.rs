use super::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> OllamaConfig {
    OllamaConfig {
        host: server.address().ip().to_string(),
        port: server.address().port(),
        model: "all-minilm:latest".to_string(),
        batch_size: 2,
        ..OllamaConfig::default()
    }
}

#[test]
fn client_configuration() {
    let config = OllamaConfig {
        protocol: "http".to_string(),
        host: "test-host".to_string(),
        port: 1234,
        model: "test-model".to_string(),
        batch_size: 128,
        timeout_seconds: 5,
        embedding_dimension: Some(384),
    };
    let client = OllamaClient::new(&config).expect("Failed to create client");

    assert_eq!(client.model, "test-model");
    assert_eq!(client.model_name(), "test-model");
    assert_eq!(client.batch_size, 128);
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
    assert_eq!(client.expected_dimension, Some(384));
}

#[test]
fn client_builder_methods() {
    let client = OllamaClient::new(&OllamaConfig::default())
        .expect("Failed to create client")
        .with_timeout(Duration::from_secs(60))
        .with_expected_dimension(768);

    assert_eq!(client.expected_dimension, Some(768));
}

#[tokio::test(flavor = "multi_thread")]
async fn encode_single_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({
            "model": "all-minilm:latest",
            "input": ["Kale, raw"]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [[0.1, 0.2, 0.3]] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = OllamaClient::new(&config_for(&server)).expect("client should build");
    let embedding = tokio::task::spawn_blocking(move || client.encode("Kale, raw"))
        .await
        .expect("task should join")
        .expect("encode should succeed");

    assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
}

#[tokio::test(flavor = "multi_thread")]
async fn encode_batch_splits_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({ "input": ["a", "b"] })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "embeddings": [[1.0, 0.0], [0.0, 1.0]] })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({ "input": ["c"] })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [[0.5, 0.5]] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = OllamaClient::new(&config_for(&server)).expect("client should build");
    let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let embeddings = tokio::task::spawn_blocking(move || client.encode_batch(&texts))
        .await
        .expect("task should join")
        .expect("batch should succeed");

    assert_eq!(
        embeddings,
        vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.5]]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn server_error_is_an_embedding_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = OllamaClient::new(&config_for(&server)).expect("client should build");
    let result = tokio::task::spawn_blocking(move || client.encode("kale"))
        .await
        .expect("task should join");

    assert!(matches!(result, Err(RagError::Embedding(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn wrong_dimension_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [[0.1, 0.2]] })),
        )
        .mount(&server)
        .await;

    let client = OllamaClient::new(&config_for(&server))
        .expect("client should build")
        .with_expected_dimension(3);
    let result = tokio::task::spawn_blocking(move || client.encode("kale"))
        .await
        .expect("task should join");

    match result {
        Err(RagError::Embedding(message)) => assert!(message.contains("3-dimensional")),
        other => panic!("expected embedding error, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn count_mismatch_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [[0.1, 0.2]] })),
        )
        .mount(&server)
        .await;

    let client = OllamaClient::new(&config_for(&server)).expect("client should build");
    let texts = vec!["a".to_string(), "b".to_string()];
    let result = tokio::task::spawn_blocking(move || client.encode_batch(&texts))
        .await
        .expect("task should join");

    assert!(matches!(result, Err(RagError::Embedding(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn model_listing_and_validation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                { "name": "all-minilm:latest", "size": 45960996, "digest": "1b226e2802db" },
                { "name": "llama3.2:latest" }
            ]
        })))
        .mount(&server)
        .await;

    let client = OllamaClient::new(&config_for(&server)).expect("client should build");
    let (models, health) = tokio::task::spawn_blocking(move || {
        let models = client.list_models();
        let health = client.health_check();
        (models, health)
    })
    .await
    .expect("task should join");

    let models = models.expect("models should be listed");
    assert_eq!(models.len(), 2);
    assert_eq!(models[0].size, Some(45960996));
    assert!(health.is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_model_fails_validation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "models": [{ "name": "phi3" }] })),
        )
        .mount(&server)
        .await;

    let client = OllamaClient::new(&config_for(&server)).expect("client should build");
    let result = tokio::task::spawn_blocking(move || client.validate_model())
        .await
        .expect("task should join");

    assert!(result.is_err());
}
