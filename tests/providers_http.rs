//! Wire-level provider tests against an in-process HTTP mock.
//!
//! These pin the request shapes the real services expect and the lenient
//! decoding of their replies: payload fields, query parameters, and the
//! error mapping for non-success statuses and malformed bodies.

use std::sync::Arc;

use httpmock::prelude::*;
use serde_json::json;

use groundsmith::providers::{
    EmbeddingProvider, GeminiClient, GenerationProvider, OllamaClient,
};
use groundsmith::{ChunkEmbedder, ProviderError, ProviderSettings};

fn ollama_client(server: &MockServer) -> OllamaClient {
    let settings = ProviderSettings::default().with_ollama_base_url(server.base_url());
    OllamaClient::new(&settings).unwrap()
}

fn gemini_client(server: &MockServer) -> GeminiClient {
    let mut settings = ProviderSettings::default();
    settings.gemini_base_url = server.base_url();
    settings.gemini_api_key = Some("test-key".to_string());
    GeminiClient::new(&settings).unwrap()
}

#[tokio::test]
async fn ollama_generate_sends_the_chat_payload_and_reads_content() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/chat").json_body(json!({
                "model": "llama3",
                "messages": [
                    {"role": "system", "content": "answer from the manual"},
                    {"role": "user", "content": "what is thermal foldback"}
                ],
                "stream": false
            }));
            then.status(200).json_body(json!({
                "model": "llama3",
                "message": {"role": "assistant", "content": "grounded answer"},
                "done": true
            }));
        })
        .await;

    let reply = ollama_client(&server)
        .generate("what is thermal foldback", Some("answer from the manual"))
        .await
        .unwrap();

    assert_eq!(reply, "grounded answer");
    mock.assert_async().await;
}

#[tokio::test]
async fn ollama_generate_omits_the_system_message_when_absent() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/chat").json_body(json!({
                "model": "llama3",
                "messages": [{"role": "user", "content": "hello"}],
                "stream": false
            }));
            then.status(200)
                .json_body(json!({"message": {"role": "assistant", "content": "hi"}}));
        })
        .await;

    let reply = ollama_client(&server).generate("hello", None).await.unwrap();
    assert_eq!(reply, "hi");
    mock.assert_async().await;
}

#[tokio::test]
async fn ollama_generate_maps_http_errors_to_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/chat");
            then.status(404).body("model 'llama3' not found");
        })
        .await;

    let error = ollama_client(&server)
        .generate("hello", None)
        .await
        .unwrap_err();

    match error {
        ProviderError::Status { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "model 'llama3' not found");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn ollama_generate_rejects_replies_without_content() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/chat");
            then.status(200).json_body(json!({"done": true}));
        })
        .await;

    let error = ollama_client(&server)
        .generate("hello", None)
        .await
        .unwrap_err();
    assert!(matches!(error, ProviderError::Malformed(_)), "got {error:?}");
}

#[tokio::test]
async fn ollama_embeddings_round_trip() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/embeddings").json_body(json!({
                "model": "nomic-embed-text",
                "prompt": "thermal foldback"
            }));
            then.status(200)
                .json_body(json!({"embedding": [0.25, -0.5, 0.75]}));
        })
        .await;

    let vector = ollama_client(&server).embed("thermal foldback").await.unwrap();

    assert_eq!(vector, vec![0.25, -0.5, 0.75]);
    mock.assert_async().await;
}

#[tokio::test]
async fn missing_embedding_field_degrades_to_the_hash_fallback() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/embeddings");
            then.status(200).json_body(json!({}));
        })
        .await;

    let client = ollama_client(&server);
    assert!(client.embed("anything").await.unwrap().is_empty());

    let embedder = ChunkEmbedder::new(Some(Arc::new(ollama_client(&server))));
    let outcome = embedder.embed("anything").await;
    assert!(outcome.fallback);
    assert_eq!(outcome.vector.len(), 384);
}

#[tokio::test]
async fn ollama_tags_drive_health_and_model_listing() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).json_body(json!({
                "models": [
                    {"name": "llama3:latest"},
                    {"name": "nomic-embed-text:latest"}
                ]
            }));
        })
        .await;

    let client = ollama_client(&server);
    assert!(GenerationProvider::healthy(&client).await);
    assert_eq!(
        client.list_models().await.unwrap(),
        vec!["llama3:latest", "nomic-embed-text:latest"]
    );
}

#[tokio::test]
async fn ollama_health_fails_on_error_statuses() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(500).body("daemon restarting");
        })
        .await;

    let client = ollama_client(&server);
    assert!(!GenerationProvider::healthy(&client).await);
    let error = client.list_models().await.unwrap_err();
    assert!(matches!(error, ProviderError::Status { status: 500, .. }), "got {error:?}");
}

#[tokio::test]
async fn gemini_prepends_the_system_instruction_to_the_user_turn() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-2.0-flash-exp:generateContent")
                .query_param("key", "test-key")
                .json_body(json!({
                    "contents": [
                        {"parts": [{"text": "answer tersely\n\nUser: what is foldback"}]}
                    ]
                }));
            then.status(200).json_body(json!({
                "candidates": [
                    {"content": {"parts": [{"text": "Foldback limits gain."}], "role": "model"}}
                ]
            }));
        })
        .await;

    let reply = gemini_client(&server)
        .generate("what is foldback", Some("answer tersely"))
        .await
        .unwrap();

    assert_eq!(reply, "Foldback limits gain.");
    mock.assert_async().await;
}

#[tokio::test]
async fn gemini_rejects_candidate_free_replies() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-2.0-flash-exp:generateContent");
            then.status(200).json_body(json!({}));
        })
        .await;

    let error = gemini_client(&server)
        .generate("hello", None)
        .await
        .unwrap_err();
    assert!(matches!(error, ProviderError::Malformed(_)), "got {error:?}");
}

#[tokio::test]
async fn gemini_surfaces_http_errors_with_their_bodies() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-2.0-flash-exp:generateContent");
            then.status(429).body("quota exceeded");
        })
        .await;

    let error = gemini_client(&server)
        .generate("hello", None)
        .await
        .unwrap_err();

    match error {
        ProviderError::Status { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "quota exceeded");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}
