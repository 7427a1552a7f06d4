//! Ollama-backed generation and embedding.
//!
//! Talks to a local Ollama daemon: `/api/chat` for generation,
//! `/api/embeddings` for vectors, `/api/tags` for reachability and model
//! listing. Generation gets the long timeout (local models are slow to
//! first token); embeddings and health probes get shorter ones.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{EmbeddingProvider, GenerationProvider, check_status};
use crate::config::ProviderSettings;
use crate::error::ProviderError;

/// Client for one Ollama daemon.
#[derive(Clone, Debug)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    chat_model: String,
    embed_model: String,
    generate_timeout: Duration,
    embed_timeout: Duration,
    health_timeout: Duration,
}

impl OllamaClient {
    /// Build a client from provider settings.
    pub fn new(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: settings.ollama_base_url.trim_end_matches('/').to_string(),
            chat_model: settings.chat_model.clone(),
            embed_model: settings.embed_model.clone(),
            generate_timeout: settings.generate_timeout,
            embed_timeout: settings.embed_timeout,
            health_timeout: settings.health_timeout,
        })
    }

    /// Names of the models the daemon has pulled.
    pub async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(self.health_timeout)
            .send()
            .await?;
        let response = check_status(response).await?;
        let payload: TagsResponse = response.json().await?;
        Ok(payload.models.into_iter().map(|model| model.name).collect())
    }
}

#[async_trait]
impl GenerationProvider for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, ProviderError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .timeout(self.generate_timeout)
            .json(&ChatRequest {
                model: &self.chat_model,
                messages,
                stream: false,
            })
            .send()
            .await?;
        let response = check_status(response).await?;
        let payload: ChatResponse = response.json().await?;

        payload
            .message
            .map(|message| message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                ProviderError::Malformed("chat response carried no message content".into())
            })
    }

    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn healthy(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(self.health_timeout)
            .send()
            .await
            .map(|response| response.status().is_success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .timeout(self.embed_timeout)
            .json(&EmbeddingsRequest {
                model: &self.embed_model,
                prompt: text,
            })
            .send()
            .await?;
        let response = check_status(response).await?;
        let payload: EmbeddingsResponse = response.json().await?;
        // A 2xx with no vector means the model cannot embed; empty signals
        // "unavailable" to the adapter.
        Ok(payload.embedding)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn healthy(&self) -> bool {
        GenerationProvider::healthy(self).await
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<AssistantMessage>,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}
