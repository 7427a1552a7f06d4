//! Gemini-backed generation.
//!
//! Calls the `generateContent` REST endpoint. Gemini has no system-message
//! slot in this shape, so a system instruction is prepended to the user
//! turn. Generation only; embeddings stay with Ollama or the deterministic
//! fallback.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{GenerationProvider, check_status};
use crate::config::ProviderSettings;
use crate::error::ProviderError;

/// Client for the Gemini `generateContent` API.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    generate_timeout: Duration,
}

impl GeminiClient {
    /// Build a client from provider settings.
    ///
    /// Fails with [`ProviderError::Unavailable`] when no API key is
    /// configured, so a missing key is caught at wiring time rather than on
    /// the first question.
    pub fn new(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let api_key = settings
            .gemini_api_key
            .clone()
            .ok_or_else(|| ProviderError::Unavailable("GEMINI_API_KEY is not set".into()))?;
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: settings.gemini_base_url.trim_end_matches('/').to_string(),
            model: settings.gemini_model.clone(),
            api_key,
            generate_timeout: settings.generate_timeout,
        })
    }
}

#[async_trait]
impl GenerationProvider for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, ProviderError> {
        let text = match system {
            Some(system) => format!("{system}\n\nUser: {prompt}"),
            None => prompt.to_string(),
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let response = self
            .client
            .post(url)
            .timeout(self.generate_timeout)
            .json(&GenerateRequest {
                contents: vec![RequestContent {
                    parts: vec![Part { text }],
                }],
            })
            .send()
            .await?;
        let response = check_status(response).await?;
        let payload: GenerateResponse = response.json().await?;

        payload
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                ProviderError::Malformed(
                    "generateContent response carried no candidate text".into(),
                )
            })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}
