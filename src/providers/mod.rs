//! Remote capabilities and their test doubles.
//!
//! Each capability is a single-method trait: [`GenerationProvider`] turns a
//! prompt into text, [`EmbeddingProvider`] turns text into a vector. Remote
//! implementations ([`OllamaClient`], [`GeminiClient`]) speak HTTP; the
//! mocks are deterministic stand-ins exported for tests and demos. Fallback
//! policy does not live here: the embedder adapter decides when a failure
//! routes to the deterministic scheme, and the chat orchestrator decides
//! what a generation failure turns into.

use async_trait::async_trait;

use crate::error::ProviderError;

pub mod gemini;
pub mod mock;
pub mod ollama;

pub use gemini::GeminiClient;
pub use mock::{MockEmbeddingProvider, MockGenerationProvider, RecordedGeneration};
pub use ollama::OllamaClient;

/// Produces grounded answers (and, during ingestion, segmentation output).
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a completion for `prompt`, optionally steered by a system
    /// instruction.
    async fn generate(&self, prompt: &str, system: Option<&str>)
    -> Result<String, ProviderError>;

    /// Short name used in logs and telemetry.
    fn name(&self) -> &'static str;

    /// Cheap reachability probe. Defaults to optimistic.
    async fn healthy(&self) -> bool {
        true
    }
}

/// Produces a fixed-length vector for a piece of text.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one text.
    ///
    /// An empty vector is a valid answer meaning "unavailable right now";
    /// callers treat it the same as an error, without the noise.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    /// Short name used in logs and telemetry.
    fn name(&self) -> &'static str;

    /// Cheap reachability probe. Defaults to optimistic.
    async fn healthy(&self) -> bool {
        true
    }
}

/// Maps a non-success HTTP response to [`ProviderError::Status`], keeping
/// whatever body text the service sent for diagnosis.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}
