//! Deterministic provider doubles.
//!
//! Exported unconditionally so integration tests and demos can run the full
//! pipeline offline. [`MockGenerationProvider`] replays scripted replies and
//! records every call; [`MockEmbeddingProvider`] derives a stable
//! pseudo-embedding from the input bytes. Both can be flipped into failure
//! modes to exercise the fallback paths.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{EmbeddingProvider, GenerationProvider};
use crate::error::ProviderError;

/// One recorded `generate` call.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedGeneration {
    pub prompt: String,
    pub system: Option<String>,
}

/// Scripted generation double.
///
/// Replies are consumed front-to-back; once the script runs out, a fixed
/// placeholder is returned so tests never hang on an empty queue.
pub struct MockGenerationProvider {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<RecordedGeneration>>,
    fail: bool,
}

impl MockGenerationProvider {
    pub const DEFAULT_REPLY: &'static str = "mock reply";

    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// Queue replies to return in order.
    pub fn with_replies(replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let provider = Self::new();
        provider
            .replies
            .lock()
            .extend(replies.into_iter().map(Into::into));
        provider
    }

    /// A double whose every call errors.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Everything `generate` has been asked so far, in order.
    pub fn calls(&self) -> Vec<RecordedGeneration> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Default for MockGenerationProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, ProviderError> {
        self.calls.lock().push(RecordedGeneration {
            prompt: prompt.to_string(),
            system: system.map(str::to_string),
        });
        if self.fail {
            return Err(ProviderError::Unavailable("mock generation failure".into()));
        }
        Ok(self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Self::DEFAULT_REPLY.to_string()))
    }

    fn name(&self) -> &'static str {
        "mock-generation"
    }

    async fn healthy(&self) -> bool {
        !self.fail
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EmbedBehavior {
    /// Deterministic pseudo-embeddings.
    Normal,
    /// Reachable but always answers with an empty vector.
    Empty,
    /// Every call errors.
    Fail,
}

/// Deterministic embedding double.
pub struct MockEmbeddingProvider {
    dimensions: usize,
    behavior: EmbedBehavior,
    calls: AtomicUsize,
}

impl MockEmbeddingProvider {
    pub const DEFAULT_DIMENSIONS: usize = 32;

    pub fn new() -> Self {
        Self::with_dimensions(Self::DEFAULT_DIMENSIONS)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            behavior: EmbedBehavior::Normal,
            calls: AtomicUsize::new(0),
        }
    }

    /// A double that signals "unavailable" via empty vectors.
    pub fn empty() -> Self {
        Self {
            behavior: EmbedBehavior::Empty,
            ..Self::new()
        }
    }

    /// A double whose every call errors.
    pub fn failing() -> Self {
        Self {
            behavior: EmbedBehavior::Fail,
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn pseudo_vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for (position, byte) in text.bytes().enumerate() {
            let slot = (position + byte as usize) % self.dimensions;
            vector[slot] += f32::from(byte) / 255.0;
        }
        let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match self.behavior {
            EmbedBehavior::Normal => Ok(self.pseudo_vector(text)),
            EmbedBehavior::Empty => Ok(Vec::new()),
            EmbedBehavior::Fail => {
                Err(ProviderError::Unavailable("mock embedding failure".into()))
            }
        }
    }

    fn name(&self) -> &'static str {
        "mock-embedding"
    }

    async fn healthy(&self) -> bool {
        self.behavior != EmbedBehavior::Fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_replies_come_back_in_order_then_default() {
        let provider = MockGenerationProvider::with_replies(["first", "second"]);
        assert_eq!(provider.generate("q1", None).await.unwrap(), "first");
        assert_eq!(provider.generate("q2", None).await.unwrap(), "second");
        assert_eq!(
            provider.generate("q3", None).await.unwrap(),
            MockGenerationProvider::DEFAULT_REPLY
        );
    }

    #[tokio::test]
    async fn generation_calls_are_recorded_with_system_prompts() {
        let provider = MockGenerationProvider::new();
        provider
            .generate("what is VDD?", Some("answer from context"))
            .await
            .unwrap();
        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].prompt, "what is VDD?");
        assert_eq!(calls[0].system.as_deref(), Some("answer from context"));
    }

    #[tokio::test]
    async fn failing_generation_errors_and_reports_unhealthy() {
        let provider = MockGenerationProvider::failing();
        assert!(provider.generate("q", None).await.is_err());
        assert!(!provider.healthy().await);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn mock_embeddings_are_deterministic_and_text_sensitive() {
        let provider = MockEmbeddingProvider::new();
        let first = provider.embed("Hello world").await.unwrap();
        let again = provider.embed("Hello world").await.unwrap();
        let other = provider.embed("Goodbye world").await.unwrap();

        assert_eq!(first, again, "identical text should embed identically");
        assert_ne!(first, other, "different text should embed differently");
        assert_eq!(first.len(), MockEmbeddingProvider::DEFAULT_DIMENSIONS);

        let norm = first.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "expected unit norm, got {norm}");
    }

    #[tokio::test]
    async fn empty_mode_signals_unavailable_without_error() {
        let provider = MockEmbeddingProvider::empty();
        assert!(provider.embed("anything").await.unwrap().is_empty());
        assert!(provider.healthy().await);
        assert_eq!(provider.call_count(), 1);
    }
}
