//! Embedding with a deterministic fallback.
//!
//! [`ChunkEmbedder`] is the one place that decides between the remote
//! capability and the hash scheme. Ingestion calls [`ChunkEmbedder::embed`],
//! which never fails: any remote problem routes that one chunk to
//! [`hash_embedding`] and ingestion keeps going. Queries call
//! [`ChunkEmbedder::embed_query`], which is remote-only; when it yields
//! nothing the retriever switches to lexical scoring instead of comparing a
//! hash vector against remote-provenance chunk vectors.

use std::sync::Arc;

use crate::providers::EmbeddingProvider;

/// Dimensionality of the deterministic fallback scheme.
pub const FALLBACK_DIMENSIONS: usize = 384;

/// The vector produced for one text, and which path produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddingOutcome {
    pub vector: Vec<f32>,
    /// True when the deterministic scheme produced the vector.
    pub fallback: bool,
}

/// Adapter holding the remote-vs-fallback policy.
#[derive(Clone)]
pub struct ChunkEmbedder {
    provider: Option<Arc<dyn EmbeddingProvider>>,
}

impl std::fmt::Debug for ChunkEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkEmbedder")
            .field("provider", &self.provider_name())
            .finish()
    }
}

impl ChunkEmbedder {
    pub fn new(provider: Option<Arc<dyn EmbeddingProvider>>) -> Self {
        Self { provider }
    }

    /// Name of the active path, for logs.
    pub fn provider_name(&self) -> &'static str {
        self.provider
            .as_ref()
            .map(|provider| provider.name())
            .unwrap_or("hash-fallback")
    }

    /// Embed one chunk. Never fails; remote trouble means hash fallback.
    pub async fn embed(&self, text: &str) -> EmbeddingOutcome {
        if let Some(provider) = &self.provider {
            match provider.embed(text).await {
                Ok(vector) if !vector.is_empty() => {
                    return EmbeddingOutcome {
                        vector,
                        fallback: false,
                    };
                }
                Ok(_) => {
                    tracing::debug!(
                        provider = provider.name(),
                        "remote embedding came back empty, using hash fallback"
                    );
                }
                Err(error) => {
                    tracing::debug!(
                        provider = provider.name(),
                        %error,
                        "remote embedding failed, using hash fallback"
                    );
                }
            }
        }
        EmbeddingOutcome {
            vector: hash_embedding(text),
            fallback: true,
        }
    }

    /// Embed a query via the remote capability only.
    ///
    /// `None` when the capability is absent, errored, or answered empty.
    pub async fn embed_query(&self, text: &str) -> Option<Vec<f32>> {
        let provider = self.provider.as_ref()?;
        match provider.embed(text).await {
            Ok(vector) if !vector.is_empty() => Some(vector),
            Ok(_) => None,
            Err(error) => {
                tracing::debug!(
                    provider = provider.name(),
                    %error,
                    "query embedding failed, retrieval falls back to lexical scoring"
                );
                None
            }
        }
    }

    /// Reachability of the remote capability. False when none is wired.
    pub async fn healthy(&self) -> bool {
        match &self.provider {
            Some(provider) => provider.healthy().await,
            None => false,
        }
    }
}

/// Deterministic 384-dimension embedding.
///
/// Lowercases, tokenizes on whitespace, folds each token through a 32-bit
/// rolling hash (`h = h * 31 + char`, wrapping), scatters `+1` into
/// `|h| % 384`, then L2-normalizes. Inputs with no tokens come back as the
/// all-zero vector, left unnormalized.
pub fn hash_embedding(text: &str) -> Vec<f32> {
    let mut embedding = vec![0.0f32; FALLBACK_DIMENSIONS];
    for token in text.to_lowercase().split_whitespace() {
        let mut hash: i32 = 0;
        for ch in token.chars() {
            hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(ch as i32);
        }
        let index = hash.unsigned_abs() as usize % FALLBACK_DIMENSIONS;
        embedding[index] += 1.0;
    }
    let norm = embedding.iter().map(|value| value * value).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut embedding {
            *value /= norm;
        }
    }
    embedding
}

/// Cosine similarity, `0.0` on dimension mismatch or zero-norm input.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
