//! Error taxonomy for the engine.
//!
//! Two layers: [`ProviderError`] covers failures talking to remote
//! capabilities (generation, embedding), [`EngineError`] covers the engine
//! surface itself. Capability failures inside ingestion and chat are caught
//! and degraded per the fallback rules; they only surface from APIs that
//! are documented to return them.

use thiserror::Error;

/// Errors from a remote capability (generation or embedding service).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level failure: connection refused, DNS, timeout.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success HTTP status.
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The service answered 2xx but the payload was not the expected shape.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// The capability is not configured or reported itself unavailable.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Fatal errors on the engine surface.
///
/// Recoverable conditions (a single chunk failing to embed remotely, a
/// segmentation call returning garbage) never become an `EngineError`;
/// they route to the deterministic fallbacks instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A query arrived before a knowledge base finished building.
    #[error("knowledge base not initialized: build must complete before querying")]
    NotReady,

    /// Document ingestion cannot produce a usable knowledge base.
    #[error("ingestion failed: {0}")]
    Ingestion(String),

    /// A provider error surfaced through an API documented to raise it.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
