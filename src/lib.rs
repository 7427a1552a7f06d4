//! Retrieval-augmented question answering over one technical manual.
//!
//! Raw document text is segmented into topic-labeled semantic chunks,
//! embedded, and held in an in-memory knowledge base. Questions retrieve the
//! best-matching chunks and ground a system prompt for the generation
//! capability.
//!
//! ```text
//! SourceDocument ──▶ SemanticSegmenter ──▶ ChunkEmbedder ──▶ KnowledgeBase
//!                                                                 │
//!                       user query ──▶ Retriever ◀────────────────┘
//!                                         │ top-K
//!                                         ▼
//!                                    ChatService ──▶ GenerationProvider
//! ```
//!
//! Remote capabilities are optional. Without an embedding capability,
//! ingestion falls back to deterministic hash embeddings and retrieval to
//! lexical scoring; without a generation capability, segmentation falls back
//! to paragraph heuristics. The whole pipeline runs offline.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use groundsmith::providers::OllamaClient;
//! use groundsmith::{ChatService, EngineConfig, SourceDocument};
//!
//! # async fn run() -> Result<(), groundsmith::EngineError> {
//! let config = EngineConfig::from_env();
//! let ollama = Arc::new(OllamaClient::new(&config.providers)?);
//! let service = ChatService::builder()
//!     .with_generation_provider(ollama.clone())
//!     .with_embedding_provider(ollama)
//!     .with_config(config)
//!     .build();
//!
//! let manual = SourceDocument::new("amp_manual", "…full extracted text…");
//! service.build_knowledge_base(&manual).await?;
//! let answer = service.chat("What is thermal foldback?").await;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod chunk;
pub mod config;
pub mod embedder;
pub mod error;
pub mod knowledge;
pub mod providers;
pub mod retriever;
pub mod segmenter;
pub mod source;

pub use chat::{ChatService, ChatServiceBuilder, ServiceStatus};
pub use chunk::{ChunkKind, ChunkMetadata, DocumentChunk, SemanticRole};
pub use config::{EngineConfig, ProviderSettings};
pub use embedder::{ChunkEmbedder, EmbeddingOutcome, cosine_similarity, hash_embedding};
pub use error::{EngineError, ProviderError};
pub use knowledge::{KnowledgeBase, KnowledgeBaseBuilder, KnowledgeBaseStats};
pub use retriever::{Retriever, SearchResult};
pub use segmenter::SemanticSegmenter;
pub use source::{DocumentMetadata, PageRecord, SourceDocument, TableRecord};
