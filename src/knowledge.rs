//! In-memory knowledge base: chunk store, vector index, ready gate.
//!
//! [`KnowledgeBaseBuilder`] runs the full ingestion pipeline for one
//! document: segment the whole-document text and every page, serialize
//! tables and image references into their own chunks, embed everything with
//! bounded concurrency, and hand back a ready [`KnowledgeBase`]. Queries
//! against a base that never finished building fail fast with
//! [`EngineError::NotReady`].

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::chunk::{ChunkKind, ChunkMetadata, DocumentChunk};
use crate::config::EngineConfig;
use crate::embedder::ChunkEmbedder;
use crate::error::EngineError;
use crate::segmenter::SemanticSegmenter;
use crate::source::{SourceDocument, image_description};

/// Chunks plus their vector index, gated on build completion.
#[derive(Clone, Debug, Default)]
pub struct KnowledgeBase {
    chunks: Vec<DocumentChunk>,
    vector_index: FxHashMap<String, Vec<f32>>,
    dimensions: Option<usize>,
    ready: bool,
    fallback_embeddings: usize,
    built_at: Option<DateTime<Utc>>,
}

impl KnowledgeBase {
    /// A not-ready placeholder. Queries against it fail with
    /// [`EngineError::NotReady`].
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the build pipeline ran to completion.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Fail fast when the base is not ready to answer queries.
    pub fn ensure_ready(&self) -> Result<(), EngineError> {
        if self.ready {
            Ok(())
        } else {
            Err(EngineError::NotReady)
        }
    }

    /// Every chunk, in emission order.
    pub fn chunks(&self) -> &[DocumentChunk] {
        &self.chunks
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// The embedding recorded for a chunk id, if any.
    pub fn vector(&self, id: &str) -> Option<&[f32]> {
        self.vector_index.get(id).map(Vec::as_slice)
    }

    /// Dimensionality fixed by the first recorded vector.
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// How many chunks fell back to the deterministic hash embedding.
    pub fn fallback_embeddings(&self) -> usize {
        self.fallback_embeddings
    }

    /// Snapshot of the base's shape for reporting surfaces.
    pub fn stats(&self) -> KnowledgeBaseStats {
        let mut text_chunks = 0usize;
        let mut table_chunks = 0usize;
        let mut image_chunks = 0usize;
        let mut semantic_roles: BTreeMap<String, usize> = BTreeMap::new();
        let mut chunks_with_topics = 0usize;
        let mut chunks_with_key_terms = 0usize;
        let mut key_term_total = 0usize;

        for chunk in &self.chunks {
            match chunk.metadata.kind {
                ChunkKind::Text => text_chunks += 1,
                ChunkKind::Table => table_chunks += 1,
                ChunkKind::Image => image_chunks += 1,
            }
            let role = chunk
                .metadata
                .semantic_role
                .map(|role| role.label())
                .unwrap_or("unknown");
            *semantic_roles.entry(role.to_string()).or_insert(0) += 1;
            if chunk.metadata.topic.is_some() {
                chunks_with_topics += 1;
            }
            if !chunk.metadata.key_terms.is_empty() {
                chunks_with_key_terms += 1;
                key_term_total += chunk.metadata.key_terms.len();
            }
        }

        let avg_key_terms_per_chunk = if chunks_with_key_terms == 0 {
            0.0
        } else {
            key_term_total as f64 / chunks_with_key_terms as f64
        };

        KnowledgeBaseStats {
            initialized: self.ready,
            total_chunks: self.chunks.len(),
            text_chunks,
            table_chunks,
            image_chunks,
            embeddings_generated: self.vector_index.len(),
            fallback_embeddings: self.fallback_embeddings,
            semantic_roles,
            chunks_with_topics,
            chunks_with_key_terms,
            avg_key_terms_per_chunk,
            built_at: self.built_at,
        }
    }

    /// A ready base assembled directly from parts, bypassing the pipeline.
    #[cfg(test)]
    pub(crate) fn seeded(
        chunks: Vec<DocumentChunk>,
        vectors: Vec<(String, Vec<f32>)>,
    ) -> Self {
        let dimensions = vectors.first().map(|(_, vector)| vector.len());
        Self {
            chunks,
            vector_index: vectors.into_iter().collect(),
            dimensions,
            ready: true,
            fallback_embeddings: 0,
            built_at: Some(Utc::now()),
        }
    }
}

/// Serializable summary of a knowledge base.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseStats {
    pub initialized: bool,
    pub total_chunks: usize,
    pub text_chunks: usize,
    pub table_chunks: usize,
    pub image_chunks: usize,
    pub embeddings_generated: usize,
    pub fallback_embeddings: usize,
    /// Chunk count per role label; chunks without a role count as `unknown`.
    pub semantic_roles: BTreeMap<String, usize>,
    pub chunks_with_topics: usize,
    pub chunks_with_key_terms: usize,
    /// Mean over chunks that carry at least one key term.
    pub avg_key_terms_per_chunk: f64,
    pub built_at: Option<DateTime<Utc>>,
}

/// Runs segmentation and embedding for one document.
#[derive(Clone, Debug)]
pub struct KnowledgeBaseBuilder {
    segmenter: SemanticSegmenter,
    embedder: ChunkEmbedder,
    config: EngineConfig,
}

impl KnowledgeBaseBuilder {
    pub fn new(
        segmenter: SemanticSegmenter,
        embedder: ChunkEmbedder,
        config: EngineConfig,
    ) -> Self {
        Self {
            segmenter,
            embedder,
            config,
        }
    }

    /// Segment, serialize, and embed `document` into a ready base.
    ///
    /// Fails with [`EngineError::Ingestion`] when the document carries no
    /// usable content. Individual embedding failures never abort the build;
    /// they degrade to the hash fallback and are counted.
    #[tracing::instrument(skip(self, document), fields(source = %document.source), err)]
    pub async fn build(&self, document: &SourceDocument) -> Result<KnowledgeBase, EngineError> {
        if !document.has_content() {
            return Err(EngineError::Ingestion(format!(
                "document '{}' has no usable content",
                document.source
            )));
        }

        let started = Instant::now();
        let chunks = self.collect_chunks(document).await;
        if chunks.is_empty() {
            return Err(EngineError::Ingestion(format!(
                "document '{}' produced no chunks",
                document.source
            )));
        }
        tracing::debug!(
            chunks = chunks.len(),
            pages = document.pages.len(),
            "segmentation complete, embedding chunks"
        );

        let total = chunks.len();
        let progress_step = (total / 10).max(1);
        let concurrency = self.config.embed_concurrency.max(1);
        let embedder = &self.embedder;

        let mut jobs = futures_util::stream::iter(chunks.iter().map(|chunk| {
            let id = chunk.id.clone();
            let content = chunk.content.clone();
            async move { (id, embedder.embed(&content).await) }
        }))
        .buffered(concurrency);

        let mut vector_index =
            FxHashMap::with_capacity_and_hasher(total, Default::default());
        let mut dimensions: Option<usize> = None;
        let mut fallback_embeddings = 0usize;
        let mut embedded = 0usize;

        while let Some((id, outcome)) = jobs.next().await {
            embedded += 1;
            if outcome.fallback {
                fallback_embeddings += 1;
            }
            match dimensions {
                None => dimensions = Some(outcome.vector.len()),
                Some(expected) if expected != outcome.vector.len() => {
                    tracing::warn!(
                        chunk = %id,
                        expected,
                        got = outcome.vector.len(),
                        "embedding dimension differs from the rest of the index"
                    );
                }
                Some(_) => {}
            }
            vector_index.insert(id, outcome.vector);
            if embedded % progress_step == 0 || embedded == total {
                tracing::debug!(embedded, total, "embedding progress");
            }
        }
        drop(jobs);

        tracing::info!(
            chunks = total,
            embeddings = vector_index.len(),
            fallback_embeddings,
            provider = self.embedder.provider_name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "knowledge base built"
        );

        Ok(KnowledgeBase {
            chunks,
            vector_index,
            dimensions,
            ready: true,
            fallback_embeddings,
            built_at: Some(Utc::now()),
        })
    }

    /// Chunks for the whole-document text, then per page: text, tables,
    /// image references, in that order.
    async fn collect_chunks(&self, document: &SourceDocument) -> Vec<DocumentChunk> {
        let mut chunks = self
            .segmenter
            .segment(
                &document.text,
                self.config.doc_chunk_budget,
                &document.source,
                None,
            )
            .await;

        for page in &document.pages {
            let page_chunks = self
                .segmenter
                .segment(
                    &page.text,
                    self.config.page_chunk_budget,
                    &document.source,
                    Some(page.number),
                )
                .await;
            chunks.extend(page_chunks);

            for (index, table) in page.tables.iter().enumerate() {
                let rendered = table.render_text();
                if rendered.is_empty() {
                    tracing::warn!(
                        page = page.number,
                        index,
                        "table renders to empty text, skipping"
                    );
                    continue;
                }
                chunks.push(DocumentChunk::new(
                    rendered,
                    ChunkMetadata::table(&document.source, page.number),
                    index,
                ));
            }

            for (index, reference) in page.images.iter().enumerate() {
                chunks.push(DocumentChunk::new(
                    image_description(page.number, index + 1, reference),
                    ChunkMetadata::image(&document.source, page.number),
                    index,
                ));
            }
        }
        chunks
    }
}
