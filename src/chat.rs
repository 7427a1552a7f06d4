//! Grounded chat over one indexed manual.
//!
//! [`ChatService`] wires the whole pipeline together: it builds the
//! knowledge base from a source document, retrieves context for each
//! question, and hands a grounded system prompt to the generation
//! capability. The current base sits behind a
//! `parking_lot::RwLock<Arc<KnowledgeBase>>`; builds swap whole snapshots so
//! queries never observe a half-built index.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::embedder::ChunkEmbedder;
use crate::error::EngineError;
use crate::knowledge::{KnowledgeBase, KnowledgeBaseBuilder, KnowledgeBaseStats};
use crate::providers::{EmbeddingProvider, GenerationProvider};
use crate::retriever::{Retriever, SearchResult};
use crate::segmenter::SemanticSegmenter;
use crate::source::SourceDocument;

/// Reply when the knowledge base has not finished building.
pub const STILL_PROCESSING_REPLY: &str =
    "The manual is still being indexed. Please try again in a moment.";

/// Reply when the generation capability is absent or fails.
pub const GENERATION_FAILED_REPLY: &str =
    "I could not generate an answer just now. Please try again.";

/// Context placeholder when retrieval finds nothing.
pub const NO_CONTEXT_NOTE: &str = "No matching sections were found in the indexed manual.";

/// Reachability snapshot of the service's moving parts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub generation_reachable: bool,
    pub embedding_reachable: bool,
    pub knowledge_base_ready: bool,
}

/// Assembles a [`ChatService`]; both capabilities are optional.
#[derive(Default)]
pub struct ChatServiceBuilder {
    generation: Option<Arc<dyn GenerationProvider>>,
    embedding: Option<Arc<dyn EmbeddingProvider>>,
    config: Option<EngineConfig>,
}

impl ChatServiceBuilder {
    /// Capability answering questions and annotating segments.
    #[must_use]
    pub fn with_generation_provider(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.generation = Some(provider);
        self
    }

    /// Capability producing embeddings; absent means hash-fallback ingestion
    /// and lexical retrieval.
    #[must_use]
    pub fn with_embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding = Some(provider);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> ChatService {
        let config = self.config.unwrap_or_default();
        let segmenter = SemanticSegmenter::new(self.generation.clone())
            .with_small_text_threshold(config.small_text_threshold);
        let embedder = ChunkEmbedder::new(self.embedding);
        let builder = KnowledgeBaseBuilder::new(segmenter, embedder.clone(), config.clone());
        let session = Uuid::new_v4();
        tracing::debug!(
            %session,
            generation = self.generation.as_ref().map(|p| p.name()).unwrap_or("none"),
            embedding = embedder.provider_name(),
            "chat service assembled"
        );
        ChatService {
            generation: self.generation,
            retriever: Retriever::new(embedder.clone()),
            embedder,
            builder,
            config,
            knowledge: RwLock::new(Arc::new(KnowledgeBase::empty())),
            session,
        }
    }
}

/// Facade over ingestion, retrieval, and grounded generation.
pub struct ChatService {
    generation: Option<Arc<dyn GenerationProvider>>,
    embedder: ChunkEmbedder,
    retriever: Retriever,
    builder: KnowledgeBaseBuilder,
    config: EngineConfig,
    knowledge: RwLock<Arc<KnowledgeBase>>,
    session: Uuid,
}

impl ChatService {
    pub fn builder() -> ChatServiceBuilder {
        ChatServiceBuilder::default()
    }

    /// Session identifier carried in build and chat spans.
    pub fn session(&self) -> Uuid {
        self.session
    }

    fn snapshot(&self) -> Arc<KnowledgeBase> {
        Arc::clone(&self.knowledge.read())
    }

    /// Index `document`, replacing any previous knowledge base.
    ///
    /// The old base is dropped before the build starts, so a failed build
    /// leaves the service not ready rather than serving stale chunks.
    #[tracing::instrument(
        skip(self, document),
        fields(session = %self.session, source = %document.source),
        err
    )]
    pub async fn build_knowledge_base(&self, document: &SourceDocument) -> Result<(), EngineError> {
        *self.knowledge.write() = Arc::new(KnowledgeBase::empty());
        let base = self.builder.build(document).await?;
        tracing::debug!(chunks = base.chunk_count(), "swapping in fresh knowledge base");
        *self.knowledge.write() = Arc::new(base);
        Ok(())
    }

    /// Answer `message` grounded in the indexed manual. Never fails: every
    /// trouble path degrades to a fixed reply.
    #[tracing::instrument(skip(self, message), fields(session = %self.session))]
    pub async fn chat(&self, message: &str) -> String {
        let base = self.snapshot();
        if !base.is_ready() {
            tracing::debug!("chat requested before the knowledge base was ready");
            return STILL_PROCESSING_REPLY.to_string();
        }

        let results = match self
            .retriever
            .search(&base, message, self.config.retrieval_top_k)
            .await
        {
            Ok(results) => results,
            Err(error) => {
                tracing::warn!(%error, "retrieval failed");
                return STILL_PROCESSING_REPLY.to_string();
            }
        };
        tracing::debug!(retrieved = results.len(), "context retrieved");

        let Some(provider) = &self.generation else {
            tracing::warn!("no generation capability wired, returning fixed reply");
            return GENERATION_FAILED_REPLY.to_string();
        };
        let system = grounded_system_prompt(&results);
        match provider.generate(message, Some(&system)).await {
            Ok(reply) => reply,
            Err(error) => {
                tracing::warn!(provider = provider.name(), %error, "generation failed");
                GENERATION_FAILED_REPLY.to_string()
            }
        }
    }

    /// Stats snapshot of the current knowledge base.
    pub fn stats(&self) -> KnowledgeBaseStats {
        self.snapshot().stats()
    }

    /// Probe capability reachability and base readiness.
    pub async fn status(&self) -> ServiceStatus {
        let generation_reachable = match &self.generation {
            Some(provider) => provider.healthy().await,
            None => false,
        };
        ServiceStatus {
            generation_reachable,
            embedding_reachable: self.embedder.healthy().await,
            knowledge_base_ready: self.snapshot().is_ready(),
        }
    }
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("session", &self.session)
            .field(
                "generation",
                &self.generation.as_ref().map(|p| p.name()).unwrap_or("none"),
            )
            .field("embedder", &self.embedder)
            .field("ready", &self.snapshot().is_ready())
            .finish()
    }
}

/// One numbered context block: header with optional page, then topic, type,
/// and key-term lines when present, then the chunk content.
fn context_block(index: usize, result: &SearchResult) -> String {
    let chunk = &result.chunk;
    let mut block = format!("--- Context {} ---", index + 1);
    if let Some(page) = chunk.metadata.page {
        block.push_str(&format!(" (Page {page})"));
    }
    block.push('\n');
    if let Some(topic) = &chunk.metadata.topic {
        block.push_str(&format!("Topic: {topic}\n"));
    }
    if let Some(role) = chunk.metadata.semantic_role {
        block.push_str(&format!("Type: {}\n", role.label()));
    }
    if !chunk.metadata.key_terms.is_empty() {
        block.push_str(&format!("Key Terms: {}\n", chunk.metadata.key_terms.join(", ")));
    }
    block.push_str(&chunk.content);
    block
}

fn assemble_context(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_CONTEXT_NOTE.to_string();
    }
    results
        .iter()
        .enumerate()
        .map(|(index, result)| context_block(index, result))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// System prompt embedding the ranked context verbatim.
fn grounded_system_prompt(results: &[SearchResult]) -> String {
    format!(
        "You are a technical assistant answering questions about one indexed manual.\n\n\
         Context from the manual:\n\n{context}\n\n\
         Ground every answer in the context above. Prefer context whose type matches what \
         the question asks for: definitions for what-is questions, instructions for how-to \
         questions. Cite page numbers when the context names them. When the context does \
         not cover the question, say so plainly instead of guessing.",
        context = assemble_context(results)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ChunkMetadata, DocumentChunk, SemanticRole};
    use crate::providers::{MockEmbeddingProvider, MockGenerationProvider};
    use crate::source::PageRecord;

    fn service_with(generation: Arc<MockGenerationProvider>) -> ChatService {
        ChatService::builder()
            .with_generation_provider(generation)
            .build()
    }

    fn short_manual() -> SourceDocument {
        // Short enough that segmentation never consults the generation
        // capability, keeping scripted replies for the chat turns.
        SourceDocument::new("amp", "Thermal foldback reduces gain when the die heats up.")
    }

    #[tokio::test]
    async fn chat_before_build_skips_generation() {
        let generation = Arc::new(MockGenerationProvider::new());
        let service = service_with(generation.clone());

        let reply = service.chat("what is thermal foldback").await;

        assert_eq!(reply, STILL_PROCESSING_REPLY);
        assert_eq!(generation.call_count(), 0);
    }

    #[tokio::test]
    async fn chat_grounds_the_system_prompt_in_retrieved_context() {
        let generation = Arc::new(MockGenerationProvider::with_replies([
            "Thermal foldback protects the die.",
        ]));
        let service = service_with(generation.clone());

        service.build_knowledge_base(&short_manual()).await.unwrap();
        let reply = service.chat("what is thermal foldback").await;

        assert_eq!(reply, "Thermal foldback protects the die.");
        let calls = generation.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].prompt, "what is thermal foldback");
        let system = calls[0].system.as_deref().unwrap();
        assert!(system.contains("--- Context 1 ---"), "{system}");
        assert!(system.contains("Thermal foldback reduces gain"), "{system}");
    }

    #[tokio::test]
    async fn unmatched_queries_ground_on_the_empty_context_note() {
        let generation = Arc::new(MockGenerationProvider::new());
        let service = service_with(generation.clone());
        service.build_knowledge_base(&short_manual()).await.unwrap();

        service.chat("zzz qqq xxx").await;

        let calls = generation.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].system.as_deref().unwrap().contains(NO_CONTEXT_NOTE));
    }

    #[tokio::test]
    async fn generation_failure_degrades_to_the_fixed_reply() {
        let service = service_with(Arc::new(MockGenerationProvider::failing()));
        service.build_knowledge_base(&short_manual()).await.unwrap();

        let reply = service.chat("what is thermal foldback").await;
        assert_eq!(reply, GENERATION_FAILED_REPLY);
    }

    #[tokio::test]
    async fn missing_generation_capability_degrades_to_the_fixed_reply() {
        let service = ChatService::builder().build();
        service.build_knowledge_base(&short_manual()).await.unwrap();

        let reply = service.chat("what is thermal foldback").await;
        assert_eq!(reply, GENERATION_FAILED_REPLY);
    }

    #[tokio::test]
    async fn failed_build_leaves_the_service_not_ready() {
        let service = ChatService::builder().build();
        service.build_knowledge_base(&short_manual()).await.unwrap();
        assert!(service.stats().initialized);

        let error = service
            .build_knowledge_base(&SourceDocument::new("empty", "   "))
            .await
            .unwrap_err();
        assert!(matches!(error, EngineError::Ingestion(_)));
        assert!(!service.stats().initialized, "stale base must not survive");
        assert_eq!(service.chat("anything").await, STILL_PROCESSING_REPLY);
    }

    #[tokio::test]
    async fn rebuild_replaces_the_previous_base() {
        let service = ChatService::builder().build();
        service.build_knowledge_base(&short_manual()).await.unwrap();
        assert_eq!(service.stats().total_chunks, 1);

        let bigger = SourceDocument::new("amp", "Overview of the amplifier.")
            .with_pages(vec![PageRecord::new(1, "Set the PWR bit before playback.")]);
        service.build_knowledge_base(&bigger).await.unwrap();
        assert_eq!(service.stats().total_chunks, 2);
    }

    #[tokio::test]
    async fn status_reports_capability_reachability() {
        let offline = ChatService::builder().build();
        let status = offline.status().await;
        assert!(!status.generation_reachable);
        assert!(!status.embedding_reachable);
        assert!(!status.knowledge_base_ready);

        let wired = ChatService::builder()
            .with_generation_provider(Arc::new(MockGenerationProvider::new()))
            .with_embedding_provider(Arc::new(MockEmbeddingProvider::new()))
            .build();
        wired.build_knowledge_base(&short_manual()).await.unwrap();
        let status = wired.status().await;
        assert!(status.generation_reachable);
        assert!(status.embedding_reachable);
        assert!(status.knowledge_base_ready);
    }

    #[test]
    fn context_blocks_carry_page_topic_type_and_terms() {
        let mut metadata = ChunkMetadata::text("amp", Some(12));
        metadata.semantic_role = Some(SemanticRole::Specification);
        metadata.topic = Some("Timing".to_string());
        metadata.key_terms = vec!["I2C".to_string(), "400kHz".to_string()];
        let result = SearchResult {
            chunk: DocumentChunk::new("Clock high time is 0.6us minimum.", metadata, 0),
            score: 0.9,
        };

        assert_eq!(
            context_block(0, &result),
            "--- Context 1 --- (Page 12)\n\
             Topic: Timing\n\
             Type: specification\n\
             Key Terms: I2C, 400kHz\n\
             Clock high time is 0.6us minimum."
        );
    }

    #[test]
    fn bare_chunks_render_header_and_content_only() {
        let result = SearchResult {
            chunk: DocumentChunk::new("Plain content.", ChunkMetadata::text("amp", None), 3),
            score: 0.1,
        };
        assert_eq!(context_block(1, &result), "--- Context 2 ---\nPlain content.");
    }

    #[test]
    fn empty_result_sets_use_the_placeholder_note() {
        assert_eq!(assemble_context(&[]), NO_CONTEXT_NOTE);
        let prompt = grounded_system_prompt(&[]);
        assert!(prompt.contains(NO_CONTEXT_NOTE));
    }
}
