//! Top-K retrieval: cosine similarity with a lexical fallback.
//!
//! The vector path runs whenever the query embeds remotely. Without a usable
//! query embedding the [`Retriever`] falls back to lexical scoring, which
//! weighs exact-phrase hits, topic and key-term matches, and agreement
//! between the query's intent and a chunk's semantic role.

use serde::{Deserialize, Serialize};

use crate::chunk::{DocumentChunk, SemanticRole};
use crate::embedder::{ChunkEmbedder, cosine_similarity};
use crate::error::EngineError;
use crate::knowledge::KnowledgeBase;

/// Bonus when the whole query appears verbatim in the chunk content.
pub const PHRASE_MATCH_WEIGHT: f32 = 10.0;
/// Bonus when the chunk's semantic role matches a detected query intent.
pub const INTENT_MATCH_WEIGHT: f32 = 8.0;
/// Bonus per query token contained in the chunk topic.
pub const TOPIC_MATCH_WEIGHT: f32 = 5.0;
/// Bonus per key term in a mutual-substring relation with a query token.
pub const KEY_TERM_MATCH_WEIGHT: f32 = 3.0;
/// Raw lexical scores divide by this before capping at 1.0.
pub const LEXICAL_SCALE: f32 = 100.0;

const DEFINITION_INTENT_CUES: [&str; 3] = ["what is", "define", "definition"];
const INSTRUCTION_INTENT_CUES: [&str; 3] = ["how to", "procedure", "steps"];
const SPECIFICATION_INTENT_CUES: [&str; 3] = ["spec", "requirement", "standard"];
const EXAMPLE_INTENT_CUES: [&str; 2] = ["example", "sample"];

/// One ranked chunk. Scores always land in `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Ranks knowledge-base chunks against a query.
#[derive(Clone, Debug)]
pub struct Retriever {
    embedder: ChunkEmbedder,
}

impl Retriever {
    pub fn new(embedder: ChunkEmbedder) -> Self {
        Self { embedder }
    }

    /// The `top_k` best-matching chunks, best first.
    ///
    /// Fails only when `base` is not ready. An empty result set is a valid
    /// answer. Ties rank in chunk emission order.
    #[tracing::instrument(skip(self, base), err)]
    pub async fn search(
        &self,
        base: &KnowledgeBase,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, EngineError> {
        base.ensure_ready()?;

        match self.embedder.embed_query(query).await {
            Some(vector) if !vector.is_empty() => {
                let results = vector_search(base, &vector, top_k);
                tracing::debug!(results = results.len(), top_k, "vector search complete");
                Ok(results)
            }
            _ => {
                tracing::debug!("no usable query embedding, scoring lexically");
                let results = lexical_search(base, query, top_k);
                tracing::debug!(results = results.len(), top_k, "lexical search complete");
                Ok(results)
            }
        }
    }
}

/// Rank every indexed chunk by cosine similarity, then clamp scores onto the
/// `[0, 1]` result surface.
fn vector_search(base: &KnowledgeBase, query_vector: &[f32], top_k: usize) -> Vec<SearchResult> {
    let mut scored: Vec<(f32, &DocumentChunk)> = base
        .chunks()
        .iter()
        .filter_map(|chunk| {
            base.vector(&chunk.id)
                .map(|vector| (cosine_similarity(query_vector, vector), chunk))
        })
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.truncate(top_k);
    scored
        .into_iter()
        .map(|(score, chunk)| SearchResult {
            chunk: chunk.clone(),
            score: score.clamp(0.0, 1.0),
        })
        .collect()
}

/// Score chunks by token occurrences plus phrase, topic, key-term, and
/// intent bonuses. Chunks with zero raw score never appear in the results.
fn lexical_search(base: &KnowledgeBase, query: &str, top_k: usize) -> Vec<SearchResult> {
    let query_lower = query.to_lowercase();
    let query_phrase = query_lower.trim();
    let tokens: Vec<&str> = query_phrase.split_whitespace().collect();
    let intents = query_intents(query_phrase);

    let mut scored: Vec<(f32, &DocumentChunk)> = base
        .chunks()
        .iter()
        .filter_map(|chunk| {
            let raw = lexical_score(chunk, query_phrase, &tokens, &intents);
            (raw > 0.0).then(|| ((raw / LEXICAL_SCALE).min(1.0), chunk))
        })
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.truncate(top_k);
    scored
        .into_iter()
        .map(|(score, chunk)| SearchResult {
            chunk: chunk.clone(),
            score,
        })
        .collect()
}

fn lexical_score(
    chunk: &DocumentChunk,
    query_phrase: &str,
    tokens: &[&str],
    intents: &[SemanticRole],
) -> f32 {
    let content = chunk.content.to_lowercase();
    let mut raw = 0.0f32;

    // Non-overlapping literal occurrences of each token.
    for token in tokens {
        raw += content.matches(token).count() as f32;
    }
    if !query_phrase.is_empty() && content.contains(query_phrase) {
        raw += PHRASE_MATCH_WEIGHT;
    }
    if let Some(topic) = &chunk.metadata.topic {
        let topic = topic.to_lowercase();
        for token in tokens {
            if topic.contains(token) {
                raw += TOPIC_MATCH_WEIGHT;
            }
        }
    }
    for term in &chunk.metadata.key_terms {
        let term = term.to_lowercase();
        if tokens
            .iter()
            .any(|token| term.contains(token) || token.contains(term.as_str()))
        {
            raw += KEY_TERM_MATCH_WEIGHT;
        }
    }
    if let Some(role) = chunk.metadata.semantic_role {
        if intents.contains(&role) {
            raw += INTENT_MATCH_WEIGHT;
        }
    }
    raw
}

/// Every semantic role the query's phrasing asks for. Cue categories fire
/// independently, so one query can carry several intents at once.
/// Expects lowercase input.
fn query_intents(query: &str) -> Vec<SemanticRole> {
    let mut intents = Vec::new();
    if DEFINITION_INTENT_CUES.iter().any(|cue| query.contains(cue)) {
        intents.push(SemanticRole::Definition);
    }
    if INSTRUCTION_INTENT_CUES.iter().any(|cue| query.contains(cue)) {
        intents.push(SemanticRole::Instruction);
    }
    if SPECIFICATION_INTENT_CUES.iter().any(|cue| query.contains(cue)) {
        intents.push(SemanticRole::Specification);
    }
    if EXAMPLE_INTENT_CUES.iter().any(|cue| query.contains(cue)) {
        intents.push(SemanticRole::Example);
    }
    intents
}
