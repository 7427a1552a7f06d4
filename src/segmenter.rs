//! Semantic segmentation: topic-labeled sections from raw text.
//!
//! [`SemanticSegmenter`] asks the generation capability to partition text
//! into sections annotated with topic, semantic role, and key terms. When no
//! capability is wired, the call fails, or the reply is unusable, a
//! deterministic heuristic takes over: paragraph boundaries become sections,
//! roles come from keyword cues, and key terms are extracted by pattern.
//! Either way, sections larger than the chunk-size budget are re-split on
//! sentence boundaries, so a chunk never ends mid-sentence.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Deserialize;

use crate::chunk::{ChunkMetadata, DocumentChunk, SemanticRole};
use crate::config::EngineConfig;
use crate::providers::GenerationProvider;

/// Upper bound on key terms carried by one chunk.
pub const KEY_TERM_CAP: usize = 10;

const SEGMENTATION_SYSTEM: &str =
    "You are a technical documentation analyzer. Reply with valid JSON only.";

/// Capitalized words that are sentence scaffolding, not technical terms.
const KEY_TERM_STOPWORDS: [&str; 7] = ["The", "This", "That", "When", "Where", "What", "How"];

const DEFINITION_CUES: [&str; 3] = ["is defined as", "refers to", "means"];
const INSTRUCTION_CUES: [&str; 3] = ["should", "must", "follow these steps"];
const SPECIFICATION_CUES: [&str; 3] = ["specification", "requirement", "standard"];
const EXAMPLE_CUES: [&str; 3] = ["example", "for instance", "such as"];
const REFERENCE_CUES: [&str; 3] = ["see", "refer to", "section"];

/// Splits text into topic-labeled semantic chunks.
#[derive(Clone)]
pub struct SemanticSegmenter {
    provider: Option<Arc<dyn GenerationProvider>>,
    small_text_threshold: usize,
}

impl SemanticSegmenter {
    /// Segmenter backed by an optional generation capability.
    pub fn new(provider: Option<Arc<dyn GenerationProvider>>) -> Self {
        Self {
            provider,
            small_text_threshold: EngineConfig::DEFAULT_SMALL_TEXT_THRESHOLD,
        }
    }

    /// Inputs shorter than this become a single `general` chunk.
    #[must_use]
    pub fn with_small_text_threshold(mut self, threshold: usize) -> Self {
        self.small_text_threshold = threshold;
        self
    }

    /// Segment `text` into chunks no larger than `max_chunk_size` characters
    /// where sentence boundaries allow it.
    ///
    /// Whitespace-only input yields nothing. Input below the small-text
    /// threshold yields exactly one `general` chunk with no topic inference,
    /// skipping the model call entirely. Never fails: any trouble on the
    /// model path routes to the heuristic segmentation.
    pub async fn segment(
        &self,
        text: &str,
        max_chunk_size: usize,
        source: &str,
        page: Option<u32>,
    ) -> Vec<DocumentChunk> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        if text.chars().count() < self.small_text_threshold {
            let metadata = ChunkMetadata::text(source, page).with_role(SemanticRole::General);
            return vec![DocumentChunk::new(text, metadata, 0)];
        }

        let sections = match self.model_sections(text).await {
            Some(sections) => sections,
            None => heuristic_sections(text),
        };

        let mut chunks = Vec::new();
        let mut sequence = 0usize;
        for section in sections {
            emit_section(section, max_chunk_size, source, page, &mut sequence, &mut chunks);
        }
        chunks
    }

    /// Ask the generation capability for annotated sections.
    ///
    /// `None` signals "use the heuristic": capability absent, call failed,
    /// reply unparsable, or every parsed section empty.
    async fn model_sections(&self, text: &str) -> Option<Vec<Section>> {
        let provider = self.provider.as_ref()?;
        let reply = match provider
            .generate(&segmentation_prompt(text), Some(SEGMENTATION_SYSTEM))
            .await
        {
            Ok(reply) => reply,
            Err(error) => {
                tracing::debug!(
                    provider = provider.name(),
                    %error,
                    "section analysis failed, falling back to heuristic segmentation"
                );
                return None;
            }
        };
        match parse_sections(&reply) {
            Some(sections) if !sections.is_empty() => {
                tracing::debug!(
                    provider = provider.name(),
                    sections = sections.len(),
                    "model segmentation accepted"
                );
                Some(sections)
            }
            _ => {
                tracing::debug!(
                    provider = provider.name(),
                    "model reply carried no usable sections, falling back to heuristic segmentation"
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for SemanticSegmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticSegmenter")
            .field("provider", &self.provider.as_ref().map(|p| p.name()))
            .field("small_text_threshold", &self.small_text_threshold)
            .finish()
    }
}

/// One annotated section on its way to becoming chunks.
struct Section {
    content: String,
    topic: Option<String>,
    role: Option<SemanticRole>,
    key_terms: Vec<String>,
}

/// Section shape the model is asked to reply with.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSection {
    #[serde(default)]
    content: String,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    semantic_type: Option<String>,
    #[serde(default)]
    key_terms: Vec<String>,
}

fn segmentation_prompt(text: &str) -> String {
    format!(
        "Partition the following technical text into logical sections. For each section \
         report its main topic, its semantic type (definition, instruction, specification, \
         example, reference, or general), and its key technical terms.\n\n\
         Reply with a JSON array shaped like:\n\
         [{{\"content\": \"the section text\", \"topic\": \"short theme\", \
         \"semanticType\": \"general\", \"keyTerms\": [\"term1\", \"term2\"]}}]\n\n\
         Text to analyze:\n{text}"
    )
}

/// Pull the first `[` .. last `]` slice out of a model reply and parse it
/// leniently. Sections whose content trims to nothing are discarded; unknown
/// role labels map to `general`.
fn parse_sections(reply: &str) -> Option<Vec<Section>> {
    let start = reply.find('[')?;
    let end = reply.rfind(']')?;
    if end < start {
        return None;
    }
    let raw: Vec<RawSection> = serde_json::from_str(&reply[start..=end]).ok()?;
    let sections = raw
        .into_iter()
        .filter_map(|section| {
            let content = section.content.trim().to_string();
            if content.is_empty() {
                return None;
            }
            Some(Section {
                content,
                topic: section
                    .topic
                    .map(|topic| topic.trim().to_string())
                    .filter(|topic| !topic.is_empty()),
                role: Some(SemanticRole::from_label(
                    section.semantic_type.as_deref().unwrap_or(""),
                )),
                key_terms: dedup_capped(section.key_terms),
            })
        })
        .collect();
    Some(sections)
}

/// Deterministic fallback: paragraphs become sections, annotated by the
/// keyword heuristics.
fn heuristic_sections(text: &str) -> Vec<Section> {
    paragraph_boundary_regex()
        .split(text)
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .enumerate()
        .map(|(index, paragraph)| Section {
            content: paragraph.to_string(),
            topic: Some(format!("Section {}", index + 1)),
            role: Some(infer_semantic_role(paragraph)),
            key_terms: extract_key_terms(paragraph),
        })
        .collect()
}

/// Turn one section into one or more chunks, splitting oversized sections on
/// sentence boundaries. Sub-chunks inherit the section's topic and role; key
/// terms are re-extracted from the sub-chunk's own sentences.
fn emit_section(
    section: Section,
    max_chunk_size: usize,
    source: &str,
    page: Option<u32>,
    sequence: &mut usize,
    chunks: &mut Vec<DocumentChunk>,
) {
    if section.content.chars().count() <= max_chunk_size {
        let mut metadata = ChunkMetadata::text(source, page);
        metadata.semantic_role = section.role;
        metadata.topic = section.topic;
        metadata.key_terms = section.key_terms;
        chunks.push(DocumentChunk::new(section.content, metadata, *sequence));
        *sequence += 1;
        return;
    }

    for piece in split_on_sentences(&section.content, max_chunk_size) {
        let mut metadata = ChunkMetadata::text(source, page);
        metadata.semantic_role = section.role;
        metadata.topic = section.topic.clone();
        metadata.key_terms = extract_key_terms(&piece);
        chunks.push(DocumentChunk::new(piece, metadata, *sequence));
        *sequence += 1;
    }
}

/// Accumulate sentences until the budget would be exceeded, then flush.
///
/// A single sentence longer than the budget becomes its own oversized piece
/// rather than being cut; the final remainder always flushes.
fn split_on_sentences(content: &str, max_chunk_size: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in content
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
    {
        let sentence_len = sentence.chars().count();
        if !current.is_empty() && current_len + sentence_len + 1 > max_chunk_size {
            pieces.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push_str(". ");
            current_len += 2;
        }
        current.push_str(sentence);
        current_len += sentence_len;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    if pieces.is_empty() {
        // No sentence boundaries survived trimming: keep the section whole
        // rather than dropping it.
        pieces.push(content.to_string());
    }
    pieces
}

/// Keyword inference of a paragraph's rhetorical role, first cue list wins:
/// definition, instruction, specification, example, reference, else general.
fn infer_semantic_role(text: &str) -> SemanticRole {
    let lower = text.to_lowercase();
    if DEFINITION_CUES.iter().any(|cue| lower.contains(cue)) {
        return SemanticRole::Definition;
    }
    if INSTRUCTION_CUES.iter().any(|cue| lower.contains(cue)) {
        return SemanticRole::Instruction;
    }
    if SPECIFICATION_CUES.iter().any(|cue| lower.contains(cue)) {
        return SemanticRole::Specification;
    }
    if EXAMPLE_CUES.iter().any(|cue| lower.contains(cue)) {
        return SemanticRole::Example;
    }
    if REFERENCE_CUES.iter().any(|cue| lower.contains(cue)) {
        return SemanticRole::Reference;
    }
    SemanticRole::General
}

/// Extract salient technical terms: uppercase abbreviations, tokens with
/// digits or hyphen/underscore compounds, then CamelCase words past the
/// stopword filter. Category order is preserved, duplicates dropped, capped
/// at [`KEY_TERM_CAP`].
fn extract_key_terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    terms.extend(
        abbreviation_regex()
            .find_iter(text)
            .map(|found| found.as_str().to_string()),
    );
    terms.extend(
        technical_token_regex()
            .find_iter(text)
            .map(|found| found.as_str().to_string()),
    );
    terms.extend(
        capitalized_term_regex()
            .find_iter(text)
            .map(|found| found.as_str())
            .filter(|word| word.len() > 3 && !KEY_TERM_STOPWORDS.contains(word))
            .map(str::to_string),
    );
    dedup_capped(terms)
}

/// Trim, drop empties and duplicates keeping first occurrence, cap at
/// [`KEY_TERM_CAP`].
fn dedup_capped(terms: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for term in terms {
        let term = term.trim();
        if term.is_empty() || out.iter().any(|seen| seen == term) {
            continue;
        }
        out.push(term.to_string());
        if out.len() == KEY_TERM_CAP {
            break;
        }
    }
    out
}

fn paragraph_boundary_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").unwrap())
}

fn abbreviation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z]{2,6}\b").unwrap())
}

fn technical_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Za-z]*[0-9]+[A-Za-z0-9]*\b|\b[a-z]+[-_][a-z]+\b").unwrap())
}

fn capitalized_term_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z][a-z]+(?:[A-Z][a-z]+)*\b").unwrap())
}
