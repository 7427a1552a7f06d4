//! Chunk model shared by segmentation, indexing, and retrieval.
//!
//! A [`DocumentChunk`] is the unit everything downstream operates on: the
//! segmenter emits them, the knowledge base indexes them, the retriever
//! scores them, and the chat orchestrator renders them into context blocks.

use serde::{Deserialize, Serialize};

/// Structural origin of a chunk within the source document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Flowing prose from the document body or a page.
    Text,
    /// A serialized table.
    Table,
    /// A positional description of an embedded image.
    Image,
}

impl ChunkKind {
    /// Lowercase label used in ids, stats, and prompt rendering.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Table => "table",
            Self::Image => "image",
        }
    }
}

/// Rhetorical role of a chunk's content.
///
/// Assigned by the LLM segmentation pass or inferred heuristically; unknown
/// labels coming back from a model are mapped to [`SemanticRole::General`]
/// rather than rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticRole {
    /// Explains what something is.
    Definition,
    /// Tells the reader how to do something.
    Instruction,
    /// States requirements, limits, or ranges.
    Specification,
    /// Illustrates usage with a concrete case.
    Example,
    /// Points at other material.
    Reference,
    /// Anything else.
    General,
}

impl SemanticRole {
    /// Lowercase label as it appears in prompts and stats.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Definition => "definition",
            Self::Instruction => "instruction",
            Self::Specification => "specification",
            Self::Example => "example",
            Self::Reference => "reference",
            Self::General => "general",
        }
    }

    /// Lenient parse: case-insensitive, anything unrecognized is `General`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "definition" => Self::Definition,
            "instruction" => Self::Instruction,
            "specification" => Self::Specification,
            "example" => Self::Example,
            "reference" => Self::Reference,
            _ => Self::General,
        }
    }
}

impl std::fmt::Display for SemanticRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Descriptive metadata carried by every chunk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Identifier of the originating document.
    pub source: String,
    /// One-based page number, when the chunk came from a specific page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Structural origin.
    pub kind: ChunkKind,
    /// Rhetorical role, when one was assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_role: Option<SemanticRole>,
    /// Short human-readable theme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Salient terms: deduplicated, insertion-ordered, at most ten.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_terms: Vec<String>,
}

impl ChunkMetadata {
    /// Metadata for plain text with nothing inferred yet.
    pub fn text(source: impl Into<String>, page: Option<u32>) -> Self {
        Self {
            source: source.into(),
            page,
            kind: ChunkKind::Text,
            semantic_role: None,
            topic: None,
            key_terms: Vec::new(),
        }
    }

    /// Metadata for a serialized table. Table chunks carry no semantic role.
    pub fn table(source: impl Into<String>, page: u32) -> Self {
        Self {
            source: source.into(),
            page: Some(page),
            kind: ChunkKind::Table,
            semantic_role: None,
            topic: None,
            key_terms: Vec::new(),
        }
    }

    /// Metadata for an image description. Image chunks carry no semantic role.
    pub fn image(source: impl Into<String>, page: u32) -> Self {
        Self {
            source: source.into(),
            page: Some(page),
            kind: ChunkKind::Image,
            semantic_role: None,
            topic: None,
            key_terms: Vec::new(),
        }
    }

    /// Set the rhetorical role.
    #[must_use]
    pub fn with_role(mut self, role: SemanticRole) -> Self {
        self.semantic_role = Some(role);
        self
    }

    /// Set the topic.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Set the key terms.
    #[must_use]
    pub fn with_key_terms(mut self, key_terms: Vec<String>) -> Self {
        self.key_terms = key_terms;
        self
    }
}

/// A semantic chunk of the source document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Unique within one knowledge base; see [`DocumentChunk::id_for`].
    pub id: String,
    /// The chunk text. Non-empty after trimming.
    pub content: String,
    /// Descriptive metadata.
    pub metadata: ChunkMetadata,
}

impl DocumentChunk {
    /// Create a chunk, deriving its id from source, page, kind, and sequence.
    pub fn new(content: impl Into<String>, metadata: ChunkMetadata, sequence: usize) -> Self {
        let id = Self::id_for(&metadata.source, metadata.page, metadata.kind, sequence);
        Self {
            id,
            content: content.into(),
            metadata,
        }
    }

    /// Canonical id scheme: `{source}_page_{page|0}_{tag}_{seq}`.
    ///
    /// The tag is `chunk` for text and the kind label otherwise, so text ids
    /// read `manual_page_2_chunk_0` and table ids `manual_page_2_table_0`.
    pub fn id_for(source: &str, page: Option<u32>, kind: ChunkKind, sequence: usize) -> String {
        let tag = match kind {
            ChunkKind::Text => "chunk",
            other => other.label(),
        };
        format!("{source}_page_{}_{tag}_{sequence}", page.unwrap_or(0))
    }

    /// One-based page number, when known.
    pub fn page(&self) -> Option<u32> {
        self.metadata.page
    }
}
