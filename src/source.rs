//! Ingestion contract: the extracted document handed to the engine.
//!
//! Extraction itself (PDF parsing, OCR) happens upstream; the engine takes
//! already-extracted text plus per-page structure. Tables and images are
//! not indexed as-is: [`TableRecord::render_text`] and [`image_description`]
//! define the text serializations that actually enter the knowledge base.

use serde::{Deserialize, Serialize};

/// A whole extracted document: full text plus per-page records.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Identifier stamped into every chunk id (typically the file name).
    pub source: String,
    /// Full document text, independent of page structure.
    pub text: String,
    /// Per-page records, in page order.
    #[serde(default)]
    pub pages: Vec<PageRecord>,
    /// Optional document-level metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,
}

impl SourceDocument {
    /// Create a document from its identifier and full text.
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
            pages: Vec::new(),
            metadata: None,
        }
    }

    /// Attach per-page records.
    #[must_use]
    pub fn with_pages(mut self, pages: Vec<PageRecord>) -> Self {
        self.pages = pages;
        self
    }

    /// Attach document-level metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// True when the document carries anything worth indexing.
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty()
            || self.pages.iter().any(|page| {
                !page.text.trim().is_empty() || !page.tables.is_empty() || !page.images.is_empty()
            })
    }
}

/// One extracted page: text plus any tables and image references.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// One-based page number.
    pub number: u32,
    /// Text extracted from this page.
    pub text: String,
    /// Tables found on this page, in reading order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<TableRecord>,
    /// Image references (paths or extractor handles), in reading order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl PageRecord {
    /// Create a page record from its number and text.
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
            tables: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Attach tables.
    #[must_use]
    pub fn with_tables(mut self, tables: Vec<TableRecord>) -> Self {
        self.tables = tables;
        self
    }

    /// Attach image references.
    #[must_use]
    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }
}

/// An extracted table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRecord {
    /// Caption, when the extractor found one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Header row, when present.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<String>,
    /// Data rows.
    pub rows: Vec<Vec<String>>,
}

impl TableRecord {
    /// Create a table from its data rows.
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            caption: None,
            headers: Vec::new(),
            rows,
        }
    }

    /// Attach a caption.
    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Attach a header row.
    #[must_use]
    pub fn with_headers(mut self, headers: Vec<String>) -> Self {
        self.headers = headers;
        self
    }

    /// Line-oriented text serialization used for indexing.
    ///
    /// ```text
    /// Table: Pin Configuration
    /// Headers: Pin | Function
    /// Data:
    /// VDD | Power
    /// GND | Ground
    /// ```
    ///
    /// Caption and header lines are omitted when absent; the result is
    /// trimmed, so a table with no content renders as an empty string.
    pub fn render_text(&self) -> String {
        let mut text = String::new();
        if let Some(caption) = &self.caption {
            text.push_str(&format!("Table: {caption}\n"));
        }
        if !self.headers.is_empty() {
            text.push_str(&format!("Headers: {}\n", self.headers.join(" | ")));
        }
        if !self.rows.is_empty() {
            text.push_str("Data:\n");
            for row in &self.rows {
                text.push_str(&row.join(" | "));
                text.push('\n');
            }
        }
        text.trim().to_string()
    }
}

/// Document-level metadata from the extractor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
}

/// Positional description indexed in place of raw image bytes.
///
/// `position` is one-based within the page. The file name is the last path
/// component of the reference, falling back to the reference itself.
pub fn image_description(page: u32, position: usize, reference: &str) -> String {
    let file_name = std::path::Path::new(reference)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| reference.to_string());
    format!("Image on page {page}, position {position}. File: {file_name}")
}
