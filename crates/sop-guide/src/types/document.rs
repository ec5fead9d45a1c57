//! Document and chunk types with source tracking for citations

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Supported source document types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        match self {
            Self::Pdf => cfg!(feature = "pdf"),
            Self::Txt | Self::Markdown => true,
            Self::Unknown => false,
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Pdf => "PDF",
            Self::Txt => "Text File",
            Self::Markdown => "Markdown",
            Self::Unknown => "Unknown",
        }
    }
}

/// One page of a loaded source document.
///
/// Pages are the unit the indexer chunks; plain-text files load as a single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Original filename
    pub filename: String,
    /// Citation label shown next to retrieved text
    pub label: String,
    /// File type
    pub file_type: FileType,
    /// Page number (1-indexed) for paginated sources
    pub page_number: Option<u32>,
    /// Text content
    pub text: String,
}

impl Document {
    /// Create a document page
    pub fn new(
        filename: impl Into<String>,
        label: impl Into<String>,
        file_type: FileType,
        page_number: Option<u32>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            label: label.into(),
            file_type,
            page_number,
            text: text.into(),
        }
    }

    /// Create a single-page plain text document
    pub fn text(filename: impl Into<String>, label: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(filename, label, FileType::Txt, None, text)
    }
}

/// Source information for a chunk (used for citations)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkSource {
    /// Citation label (e.g. "Guía ESHRE 2023"); empty when the source carried none
    #[serde(default)]
    pub label: String,
    /// Original filename
    pub filename: String,
    /// Page number (1-indexed)
    pub page_number: Option<u32>,
}

impl ChunkSource {
    /// Label used when the chunk carries none
    pub const DEFAULT_LABEL: &'static str = "Guía médica";

    /// Citation label, falling back to the generic placeholder
    pub fn citation_label(&self) -> &str {
        let label = self.label.trim();
        if label.is_empty() {
            Self::DEFAULT_LABEL
        } else {
            label
        }
    }

    /// Format source for display
    pub fn format_citation(&self) -> String {
        let mut parts = vec![self.citation_label().to_string()];

        if let Some(page) = self.page_number {
            parts.push(format!("Página {}", page));
        }

        parts.join(", ")
    }
}

/// A contiguous slice of a document page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Text content, verbatim from the source
    pub content: String,
    /// Source information for citations
    pub source: ChunkSource,
    /// Character position in the page (Unicode scalar values)
    pub char_start: usize,
    pub char_end: usize,
    /// Sequence position within the whole indexed document
    pub chunk_index: u32,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(
        document_id: Uuid,
        content: String,
        source: ChunkSource,
        char_start: usize,
        char_end: usize,
        chunk_index: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content,
            source,
            char_start,
            char_end,
            chunk_index,
        }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }
}
