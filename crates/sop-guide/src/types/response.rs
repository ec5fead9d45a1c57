//! Retrieval results and pipeline outcomes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::Chunk;
use super::image::ImageKind;

/// One chunk selected by the retriever
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    /// Inner product with the query (cosine, vectors are unit-norm)
    pub score: f32,
}

impl RetrievedChunk {
    pub fn label(&self) -> &str {
        self.chunk.source.citation_label()
    }

    pub fn text(&self) -> &str {
        &self.chunk.content
    }
}

/// Chunks in non-increasing score order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub items: Vec<RetrievedChunk>,
}

impl RetrievedContext {
    pub fn new(items: Vec<RetrievedChunk>) -> Self {
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Citations for the HTTP layer
    pub fn sources(&self) -> Vec<SourceRef> {
        self.items
            .iter()
            .map(|item| SourceRef {
                label: item.label().to_string(),
                page_number: item.chunk.source.page_number,
                score: item.score,
                chunk_index: item.chunk.chunk_index,
            })
            .collect()
    }
}

/// Citation returned with an answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceRef {
    pub label: String,
    pub page_number: Option<u32>,
    pub score: f32,
    pub chunk_index: u32,
}

/// How a pipeline call ended
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatOutcome {
    /// The model answered
    Answered,
    /// Nothing was retrieved; the fixed fallback was returned
    NoContext,
    /// The uploaded image could not be decoded
    InvalidImage,
    /// The model refused on safety grounds
    SafetyBlocked,
    /// The hosted service quota is exhausted
    QuotaExceeded,
    /// Any other failure
    Error,
}

impl ChatOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Answered)
    }
}

/// Answer text plus what produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub outcome: ChatOutcome,
    pub sources: Vec<SourceRef>,
}

impl ChatAnswer {
    /// Fixed text with no citations
    pub fn fixed(answer: impl Into<String>, outcome: ChatOutcome) -> Self {
        Self {
            answer: answer.into(),
            outcome,
            sources: Vec::new(),
        }
    }
}

/// Result of one image analysis, kept by the caller as history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub kind: ImageKind,
    pub label: String,
    pub analysis: String,
    pub outcome: ChatOutcome,
    /// Only present when the analysis succeeded
    pub doctor_questions: Vec<String>,
    pub doctor_tip: Option<String>,
    pub disclaimer: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisReport {
    /// Report carrying only a fixed failure message
    pub fn failed(kind: ImageKind, message: impl Into<String>, outcome: ChatOutcome) -> Self {
        Self {
            kind,
            label: kind.label().to_string(),
            analysis: message.into(),
            outcome,
            doctor_questions: Vec::new(),
            doctor_tip: None,
            disclaimer: None,
            timestamp: Utc::now(),
        }
    }
}
