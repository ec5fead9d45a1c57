//! Text chunking with exact overlap and natural split points

use unicode_segmentation::UnicodeSegmentation;

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkSource, Document};

/// Kind of boundary a chunk was cut at, highest preference first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SplitKind {
    Paragraph,
    Line,
    Sentence,
    Word,
    Character,
}

/// A slice of the input text, positions in characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub content: String,
    pub char_start: usize,
    pub char_end: usize,
}

/// Text chunker with configurable size and overlap.
///
/// Consecutive spans share exactly `overlap` characters and no span is longer
/// than `max_chars`, so the input is recoverable with [`reconstruct`].
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    max_chars: usize,
    /// Overlap between chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(max_chars: usize, overlap: usize) -> Result<Self> {
        if max_chars == 0 {
            return Err(Error::Config("chunk size must be positive".into()));
        }
        if overlap >= max_chars {
            return Err(Error::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, max_chars
            )));
        }
        Ok(Self { max_chars, overlap })
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split text into overlapping spans
    pub fn split(&self, text: &str) -> Vec<TextSpan> {
        // Byte offset of every char, plus the end of the text
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let n = offsets.len() - 1;

        let mut spans = Vec::new();
        let mut start = 0usize;

        while start < n {
            let window_end = (start + self.max_chars).min(n);
            let end = if window_end == n {
                n
            } else {
                let lo = start + self.overlap;
                let (split, _) = self.find_split(&text[offsets[lo]..offsets[window_end]], lo, window_end);
                split
            };

            spans.push(TextSpan {
                content: text[offsets[start]..offsets[end]].to_string(),
                char_start: start,
                char_end: end,
            });

            if end == n {
                break;
            }
            start = end - self.overlap;
        }

        spans
    }

    /// Last split point inside `window`, which spans chars `(lo, hi]`.
    ///
    /// Returned positions are always greater than `lo`, so the loop advances.
    fn find_split(&self, window: &str, lo: usize, hi: usize) -> (usize, SplitKind) {
        let at = |byte: usize| lo + window[..byte].chars().count();

        if let Some(i) = window.rfind("\n\n") {
            return (at(i + 2), SplitKind::Paragraph);
        }
        if let Some(i) = window.rfind('\n') {
            return (at(i + 1), SplitKind::Line);
        }
        if let Some((i, _)) = window
            .split_sentence_bound_indices()
            .filter(|(i, _)| *i > 0)
            .last()
        {
            return (at(i), SplitKind::Sentence);
        }
        if let Some(end) = window
            .split_word_bound_indices()
            .filter(|(_, w)| w.chars().all(char::is_whitespace))
            .map(|(i, w)| i + w.len())
            .last()
        {
            return (at(end), SplitKind::Word);
        }
        (hi, SplitKind::Character)
    }

    /// Chunk one document page, numbering chunks from `first_index`
    pub fn chunk_document(&self, doc: &Document, first_index: u32) -> Vec<Chunk> {
        let source = ChunkSource {
            label: doc.label.clone(),
            filename: doc.filename.clone(),
            page_number: doc.page_number,
        };

        self.split(&doc.text)
            .into_iter()
            .enumerate()
            .map(|(i, span)| {
                Chunk::new(
                    doc.id,
                    span.content,
                    source.clone(),
                    span.char_start,
                    span.char_end,
                    first_index + i as u32,
                )
            })
            .collect()
    }

    /// Chunk every page in order; blank pages produce nothing
    pub fn chunk_documents(&self, pages: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for page in pages {
            if page.text.trim().is_empty() {
                tracing::debug!("Skipping blank page {:?} of {}", page.page_number, page.filename);
                continue;
            }
            let page_chunks = self.chunk_document(page, chunks.len() as u32);
            tracing::debug!(
                "Page {:?}: {} chunks",
                page.page_number,
                page_chunks.len()
            );
            chunks.extend(page_chunks);
        }
        chunks
    }
}

/// Rebuild the original text from consecutive spans produced with `overlap`
pub fn reconstruct<S: AsRef<str>>(spans: &[S], overlap: usize) -> String {
    let mut out = String::new();
    for (i, span) in spans.iter().enumerate() {
        let span = span.as_ref();
        if i == 0 {
            out.push_str(span);
        } else {
            out.extend(span.chars().skip(overlap));
        }
    }
    out
}
