//! Source document parser (PDF, plain text, Markdown)

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::types::{Document, FileType};

/// Glyph names and ligatures some PDF fonts leak into extracted text
const GLYPH_REPLACEMENTS: &[(&str, &str)] = &[
    ("\u{FB01}", "fi"),
    ("\u{FB02}", "fl"),
    ("\u{FB00}", "ff"),
    ("\u{FB03}", "ffi"),
    ("\u{FB04}", "ffl"),
    ("\u{00A0}", " "),
    ("\u{00AD}", ""),
    ("\u{2010}", "-"),
    ("\u{2011}", "-"),
    ("\u{2022}", "* "),
    ("\u{2026}", "..."),
    ("(uni2010)", "-"),
    ("(uni2022)", "* "),
    ("(uni00A0)", " "),
    ("\0", ""),
];

/// Replace leaked glyphs, trim lines and drop empty ones
#[cfg_attr(not(feature = "pdf"), allow(dead_code))]
fn cleanup_pdf_text(text: &str) -> String {
    let mut result = text.to_string();
    for (glyph, replacement) in GLYPH_REPLACEMENTS {
        if result.contains(glyph) {
            result = result.replace(glyph, replacement);
        }
    }

    result
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A loaded source: one [`Document`] per page plus whole-file metadata
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub filename: String,
    pub file_type: FileType,
    /// SHA-256 of the extracted text, hex encoded
    pub content_hash: String,
    /// Total pages (if applicable)
    pub total_pages: Option<u32>,
    pub pages: Vec<Document>,
}

impl ParsedDocument {
    /// Characters across all pages
    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }
}

/// Source document parser
pub struct FileParser;

impl FileParser {
    /// Parse a file based on its extension, tagging every page with `label`
    pub fn parse(filename: &str, data: &[u8], label: &str) -> Result<ParsedDocument> {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let file_type = FileType::from_extension(&extension);

        if !file_type.is_supported() {
            return Err(Error::UnsupportedFileType(format!(
                "{} ({})",
                extension,
                file_type.display_name()
            )));
        }

        let (pages, total_pages) = match file_type {
            #[cfg(feature = "pdf")]
            FileType::Pdf => Self::parse_pdf(filename, data, label)?,
            FileType::Txt | FileType::Markdown => Self::parse_text(filename, data, label, file_type)?,
            _ => return Err(Error::UnsupportedFileType(extension)),
        };

        let mut hasher = Sha256::new();
        for page in &pages {
            hasher.update(page.text.as_bytes());
        }

        Ok(ParsedDocument {
            filename: filename.to_string(),
            file_type,
            content_hash: hex::encode(hasher.finalize()),
            total_pages,
            pages,
        })
    }

    /// Parse PDF page by page, falling back to whole-document extraction
    #[cfg(feature = "pdf")]
    fn parse_pdf(filename: &str, data: &[u8], label: &str) -> Result<(Vec<Document>, Option<u32>)> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to load PDF: {}", e)))?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let total_pages = Some(page_numbers.len() as u32);

        let mut pages = Vec::with_capacity(page_numbers.len());
        for page_number in &page_numbers {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => {
                    let text = cleanup_pdf_text(&text);
                    if !text.is_empty() {
                        pages.push(Document::new(filename, label, FileType::Pdf, Some(*page_number), text));
                    }
                }
                Err(e) => {
                    tracing::debug!("Could not extract text from page {}: {}", page_number, e);
                }
            }
        }

        if pages.is_empty() {
            tracing::warn!("Per-page extraction produced no text for {}, trying pdf-extract", filename);
            let text = cleanup_pdf_text(&Self::extract_pdf_with_timeout(filename, data)?);
            if text.is_empty() {
                return Err(Error::file_parse(
                    filename,
                    "PDF appears to be image-based or has no extractable text",
                ));
            }
            pages.push(Document::new(filename, label, FileType::Pdf, None, text));
        }

        Ok((pages, total_pages))
    }

    /// Whole-document extraction on a worker thread, bounded so odd fonts cannot hang the indexer
    #[cfg(feature = "pdf")]
    fn extract_pdf_with_timeout(filename: &str, data: &[u8]) -> Result<String> {
        use std::sync::mpsc;
        use std::thread;
        use std::time::Duration;

        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data_vec);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(Duration::from_secs(60)) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(Error::file_parse(filename, format!("pdf-extract failed: {}", e))),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::error!("PDF extraction timeout after 60s for {}", filename);
                Err(Error::file_parse(filename, "PDF extraction timed out"))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(Error::file_parse(filename, "PDF extraction thread crashed"))
            }
        }
    }

    /// Parse plain text or markdown as a single page
    fn parse_text(
        filename: &str,
        data: &[u8],
        label: &str,
        file_type: FileType,
    ) -> Result<(Vec<Document>, Option<u32>)> {
        let content = std::str::from_utf8(data)
            .map_err(|e| Error::file_parse(filename, format!("File is not valid UTF-8: {}", e)))?;

        if content.trim().is_empty() {
            return Err(Error::file_parse(filename, "File is empty"));
        }

        Ok((
            vec![Document::new(filename, label, file_type, None, content)],
            None,
        ))
    }
}
