//! Fakes shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::io::Cursor;
use std::sync::Arc;

use sop_guide::config::ChunkingConfig;
use sop_guide::ingestion::TextChunker;
use sop_guide::providers::{EmbeddingProvider, GenerationRequest, GenerativeModel};
use sop_guide::retrieval::{IndexManifest, VectorIndex};
use sop_guide::{Document, Error, QueryPipeline, Result};
use sop_guide::generation::PromptBuilder;

pub const DIMS: usize = 64;

pub const GUIDE_TEXT: &str = "El síndrome de ovario poliquístico se diagnostica con los criterios de Rotterdam.\n\n\
La metformina puede mejorar la resistencia a la insulina en mujeres con SOP.\n\n\
El ejercicio regular y la alimentación equilibrada son la primera línea de tratamiento.\n\n\
La ecografía transvaginal permite contar los folículos antrales de cada ovario.";

/// Bag of words hashed into a fixed number of buckets
pub struct KeywordEmbedder;

impl KeywordEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; DIMS];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 3)
        {
            let bucket = word.bytes().fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
            vector[bucket % DIMS] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vector(text))
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn model(&self) -> &str {
        "keyword-hash"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "test"
    }
}

/// Embedder whose service is always down
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::embedding("connection refused"))
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn model(&self) -> &str {
        "keyword-hash"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "test"
    }
}

/// What the fake model does with every request
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Safety,
    Quota,
    QuotaInMessage,
    Down,
}

/// Generative model that records requests and answers with a fixed reply
pub struct RecordingModel {
    reply: Reply,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl RecordingModel {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn answering(text: &str) -> Arc<Self> {
        Self::new(Reply::Text(text.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl GenerativeModel for RecordingModel {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.lock().push(request.clone());
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Safety => Err(Error::SafetyBlocked("finishReason SAFETY".into())),
            Reply::Quota => Err(Error::QuotaExceeded("RESOURCE_EXHAUSTED".into())),
            Reply::QuotaInMessage => Err(Error::Llm("HTTP 429 Too Many Requests".into())),
            Reply::Down => Err(Error::Llm("connection reset by peer".into())),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "recording"
    }

    fn model(&self) -> &str {
        "fake-flash"
    }
}

pub fn chunking() -> ChunkingConfig {
    ChunkingConfig {
        chunk_size: 120,
        chunk_overlap: 20,
    }
}

/// Index over [`GUIDE_TEXT`] built the way the indexer does
pub async fn guide_index() -> VectorIndex {
    let embedder = KeywordEmbedder;
    let chunking = chunking();
    let chunker = TextChunker::new(chunking.chunk_size, chunking.chunk_overlap).unwrap();
    let page = Document::text("guia_sop.txt", "Guía ESHRE 2023", GUIDE_TEXT);
    let chunks = chunker.chunk_documents(&[page]);
    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let vectors = embedder.embed_batch_normalized(&texts).await.unwrap();
    let manifest = IndexManifest::new(
        "sop_medical_guide",
        embedder.fingerprint(),
        &chunking,
        "guia_sop.txt",
        "abc123",
    );
    VectorIndex::build(chunks, vectors, manifest).unwrap()
}

pub async fn pipeline_with(model: Arc<RecordingModel>) -> QueryPipeline {
    QueryPipeline::new(
        Arc::new(KeywordEmbedder),
        Arc::new(guide_index().await),
        model,
        PromptBuilder::default(),
        2,
    )
}

/// Small valid PNG
pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 120, 180]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
