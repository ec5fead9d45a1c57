//! Online query pipeline: retrieve, assemble, generate, post-process
//!
//! Every public entry point returns displayable text. Failures below startup
//! are logged and replaced by fixed user-facing messages.

use bytes::Bytes;
use chrono::{Local, Utc};
use std::sync::Arc;
use std::time::Instant;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::templates::{IMAGE_DECODE_MESSAGE, IMAGE_DISCLAIMER, NO_CONTEXT_FALLBACK};
use crate::generation::{add_guideline_footer, FailureKind, PromptBuilder, TEMPLATE_VERSION};
use crate::providers::{
    embedder_from_config, model_from_config, EmbeddingProvider, GenerationRequest, GenerativeModel,
    InlineImage,
};
use crate::retrieval::{Retriever, VectorIndex};
use crate::types::{AnalysisReport, ChatAnswer, ChatOutcome, ImageKind, Turn};

/// Reachability of the hosted services
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ServiceHealth {
    pub embedder: bool,
    pub model: bool,
}

/// Query pipeline shared by the HTTP server and the terminal chat
pub struct QueryPipeline {
    retriever: Retriever,
    embedder: Arc<dyn EmbeddingProvider>,
    model: Arc<dyn GenerativeModel>,
    prompts: PromptBuilder,
    top_k: usize,
}

impl QueryPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<VectorIndex>,
        model: Arc<dyn GenerativeModel>,
        prompts: PromptBuilder,
        top_k: usize,
    ) -> Self {
        Self {
            retriever: Retriever::new(embedder.clone(), index),
            embedder,
            model,
            prompts,
            top_k,
        }
    }

    /// Build providers from configuration and load the persisted index.
    ///
    /// Fails when the credential is missing or the index is absent or was
    /// built with another embedding model.
    pub fn load(config: &RagConfig, api_key: &str) -> Result<Self> {
        let embedder = embedder_from_config(config, api_key)?;
        let index = VectorIndex::load(&config.index.path, &embedder.fingerprint())?;
        if index.is_empty() {
            tracing::warn!("Index at {} has no entries; every answer will be the fallback", config.index.path.display());
        }
        let model = model_from_config(config, api_key)?;
        let prompts = PromptBuilder::from_config(&config.generation, config.conversation.history_window)?;

        tracing::info!(
            "Query pipeline ready (top_k {}, templates {})",
            config.retrieval.top_k,
            TEMPLATE_VERSION
        );

        Ok(Self::new(embedder, Arc::new(index), model, prompts, config.retrieval.top_k))
    }

    pub fn index(&self) -> &VectorIndex {
        self.retriever.index()
    }

    /// Answer a question grounded on the guideline. Never fails.
    pub async fn answer(&self, query: &str, history: &[Turn]) -> String {
        self.answer_detailed(query, history).await.answer
    }

    /// Answer plus outcome and citations
    pub async fn answer_detailed(&self, query: &str, history: &[Turn]) -> ChatAnswer {
        let started = Instant::now();

        let context = match self.retriever.search(query, self.top_k).await {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!("Retrieval failed, answering without grounding: {}", e);
                Default::default()
            }
        };

        if context.is_empty() {
            tracing::info!("No context retrieved, returning fallback");
            return ChatAnswer::fixed(NO_CONTEXT_FALLBACK, ChatOutcome::NoContext);
        }

        let prompt = self
            .prompts
            .build_answer_prompt(&context, history, query, Local::now().date_naive());

        let answer = match self.model.generate(&GenerationRequest::text(prompt)).await {
            Ok(text) => ChatAnswer {
                answer: add_guideline_footer(text),
                outcome: ChatOutcome::Answered,
                sources: context.sources(),
            },
            Err(e) => {
                let kind = FailureKind::classify(&e);
                tracing::warn!("Generation failed ({:?}): {}", kind, e);
                ChatAnswer::fixed(kind.user_message(), kind.outcome())
            }
        };

        tracing::info!(
            "Answered in {}ms ({:?}, {} chunks)",
            started.elapsed().as_millis(),
            answer.outcome,
            context.len()
        );
        answer
    }

    /// Educational analysis of an uploaded image. Never fails.
    pub async fn analyze_image(&self, data: &[u8], kind: ImageKind) -> String {
        self.analyze_image_detailed(Bytes::copy_from_slice(data), kind)
            .await
            .analysis
    }

    /// Analysis plus follow-up questions and disclaimer
    pub async fn analyze_image_detailed(&self, data: Bytes, kind: ImageKind) -> AnalysisReport {
        let started = Instant::now();

        let decode_input = data.clone();
        let mime_type = match tokio::task::spawn_blocking(move || validate_image(&decode_input)).await {
            Ok(Ok(mime)) => mime,
            Ok(Err(e)) => {
                tracing::warn!("Rejected {} image: {}", kind, e);
                return AnalysisReport::failed(kind, IMAGE_DECODE_MESSAGE, ChatOutcome::InvalidImage);
            }
            Err(e) => {
                tracing::error!("Image validation task failed: {}", e);
                return AnalysisReport::failed(kind, FailureKind::Generic.user_message(), ChatOutcome::Error);
            }
        };

        let request = GenerationRequest::with_image(
            PromptBuilder::build_image_prompt(kind),
            InlineImage {
                mime_type: mime_type.to_string(),
                data,
            },
        );

        let report = match self.model.generate(&request).await {
            Ok(analysis) => AnalysisReport {
                kind,
                label: kind.label().to_string(),
                analysis,
                outcome: ChatOutcome::Answered,
                doctor_questions: kind.doctor_questions().iter().map(|q| q.to_string()).collect(),
                doctor_tip: Some(kind.doctor_tip().to_string()),
                disclaimer: Some(IMAGE_DISCLAIMER.to_string()),
                timestamp: Utc::now(),
            },
            Err(e) => {
                let failure = FailureKind::classify(&e);
                tracing::warn!("Image analysis failed ({:?}): {}", failure, e);
                AnalysisReport::failed(kind, failure.image_message(kind), failure.outcome())
            }
        };

        tracing::info!(
            "Analyzed {} image in {}ms ({:?})",
            kind,
            started.elapsed().as_millis(),
            report.outcome
        );
        report
    }

    /// Probe the hosted services; failures are reported, not raised
    pub async fn health_check(&self) -> ServiceHealth {
        let embedder = match self.embedder.health_check().await {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!("Embedding provider {} unreachable: {}", self.embedder.name(), e);
                false
            }
        };
        let model = match self.model.health_check().await {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!("Generative model {} unreachable: {}", self.model.name(), e);
                false
            }
        };
        ServiceHealth { embedder, model }
    }
}

/// Check that `data` is a decodable PNG or JPEG and return its MIME type
pub fn validate_image(data: &[u8]) -> Result<&'static str> {
    let format = image::guess_format(data).map_err(|e| Error::ImageDecode(e.to_string()))?;
    let mime = match format {
        image::ImageFormat::Png => "image/png",
        image::ImageFormat::Jpeg => "image/jpeg",
        other => {
            return Err(Error::ImageDecode(format!("unsupported format {:?}", other)));
        }
    };
    image::load_from_memory_with_format(data, format)
        .map_err(|e| Error::ImageDecode(e.to_string()))?;
    Ok(mime)
}
