//! Provider abstractions for embeddings and text generation
//!
//! The pipeline only sees the traits; the hosted backends are chosen from
//! configuration at startup.

pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod ollama;

use std::sync::Arc;

pub use embedding::EmbeddingProvider;
pub use gemini::{GeminiClient, GeminiEmbedder};
pub use llm::{GenerationRequest, GenerativeModel, InlineImage};
pub use ollama::OllamaEmbedder;

use crate::config::{EmbeddingBackend, RagConfig};
use crate::error::Result;

/// Build the embedding provider selected in the configuration
pub fn embedder_from_config(config: &RagConfig, api_key: &str) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.embeddings.backend {
        EmbeddingBackend::Gemini => Arc::new(GeminiEmbedder::new(
            &config.llm,
            &config.embeddings,
            api_key.to_string(),
        )?),
        EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::new(&config.llm, &config.embeddings)?),
    };
    tracing::info!(
        "Embedding provider: {} ({}, {} dims)",
        provider.name(),
        provider.model(),
        provider.dimensions()
    );
    Ok(provider)
}

/// Build the generative model client
pub fn model_from_config(config: &RagConfig, api_key: &str) -> Result<Arc<dyn GenerativeModel>> {
    let model = GeminiClient::new(&config.llm, &config.generation, api_key.to_string())?;
    tracing::info!("Generative model: {} ({})", model.name(), model.model());
    Ok(Arc::new(model))
}
