//! Generative model trait

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Image attached to a generation request
#[derive(Debug, Clone)]
pub struct InlineImage {
    /// `image/png` or `image/jpeg`
    pub mime_type: String,
    pub data: Bytes,
}

/// One prompt, optionally with an image
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image: Option<InlineImage>,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }

    pub fn with_image(prompt: impl Into<String>, image: InlineImage) -> Self {
        Self {
            prompt: prompt.into(),
            image: Some(image),
        }
    }
}

/// Trait for hosted text generation
///
/// Implementations must report refusals as `Error::SafetyBlocked` and
/// exhausted quotas as `Error::QuotaExceeded`.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Generate text for a request
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Check if the model endpoint is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Model identifier
    fn model(&self) -> &str;
}
