//! Embedding provider trait for generating text embeddings

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::retrieval::ModelFingerprint;

/// Trait for generating text embeddings
///
/// Implementations:
/// - `GeminiEmbedder`: Generative Language API (text-embedding-004)
/// - `OllamaEmbedder`: Local Ollama server (nomic-embed-text)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts (batch)
    ///
    /// Default implementation calls `embed` sequentially.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Get embedding dimensions (768 for text-embedding-004 and nomic-embed-text)
    fn dimensions(&self) -> usize;

    /// Model name recorded in the index fingerprint
    fn model(&self) -> &str;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Identity of the vector space this provider produces
    fn fingerprint(&self) -> ModelFingerprint {
        ModelFingerprint::new(self.name(), self.model(), self.dimensions())
    }

    /// Embed and scale to unit length, checking the dimension
    async fn embed_normalized(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.embed(text).await?;
        normalize_checked(vector, self.dimensions())
    }

    /// Batch variant of [`EmbeddingProvider::embed_normalized`]
    async fn embed_batch_normalized(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = self.embed_batch(texts).await?;
        if vectors.len() != texts.len() {
            return Err(Error::embedding(format!(
                "{} returned {} embeddings for {} texts",
                self.name(),
                vectors.len(),
                texts.len()
            )));
        }
        vectors
            .into_iter()
            .map(|v| normalize_checked(v, self.dimensions()))
            .collect()
    }
}

fn normalize_checked(mut vector: Vec<f32>, expected: usize) -> Result<Vec<f32>> {
    if vector.len() != expected {
        return Err(Error::embedding(format!(
            "Expected {} dimensions, got {}",
            expected,
            vector.len()
        )));
    }
    if !l2_normalize(&mut vector) {
        return Err(Error::embedding("Embedding has zero norm"));
    }
    Ok(vector)
}

/// Scale a vector to unit L2 norm in place. Returns false for a zero or non-finite norm.
pub fn l2_normalize(vector: &mut [f32]) -> bool {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return false;
    }
    for x in vector.iter_mut() {
        *x /= norm;
    }
    true
}

/// Inner product of two equal-length vectors
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<f32>);

    #[async_trait]
    impl EmbeddingProvider for Fixed {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }
        fn dimensions(&self) -> usize {
            3
        }
        fn model(&self) -> &str {
            "fixed"
        }
        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
        fn name(&self) -> &str {
            "test"
        }
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        assert!(l2_normalize(&mut v));
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((dot(&v, &v) - 1.0).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        assert!(!l2_normalize(&mut zero));
    }

    #[tokio::test]
    async fn test_embed_normalized_is_unit_and_deterministic() {
        let provider = Fixed(vec![1.0, 2.0, 2.0]);
        let a = provider.embed_normalized("síntomas").await.unwrap();
        let b = provider.embed_normalized("síntomas").await.unwrap();
        assert_eq!(a, b);
        assert!((dot(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_wrong_dimension_rejected() {
        let provider = Fixed(vec![1.0, 2.0]);
        assert!(matches!(
            provider.embed_normalized("x").await,
            Err(Error::Embedding(_))
        ));
        assert_eq!(provider.fingerprint(), ModelFingerprint::new("test", "fixed", 3));
    }
}
