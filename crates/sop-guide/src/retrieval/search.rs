//! Query-time retrieval over the persisted index

use std::sync::Arc;

use crate::error::Result;
use crate::providers::EmbeddingProvider;
use crate::types::{RetrievedChunk, RetrievedContext};

use super::index::VectorIndex;

/// Embeds queries and selects the closest chunks
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<VectorIndex>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<VectorIndex>) -> Self {
        Self { embedder, index }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Top `k` chunks for `query`. No minimum similarity is applied.
    pub async fn search(&self, query: &str, k: usize) -> Result<RetrievedContext> {
        if self.index.is_empty() || k == 0 {
            return Ok(RetrievedContext::default());
        }

        let vector = self.embedder.embed_normalized(query).await?;
        let hits = self.index.search(&vector, k)?;

        tracing::debug!(
            "Retrieved {} chunks (best score {:.3})",
            hits.len(),
            hits.first().map(|(_, s)| *s).unwrap_or(0.0)
        );

        Ok(RetrievedContext::new(
            hits.into_iter()
                .map(|(entry, score)| RetrievedChunk {
                    chunk: entry.chunk.clone(),
                    score,
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChunkingConfig;
    use crate::error::Error;
    use crate::retrieval::{IndexManifest, ModelFingerprint};
    use crate::types::{Chunk, ChunkSource};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    /// Maps a text to a fixed axis by keyword
    struct AxisEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for AxisEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(if text.contains("insulina") {
                vec![0.0, 1.0, 0.0]
            } else if text.contains("ciclo") {
                vec![1.0, 0.0, 0.0]
            } else {
                vec![0.0, 0.0, 1.0]
            })
        }
        fn dimensions(&self) -> usize {
            3
        }
        fn model(&self) -> &str {
            "axis"
        }
        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
        fn name(&self) -> &str {
            "test"
        }
    }

    fn index() -> VectorIndex {
        let texts = ["ciclos irregulares", "resistencia a la insulina", "acné"];
        let chunks = texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                Chunk::new(
                    Uuid::nil(),
                    t.to_string(),
                    ChunkSource {
                        label: String::new(),
                        filename: "guia.txt".into(),
                        page_number: None,
                    },
                    0,
                    t.chars().count(),
                    i as u32,
                )
            })
            .collect();
        let vectors = vec![vec![1.0, 0.0, 0.0], vec![0.0, 0.8, 0.6], vec![0.0, 0.0, 1.0]];
        let manifest = IndexManifest::new(
            "test",
            ModelFingerprint::new("test", "axis", 3),
            &ChunkingConfig::default(),
            "guia.txt",
            "",
        );
        VectorIndex::build(chunks, vectors, manifest).unwrap()
    }

    #[tokio::test]
    async fn test_search_returns_best_first() {
        let embedder = Arc::new(AxisEmbedder { calls: AtomicUsize::new(0) });
        let retriever = Retriever::new(embedder, Arc::new(index()));

        let context = retriever.search("¿qué pasa con la insulina?", 2).await.unwrap();
        assert_eq!(context.len(), 2);
        assert_eq!(context.items[0].text(), "resistencia a la insulina");
        assert_eq!(context.items[0].label(), "Guía médica");
        assert!(context.items[0].score >= context.items[1].score);
    }

    #[tokio::test]
    async fn test_empty_index_skips_embedding() {
        let embedder = Arc::new(AxisEmbedder { calls: AtomicUsize::new(0) });
        let empty = VectorIndex::empty(ModelFingerprint::new("test", "axis", 3));
        let retriever = Retriever::new(embedder.clone(), Arc::new(empty));

        let context = retriever.search("ciclo", 4).await.unwrap();
        assert!(context.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_wrong_query_dimension_is_rejected() {
        struct Short;
        #[async_trait]
        impl EmbeddingProvider for Short {
            async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
                Ok(vec![1.0, 0.0])
            }
            fn dimensions(&self) -> usize {
                2
            }
            fn model(&self) -> &str {
                "short"
            }
            async fn health_check(&self) -> Result<bool> {
                Ok(true)
            }
            fn name(&self) -> &str {
                "test"
            }
        }

        let retriever = Retriever::new(Arc::new(Short), Arc::new(index()));
        assert!(matches!(retriever.search("ciclo", 2).await, Err(Error::Index(_))));
    }
}
