use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug)]
pub enum VectorError {
    #[error("Dimension mismatch: expected {0}, got {1}")]
    DimensionMismatch(usize, usize),
    #[error("Empty vector")]
    EmptyVector,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEmbedding {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: HashMap<String, String>,
}

/// Generic trait for vector storage
#[async_trait]
pub trait VectorStoreBackend: Send + Sync + std::fmt::Debug {
    async fn add(
        &self,
        id: String,
        vector: Vec<f32>,
        metadata: HashMap<String, String>,
    ) -> Result<(), VectorError>;

    /// Up to `k` entries ordered by descending cosine similarity
    async fn search(&self, query: &[f32], k: usize)
        -> Result<Vec<(f32, VectorEmbedding)>, VectorError>;

    async fn len(&self) -> usize;
}

/// In-memory vector store, brute-force scan
#[derive(Debug, Clone)]
pub struct MemoryVectorStore {
    dimension: Option<usize>,
    embeddings: Arc<RwLock<Vec<VectorEmbedding>>>,
}

impl MemoryVectorStore {
    /// Store with a fixed dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: Some(dimension),
            embeddings: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Store whose dimension is fixed by the first vector added
    pub fn unsized_store() -> Self {
        Self {
            dimension: None,
            embeddings: Arc::new(RwLock::new(Vec::new())),
        }
    }

    fn check_dimension(&self, expected: Option<usize>, actual: usize) -> Result<(), VectorError> {
        if actual == 0 {
            return Err(VectorError::EmptyVector);
        }
        match expected.or(self.dimension) {
            Some(dim) if dim != actual => Err(VectorError::DimensionMismatch(dim, actual)),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl VectorStoreBackend for MemoryVectorStore {
    async fn add(
        &self,
        id: String,
        vector: Vec<f32>,
        metadata: HashMap<String, String>,
    ) -> Result<(), VectorError> {
        let mut data = self.embeddings.write().await;
        let existing = data.first().map(|e| e.vector.len());
        self.check_dimension(existing, vector.len())?;

        data.retain(|e| e.id != id);
        data.push(VectorEmbedding {
            id,
            vector,
            metadata,
        });

        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<(f32, VectorEmbedding)>, VectorError> {
        let data = self.embeddings.read().await;
        let existing = data.first().map(|e| e.vector.len());
        self.check_dimension(existing, query.len())?;

        let mut scores: Vec<(f32, VectorEmbedding)> = data
            .iter()
            .map(|emb| (cosine_similarity(query, &emb.vector), emb.clone()))
            .collect();

        scores.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scores.truncate(k);

        Ok(scores)
    }

    async fn len(&self) -> usize {
        self.embeddings.read().await.len()
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(case_type: &str) -> HashMap<String, String> {
        HashMap::from([("case_type".to_string(), case_type.to_string())])
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let store = MemoryVectorStore::new(3);
        store.add("a".into(), vec![1.0, 0.0, 0.0], meta("Tort")).await.unwrap();
        store.add("b".into(), vec![0.0, 1.0, 0.0], meta("Contract")).await.unwrap();
        store.add("c".into(), vec![0.7, 0.7, 0.0], meta("Tort")).await.unwrap();

        let hits = store.search(&[1.0, 0.1, 0.0], 2).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|(_, e)| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(hits[0].0 >= hits[1].0);
    }

    #[tokio::test]
    async fn test_dimension_mismatch() {
        let store = MemoryVectorStore::new(3);
        let result = store.add("a".into(), vec![1.0, 0.0], HashMap::new()).await;
        assert!(matches!(result, Err(VectorError::DimensionMismatch(3, 2))));

        let result = store.search(&[1.0], 1).await;
        assert!(matches!(result, Err(VectorError::DimensionMismatch(3, 1))));
    }

    #[tokio::test]
    async fn test_unsized_store_locks_to_first_dimension() {
        let store = MemoryVectorStore::unsized_store();
        store.add("a".into(), vec![1.0, 0.0], HashMap::new()).await.unwrap();

        let result = store.add("b".into(), vec![1.0, 0.0, 0.0], HashMap::new()).await;
        assert!(matches!(result, Err(VectorError::DimensionMismatch(2, 3))));
    }

    #[tokio::test]
    async fn test_readding_id_replaces_entry() {
        let store = MemoryVectorStore::new(2);
        store.add("a".into(), vec![1.0, 0.0], meta("Tort")).await.unwrap();
        store.add("a".into(), vec![0.0, 1.0], meta("Contract")).await.unwrap();

        assert_eq!(store.len().await, 1);
        let hits = store.search(&[0.0, 1.0], 1).await.unwrap();
        assert_eq!(hits[0].1.metadata["case_type"], "Contract");
    }

    #[tokio::test]
    async fn test_empty_store_returns_nothing() {
        let store = MemoryVectorStore::unsized_store();
        assert!(store.search(&[1.0, 2.0], 5).await.unwrap().is_empty());
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
    }
}
