//! In-process precedent retrieval over an embedded case corpus
//!
//! Pipeline per query:
//! 1. optionally ask the LLM for a short hypothetical passage answering the
//!    query, and search with that instead of the raw query
//! 2. embed and fetch `top_k * 2` nearest records
//! 3. apply metadata filters, keep `top_k`
//! 4. format the best remaining record

use async_trait::async_trait;
use std::sync::Arc;

use crate::retrieval::{format_precedent, ContextResult, PrecedentRetriever, RetrievalError};
use moot_core::{matches_filters, CaseRecord, MetadataFilters};
use moot_llm::{EmbeddingProvider, LlmProvider, LlmRequest};
use moot_persist::{MemoryVectorStore, VectorStoreBackend};

/// Embedding endpoints reject very long inputs
const EMBED_CHAR_LIMIT: usize = 8000;

/// Configuration for [`RagPipeline`]
#[derive(Debug, Clone)]
pub struct RagConfig {
    /// Results kept after filtering
    pub top_k: usize,
    /// Search with an LLM-written hypothetical passage when an LLM is set
    pub hypothetical_expansion: bool,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            hypothetical_expansion: true,
        }
    }
}

impl RagConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let top_k = std::env::var("MOOT_TOP_K")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|k: &usize| *k > 0)
            .unwrap_or(3);
        Self {
            top_k,
            ..Default::default()
        }
    }
}

/// Embedding-backed [`PrecedentRetriever`]
#[derive(Debug)]
pub struct RagPipeline {
    records: Vec<CaseRecord>,
    index: MemoryVectorStore,
    embeddings: Arc<dyn EmbeddingProvider>,
    llm: Option<Arc<dyn LlmProvider>>,
    config: RagConfig,
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

impl RagPipeline {
    /// Embed every record and build the index
    pub async fn build(
        records: Vec<CaseRecord>,
        embeddings: Arc<dyn EmbeddingProvider>,
        config: RagConfig,
    ) -> Result<Self, RetrievalError> {
        let index = MemoryVectorStore::unsized_store();

        for (i, record) in records.iter().enumerate() {
            let vector = embeddings
                .embed(truncate_chars(&record.full_text, EMBED_CHAR_LIMIT))
                .await
                .map_err(|e| {
                    RetrievalError::Embedding(format!("case '{}': {}", record.case_name, e))
                })?;
            index
                .add(i.to_string(), vector, record.filter_fields())
                .await
                .map_err(|e| RetrievalError::Index(e.to_string()))?;
        }

        tracing::info!(cases = records.len(), top_k = config.top_k, "Precedent index built");

        Ok(Self {
            records,
            index,
            embeddings,
            llm: None,
            config,
        })
    }

    /// Pipeline over an empty corpus; every query comes back not found
    pub fn empty(embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            records: Vec::new(),
            index: MemoryVectorStore::unsized_store(),
            embeddings,
            llm: None,
            config: RagConfig::default(),
        }
    }

    /// Use `llm` for hypothetical-passage query expansion
    pub fn with_llm(mut self, llm: Arc<dyn LlmProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Text actually embedded for `query`
    async fn search_text(&self, query: &str) -> String {
        let llm = match (&self.llm, self.config.hypothetical_expansion) {
            (Some(llm), true) => llm,
            _ => return query.to_string(),
        };

        let request = LlmRequest::with_role(
            "You are a legal expert.",
            &format!(
                "Given the following legal question, write a brief hypothetical passage \
                 that contains the most likely answer. The passage will be used to find \
                 relevant legal precedents.\nQuestion: {}\nPassage:",
                query
            ),
        )
        .temperature(0.0);

        match llm.complete(request).await {
            Ok(response) if !response.content.trim().is_empty() => response.content,
            Ok(_) => query.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Hypothetical passage failed, searching with raw query");
                query.to_string()
            }
        }
    }

    /// Top records for `query` that pass every filter, best first
    pub async fn search(
        &self,
        query: &str,
        filters: &MetadataFilters,
    ) -> Result<Vec<(f32, &CaseRecord)>, RetrievalError> {
        if self.records.is_empty() {
            return Ok(Vec::new());
        }

        let text = self.search_text(query).await;
        let vector = self
            .embeddings
            .embed(&text)
            .await
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        let hits = self
            .index
            .search(&vector, self.config.top_k * 2)
            .await
            .map_err(|e| RetrievalError::Index(e.to_string()))?;

        let results = hits
            .into_iter()
            .filter(|(_, hit)| matches_filters(&hit.metadata, filters))
            .filter_map(|(score, hit)| {
                let record = hit.id.parse::<usize>().ok().and_then(|i| self.records.get(i))?;
                Some((score, record))
            })
            .take(self.config.top_k)
            .collect();

        Ok(results)
    }
}

#[async_trait]
impl PrecedentRetriever for RagPipeline {
    async fn retrieve(
        &self,
        query: &str,
        filters: &MetadataFilters,
    ) -> Result<ContextResult, RetrievalError> {
        let results = self.search(query, filters).await?;

        match results.first() {
            Some((score, record)) => {
                tracing::debug!(case = %record.case_name, score, "Precedent found");
                Ok(ContextResult::Found(format_precedent(record)))
            }
            None => {
                tracing::debug!(filters = filters.len(), "No precedent matched");
                Ok(ContextResult::NotFound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moot_core::CaseMetadata;
    use moot_llm::MockProvider;

    fn case(name: &str, case_type: &str, text: &str) -> CaseRecord {
        CaseRecord {
            case_name: name.to_string(),
            full_text: text.to_string(),
            metadata: CaseMetadata {
                case_type: case_type.to_string(),
                jurisdiction: "Supreme Court of India".to_string(),
                year: Some(2001),
                key_legal_principles: vec!["natural justice".to_string()],
                plaintiff_details: String::new(),
                defendant_details: String::new(),
                outcome: "Allowed".to_string(),
            },
        }
    }

    fn corpus() -> Vec<CaseRecord> {
        vec![
            case(
                "Teachers v. State",
                "Service Law",
                "teacher promotion qualifications seniority merit pay scale",
            ),
            case(
                "Parrot Defamation Reference",
                "Defamation",
                "parrot defamation slander spoken words reputation bird",
            ),
            case(
                "Orchard Drone Trespass",
                "Property",
                "drone trespass mango orchard airspace property",
            ),
        ]
    }

    async fn pipeline() -> RagPipeline {
        RagPipeline::build(corpus(), Arc::new(MockProvider::smart()), RagConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_best_match_is_formatted() {
        let rag = pipeline().await;
        let result = rag
            .retrieve("parrot defamation slander", &MetadataFilters::new())
            .await
            .unwrap();

        let text = result.as_str();
        assert!(text.starts_with("--- RELEVANT PRECEDENT FOUND ---"));
        assert!(text.contains("Case Name: Parrot Defamation Reference (2001)"));
    }

    #[tokio::test]
    async fn test_filters_are_strict_and_case_insensitive() {
        let rag = pipeline().await;
        let filters = MetadataFilters::from([("case_type".to_string(), "service law".to_string())]);

        let results = rag.search("parrot defamation", &filters).await.unwrap();
        assert!(results.iter().all(|(_, r)| r.metadata.case_type == "Service Law"));

        let filters = MetadataFilters::from([("court_room".to_string(), "7".to_string())]);
        let result = rag.retrieve("parrot", &filters).await.unwrap();
        assert_eq!(result, ContextResult::NotFound);
    }

    #[tokio::test]
    async fn test_top_k_limits_results() {
        let config = RagConfig {
            top_k: 1,
            hypothetical_expansion: false,
        };
        let rag = RagPipeline::build(corpus(), Arc::new(MockProvider::smart()), config)
            .await
            .unwrap();

        let results = rag.search("drone orchard", &MetadataFilters::new()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1.case_name, "Orchard Drone Trespass");
    }

    #[tokio::test]
    async fn test_empty_corpus_not_found() {
        let rag = RagPipeline::empty(Arc::new(MockProvider::smart()));
        let result = rag.retrieve("anything", &MetadataFilters::new()).await.unwrap();
        assert_eq!(result, ContextResult::NotFound);
        assert!(rag.is_empty());
    }

    #[tokio::test]
    async fn test_hypothetical_expansion_uses_llm() {
        let llm = Arc::new(MockProvider::smart());
        let rag = pipeline().await.with_llm(llm.clone());

        rag.retrieve("parrot defamation", &MetadataFilters::new())
            .await
            .unwrap();

        let requests = llm.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt.contains("Question: parrot defamation"));
        assert_eq!(requests[0].temperature, 0.0);
    }

    #[tokio::test]
    async fn test_failed_expansion_falls_back_to_query() {
        let rag = pipeline()
            .await
            .with_llm(Arc::new(MockProvider::failing("offline")));

        let result = rag
            .retrieve("drone trespass mango orchard", &MetadataFilters::new())
            .await
            .unwrap();
        assert!(result.as_str().contains("Orchard Drone Trespass"));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
