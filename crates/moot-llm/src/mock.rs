//! Mock LLM provider for testing

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use crate::provider::{EmbeddingProvider, LlmError, LlmProvider, LlmRequest, LlmResponse};

/// Dimension of the mock's hashed bag-of-words embeddings
pub const MOCK_EMBEDDING_DIM: usize = 256;

/// A mock LLM provider that returns predefined responses
/// Perfect for testing without needing actual LLM access
#[derive(Debug)]
pub struct MockProvider {
    /// Name of this mock
    pub name: String,
    /// Canned responses (cycles through them)
    responses: Vec<String>,
    /// Current response index
    index: AtomicUsize,
    /// Simulated latency in ms
    latency_ms: u64,
    /// Fail every completion when set
    failure: Option<String>,
    /// Every request seen, in arrival order
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockProvider {
    /// Create a new mock provider with given responses
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            name: "mock".to_string(),
            responses,
            index: AtomicUsize::new(0),
            latency_ms: 10,
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always returns the same response
    pub fn constant(response: &str) -> Self {
        Self::new(vec![response.to_string()])
    }

    /// Create a mock whose completions always fail
    pub fn failing(reason: &str) -> Self {
        let mut mock = Self::new(vec![]);
        mock.name = "failing-mock".to_string();
        mock.failure = Some(reason.to_string());
        mock
    }

    /// Create a smart mock that answers in the shape each debate prompt expects
    pub fn smart() -> Self {
        let mut mock = Self::new(vec![]);
        mock.name = "smart-mock".to_string();
        mock
    }

    /// Override the simulated latency
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Requests received so far
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn generate_smart_response(&self, request: &LlmRequest) -> String {
        let system_lower = request.system.to_lowercase();
        let prompt_lower = request.prompt.to_lowercase();

        if system_lower.contains("chaos lawyer") {
            return r#"{
                "argument": "Your Honor, my client was clearly wronged by forces both seen and unseen, and the defendant's so-called precedent was written on a napkin during a lunar eclipse!",
                "rhetoric": "Theatrical outrage with a flourish of cosmic conspiracy"
            }"#
            .to_string();
        }

        if system_lower.contains("precedent") {
            return r#"{
                "argument": "The claim lacks any recognised cause of action. The plaintiff has shown neither a duty owed nor damage suffered, and settled precedent requires both.",
                "citation": "Donoghue v Stevenson [1932] AC 562",
                "metadata": {
                    "case_type": "tort",
                    "jurisdiction": "House of Lords",
                    "year": 1932,
                    "key_legal_principles": ["duty of care", "proximate damage"],
                    "plaintiff_details": "The aggrieved party",
                    "defendant_details": "The accused party",
                    "outcome": "claim dismissed"
                }
            }"#
            .to_string();
        }

        if prompt_lower.contains("plaintiff and the defendant") {
            return r#"{ "plaintiff": "The claimant", "defendant": "The respondent" }"#.to_string();
        }

        if prompt_lower.contains("hypothetical passage") {
            return "The court held that liability requires a recognised duty, a breach of that \
                    duty, and damage flowing from the breach."
                .to_string();
        }

        let excerpt: String = request.prompt.chars().take(50).collect();
        format!(
            "I understand you're asking about: \"{}\"\n\n\
             Here's my response based on the context provided:\n\
             - The request has been processed\n\
             - Analysis complete\n\
             - Ready for further instructions",
            excerpt
        )
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_available(&self) -> bool {
        self.failure.is_none()
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        // Simulate latency
        tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;

        if let Some(reason) = &self.failure {
            return Err(LlmError::RequestFailed(reason.clone()));
        }

        let content = if self.responses.is_empty() {
            self.generate_smart_response(&request)
        } else {
            // Cycle through canned responses
            let idx = self.index.fetch_add(1, Ordering::Relaxed);
            self.responses[idx % self.responses.len()].clone()
        };

        Ok(LlmResponse {
            content,
            model: self.name.clone(),
            tokens_used: Some((request.prompt.len() / 4) as u32 + 100),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for MockProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        if let Some(reason) = &self.failure {
            return Err(LlmError::RequestFailed(reason.clone()));
        }
        Ok(hashed_embedding(text))
    }
}

/// Deterministic bag-of-words embedding: each lowercase token is hashed
/// (FNV-1a) into a bucket, then the vector is L2-normalised.
pub fn hashed_embedding(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; MOCK_EMBEDDING_DIM];

    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(str::to_lowercase)
    {
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in token.bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        vector[(hash % MOCK_EMBEDDING_DIM as u64) as usize] += 1.0;
    }

    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
    vector
}
