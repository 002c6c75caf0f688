//! # Moot LLM
//!
//! LLM provider integrations for the debate personas.
//!
//! ## Supported Backends
//!
//! | Provider | Type | Key Required |
//! |----------|------|--------------|
//! | Gemini (OpenAI-compatible endpoint) | API | `GOOGLE_API_KEY` |
//! | OpenAI | API | `OPENAI_API_KEY` |
//! | Mock | Testing | None |
//!
//! ## Quick Start
//!
//! ```rust
//! use moot_llm::{LlmProvider, MockProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let llm = MockProvider::constant("Objection sustained.");
//!     let response = llm.ask("Rule on the objection").await.unwrap();
//!     assert_eq!(response, "Objection sustained.");
//! }
//! ```
//!
//! ## Structured Output
//!
//! ```rust
//! use moot_llm::{parse_structured, LlmError};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Parties { plaintiff: String, defendant: String }
//!
//! let parties: Parties = parse_structured(r#"{"plaintiff": "A cat", "defendant": "Its owner"}"#).unwrap();
//! assert_eq!(parties.plaintiff, "A cat");
//! ```

pub mod config;
pub mod metrics;
pub mod mock;
pub mod openai;
pub mod provider;
pub mod resilient_provider;
pub mod structured;

pub use config::{ConfigError, LlmConfig, ProviderSet};
pub use metrics::{Metrics, MetricsSnapshot, Timer};
pub use mock::MockProvider;
pub use openai::OpenAIProvider;
pub use provider::{EmbeddingProvider, LlmError, LlmProvider, LlmRequest, LlmResponse};
pub use resilient_provider::{CircuitState, LlmCircuitConfig, ResilientProvider};
pub use structured::{complete_structured, extract_json, parse_structured};
