//! # Moot Debate
//!
//! The debate core: a precedent lawyer (persona A) and a chaos lawyer
//! (persona B) argue a case while a human judge rules in free text.
//!
//! ## Key Types
//!
//! - [`VerdictClassifier`]: judge input to [`ContinuationSignal`]
//! - [`PrecedentRetriever`] / [`RagPipeline`]: supporting precedent per turn
//! - [`PrecedentAdvocate`] / [`ChaosAdvocate`]: the two persona generators
//! - [`TurnEngine`]: the per-turn state machine
//! - [`DebateService`]: sessions plus engine, the boundary for callers
//!
//! ## Quick Start
//!
//! ```rust
//! use moot_debate::{ContinuationSignal, VerdictClassifier};
//!
//! let classifier = VerdictClassifier::default();
//! assert_eq!(classifier.classify("  Chaos Wins "), ContinuationSignal::PersonaBWins);
//! assert_eq!(classifier.classify("Objection!"), ContinuationSignal::Continue);
//! ```
//!
//! ## Running a Debate Offline
//!
//! ```rust
//! use moot_core::MetadataFilters;
//! use moot_debate::{DebateService, EngineConfig, RagConfig};
//! use moot_llm::LlmConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let providers = LlmConfig::default().build_providers();
//!     let service = DebateService::from_providers(
//!         &providers,
//!         Vec::new(),
//!         RagConfig::default(),
//!         EngineConfig::default(),
//!     )
//!     .await;
//!
//!     let started = service.start(Some("A cat sues its owner.")).await.unwrap();
//!     let outcome = service
//!         .run_turn(started.session_id, "rag wins", &MetadataFilters::new())
//!         .await
//!         .unwrap();
//!     assert!(outcome.is_finished);
//! }
//! ```

pub mod engine;
pub mod narration;
pub mod persona;
pub mod rag;
pub mod retrieval;
pub mod service;
pub mod setup;
pub mod verdict;

pub use engine::{EngineConfig, EngineError, GenerationFailurePolicy, TurnEngine, TurnOutcome};
pub use narration::{closing_statements, Narration, QuitNarration};
pub use persona::{
    persona_a_fallback, persona_b_fallback, ChaosAdvocate, ChaosContext, ChaosLawyer,
    GenerationError, PrecedentAdvocate, PrecedentContext, PrecedentLawyer,
};
pub use rag::{RagConfig, RagPipeline};
pub use retrieval::{
    build_query, format_precedent, ContextResult, PrecedentRetriever, RetrievalError,
    NO_PRECEDENT_FOUND,
};
pub use service::{DebateError, DebateService, SessionStarted};
pub use setup::{choose_case, CaseParties, PartyExtractor, SEED_CASES};
pub use verdict::{ClassifierError, ContinuationSignal, VerdictClassifier};
