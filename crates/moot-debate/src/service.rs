//! Debate service: the boundary callers talk to
//!
//! Owns the session store and the turn engine. Each turn runs under the
//! session's own lock and is committed only after the engine returns, so a
//! failed or dropped turn leaves the last committed state in place.

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::engine::{EngineConfig, EngineError, TurnEngine, TurnOutcome};
use crate::persona::{ChaosLawyer, PrecedentLawyer};
use crate::rag::{RagConfig, RagPipeline};
use crate::setup::{choose_case, PartyExtractor};
use crate::verdict::VerdictClassifier;
use moot_core::{CaseRecord, DebateSession, MetadataFilters};
use moot_llm::{Metrics, ProviderSet, Timer};
use moot_persist::{SessionStore, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum DebateError {
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Storage error: {0}")]
    Store(StorageError),
}

/// Reply to a successful start
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStarted {
    pub session_id: Uuid,
    pub case: String,
    /// Role the precedent lawyer defends
    pub persona_a_role: String,
    /// Role the chaos lawyer represents
    pub persona_b_role: String,
}

#[derive(Debug, Clone)]
pub struct DebateService {
    store: Arc<SessionStore>,
    engine: TurnEngine,
    parties: PartyExtractor,
    metrics: Arc<Metrics>,
}

impl DebateService {
    pub fn new(store: Arc<SessionStore>, engine: TurnEngine, parties: PartyExtractor) -> Self {
        Self {
            store,
            engine,
            parties,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Wire the LLM-backed personas and the precedent index around one provider set.
    ///
    /// An index that fails to build is replaced by an empty one; the debate
    /// then runs without precedent.
    pub async fn from_providers(
        providers: &ProviderSet,
        records: Vec<CaseRecord>,
        rag_config: RagConfig,
        engine_config: EngineConfig,
    ) -> Self {
        let rag = match RagPipeline::build(records, providers.embeddings.clone(), rag_config).await {
            Ok(rag) => rag,
            Err(e) => {
                tracing::warn!(error = %e, "Precedent index unavailable, debating without it");
                RagPipeline::empty(providers.embeddings.clone())
            }
        };
        // The mock's hypothetical passage is constant and would collapse every query
        let rag = if providers.is_mock {
            rag
        } else {
            rag.with_llm(providers.chat.clone())
        };

        let classifier = VerdictClassifier::from_env().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring configured verdict terms");
            VerdictClassifier::default()
        });

        let engine = TurnEngine::new(
            Arc::new(rag),
            Arc::new(PrecedentLawyer::new(providers.chat.clone())),
            Arc::new(ChaosLawyer::new(providers.chat.clone())),
        )
        .with_classifier(classifier)
        .with_config(engine_config);

        Self::new(
            Arc::new(SessionStore::new()),
            engine,
            PartyExtractor::new(providers.chat.clone()),
        )
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn engine(&self) -> &TurnEngine {
        &self.engine
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Open a debate. Without a case (or with a blank one) a seed case is used.
    pub async fn start(&self, case: Option<&str>) -> Result<SessionStarted, DebateError> {
        let case = choose_case(case);
        let parties = self.parties.extract(&case).await;

        // Persona A defends, persona B brings the claim
        let session = DebateSession::new(&case, &parties.defendant, &parties.plaintiff);
        let session_id = self.store.insert(session).await.map_err(DebateError::Store)?;

        self.metrics.record_session_started();
        tracing::info!(%session_id, case = %case, "Session started");

        Ok(SessionStarted {
            session_id,
            case,
            persona_a_role: parties.defendant,
            persona_b_role: parties.plaintiff,
        })
    }

    /// Run one turn for `session_id`
    pub async fn run_turn(
        &self,
        session_id: Uuid,
        judge_input: &str,
        filters: &MetadataFilters,
    ) -> Result<TurnOutcome, DebateError> {
        let timer = Timer::start();
        let turn = self
            .store
            .lock(session_id)
            .await
            .map_err(|e| store_error(session_id, e))?;

        let (next, outcome) = match self.engine.run_turn(&turn, judge_input, filters).await {
            Ok(result) => result,
            Err(e) => {
                self.metrics.record_turn_error();
                return Err(e.into());
            }
        };
        turn.commit(next).await;

        self.record(&outcome);
        tracing::debug!(
            %session_id,
            signal = %outcome.signal,
            latency_ms = timer.elapsed_ms(),
            "Turn complete"
        );
        Ok(outcome)
    }

    /// Last committed state of a session; does not wait for a running turn
    pub async fn session(&self, session_id: Uuid) -> Result<DebateSession, DebateError> {
        self.store
            .get(session_id)
            .await
            .map_err(|e| store_error(session_id, e))
    }

    /// Pretty-printed JSON of the committed session
    pub async fn transcript(&self, session_id: Uuid) -> Result<String, DebateError> {
        self.store
            .export_json(session_id)
            .await
            .map_err(|e| store_error(session_id, e))
    }

    /// Drop a session from the store, returning its final state
    pub async fn close(&self, session_id: Uuid) -> Result<DebateSession, DebateError> {
        let session = self
            .store
            .remove(session_id)
            .await
            .map_err(|e| store_error(session_id, e))?;
        tracing::info!(%session_id, winner = %session.winner(), "Session closed");
        Ok(session)
    }

    fn record(&self, outcome: &TurnOutcome) {
        if outcome.frozen {
            return;
        }
        if outcome.is_finished {
            self.metrics.record_verdict();
            return;
        }

        self.metrics.record_turn();
        if !outcome.precedent_found {
            self.metrics.record_retrieval_miss();
        }
        let fallbacks = outcome.persona_a_fallback as u64 + outcome.persona_b_fallback as u64;
        if fallbacks > 0 {
            self.metrics.record_generation_fallbacks(fallbacks);
        }
    }
}

fn store_error(session_id: Uuid, e: StorageError) -> DebateError {
    match e {
        StorageError::NotFound(_) => DebateError::SessionNotFound(session_id),
        other => DebateError::Store(other),
    }
}
