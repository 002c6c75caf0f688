//! Debate turn engine
//!
//! One judge input in, one [`TurnOutcome`] out. [`TurnEngine::run_turn`]
//! never mutates its input: it returns the next session value and the
//! caller decides whether to commit it.
//!
//! ```text
//! AwaitingTurn --continue--> retrieve -> persona A -> persona B -> AwaitingTurn
//! AwaitingTurn --verdict---> Finished (narration only, no collaborator calls)
//! Finished     --anything--> Finished (frozen outcome, session unchanged)
//! ```

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::narration::{closing_statements, QuitNarration};
use crate::persona::{
    persona_a_fallback, persona_b_fallback, ChaosAdvocate, ChaosContext, GenerationError,
    PrecedentAdvocate, PrecedentContext,
};
use crate::retrieval::{
    build_query, ContextResult, PrecedentRetriever, RetrievalError, NO_PRECEDENT_FOUND,
};
use crate::verdict::{ContinuationSignal, VerdictClassifier};
use moot_core::{
    ChaosArgument, DebateSession, MetadataFilters, PrecedentArgument, SessionError,
    StructuredArgument, Winner,
};

/// What to do when persona B fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationFailurePolicy {
    /// Substitute the fixed fallback argument and finish the turn
    #[default]
    Recover,
    /// Fail the turn; the stored session is left untouched
    Propagate,
}

impl FromStr for GenerationFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recover" => Ok(Self::Recover),
            "propagate" => Ok(Self::Propagate),
            other => Err(format!("unknown failure policy '{}'", other)),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub retrieval_timeout: Duration,
    pub generation_timeout: Duration,
    pub chaos_failure: GenerationFailurePolicy,
    pub quit_narration: QuitNarration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retrieval_timeout: Duration::from_secs(20),
            generation_timeout: Duration::from_secs(60),
            chaos_failure: GenerationFailurePolicy::Recover,
            quit_narration: QuitNarration::Silent,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secs = |key: &str, default: Duration| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(default)
        };
        let parsed = |key: &str| std::env::var(key).ok();

        Self {
            retrieval_timeout: secs("MOOT_RETRIEVAL_TIMEOUT_SECS", defaults.retrieval_timeout),
            generation_timeout: secs("MOOT_GENERATION_TIMEOUT_SECS", defaults.generation_timeout),
            chaos_failure: parsed("MOOT_CHAOS_FAILURE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.chaos_failure),
            quit_narration: parsed("MOOT_QUIT_NARRATION")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.quit_narration),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Persona B failed to argue: {0}")]
    Generation(GenerationError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Everything one turn produced
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub signal: ContinuationSignal,
    pub persona_a_output: Option<PrecedentArgument>,
    pub persona_b_output: Option<ChaosArgument>,
    pub retrieved_context: String,
    pub is_finished: bool,
    /// Set only once the debate is over
    pub winner: Option<Winner>,
    /// A precedent was found this turn
    pub precedent_found: bool,
    pub persona_a_fallback: bool,
    pub persona_b_fallback: bool,
    /// The session had already finished before this call
    pub frozen: bool,
}

impl TurnOutcome {
    fn terminal(session: &DebateSession, signal: ContinuationSignal, quit: QuitNarration) -> Self {
        let narration = closing_statements(session, quit);
        // A verdict before any retrieval still reports the no-precedent sentinel
        let retrieved_context = match session.retrieved_context() {
            "" => NO_PRECEDENT_FOUND,
            stored => stored,
        };
        Self {
            signal,
            persona_a_output: narration.persona_a,
            persona_b_output: narration.persona_b,
            retrieved_context: retrieved_context.to_string(),
            is_finished: true,
            winner: Some(session.winner()),
            precedent_found: false,
            persona_a_fallback: false,
            persona_b_fallback: false,
            frozen: false,
        }
    }

    /// This turn's arguments in speaking order, tagged by persona
    pub fn arguments(&self) -> Vec<StructuredArgument> {
        let a = self.persona_a_output.clone().map(StructuredArgument::from);
        let b = self.persona_b_output.clone().map(StructuredArgument::from);
        a.into_iter().chain(b).collect()
    }
}

/// The debate state machine and its collaborators
#[derive(Debug, Clone)]
pub struct TurnEngine {
    classifier: VerdictClassifier,
    retriever: Arc<dyn PrecedentRetriever>,
    persona_a: Arc<dyn PrecedentAdvocate>,
    persona_b: Arc<dyn ChaosAdvocate>,
    config: EngineConfig,
}

async fn bounded<T, E>(
    limit: Duration,
    fut: impl Future<Output = Result<T, E>>,
) -> Result<Result<T, E>, u64> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| limit.as_millis() as u64)
}

impl TurnEngine {
    pub fn new(
        retriever: Arc<dyn PrecedentRetriever>,
        persona_a: Arc<dyn PrecedentAdvocate>,
        persona_b: Arc<dyn ChaosAdvocate>,
    ) -> Self {
        Self {
            classifier: VerdictClassifier::default(),
            retriever,
            persona_a,
            persona_b,
            config: EngineConfig::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: VerdictClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn classifier(&self) -> &VerdictClassifier {
        &self.classifier
    }

    /// Run one turn against `session`, returning the next session value.
    ///
    /// A finished session comes back unchanged with its frozen outcome and no
    /// collaborator is called.
    #[tracing::instrument(skip_all, fields(session_id = %session.id(), turn = session.turns() + 1))]
    pub async fn run_turn(
        &self,
        session: &DebateSession,
        judge_input: &str,
        filters: &MetadataFilters,
    ) -> Result<(DebateSession, TurnOutcome), EngineError> {
        if session.is_finished() {
            tracing::debug!(winner = %session.winner(), "Turn on finished debate ignored");
            let signal = self.classifier.classify(session.latest_judge_input());
            let mut outcome = TurnOutcome::terminal(session, signal, self.config.quit_narration);
            outcome.frozen = true;
            return Ok((session.clone(), outcome));
        }

        let mut next = session.clone();
        next.set_judge_input(judge_input);

        let signal = self.classifier.classify(judge_input);
        if let Some(winner) = signal.verdict() {
            next.declare_winner(winner)?;
            tracing::info!(%winner, "Debate finished");
            let outcome = TurnOutcome::terminal(&next, signal, self.config.quit_narration);
            return Ok((next, outcome));
        }

        let query = build_query(next.case_description(), judge_input);
        let context = self.retrieve(&query, filters).await;
        next.set_retrieved_context(context.as_str());

        let (persona_a, persona_a_fallback) = self.precedent_argument(&next).await;
        let (persona_b, persona_b_fallback) =
            self.chaos_argument(&next, &persona_a.argument).await?;

        next.record_arguments(persona_a.clone(), persona_b.clone())?;

        let outcome = TurnOutcome {
            signal,
            persona_a_output: Some(persona_a),
            persona_b_output: Some(persona_b),
            retrieved_context: next.retrieved_context().to_string(),
            is_finished: false,
            winner: None,
            precedent_found: context.is_found(),
            persona_a_fallback,
            persona_b_fallback,
            frozen: false,
        };
        Ok((next, outcome))
    }

    /// Best-effort retrieval; every failure becomes `NotFound`
    async fn retrieve(&self, query: &str, filters: &MetadataFilters) -> ContextResult {
        let result = bounded(
            self.config.retrieval_timeout,
            self.retriever.retrieve(query, filters),
        )
        .await
        .unwrap_or_else(|ms| Err(RetrievalError::Timeout(ms)));

        match result {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!(error = %e, "Retrieval failed, continuing without precedent");
                ContextResult::NotFound
            }
        }
    }

    async fn precedent_argument(&self, session: &DebateSession) -> (PrecedentArgument, bool) {
        let context = PrecedentContext::from_session(session);
        let result = bounded(self.config.generation_timeout, self.persona_a.argue(&context))
            .await
            .unwrap_or_else(|ms| Err(GenerationError::Timeout(ms)));

        match result {
            Ok(argument) => (argument, false),
            Err(e) => {
                tracing::warn!(error = %e, "Persona A failed, using fallback argument");
                (persona_a_fallback(), true)
            }
        }
    }

    async fn chaos_argument(
        &self,
        session: &DebateSession,
        opposing_argument: &str,
    ) -> Result<(ChaosArgument, bool), EngineError> {
        let context = ChaosContext::from_session(session, opposing_argument);
        let result = bounded(self.config.generation_timeout, self.persona_b.argue(&context))
            .await
            .unwrap_or_else(|ms| Err(GenerationError::Timeout(ms)));

        match (result, self.config.chaos_failure) {
            (Ok(argument), _) => Ok((argument, false)),
            (Err(e), GenerationFailurePolicy::Recover) => {
                tracing::warn!(error = %e, "Persona B failed, using fallback argument");
                Ok((persona_b_fallback(), true))
            }
            (Err(e), GenerationFailurePolicy::Propagate) => {
                tracing::warn!(error = %e, "Persona B failed, aborting turn");
                Err(EngineError::Generation(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::{PERSONA_A_FALLBACK_ARGUMENT, PERSONA_B_FALLBACK_ARGUMENT};
    use async_trait::async_trait;
    use moot_core::CaseMetadata;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug)]
    enum Retrieval {
        Found,
        Fail,
        Hang,
    }

    #[derive(Debug)]
    struct ScriptedRetriever {
        mode: Retrieval,
        queries: Mutex<Vec<String>>,
    }

    impl ScriptedRetriever {
        fn new(mode: Retrieval) -> Arc<Self> {
            Arc::new(Self {
                mode,
                queries: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PrecedentRetriever for ScriptedRetriever {
        async fn retrieve(
            &self,
            query: &str,
            _filters: &MetadataFilters,
        ) -> Result<ContextResult, RetrievalError> {
            self.queries.lock().unwrap().push(query.to_string());
            match self.mode {
                Retrieval::Found => Ok(ContextResult::Found("--- PRECEDENT ---".to_string())),
                Retrieval::Fail => Err(RetrievalError::Index("corrupt".to_string())),
                Retrieval::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(ContextResult::NotFound)
                }
            }
        }
    }

    #[derive(Debug, Default)]
    struct ScriptedA {
        fail: bool,
        seen: Mutex<Vec<PrecedentContext>>,
    }

    #[async_trait]
    impl PrecedentAdvocate for ScriptedA {
        async fn argue(
            &self,
            context: &PrecedentContext,
        ) -> Result<PrecedentArgument, GenerationError> {
            let mut seen = self.seen.lock().unwrap();
            seen.push(context.clone());
            if self.fail {
                return Err(GenerationError::Malformed("missing citation".to_string()));
            }
            Ok(PrecedentArgument::new(
                &format!("A{}", seen.len()),
                "Donoghue v Stevenson",
                CaseMetadata::marked("tort"),
            ))
        }
    }

    #[derive(Debug, Default)]
    struct ScriptedB {
        fail: bool,
        calls: AtomicUsize,
        seen: Mutex<Vec<ChaosContext>>,
    }

    #[async_trait]
    impl ChaosAdvocate for ScriptedB {
        async fn argue(&self, context: &ChaosContext) -> Result<ChaosArgument, GenerationError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.seen.lock().unwrap().push(context.clone());
            if self.fail {
                return Err(GenerationError::Provider("offline".to_string()));
            }
            Ok(ChaosArgument::new(&format!("B{}", n), "chaos"))
        }
    }

    fn session() -> DebateSession {
        DebateSession::new("A cat sues its owner.", "The owner", "The cat")
    }

    fn engine(
        retriever: Arc<ScriptedRetriever>,
        a: Arc<ScriptedA>,
        b: Arc<ScriptedB>,
    ) -> TurnEngine {
        TurnEngine::new(retriever, a, b)
    }

    #[tokio::test]
    async fn test_continue_turn_orders_personas() {
        let retriever = ScriptedRetriever::new(Retrieval::Found);
        let a = Arc::new(ScriptedA::default());
        let b = Arc::new(ScriptedB::default());
        let engine = engine(retriever.clone(), a.clone(), b.clone());

        let (s1, out1) = engine
            .run_turn(&session(), "Continue the debate.", &MetadataFilters::new())
            .await
            .unwrap();
        let (s2, _) = engine
            .run_turn(&s1, "Go on.", &MetadataFilters::new())
            .await
            .unwrap();

        assert!(!out1.is_finished);
        assert!(out1.winner.is_none());
        assert!(out1.precedent_found);
        assert_eq!(out1.retrieved_context, "--- PRECEDENT ---");
        let spoken: Vec<String> = out1
            .arguments()
            .iter()
            .map(|arg| arg.argument().to_string())
            .collect();
        assert_eq!(spoken, ["A1", "B1"]);
        assert!(matches!(out1.arguments()[0], StructuredArgument::Precedent(_)));

        // Persona B always sees persona A's argument from the same turn
        let b_seen = b.seen.lock().unwrap();
        assert_eq!(b_seen[0].opposing_argument, "A1");
        assert_eq!(b_seen[1].opposing_argument, "A2");
        assert_eq!(b_seen[1].own_history, vec!["B1"]);

        // Persona A sees its own prior history only, and B's previous output
        let a_seen = a.seen.lock().unwrap();
        assert!(a_seen[0].own_history.is_empty());
        assert!(a_seen[0].opposing_latest.is_none());
        assert_eq!(a_seen[1].own_history, vec!["A1"]);
        assert_eq!(a_seen[1].opposing_latest.as_deref(), Some("B1"));
        assert_eq!(a_seen[1].retrieved_context, "--- PRECEDENT ---");

        assert_eq!(s2.persona_a_history(), ["A1", "A2"]);
        assert_eq!(s2.persona_b_history(), ["B1", "B2"]);
        assert_eq!(s2.turns(), 2);

        let queries = retriever.queries.lock().unwrap();
        assert_eq!(queries[1], "A cat sues its owner. Go on.");
    }

    #[tokio::test]
    async fn test_input_session_not_mutated() {
        let engine = engine(
            ScriptedRetriever::new(Retrieval::Found),
            Arc::new(ScriptedA::default()),
            Arc::new(ScriptedB::default()),
        );
        let original = session();
        let (next, _) = engine
            .run_turn(&original, "Continue", &MetadataFilters::new())
            .await
            .unwrap();

        assert!(original.persona_a_history().is_empty());
        assert_eq!(original.latest_judge_input(), "");
        assert_eq!(next.latest_judge_input(), "Continue");
    }

    #[tokio::test]
    async fn test_verdict_skips_collaborators() {
        let retriever = ScriptedRetriever::new(Retrieval::Found);
        let a = Arc::new(ScriptedA::default());
        let b = Arc::new(ScriptedB::default());
        let engine = engine(retriever.clone(), a.clone(), b.clone());

        let (s1, _) = engine
            .run_turn(&session(), "Continue", &MetadataFilters::new())
            .await
            .unwrap();
        let (s2, outcome) = engine
            .run_turn(&s1, "RAG WINS", &MetadataFilters::new())
            .await
            .unwrap();

        assert!(outcome.is_finished);
        assert_eq!(outcome.winner, Some(Winner::PersonaAWins));
        assert_eq!(outcome.persona_a_output.unwrap().citation, "Res ipsa loquitur.");
        assert_eq!(s2.persona_a_history().len(), 1);
        assert_eq!(s2.latest_judge_input(), "RAG WINS");
        assert_eq!(retriever.queries.lock().unwrap().len(), 1);
        assert_eq!(a.seen.lock().unwrap().len(), 1);
        assert_eq!(b.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_finished_session_is_frozen() {
        let b = Arc::new(ScriptedB::default());
        let engine = engine(
            ScriptedRetriever::new(Retrieval::Found),
            Arc::new(ScriptedA::default()),
            b.clone(),
        );

        let (finished, first) = engine
            .run_turn(&session(), "chaos wins", &MetadataFilters::new())
            .await
            .unwrap();
        let (again, second) = engine
            .run_turn(&finished, "rag wins", &MetadataFilters::new())
            .await
            .unwrap();

        assert_eq!(again, finished);
        assert_eq!(second.winner, Some(Winner::PersonaBWins));
        assert_eq!(second.persona_b_output, first.persona_b_output);
        assert_eq!(second.signal, ContinuationSignal::PersonaBWins);
        assert!(second.frozen);
        assert_eq!(b.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_retrieval_failure_masked() {
        let engine = engine(
            ScriptedRetriever::new(Retrieval::Fail),
            Arc::new(ScriptedA::default()),
            Arc::new(ScriptedB::default()),
        );
        let (next, outcome) = engine
            .run_turn(&session(), "Continue", &MetadataFilters::new())
            .await
            .unwrap();

        assert_eq!(outcome.retrieved_context, NO_PRECEDENT_FOUND);
        assert_eq!(next.retrieved_context(), NO_PRECEDENT_FOUND);
        assert!(!outcome.precedent_found);
        assert!(outcome.persona_a_output.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrieval_timeout_masked() {
        let engine = engine(
            ScriptedRetriever::new(Retrieval::Hang),
            Arc::new(ScriptedA::default()),
            Arc::new(ScriptedB::default()),
        );
        let (_, outcome) = engine
            .run_turn(&session(), "Continue", &MetadataFilters::new())
            .await
            .unwrap();

        assert_eq!(outcome.retrieved_context, NO_PRECEDENT_FOUND);
    }

    #[tokio::test]
    async fn test_persona_a_failure_uses_fallback() {
        let b = Arc::new(ScriptedB::default());
        let engine = engine(
            ScriptedRetriever::new(Retrieval::Found),
            Arc::new(ScriptedA {
                fail: true,
                ..Default::default()
            }),
            b.clone(),
        );
        let (next, outcome) = engine
            .run_turn(&session(), "Continue", &MetadataFilters::new())
            .await
            .unwrap();

        let a = outcome.persona_a_output.unwrap();
        assert_eq!(a.argument, PERSONA_A_FALLBACK_ARGUMENT);
        assert_eq!(a.metadata.case_type, "error");
        assert!(outcome.persona_a_fallback);
        assert_eq!(next.persona_a_history(), [PERSONA_A_FALLBACK_ARGUMENT]);
        assert_eq!(b.seen.lock().unwrap()[0].opposing_argument, PERSONA_A_FALLBACK_ARGUMENT);
    }

    #[tokio::test]
    async fn test_persona_b_failure_recovered_by_default() {
        let engine = engine(
            ScriptedRetriever::new(Retrieval::Found),
            Arc::new(ScriptedA::default()),
            Arc::new(ScriptedB {
                fail: true,
                ..Default::default()
            }),
        );
        let (next, outcome) = engine
            .run_turn(&session(), "Continue", &MetadataFilters::new())
            .await
            .unwrap();

        assert_eq!(
            outcome.persona_b_output.unwrap().argument,
            PERSONA_B_FALLBACK_ARGUMENT
        );
        assert!(outcome.persona_b_fallback);
        assert_eq!(next.persona_b_history().len(), 1);
    }

    #[tokio::test]
    async fn test_persona_b_failure_propagated() {
        let engine = engine(
            ScriptedRetriever::new(Retrieval::Found),
            Arc::new(ScriptedA::default()),
            Arc::new(ScriptedB {
                fail: true,
                ..Default::default()
            }),
        )
        .with_config(EngineConfig {
            chaos_failure: GenerationFailurePolicy::Propagate,
            ..Default::default()
        });

        let result = engine
            .run_turn(&session(), "Continue", &MetadataFilters::new())
            .await;
        assert!(matches!(
            result,
            Err(EngineError::Generation(GenerationError::Provider(_)))
        ));
    }

    #[tokio::test]
    async fn test_quit_before_any_turn() {
        let engine = engine(
            ScriptedRetriever::new(Retrieval::Found),
            Arc::new(ScriptedA::default()),
            Arc::new(ScriptedB::default()),
        );
        let (next, outcome) = engine
            .run_turn(&session(), " Quit ", &MetadataFilters::new())
            .await
            .unwrap();

        assert_eq!(next.winner(), Winner::Quit);
        assert_eq!(outcome.winner, Some(Winner::Quit));
        assert!(outcome.persona_a_output.is_none());
        assert!(outcome.persona_b_output.is_none());
        assert!(outcome.arguments().is_empty());
        assert_eq!(outcome.retrieved_context, NO_PRECEDENT_FOUND);
    }

    #[tokio::test]
    async fn test_first_turn_verdict_reports_no_precedent() {
        let retriever = ScriptedRetriever::new(Retrieval::Found);
        let engine = engine(
            retriever.clone(),
            Arc::new(ScriptedA::default()),
            Arc::new(ScriptedB::default()),
        );
        let (next, outcome) = engine
            .run_turn(&session(), "rag wins", &MetadataFilters::new())
            .await
            .unwrap();

        assert_eq!(outcome.winner, Some(Winner::PersonaAWins));
        assert_eq!(outcome.retrieved_context, NO_PRECEDENT_FOUND);
        assert_eq!(next.retrieved_context(), "");
        assert!(retriever.queries.lock().unwrap().is_empty());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "Propagate".parse::<GenerationFailurePolicy>().unwrap(),
            GenerationFailurePolicy::Propagate
        );
        assert!("explode".parse::<GenerationFailurePolicy>().is_err());
        assert_eq!(
            EngineConfig::default().retrieval_timeout,
            Duration::from_secs(20)
        );
    }
}
