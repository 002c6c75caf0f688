//! Persona generators
//!
//! Each persona has its own trait and its own context type. The chaos
//! lawyer's context carries the precedent lawyer's argument from the same
//! turn as a plain `String`, so it cannot be built before persona A has run.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use moot_core::{CaseMetadata, ChaosArgument, DebateSession, PrecedentArgument};
use moot_llm::{complete_structured, LlmError, LlmProvider, LlmRequest};

/// Argument used when persona A cannot produce one
pub const PERSONA_A_FALLBACK_ARGUMENT: &str =
    "[An error occurred. I am unable to provide an argument.]";
/// Argument used when persona B cannot produce one and the failure is recovered
pub const PERSONA_B_FALLBACK_ARGUMENT: &str =
    "[An error occurred. Chaos has temporarily left the courtroom.]";

/// Marker placed in every descriptive field of a fallback output
pub const ERROR_MARKER: &str = "error";

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("Malformed output: {0}")]
    Malformed(String),
    #[error("Generation timed out after {0}ms")]
    Timeout(u64),
}

impl From<LlmError> for GenerationError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::InvalidResponse(msg) => GenerationError::Malformed(msg),
            LlmError::Timeout(ms) => GenerationError::Timeout(ms),
            other => GenerationError::Provider(other.to_string()),
        }
    }
}

/// Fixed persona A output used after a generation failure
pub fn persona_a_fallback() -> PrecedentArgument {
    PrecedentArgument::new(
        PERSONA_A_FALLBACK_ARGUMENT,
        "N/A",
        CaseMetadata::marked(ERROR_MARKER),
    )
}

/// Fixed persona B output used after a recovered generation failure
pub fn persona_b_fallback() -> ChaosArgument {
    ChaosArgument::new(PERSONA_B_FALLBACK_ARGUMENT, ERROR_MARKER)
}

/// Everything persona A sees when it argues
#[derive(Debug, Clone, PartialEq)]
pub struct PrecedentContext {
    pub case_description: String,
    /// Persona A's own side (the defendant)
    pub own_role: String,
    pub opposing_role: String,
    /// Own arguments from earlier turns, oldest first
    pub own_history: Vec<String>,
    pub opposing_history: Vec<String>,
    /// Persona B's argument from the previous turn, if any
    pub opposing_latest: Option<String>,
    /// Precedent text retrieved this turn
    pub retrieved_context: String,
}

impl PrecedentContext {
    /// Context for this turn. `session` must already hold this turn's
    /// retrieved context and must not yet hold this turn's arguments.
    pub fn from_session(session: &DebateSession) -> Self {
        Self {
            case_description: session.case_description().to_string(),
            own_role: session.persona_a_role().to_string(),
            opposing_role: session.persona_b_role().to_string(),
            own_history: session.persona_a_history().to_vec(),
            opposing_history: session.persona_b_history().to_vec(),
            opposing_latest: session
                .latest_persona_b_output()
                .map(|output| output.argument.clone()),
            retrieved_context: session.retrieved_context().to_string(),
        }
    }
}

/// Everything persona B sees when it argues
#[derive(Debug, Clone, PartialEq)]
pub struct ChaosContext {
    pub case_description: String,
    /// Persona B's own side (the plaintiff)
    pub own_role: String,
    pub opposing_role: String,
    pub own_history: Vec<String>,
    /// Persona A's argument from this same turn
    pub opposing_argument: String,
}

impl ChaosContext {
    pub fn from_session(session: &DebateSession, opposing_argument: &str) -> Self {
        Self {
            case_description: session.case_description().to_string(),
            own_role: session.persona_b_role().to_string(),
            opposing_role: session.persona_a_role().to_string(),
            own_history: session.persona_b_history().to_vec(),
            opposing_argument: opposing_argument.to_string(),
        }
    }
}

/// Persona A: the precedent-grounded lawyer
#[async_trait]
pub trait PrecedentAdvocate: Send + Sync + fmt::Debug {
    async fn argue(&self, context: &PrecedentContext) -> Result<PrecedentArgument, GenerationError>;
}

/// Persona B: the chaos lawyer
#[async_trait]
pub trait ChaosAdvocate: Send + Sync + fmt::Debug {
    async fn argue(&self, context: &ChaosContext) -> Result<ChaosArgument, GenerationError>;
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "(none yet)".to_string();
    }
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

const PRECEDENT_SYSTEM: &str = "You are a meticulous defence counsel. Ground every argument \
     in precedent, statute and established legal principle. Respond with a single JSON \
     object with the keys \"argument\", \"citation\" and \"metadata\". \"metadata\" must \
     contain \"case_type\", \"jurisdiction\", \"year\", \"key_legal_principles\" (a list), \
     \"plaintiff_details\", \"defendant_details\" and \"outcome\".";

const CHAOS_SYSTEM: &str = "You are the CHAOS LAWYER. You argue with absurd, exaggerated and \
     theatrical counterarguments, wild rhetoric and ridiculous legal twists. Respond with a \
     single JSON object with the keys \"argument\" and \"rhetoric\", where \"rhetoric\" names \
     the rhetorical flourish you used.";

/// LLM-backed persona A
#[derive(Debug, Clone)]
pub struct PrecedentLawyer {
    llm: Arc<dyn LlmProvider>,
    temperature: f32,
}

impl PrecedentLawyer {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            temperature: 0.5,
        }
    }

    /// User prompt for one turn
    pub fn prompt(context: &PrecedentContext) -> String {
        let latest = context
            .opposing_latest
            .as_deref()
            .unwrap_or("(the plaintiff's counsel has not spoken yet)");

        format!(
            "Case: {case}\n\
             Plaintiff: {plaintiff}\n\
             Defendant: {defendant}\n\n\
             You represent the defendant. Take their side clearly and point out the \
             weaknesses in the plaintiff's position.\n\n\
             Relevant legal context:\n{context}\n\n\
             Your previous arguments:\n{own}\n\n\
             Opposing counsel's previous arguments:\n{opposing}\n\n\
             Opposing counsel's latest argument:\n{latest}\n\n\
             Prepare your next argument.",
            case = context.case_description,
            plaintiff = context.opposing_role,
            defendant = context.own_role,
            context = context.retrieved_context,
            own = bullet_list(&context.own_history),
            opposing = bullet_list(&context.opposing_history),
            latest = latest,
        )
    }
}

#[async_trait]
impl PrecedentAdvocate for PrecedentLawyer {
    async fn argue(&self, context: &PrecedentContext) -> Result<PrecedentArgument, GenerationError> {
        let request = LlmRequest::with_role(PRECEDENT_SYSTEM, &Self::prompt(context))
            .temperature(self.temperature);
        let argument: PrecedentArgument = complete_structured(self.llm.as_ref(), request).await?;

        if argument.argument.trim().is_empty() {
            return Err(GenerationError::Malformed("empty argument".to_string()));
        }
        Ok(argument)
    }
}

/// LLM-backed persona B
#[derive(Debug, Clone)]
pub struct ChaosLawyer {
    llm: Arc<dyn LlmProvider>,
    temperature: f32,
}

impl ChaosLawyer {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            temperature: 0.9,
        }
    }

    pub fn prompt(context: &ChaosContext) -> String {
        format!(
            "Case: {case}\n\
             Plaintiff: {plaintiff}\n\
             Defendant: {defendant}\n\n\
             You represent the plaintiff. Take their side clearly and accuse the defendant \
             wherever the arguments allow.\n\n\
             Your previous arguments:\n{own}\n\n\
             The defence's latest argument:\n{opposing}\n\n\
             Produce a new counterargument that is absurd and exaggerated.",
            case = context.case_description,
            plaintiff = context.own_role,
            defendant = context.opposing_role,
            own = bullet_list(&context.own_history),
            opposing = context.opposing_argument,
        )
    }
}

#[async_trait]
impl ChaosAdvocate for ChaosLawyer {
    async fn argue(&self, context: &ChaosContext) -> Result<ChaosArgument, GenerationError> {
        let request = LlmRequest::with_role(CHAOS_SYSTEM, &Self::prompt(context))
            .temperature(self.temperature);
        let argument: ChaosArgument = complete_structured(self.llm.as_ref(), request).await?;

        if argument.argument.trim().is_empty() {
            return Err(GenerationError::Malformed("empty argument".to_string()));
        }
        Ok(argument)
    }
}
