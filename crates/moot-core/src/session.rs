//! Debate session state
//!
//! A [`DebateSession`] holds everything one debate needs between turns. The
//! verdict is write-once and both histories are append-only; the mutating
//! methods enforce this so callers cannot break it by accident.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::argument::{ChaosArgument, PrecedentArgument};

/// Final state of a debate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Winner {
    /// Debate still running
    #[default]
    None,
    /// The precedent lawyer won
    PersonaAWins,
    /// The chaos lawyer won
    PersonaBWins,
    /// The judge walked out
    Quit,
}

impl Winner {
    /// Whether this value ends the debate
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::PersonaAWins => write!(f, "personaAWins"),
            Self::PersonaBWins => write!(f, "personaBWins"),
            Self::Quit => write!(f, "quit"),
        }
    }
}

/// Errors from illegal session mutations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Debate already finished with verdict {0}")]
    AlreadyFinished(Winner),
    #[error("A verdict must name a winner or quit")]
    NoVerdict,
}

/// State of one ongoing debate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DebateSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    case_description: String,
    persona_a_role: String,
    persona_b_role: String,
    retrieved_context: String,
    latest_judge_input: String,
    persona_a_history: Vec<String>,
    persona_b_history: Vec<String>,
    latest_persona_a_output: Option<PrecedentArgument>,
    latest_persona_b_output: Option<ChaosArgument>,
    winner: Winner,
    turns: u32,
}

impl DebateSession {
    /// Create a fresh session. Persona A argues for the defendant, persona B
    /// for the plaintiff.
    pub fn new(case_description: &str, persona_a_role: &str, persona_b_role: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            case_description: case_description.to_string(),
            persona_a_role: persona_a_role.to_string(),
            persona_b_role: persona_b_role.to_string(),
            retrieved_context: String::new(),
            latest_judge_input: String::new(),
            persona_a_history: Vec::new(),
            persona_b_history: Vec::new(),
            latest_persona_a_output: None,
            latest_persona_b_output: None,
            winner: Winner::None,
            turns: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn case_description(&self) -> &str {
        &self.case_description
    }

    pub fn persona_a_role(&self) -> &str {
        &self.persona_a_role
    }

    pub fn persona_b_role(&self) -> &str {
        &self.persona_b_role
    }

    pub fn retrieved_context(&self) -> &str {
        &self.retrieved_context
    }

    pub fn latest_judge_input(&self) -> &str {
        &self.latest_judge_input
    }

    /// Persona A's arguments, oldest first
    pub fn persona_a_history(&self) -> &[String] {
        &self.persona_a_history
    }

    /// Persona B's arguments, oldest first
    pub fn persona_b_history(&self) -> &[String] {
        &self.persona_b_history
    }

    pub fn latest_persona_a_output(&self) -> Option<&PrecedentArgument> {
        self.latest_persona_a_output.as_ref()
    }

    pub fn latest_persona_b_output(&self) -> Option<&ChaosArgument> {
        self.latest_persona_b_output.as_ref()
    }

    pub fn winner(&self) -> Winner {
        self.winner
    }

    /// Number of completed non-terminal turns
    pub fn turns(&self) -> u32 {
        self.turns
    }

    /// Whether a verdict has been recorded
    pub fn is_finished(&self) -> bool {
        self.winner.is_terminal()
    }

    pub fn set_judge_input(&mut self, input: &str) {
        self.latest_judge_input = input.to_string();
    }

    pub fn set_retrieved_context(&mut self, context: &str) {
        self.retrieved_context = context.to_string();
    }

    /// Record one completed exchange: both histories grow by exactly one
    /// entry and the latest outputs are replaced.
    pub fn record_arguments(
        &mut self,
        persona_a: PrecedentArgument,
        persona_b: ChaosArgument,
    ) -> Result<(), SessionError> {
        if self.is_finished() {
            return Err(SessionError::AlreadyFinished(self.winner));
        }

        self.persona_a_history.push(persona_a.argument.clone());
        self.persona_b_history.push(persona_b.argument.clone());
        self.latest_persona_a_output = Some(persona_a);
        self.latest_persona_b_output = Some(persona_b);
        self.turns += 1;
        Ok(())
    }

    /// Record the verdict. Only succeeds once.
    pub fn declare_winner(&mut self, winner: Winner) -> Result<(), SessionError> {
        if self.is_finished() {
            return Err(SessionError::AlreadyFinished(self.winner));
        }
        if !winner.is_terminal() {
            return Err(SessionError::NoVerdict);
        }

        self.winner = winner;
        Ok(())
    }
}
