//! Session setup: picking a case and naming the parties

use rand::seq::IndexedRandom;
use serde::Deserialize;
use std::sync::Arc;

use moot_llm::{complete_structured, LlmProvider, LlmRequest};

/// Cases used when the caller does not bring one
pub const SEED_CASES: &[&str] = &[
    "A man sues a parrot for defamation.",
    "A neighbor claims ownership of sunlight entering their balcony.",
    "A magician sues an assistant for revealing a trick as 'trade secret'.",
    "A drone trespass case over mango orchards.",
    "An influencer alleges trademark over a catchphrase used by a politician.",
];

pub const DEFAULT_PLAINTIFF: &str = "Plaintiff";
pub const DEFAULT_DEFENDANT: &str = "Defendant";

/// The supplied case if it has any content, otherwise a random seed
pub fn choose_case(requested: Option<&str>) -> String {
    match requested.map(str::trim).filter(|c| !c.is_empty()) {
        Some(case) => case.to_string(),
        None => SEED_CASES
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(SEED_CASES[0])
            .to_string(),
    }
}

/// Who is suing whom
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaseParties {
    pub plaintiff: String,
    pub defendant: String,
}

impl Default for CaseParties {
    fn default() -> Self {
        Self {
            plaintiff: DEFAULT_PLAINTIFF.to_string(),
            defendant: DEFAULT_DEFENDANT.to_string(),
        }
    }
}

/// Names the parties in a case description with the help of an LLM
#[derive(Debug, Clone)]
pub struct PartyExtractor {
    llm: Arc<dyn LlmProvider>,
}

impl PartyExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Parties for `case`, or the generic labels if the LLM cannot say
    pub async fn extract(&self, case: &str) -> CaseParties {
        let request = LlmRequest::with_role(
            "You identify the parties in short legal case descriptions. Respond with a \
             JSON object with the keys \"plaintiff\" and \"defendant\".",
            &format!(
                "Analyze the following case description and identify the plaintiff and the \
                 defendant: '{}'",
                case
            ),
        )
        .temperature(0.0);

        match complete_structured::<CaseParties>(self.llm.as_ref(), request).await {
            Ok(parties)
                if !parties.plaintiff.trim().is_empty() && !parties.defendant.trim().is_empty() =>
            {
                parties
            }
            Ok(_) => {
                tracing::warn!("Party extraction returned blank names, using generic roles");
                CaseParties::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Party extraction failed, using generic roles");
                CaseParties::default()
            }
        }
    }
}
