//! Closing statements once the judge has ruled
//!
//! Winning and losing lines are fixed per verdict and never depend on what
//! the generators would have said.

use std::str::FromStr;

use moot_core::{CaseMetadata, ChaosArgument, DebateSession, PrecedentArgument, Winner};

const A_VICTORY: &str = "Victory was the only logical outcome. The evidence presented was \
     unequivocal, and the principles of jurisprudence have been upheld.";
const A_VICTORY_CITATION: &str = "Res ipsa loquitur.";
const B_DEFEAT: &str = "A FIX! The system is rigged! My arguments were clearly too advanced \
     for this court's primitive understanding of para-legal quantum mechanics!";
const B_DEFEAT_RHETORIC: &str = "I demand a retrial in the Court of Cosmic Opinion!";

const A_DEFEAT: &str = "A travesty. The court has been swayed by cheap theatrics over the \
     bedrock of established law. The verdict is logically unsound.";
const A_DEFEAT_CITATION: &str = "Aberratio ictus.";
const B_VICTORY: &str = "SILENCE! The court has recognized true genius! My irrefutable logic\u{2014}a \
     dazzling tapestry of chaos and brilliance\u{2014}has prevailed!";
const B_VICTORY_RHETORIC: &str =
    "Let this victory be a lesson to all who dare challenge the beautiful absurdity of the law!";

const ADJOURNED: &str = "The court is adjourned.";

/// What to return when the judge quits without naming a winner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuitNarration {
    /// Return the last real outputs, which may be absent
    #[default]
    Silent,
    /// Return a fixed adjournment line from both personas
    Adjourned,
}

impl FromStr for QuitNarration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "silent" => Ok(Self::Silent),
            "adjourned" => Ok(Self::Adjourned),
            other => Err(format!("unknown quit narration '{}'", other)),
        }
    }
}

/// Both personas' closing outputs
#[derive(Debug, Clone, PartialEq)]
pub struct Narration {
    pub persona_a: Option<PrecedentArgument>,
    pub persona_b: Option<ChaosArgument>,
}

fn concluded(outcome: &str) -> CaseMetadata {
    CaseMetadata {
        case_type: "Concluded".to_string(),
        jurisdiction: String::new(),
        year: None,
        key_legal_principles: Vec::new(),
        plaintiff_details: String::new(),
        defendant_details: String::new(),
        outcome: outcome.to_string(),
    }
}

/// Closing statements for a finished session
///
/// Persona A's closing line keeps the metadata of its last real argument so
/// the citation trail survives the verdict.
pub fn closing_statements(session: &DebateSession, quit: QuitNarration) -> Narration {
    let last_metadata = session
        .latest_persona_a_output()
        .map(|output| output.metadata.clone());

    match session.winner() {
        Winner::PersonaAWins => Narration {
            persona_a: Some(PrecedentArgument::new(
                A_VICTORY,
                A_VICTORY_CITATION,
                last_metadata.unwrap_or_else(|| concluded("Won")),
            )),
            persona_b: Some(ChaosArgument::new(B_DEFEAT, B_DEFEAT_RHETORIC)),
        },
        Winner::PersonaBWins => Narration {
            persona_a: Some(PrecedentArgument::new(
                A_DEFEAT,
                A_DEFEAT_CITATION,
                last_metadata.unwrap_or_else(|| concluded("Lost")),
            )),
            persona_b: Some(ChaosArgument::new(B_VICTORY, B_VICTORY_RHETORIC)),
        },
        Winner::Quit => match quit {
            QuitNarration::Silent => Narration {
                persona_a: session.latest_persona_a_output().cloned(),
                persona_b: session.latest_persona_b_output().cloned(),
            },
            QuitNarration::Adjourned => Narration {
                persona_a: Some(PrecedentArgument::new(
                    ADJOURNED,
                    "N/A",
                    last_metadata.unwrap_or_else(|| concluded("Adjourned")),
                )),
                persona_b: Some(ChaosArgument::new(ADJOURNED, "N/A")),
            },
        },
        Winner::None => Narration {
            persona_a: session.latest_persona_a_output().cloned(),
            persona_b: session.latest_persona_b_output().cloned(),
        },
    }
}
