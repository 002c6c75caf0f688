//! Structured persona outputs
//!
//! Each persona produces its own typed argument. The engine only ever reads
//! the `argument` text; the other fields travel to the caller untouched.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Metadata describing a legal case, either cited by the precedent lawyer or
/// attached to a corpus record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CaseMetadata {
    /// Legal category, e.g. "defamation"
    pub case_type: String,
    /// Relevant jurisdiction, e.g. "Supreme Court of India"
    pub jurisdiction: String,
    /// Year of the judgment
    #[serde(default)]
    pub year: Option<i32>,
    /// Core legal principles cited
    pub key_legal_principles: Vec<String>,
    #[serde(default)]
    pub plaintiff_details: String,
    #[serde(default)]
    pub defendant_details: String,
    /// Brief summary of the outcome, e.g. "dismissed"
    pub outcome: String,
}

impl CaseMetadata {
    /// Metadata with every descriptive field set to the same marker
    pub fn marked(marker: &str) -> Self {
        Self {
            case_type: marker.to_string(),
            jurisdiction: marker.to_string(),
            year: None,
            key_legal_principles: Vec::new(),
            plaintiff_details: String::new(),
            defendant_details: String::new(),
            outcome: marker.to_string(),
        }
    }
}

/// Output of the precedent-grounded lawyer (persona A)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PrecedentArgument {
    /// The detailed, fact-based legal argument
    pub argument: String,
    /// A relevant case law, statute, or precedent
    pub citation: String,
    pub metadata: CaseMetadata,
}

impl PrecedentArgument {
    pub fn new(argument: &str, citation: &str, metadata: CaseMetadata) -> Self {
        Self {
            argument: argument.to_string(),
            citation: citation.to_string(),
            metadata,
        }
    }

    /// An argument without a citation, mostly useful in tests and demos
    pub fn uncited(argument: &str) -> Self {
        Self::new(argument, "N/A", CaseMetadata::marked("N/A"))
    }
}

/// Output of the chaos lawyer (persona B)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChaosArgument {
    /// The absurd, exaggerated counter-argument
    pub argument: String,
    /// The rhetorical style or flourish used
    pub rhetoric: String,
}

impl ChaosArgument {
    pub fn new(argument: &str, rhetoric: &str) -> Self {
        Self {
            argument: argument.to_string(),
            rhetoric: rhetoric.to_string(),
        }
    }
}

/// Either persona's output, tagged by persona
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "persona", rename_all = "snake_case")]
pub enum StructuredArgument {
    Precedent(PrecedentArgument),
    Chaos(ChaosArgument),
}

impl StructuredArgument {
    /// The argument text, regardless of persona
    pub fn argument(&self) -> &str {
        match self {
            Self::Precedent(a) => &a.argument,
            Self::Chaos(a) => &a.argument,
        }
    }
}

impl From<PrecedentArgument> for StructuredArgument {
    fn from(value: PrecedentArgument) -> Self {
        Self::Precedent(value)
    }
}

impl From<ChaosArgument> for StructuredArgument {
    fn from(value: ChaosArgument) -> Self {
        Self::Chaos(value)
    }
}
