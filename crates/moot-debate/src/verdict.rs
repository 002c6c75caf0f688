//! Verdict classification
//!
//! Turns the judge's free text into a [`ContinuationSignal`]. Matching is
//! exact membership after lowercasing and trimming; anything unrecognised
//! keeps the debate going.

use std::collections::HashSet;
use std::fmt;

use moot_core::Winner;

/// Terms that award the debate to the precedent lawyer
pub const PERSONA_A_WIN_TERMS: &[&str] = &[
    "rag wins",
    "raglawyer wins",
    "rag_lawyer wins",
    "rag lawyer wins",
    "prosecution wins",
    "prosecutor_wins",
    "precedent wins",
];

/// Terms that award the debate to the chaos lawyer
pub const PERSONA_B_WIN_TERMS: &[&str] = &[
    "chaos wins",
    "chaos lawyer wins",
    "chaos_lawyer wins",
    "defense wins",
];

/// Terms that end the debate without a winner
pub const QUIT_TERMS: &[&str] = &["quit", "exit", "stop", "end", "finish"];

/// What the judge's input means for the debate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContinuationSignal {
    Continue,
    PersonaAWins,
    PersonaBWins,
    Quit,
}

impl ContinuationSignal {
    /// The verdict this signal records, if it ends the debate
    pub fn verdict(self) -> Option<Winner> {
        match self {
            Self::Continue => None,
            Self::PersonaAWins => Some(Winner::PersonaAWins),
            Self::PersonaBWins => Some(Winner::PersonaBWins),
            Self::Quit => Some(Winner::Quit),
        }
    }
}

impl fmt::Display for ContinuationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => write!(f, "continue"),
            Self::PersonaAWins => write!(f, "persona_a_wins"),
            Self::PersonaBWins => write!(f, "persona_b_wins"),
            Self::Quit => write!(f, "quit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifierError {
    #[error("Term '{term}' appears in both the {first} and {second} sets")]
    OverlappingTerm {
        term: String,
        first: &'static str,
        second: &'static str,
    },
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn term_set<I, S>(terms: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    terms.into_iter().map(|t| normalize(t.as_ref())).collect()
}

/// Classifies judge input against three disjoint term sets
#[derive(Debug, Clone)]
pub struct VerdictClassifier {
    persona_a_terms: HashSet<String>,
    persona_b_terms: HashSet<String>,
    quit_terms: HashSet<String>,
}

impl VerdictClassifier {
    /// Build a classifier. Fails if any normalized term is in more than one set.
    pub fn new<A, B, Q, S>(
        persona_a_terms: A,
        persona_b_terms: B,
        quit_terms: Q,
    ) -> Result<Self, ClassifierError>
    where
        A: IntoIterator<Item = S>,
        B: IntoIterator<Item = S>,
        Q: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classifier = Self {
            persona_a_terms: term_set(persona_a_terms),
            persona_b_terms: term_set(persona_b_terms),
            quit_terms: term_set(quit_terms),
        };

        let sets = [
            ("persona A", &classifier.persona_a_terms),
            ("persona B", &classifier.persona_b_terms),
            ("quit", &classifier.quit_terms),
        ];
        for (i, (first, left)) in sets.iter().enumerate() {
            for (second, right) in &sets[i + 1..] {
                if let Some(term) = left.intersection(right).min() {
                    return Err(ClassifierError::OverlappingTerm {
                        term: term.clone(),
                        first: *first,
                        second: *second,
                    });
                }
            }
        }

        Ok(classifier)
    }

    /// Load term sets from `MOOT_PERSONA_A_TERMS`, `MOOT_PERSONA_B_TERMS` and
    /// `MOOT_QUIT_TERMS` (comma separated). An unset or blank variable keeps
    /// the default set.
    pub fn from_env() -> Result<Self, ClassifierError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClassifierError> {
        let terms = |key: &str, defaults: &[&str]| -> Vec<String> {
            let custom: Vec<String> = lookup(key)
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default();
            if custom.is_empty() {
                defaults.iter().map(|t| t.to_string()).collect()
            } else {
                custom
            }
        };

        Self::new(
            terms("MOOT_PERSONA_A_TERMS", PERSONA_A_WIN_TERMS),
            terms("MOOT_PERSONA_B_TERMS", PERSONA_B_WIN_TERMS),
            terms("MOOT_QUIT_TERMS", QUIT_TERMS),
        )
    }

    /// Map judge input to a signal. Never fails.
    pub fn classify(&self, text: &str) -> ContinuationSignal {
        let normalized = normalize(text);

        if self.persona_a_terms.contains(&normalized) {
            ContinuationSignal::PersonaAWins
        } else if self.persona_b_terms.contains(&normalized) {
            ContinuationSignal::PersonaBWins
        } else if self.quit_terms.contains(&normalized) {
            ContinuationSignal::Quit
        } else {
            ContinuationSignal::Continue
        }
    }

    /// All terms that produce `signal`, sorted
    pub fn terms(&self, signal: ContinuationSignal) -> Vec<&str> {
        let set = match signal {
            ContinuationSignal::PersonaAWins => &self.persona_a_terms,
            ContinuationSignal::PersonaBWins => &self.persona_b_terms,
            ContinuationSignal::Quit => &self.quit_terms,
            ContinuationSignal::Continue => return Vec::new(),
        };
        let mut terms: Vec<&str> = set.iter().map(String::as_str).collect();
        terms.sort_unstable();
        terms
    }
}

impl Default for VerdictClassifier {
    fn default() -> Self {
        Self {
            persona_a_terms: term_set(PERSONA_A_WIN_TERMS),
            persona_b_terms: term_set(PERSONA_B_WIN_TERMS),
            quit_terms: term_set(QUIT_TERMS),
        }
    }
}
