//! Precedent retrieval boundary
//!
//! The engine asks a [`PrecedentRetriever`] for supporting text once per
//! continuing turn. Retrieval is best effort: errors and timeouts surface
//! here as [`RetrievalError`] and the engine turns them into
//! [`ContextResult::NotFound`].

use async_trait::async_trait;
use std::fmt;

use moot_core::{CaseRecord, MetadataFilters};

/// Context text used whenever no precedent is available
pub const NO_PRECEDENT_FOUND: &str = "No relevant legal precedent found matching the criteria.";

const SUMMARY_CHARS: usize = 1000;

/// Result of one retrieval
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextResult {
    /// Formatted precedent block
    Found(String),
    NotFound,
}

impl ContextResult {
    /// The context text handed to persona A
    pub fn as_str(&self) -> &str {
        match self {
            Self::Found(text) => text,
            Self::NotFound => NO_PRECEDENT_FOUND,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

impl fmt::Display for ContextResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("Embedding failed: {0}")]
    Embedding(String),
    #[error("Index error: {0}")]
    Index(String),
    #[error("Retrieval timed out after {0}ms")]
    Timeout(u64),
}

/// Source of supporting precedent for persona A
#[async_trait]
pub trait PrecedentRetriever: Send + Sync + fmt::Debug {
    /// Best match for `query` among records passing every filter
    async fn retrieve(
        &self,
        query: &str,
        filters: &MetadataFilters,
    ) -> Result<ContextResult, RetrievalError>;
}

/// Retrieval query for one turn: case description, a space, judge input
pub fn build_query(case_description: &str, judge_input: &str) -> String {
    format!("{} {}", case_description, judge_input)
}

/// Render a matched record as the context block persona A reads
pub fn format_precedent(record: &CaseRecord) -> String {
    let metadata = &record.metadata;
    let or_na = |value: &str| {
        if value.trim().is_empty() {
            "N/A".to_string()
        } else {
            value.to_string()
        }
    };
    let year = metadata
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let summary: String = record.full_text.chars().take(SUMMARY_CHARS).collect();

    let block = format!(
        "--- RELEVANT PRECEDENT FOUND ---\n\
         Case Name: {} ({})\n\
         Jurisdiction: {}\n\
         Key Principles: {}\n\
         Outcome: {}\n\
         Summary: \"{}...\"",
        or_na(&record.case_name),
        year,
        or_na(&metadata.jurisdiction),
        metadata.key_legal_principles.join(", "),
        or_na(&metadata.outcome),
        summary,
    );

    block
        .trim()
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use moot_core::CaseMetadata;

    fn record(full_text: &str) -> CaseRecord {
        CaseRecord {
            case_name: "State of Punjab v. Teachers".to_string(),
            full_text: full_text.to_string(),
            metadata: CaseMetadata {
                case_type: "Service Law".to_string(),
                jurisdiction: "Supreme Court of India".to_string(),
                year: Some(1998),
                key_legal_principles: vec![
                    "seniority-cum-merit".to_string(),
                    "revised pay scales".to_string(),
                ],
                plaintiff_details: String::new(),
                defendant_details: String::new(),
                outcome: "Appeals dismissed".to_string(),
            },
        }
    }

    #[test]
    fn test_query_order() {
        assert_eq!(
            build_query("A cat sues its owner.", "Continue the debate."),
            "A cat sues its owner. Continue the debate."
        );
    }

    #[test]
    fn test_not_found_renders_sentinel() {
        assert_eq!(ContextResult::NotFound.as_str(), NO_PRECEDENT_FOUND);
        assert_eq!(ContextResult::NotFound.to_string(), NO_PRECEDENT_FOUND);
        assert!(!ContextResult::NotFound.is_found());
    }

    #[test]
    fn test_format_precedent() {
        let text = format_precedent(&record("  The appeals are dismissed.  "));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "--- RELEVANT PRECEDENT FOUND ---");
        assert_eq!(lines[1], "Case Name: State of Punjab v. Teachers (1998)");
        assert_eq!(lines[2], "Jurisdiction: Supreme Court of India");
        assert_eq!(lines[3], "Key Principles: seniority-cum-merit, revised pay scales");
        assert_eq!(lines[4], "Outcome: Appeals dismissed");
        assert_eq!(lines[5], "Summary: \"  The appeals are dismissed.  ...\"");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_format_missing_fields() {
        let mut r = record("text");
        r.metadata.year = None;
        r.metadata.jurisdiction = String::new();

        let text = format_precedent(&r);
        assert!(text.contains("Case Name: State of Punjab v. Teachers (N/A)"));
        assert!(text.contains("Jurisdiction: N/A"));
    }

    #[test]
    fn test_summary_truncated() {
        let long = "x".repeat(1500);
        let text = format_precedent(&record(&long));
        let summary = text.lines().last().unwrap();
        assert_eq!(summary, format!("Summary: \"{}...\"", "x".repeat(1000)));
    }
}
