pub mod info;
pub mod play;
pub mod search;

use clap::Args;
use std::path::PathBuf;

use moot_core::{CaseRecord, MetadataFilters};

/// Where the precedent corpus lives
#[derive(Args, Debug, Clone)]
pub struct CorpusArgs {
    /// Precedent corpus (JSON array of cases)
    #[arg(long = "cases", env = "MOOT_CASES_PATH", default_value = "enriched_cases.json")]
    pub cases: PathBuf,

    /// Metadata filter, repeatable (e.g. --filter case_type=defamation)
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,
}

impl CorpusArgs {
    pub fn filters(&self) -> MetadataFilters {
        self.filters.iter().cloned().collect()
    }

    /// Load the corpus; a missing or unreadable file means an empty one
    pub async fn load(&self) -> Vec<CaseRecord> {
        match moot_persist::load_cases(&self.cases).await {
            Ok(records) => records,
            Err(e) => {
                crate::print_warning(&format!(
                    "No precedent corpus at {} ({}), arguing without one",
                    self.cases.display(),
                    e
                ));
                Vec::new()
            }
        }
    }
}

/// Parse `key=value`
pub fn parse_filter(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty filter key in '{}'", raw));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_filter("jurisdiction = Supreme Court of India").unwrap(),
            ("jurisdiction".to_string(), "Supreme Court of India".to_string())
        );
        assert_eq!(
            parse_filter("outcome=").unwrap(),
            ("outcome".to_string(), String::new())
        );
        assert!(parse_filter("defamation").is_err());
        assert!(parse_filter("=dismissed").is_err());
    }
}
