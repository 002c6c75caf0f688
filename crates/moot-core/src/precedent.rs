//! Precedent corpus records and metadata filtering

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::argument::CaseMetadata;

/// Exact-match metadata filters (key -> expected value)
pub type MetadataFilters = HashMap<String, String>;

/// One judgment in the precedent corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub case_name: String,
    pub full_text: String,
    pub metadata: CaseMetadata,
}

impl CaseRecord {
    /// Flatten the record into string fields that filters can match against
    pub fn filter_fields(&self) -> HashMap<String, String> {
        let mut fields = HashMap::new();
        fields.insert("case_name".to_string(), self.case_name.clone());
        fields.insert("case_type".to_string(), self.metadata.case_type.clone());
        fields.insert("jurisdiction".to_string(), self.metadata.jurisdiction.clone());
        fields.insert("outcome".to_string(), self.metadata.outcome.clone());
        fields.insert(
            "plaintiff_details".to_string(),
            self.metadata.plaintiff_details.clone(),
        );
        fields.insert(
            "defendant_details".to_string(),
            self.metadata.defendant_details.clone(),
        );
        if let Some(year) = self.metadata.year {
            fields.insert("year".to_string(), year.to_string());
        }
        fields
    }
}

/// Strict AND of case-insensitive exact equality.
///
/// A record is excluded when any filter key is missing from its fields or
/// its value differs. Empty filters match everything.
pub fn matches_filters(fields: &HashMap<String, String>, filters: &MetadataFilters) -> bool {
    filters.iter().all(|(key, expected)| {
        fields
            .get(key)
            .map(|actual| actual.to_lowercase() == expected.to_lowercase())
            .unwrap_or(false)
    })
}
