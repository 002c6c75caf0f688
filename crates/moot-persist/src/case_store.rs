//! Precedent corpus loading
//!
//! The corpus is a JSON array of `{ case_name, full_text, metadata }`
//! objects. Entries that do not parse (raw, unenriched cases usually lack
//! `metadata`) are skipped with a warning instead of failing the load.

use std::path::Path;

use crate::error::StorageError;
use moot_core::CaseRecord;

/// Parse a corpus from a JSON string
pub fn parse_cases(json: &str) -> Result<Vec<CaseRecord>, StorageError> {
    let raw: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let total = raw.len();

    let records: Vec<CaseRecord> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping malformed case record");
                None
            }
        })
        .collect();

    tracing::debug!(loaded = records.len(), total, "Parsed case corpus");
    Ok(records)
}

/// Load a corpus file
pub async fn load_cases(path: impl AsRef<Path>) -> Result<Vec<CaseRecord>, StorageError> {
    let path = path.as_ref();
    let json = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => StorageError::NotFound(path.display().to_string()),
        _ => StorageError::Internal(format!("{}: {}", path.display(), e)),
    })?;

    let records = parse_cases(&json)?;
    tracing::info!(path = %path.display(), cases = records.len(), "Loaded precedent corpus");
    Ok(records)
}
