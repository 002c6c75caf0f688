//! Structured (JSON) output from free-text completions
//!
//! Models asked for JSON still wrap it in markdown fences or a sentence of
//! preamble now and then. [`extract_json`] finds the object; [`parse_structured`]
//! deserializes it with serde, so any missing required field is an error.

use serde::de::DeserializeOwned;

use crate::provider::{LlmError, LlmProvider, LlmRequest};

/// Locate the outermost JSON object in a completion
pub fn extract_json(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

/// Parse a completion into `T`, rejecting malformed or incomplete objects
pub fn parse_structured<T: DeserializeOwned>(content: &str) -> Result<T, LlmError> {
    let json = extract_json(content)
        .ok_or_else(|| LlmError::InvalidResponse("No JSON object in completion".to_string()))?;

    serde_json::from_str(json).map_err(|e| LlmError::InvalidResponse(e.to_string()))
}

/// Run a JSON-mode completion and parse it into `T`
pub async fn complete_structured<T: DeserializeOwned>(
    provider: &dyn LlmProvider,
    request: LlmRequest,
) -> Result<T, LlmError> {
    let response = provider.complete(request.json()).await?;
    parse_structured(&response.content)
}
