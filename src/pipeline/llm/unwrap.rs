//! Response unwrapping for JSON-producing prompts.
//!
//! Models often wrap JSON in a markdown code fence even when asked not to.

use serde::de::DeserializeOwned;

use super::LlmError;

/// Strip a leading markdown code fence (with or without a language tag),
/// its closing fence and surrounding whitespace. Text that does not open
/// with a fence is returned trimmed, backticks inside it untouched.
pub fn unwrap_json_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = match after_open.find('\n') {
        Some(i) if after_open[..i].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            &after_open[i + 1..]
        }
        _ => after_open.strip_prefix("json").unwrap_or(after_open),
    };

    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Unwrap then deserialize a JSON response.
pub fn parse_json_response<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    serde_json::from_str(unwrap_json_fence(text))
        .map_err(|e| LlmError::ResponseParsing(e.to_string()))
}

/// Best-effort array parse. `None` when the response is not a JSON array;
/// otherwise the elements that deserialize into `T` (others are dropped).
pub fn parse_json_array_lenient<T: DeserializeOwned>(text: &str) -> Option<Vec<T>> {
    let value: serde_json::Value = serde_json::from_str(unwrap_json_fence(text)).ok()?;
    let serde_json::Value::Array(items) = value else {
        return None;
    };

    let total = items.len();
    let parsed: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if parsed.len() < total {
        tracing::debug!(
            dropped = total - parsed.len(),
            kept = parsed.len(),
            "Dropped array items that did not match the expected shape"
        );
    }
    Some(parsed)
}
