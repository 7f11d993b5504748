use crate::error::{DialogueError, Result};
use crate::models::ChunkAnalysis;

const FENCE: &str = "```";

/// Strip a leading code fence (with optional `json` tag) and a trailing fence
pub fn strip_fences(raw: &str) -> &str {
    let mut content = raw.trim();

    if let Some(rest) = content.strip_prefix(FENCE) {
        content = rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest);
    }
    if let Some(rest) = content.strip_suffix(FENCE) {
        content = rest;
    }

    content.trim()
}

/// Turn a raw extractor reply into a validated chunk analysis
///
/// Not-JSON is a `Parse` error; JSON of the wrong shape is a `Schema` error.
/// No partial recovery is attempted.
pub fn sanitize_response(raw: &str) -> Result<ChunkAnalysis> {
    let cleaned = strip_fences(raw);
    let value: serde_json::Value = serde_json::from_str(cleaned).map_err(DialogueError::Parse)?;
    serde_json::from_value(value).map_err(DialogueError::Schema)
}
