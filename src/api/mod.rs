//! Wire payloads exchanged with the campus assistant server.

use serde::{Deserialize, Serialize};

pub mod admin;

/// Body of the POST that opens a streamed turn.
#[derive(Debug, Serialize)]
pub struct ChatStreamRequest {
    pub message: String,
}

/// JSON object carried after the `data: ` prefix of one stream record.
///
/// Only `phase` is mandatory; the remaining fields depend on it. Extra keys
/// the server adds (`message`, `context_used`) are ignored.
#[derive(Debug, Deserialize)]
pub struct StreamPayload {
    pub phase: String,
    #[serde(default)]
    pub partial_response: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
}
