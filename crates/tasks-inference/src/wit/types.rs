//! wit.ai API response types not shared with the core schema.

use serde::Deserialize;

/// Error body returned on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct WitErrorResponse {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub code: Option<String>,
}

impl WitErrorResponse {
    /// Fallback when the body is not a wit.ai error object.
    pub fn unknown(body: &str) -> Self {
        let error = if body.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            body.trim().to_string()
        };
        Self { error, code: None }
    }
}
