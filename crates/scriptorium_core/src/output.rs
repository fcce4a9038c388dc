//! Output types from LLM responses.

use serde::{Deserialize, Serialize};

/// One piece of model output.
///
/// Providers with a native JSON mode may hand back an already parsed value;
/// everything else arrives as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Output {
    /// Plain text output.
    Text(String),

    /// Structured JSON output.
    Json(serde_json::Value),
}

impl Output {
    /// Render the output as text; JSON is serialized compactly.
    pub fn as_text(&self) -> String {
        match self {
            Output::Text(text) => text.clone(),
            Output::Json(value) => value.to_string(),
        }
    }
}
