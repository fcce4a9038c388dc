//! Discriminated model responses.

use futures_util::stream::{Stream, StreamExt};
use scriptorium_error::{ModelsError, ModelsErrorKind, ScriptoriumResult};
use serde_json::Value;
use std::pin::Pin;

/// Lazy, single-pass, finite sequence of text fragments.
pub type TextStream = Pin<Box<dyn Stream<Item = ScriptoriumResult<String>> + Send>>;

/// What a model call produced.
///
/// Callers branch on the tag instead of probing the value's shape.
pub enum ModelResponse {
    /// Complete text
    Text(String),
    /// Parsed JSON (JSON mode)
    Structured(Value),
    /// Incremental text fragments (streaming mode)
    Stream(TextStream),
}

impl std::fmt::Debug for ModelResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelResponse::Text(text) => f.debug_tuple("Text").field(text).finish(),
            ModelResponse::Structured(value) => f.debug_tuple("Structured").field(value).finish(),
            ModelResponse::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl ModelResponse {
    /// Short tag for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ModelResponse::Text(_) => "text",
            ModelResponse::Structured(_) => "structured",
            ModelResponse::Stream(_) => "stream",
        }
    }

    /// Take the parsed JSON value.
    ///
    /// Fails with a decode error for any other variant.
    ///
    /// ```
    /// use scriptorium_interface::ModelResponse;
    /// use serde_json::json;
    ///
    /// let value = ModelResponse::Structured(json!({"acts": []})).into_json().unwrap();
    /// assert_eq!(value, json!({"acts": []}));
    /// assert!(ModelResponse::Text("hi".into()).into_json().is_err());
    /// ```
    pub fn into_json(self) -> ScriptoriumResult<Value> {
        match self {
            ModelResponse::Structured(value) => Ok(value),
            other => Err(ModelsError::new(ModelsErrorKind::Decode(format!(
                "expected structured output, got {}",
                other.kind()
            )))
            .into()),
        }
    }

    /// Collect the response as text, draining a stream if necessary.
    pub async fn collect_text(self) -> ScriptoriumResult<String> {
        match self {
            ModelResponse::Text(text) => Ok(text),
            ModelResponse::Structured(value) => Ok(value.to_string()),
            ModelResponse::Stream(mut stream) => {
                let mut text = String::new();
                while let Some(fragment) = stream.next().await {
                    text.push_str(&fragment?);
                }
                Ok(text)
            }
        }
    }
}
