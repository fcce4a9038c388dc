//! Request and response types for LLM generation.

use crate::{Message, Output};
use serde::{Deserialize, Serialize};

/// What the model is asked to continue: a bare prompt or a chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prompt {
    /// Single prompt string
    Text(String),
    /// Structured message history
    Messages(Vec<Message>),
}

impl Prompt {
    /// Total characters across the prompt, for logging.
    pub fn len(&self) -> usize {
        match self {
            Prompt::Text(text) => text.len(),
            Prompt::Messages(messages) => messages.iter().map(|m| m.content().len()).sum(),
        }
    }

    /// Whether the prompt carries no text at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten a chat history into `role: content` lines.
    ///
    /// Used by providers that only take a single prompt string.
    pub fn to_plain_text(&self) -> String {
        match self {
            Prompt::Text(text) => text.clone(),
            Prompt::Messages(messages) => messages
                .iter()
                .map(|m| format!("{}: {}", m.role().as_str(), m.content()))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl From<&str> for Prompt {
    fn from(text: &str) -> Self {
        Prompt::Text(text.to_string())
    }
}

impl From<String> for Prompt {
    fn from(text: String) -> Self {
        Prompt::Text(text)
    }
}

impl From<Vec<Message>> for Prompt {
    fn from(messages: Vec<Message>) -> Self {
        Prompt::Messages(messages)
    }
}

/// Constrained output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResponseFormat {
    /// The model must answer with a single JSON value
    Json,
}

/// Provider-neutral generation request.
///
/// # Examples
///
/// ```
/// use scriptorium_core::{GenerateRequest, Prompt, ResponseFormat};
///
/// let request = GenerateRequest::builder()
///     .prompt("List the acts as JSON.")
///     .format(ResponseFormat::Json)
///     .build()
///     .unwrap();
///
/// assert_eq!(*request.format(), Some(ResponseFormat::Json));
/// assert!(!request.stream());
/// assert!(matches!(request.prompt(), Prompt::Text(_)));
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_builder::Builder,
    derive_getters::Getters,
)]
#[builder(setter(into))]
pub struct GenerateRequest {
    /// Prompt string or message history
    prompt: Prompt,
    /// Model override; the driver's own model when absent
    #[builder(default)]
    model: Option<String>,
    /// Whether to stream incremental fragments
    #[builder(default)]
    #[getter(skip)]
    stream: bool,
    /// Required output format
    #[builder(default)]
    format: Option<ResponseFormat>,
    /// Extra provider options merged into the request body
    #[builder(default)]
    options: serde_json::Map<String, serde_json::Value>,
}

impl GenerateRequest {
    /// Start building a request.
    pub fn builder() -> GenerateRequestBuilder {
        GenerateRequestBuilder::default()
    }

    /// Whether streaming was requested.
    pub fn stream(&self) -> bool {
        self.stream
    }

    /// Whether JSON output was requested.
    pub fn wants_json(&self) -> bool {
        self.format == Some(ResponseFormat::Json)
    }
}

/// The unified response object.
///
/// # Examples
///
/// ```
/// use scriptorium_core::{GenerateResponse, Output};
///
/// let response = GenerateResponse {
///     outputs: vec![Output::Text("FADE IN:".to_string())],
/// };
/// assert_eq!(response.text(), "FADE IN:");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The generated outputs from the model
    pub outputs: Vec<Output>,
}

impl GenerateResponse {
    /// Wrap a single text output.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            outputs: vec![Output::Text(text.into())],
        }
    }

    /// Concatenate every output as text.
    pub fn text(&self) -> String {
        self.outputs.iter().map(Output::as_text).collect()
    }
}
