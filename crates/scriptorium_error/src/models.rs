//! Model provider errors.

/// Model provider error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ModelsErrorKind {
    /// Provider name is not one of the known backends
    #[display("Unsupported provider: {}", _0)]
    UnsupportedProvider(String),

    /// JSON was requested but the response could not be decoded
    #[display("Failed to decode model response: {}", _0)]
    Decode(String),

    /// Provider answered with a non-success status or a failed prediction
    #[display("{} API error: {}", provider, message)]
    Api {
        /// Provider name
        provider: String,
        /// Status and body, or failure reason
        message: String,
    },

    /// Request never produced a response
    #[display("{} request failed: {}", provider, message)]
    Transport {
        /// Provider name
        provider: String,
        /// Underlying transport error
        message: String,
    },

    /// Streaming body broke off or carried an unreadable chunk
    #[display("Stream error: {}", _0)]
    Stream(String),

    /// Required API key environment variable is unset
    #[display("Missing API key: environment variable {} is not set", _0)]
    MissingApiKey(String),

    /// Builder error (derive_builder failures)
    #[display("Builder error: {}", _0)]
    Builder(String),
}

impl ModelsErrorKind {
    /// Whether a call failing with this kind should be retried on the fallback provider.
    ///
    /// Decode failures are excluded: the provider answered, the content was bad.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Self::Api { .. } | Self::Transport { .. } | Self::Stream(_) | Self::MissingApiKey(_)
        )
    }
}

/// Model provider error with location tracking.
///
/// # Examples
///
/// ```
/// use scriptorium_error::{ModelsError, ModelsErrorKind};
///
/// let err = ModelsError::new(ModelsErrorKind::UnsupportedProvider("gpt-neo".into()));
/// assert!(err.to_string().contains("Unsupported provider: gpt-neo"));
/// assert!(!err.kind.is_provider_failure());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Models Error: {} at {}:{}", kind, file, line)]
pub struct ModelsError {
    /// The specific error kind
    pub kind: ModelsErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// Source file where error occurred
    pub file: &'static str,
}

impl ModelsError {
    /// Create a new models error.
    #[track_caller]
    pub fn new(kind: ModelsErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Result type for model provider operations.
pub type ModelsResult<T> = Result<T, ModelsError>;
