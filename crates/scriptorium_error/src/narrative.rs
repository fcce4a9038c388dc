//! Generation pipeline error types.

/// Specific error conditions for outline, scene and script generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum NarrativeErrorKind {
    /// A validate-until-accepted stage ran out of attempts
    #[display("Stage '{}' was not accepted after {} attempts", stage, attempts)]
    ExhaustedAttempts {
        /// Stage name, e.g. "key_scenes (act 2)"
        stage: String,
        /// Number of generation attempts made
        attempts: u32,
    },
    /// JSON generation kept producing undecodable output
    #[display("Could not obtain valid JSON for '{}' after {} attempts", stage, attempts)]
    UndecodableOutput {
        /// Stage name
        stage: String,
        /// Number of attempts made
        attempts: u32,
    },
    /// Prompt template rendering failed
    #[display("Template error: {}", _0)]
    TemplateError(String),
    /// Prompt library lacks a required template
    #[display("Prompt library is missing template '{}'", _0)]
    MissingPrompt(String),
    /// Failed to read a prompt library file
    #[display("Failed to read prompt file: {}", _0)]
    FileRead(String),
    /// Failed to parse TOML content
    #[display("Failed to parse TOML: {}", _0)]
    TomlParse(String),
    /// Required run input is absent
    #[display("Missing required input: {}", _0)]
    MissingInput(String),
}

/// Error type for generation pipeline operations.
///
/// # Examples
///
/// ```
/// use scriptorium_error::{NarrativeError, NarrativeErrorKind};
///
/// let err = NarrativeError::new(NarrativeErrorKind::ExhaustedAttempts {
///     stage: "acts".to_string(),
///     attempts: 3,
/// });
/// assert!(err.to_string().contains("after 3 attempts"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Narrative Error: {} at line {} in {}", kind, line, file)]
pub struct NarrativeError {
    /// The specific error condition
    pub kind: NarrativeErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl NarrativeError {
    /// Create a new NarrativeError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: NarrativeErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
