//! Top-level error wrapper types.

use crate::{ConfigError, JsonError, ModelsError, ModelsErrorKind, NarrativeError, StorageError};

/// Every error condition a Scriptorium operation can report.
///
/// # Examples
///
/// ```
/// use scriptorium_error::{ScriptoriumError, StorageError, StorageErrorKind};
///
/// let storage_err = StorageError::new(StorageErrorKind::InvalidKey("../outline.json".into()));
/// let err: ScriptoriumError = storage_err.into();
/// assert!(format!("{}", err).contains("outline.json"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ScriptoriumErrorKind {
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Artifact storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Model provider error
    #[from(ModelsError)]
    Models(ModelsError),
    /// Generation pipeline error
    #[from(NarrativeError)]
    Narrative(NarrativeError),
}

/// Scriptorium error with kind discrimination.
///
/// # Examples
///
/// ```
/// use scriptorium_error::{ScriptoriumResult, ConfigError};
///
/// fn might_fail() -> ScriptoriumResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Scriptorium Error: {}", _0)]
pub struct ScriptoriumError(Box<ScriptoriumErrorKind>);

impl ScriptoriumError {
    /// Create a new error from a kind.
    pub fn new(kind: ScriptoriumErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ScriptoriumErrorKind {
        &self.0
    }

    /// Whether the failure came from the provider rather than from its output.
    ///
    /// These are the errors a fallback provider can recover from.
    ///
    /// ```
    /// use scriptorium_error::{ModelsError, ModelsErrorKind, ScriptoriumError};
    ///
    /// let transport: ScriptoriumError = ModelsError::new(ModelsErrorKind::Transport {
    ///     provider: "ollama".into(),
    ///     message: "reset by peer".into(),
    /// })
    /// .into();
    /// assert!(transport.is_provider_failure());
    ///
    /// let decode: ScriptoriumError =
    ///     ModelsError::new(ModelsErrorKind::Decode("trailing comma".into())).into();
    /// assert!(!decode.is_provider_failure());
    /// assert!(decode.is_decode());
    /// ```
    pub fn is_provider_failure(&self) -> bool {
        match self.kind() {
            ScriptoriumErrorKind::Models(e) => e.kind.is_provider_failure(),
            _ => false,
        }
    }

    /// Whether the model answered but its output was not decodable JSON.
    pub fn is_decode(&self) -> bool {
        match self.kind() {
            ScriptoriumErrorKind::Models(e) => matches!(e.kind, ModelsErrorKind::Decode(_)),
            ScriptoriumErrorKind::Json(_) => true,
            _ => false,
        }
    }
}

// Generic From implementation for any type that converts to ScriptoriumErrorKind
impl<T> From<T> for ScriptoriumError
where
    T: Into<ScriptoriumErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Scriptorium operations.
pub type ScriptoriumResult<T> = std::result::Result<T, ScriptoriumError>;
