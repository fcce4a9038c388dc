//! Message-only error types.
//!
//! These errors carry a free-form message plus the source location that
//! created them. They are generated by one macro so that every variant shares
//! the same shape and `Display` format.

macro_rules! message_error {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, derive_more::Error)]
        pub struct $name {
            /// The underlying error message
            pub message: String,
            /// Line number where the error occurred
            pub line: u32,
            /// File where the error occurred
            pub file: &'static str,
        }

        impl $name {
            /// Create a new error with the given message at the caller's location.
            #[track_caller]
            pub fn new(message: impl Into<String>) -> Self {
                let location = std::panic::Location::caller();
                Self {
                    message: message.into(),
                    line: location.line(),
                    file: location.file(),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(
                    f,
                    "{}: {} at line {} in {}",
                    $label, self.message, self.line, self.file
                )
            }
        }
    };
}

message_error!(
    /// JSON serialization or deserialization failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use scriptorium_error::JsonError;
    ///
    /// let err = JsonError::new("expected value at line 1 column 1");
    /// assert!(err.message.contains("expected value"));
    /// ```
    JsonError,
    "JSON Error"
);

message_error!(
    /// Configuration could not be loaded or is inconsistent.
    ///
    /// # Examples
    ///
    /// ```
    /// use scriptorium_error::ConfigError;
    ///
    /// let err = ConfigError::new("good_scene_threshold must be at most 100");
    /// assert!(err.to_string().contains("Configuration Error"));
    /// ```
    ConfigError,
    "Configuration Error"
);
