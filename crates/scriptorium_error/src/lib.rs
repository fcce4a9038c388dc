//! Error types for the Scriptorium workspace.
//!
//! # Error Hierarchy
//!
//! Errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - Constructors use `#[track_caller]` for automatic location capture
//!
//! Everything converts into [`ScriptoriumError`] with `?`.
//!
//! # Examples
//!
//! ```
//! use scriptorium_error::{ScriptoriumResult, NarrativeError, NarrativeErrorKind};
//!
//! fn build_acts() -> ScriptoriumResult<()> {
//!     Err(NarrativeError::new(NarrativeErrorKind::ExhaustedAttempts {
//!         stage: "acts".into(),
//!         attempts: 3,
//!     }))?
//! }
//!
//! let err = build_acts().unwrap_err();
//! assert!(err.to_string().contains("acts"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod message;
mod models;
mod narrative;
mod storage;

pub use error::{ScriptoriumError, ScriptoriumErrorKind, ScriptoriumResult};
pub use message::{ConfigError, JsonError};
pub use models::{ModelsError, ModelsErrorKind, ModelsResult};
pub use narrative::{NarrativeError, NarrativeErrorKind};
pub use storage::{StorageError, StorageErrorKind};
