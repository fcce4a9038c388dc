//! Trait definitions for the Scriptorium workspace.
//!
//! [`ScriptoriumDriver`] is the seam between the generation pipeline and the
//! concrete LLM providers; [`ModelResponse`] is the tagged result the model
//! access layer hands back to callers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod response;
mod traits;

pub use response::{ModelResponse, TextStream};
pub use traits::ScriptoriumDriver;
