//! Scriptorium - screenplay generation with large language models
//!
//! Scriptorium turns a one-paragraph concept into a screenplay. It builds a
//! hierarchical outline through validated stages, develops characters and
//! themes, then writes every sub-scene with a score-and-refine loop and
//! reviews the assembled script.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use scriptorium::{RunFlags, ScriptAutomator, ScriptoriumConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScriptoriumConfig::load()?;
//!     let automator = ScriptAutomator::from_config(config)?;
//!     let summary = automator.run(RunFlags::all()).await?;
//!     println!("{} acts written", summary.outline().acts.len());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Scriptorium is organized as a workspace with focused crates:
//!
//! - `scriptorium_error` - Error types
//! - `scriptorium_core` - Outline, scene and evaluation types
//! - `scriptorium_interface` - ScriptoriumDriver trait definition
//! - `scriptorium_config` - Layered TOML and environment configuration
//! - `scriptorium_storage` - Artifact stores (filesystem, in-memory)
//! - `scriptorium_models` - Ollama, OpenAI-compatible and Replicate drivers
//! - `scriptorium_narrative` - Outline, scene and refinement pipeline
//!
//! This crate (`scriptorium`) re-exports everything for convenience and
//! ships the `scriptorium` binary.

pub mod observability;

pub use observability::{LoggingConfig, init_logging};

pub use scriptorium_config::*;
pub use scriptorium_core::*;
pub use scriptorium_error::*;
pub use scriptorium_interface::*;
pub use scriptorium_models::*;
pub use scriptorium_narrative::*;
pub use scriptorium_storage::*;
