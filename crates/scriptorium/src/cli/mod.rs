//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the scriptorium binary.

mod commands;
mod run;

pub use commands::{Cli, Commands, run_flags};
pub use run::{ask, merge_outline_files, run_pipeline};
