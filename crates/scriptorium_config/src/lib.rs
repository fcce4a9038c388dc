//! Run configuration for Scriptorium.
//!
//! Configuration is layered with the `config` crate: bundled defaults, then
//! user files, then an explicit file, then `SCRIPTORIUM_*` environment
//! variables. See [`ScriptoriumConfig::load`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;

pub use config::{
    DEFAULT_CONFIG, ModelSelection, PathsConfig, ProviderSettings, ScriptoriumConfig,
};
