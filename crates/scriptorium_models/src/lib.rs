//! LLM provider integrations for Scriptorium.
//!
//! # Available Providers
//!
//! - **Ollama** (`ollama`): local server, `/api/generate` and `/api/chat`
//! - **OpenAI** (`openai`): chat completions, also any compatible server
//! - **Replicate** (`replicate`): hosted predictions
//!
//! Providers are chosen by name at run time with [`create_driver`].
//! [`ModelService`] turns driver output into a [`ModelResponse`], decoding
//! JSON when asked, and [`TieredModel`] adds a one-shot fallback provider.
//!
//! # Example
//!
//! ```no_run
//! use scriptorium_config::ScriptoriumConfig;
//! use scriptorium_models::{GenerateOptions, TieredModel};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ScriptoriumConfig::load()?;
//! let model = TieredModel::from_config(&config.generation(), &config)?;
//!
//! let acts = model.generate_json("List three acts as JSON.").await?;
//! let text = model
//!     .generate("Write a logline.", &GenerateOptions::text())
//!     .await?
//!     .collect_text()
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`ModelResponse`]: scriptorium_interface::ModelResponse

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod extraction;
mod http;
mod ollama;
mod openai;
mod provider;
mod replicate;
mod service;
mod tiered;

pub use extraction::{decode_json, extract_json};
pub use ollama::{DEFAULT_OLLAMA_URL, OllamaClient};
pub use openai::{DEFAULT_OPENAI_URL, OpenAICompatibleClient};
pub use provider::{ProviderKind, create_driver};
pub use replicate::{DEFAULT_REPLICATE_URL, ReplicateClient};
pub use service::{GenerateOptions, ModelService};
pub use tiered::{TierOutcome, TieredModel};
