//! OpenAI-compatible chat completions client.

mod client;
mod conversion;

pub use client::{DEFAULT_OPENAI_URL, OpenAICompatibleClient};
