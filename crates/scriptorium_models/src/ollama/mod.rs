//! Ollama local model server client.

mod client;
mod conversion;

pub use client::{DEFAULT_OLLAMA_URL, OllamaClient};
