//! Replicate predictions API client.

mod client;
mod prediction;

pub use client::{DEFAULT_REPLICATE_URL, ReplicateClient};
