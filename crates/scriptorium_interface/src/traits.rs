//! Trait definitions for LLM backends.

use crate::TextStream;
use async_trait::async_trait;
use scriptorium_core::{GenerateRequest, GenerateResponse};
use scriptorium_error::ScriptoriumResult;
use std::sync::Arc;

/// Core trait that all LLM backends must implement.
///
/// A driver turns one [`GenerateRequest`] into one response. Request shape
/// (prompt or chat history, JSON mode, model override) is carried by the
/// request itself; drivers map it onto their wire format.
#[async_trait]
pub trait ScriptoriumDriver: Send + Sync {
    /// Generate a complete response.
    async fn generate(&self, req: &GenerateRequest) -> ScriptoriumResult<GenerateResponse>;

    /// Generate a response as a stream of text fragments.
    ///
    /// The default runs a normal generation and yields its text as a single
    /// fragment, for backends without incremental output.
    async fn generate_stream(&self, req: &GenerateRequest) -> ScriptoriumResult<TextStream> {
        let response = self.generate(req).await?;
        let fragments: Vec<ScriptoriumResult<String>> = vec![Ok(response.text())];
        Ok(Box::pin(futures_util::stream::iter(fragments)))
    }

    /// Provider name (e.g., "ollama", "openai").
    fn provider_name(&self) -> &'static str;

    /// Default model identifier (e.g., "gemma2:27b").
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<T> ScriptoriumDriver for Arc<T>
where
    T: ScriptoriumDriver + ?Sized,
{
    async fn generate(&self, req: &GenerateRequest) -> ScriptoriumResult<GenerateResponse> {
        (**self).generate(req).await
    }

    async fn generate_stream(&self, req: &GenerateRequest) -> ScriptoriumResult<TextStream> {
        (**self).generate_stream(req).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
