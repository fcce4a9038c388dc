//! Ollama HTTP client.

use super::conversion::{endpoint, request_body, response_text, stream_line};
use crate::http;
use futures_util::StreamExt;
use scriptorium_core::{GenerateRequest, GenerateResponse};
use scriptorium_error::ScriptoriumResult;
use scriptorium_interface::{ScriptoriumDriver, TextStream};
use tracing::{debug, info, instrument};

/// Default local Ollama server.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama client for local model execution.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    /// Model name (e.g., "gemma2:27b", "llama3")
    model: String,
    /// Server URL without a trailing slash
    base_url: String,
}

impl OllamaClient {
    /// Create a client against the default localhost server.
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_base_url(model, DEFAULT_OLLAMA_URL)
    }

    /// Create a client against a custom server URL.
    #[instrument(name = "ollama_client_new", skip_all)]
    pub fn with_base_url(model: impl Into<String>, base_url: impl Into<String>) -> Self {
        let model = model.into();
        let base_url = base_url.into().trim_end_matches('/').to_string();

        info!(model = %model, url = %base_url, "Creating Ollama client");

        Self {
            client: reqwest::Client::new(),
            model,
            base_url,
        }
    }

    async fn post(&self, request: &GenerateRequest, stream: bool) -> ScriptoriumResult<reqwest::Response> {
        let model = request.model().as_deref().unwrap_or(&self.model);
        let url = format!("{}{}", self.base_url, endpoint(request));
        let body = request_body(model, request, stream);

        debug!(url = %url, model, prompt_length = request.prompt().len(), "Sending Ollama request");
        http::send(self.client.post(&url).json(&body), self.provider_name()).await
    }
}

#[async_trait::async_trait]
impl ScriptoriumDriver for OllamaClient {
    #[instrument(skip(self, request), fields(provider = "ollama", model = %self.model))]
    async fn generate(&self, request: &GenerateRequest) -> ScriptoriumResult<GenerateResponse> {
        let response = self.post(request, false).await?;
        let value = http::read_json(response, self.provider_name()).await?;
        let text = response_text(&value)?;

        debug!(response_length = text.len(), "Received response from Ollama");
        Ok(GenerateResponse::from_text(text))
    }

    #[instrument(skip(self, request), fields(provider = "ollama", model = %self.model))]
    async fn generate_stream(&self, request: &GenerateRequest) -> ScriptoriumResult<TextStream> {
        let response = self.post(request, true).await?;

        let fragments = async_stream::stream! {
            let mut lines = Box::pin(http::body_lines(response));
            while let Some(line) = lines.next().await {
                match line.and_then(|line| stream_line(&line)) {
                    Ok((text, done)) => {
                        if !text.is_empty() {
                            yield Ok(text);
                        }
                        if done {
                            break;
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(fragments))
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
