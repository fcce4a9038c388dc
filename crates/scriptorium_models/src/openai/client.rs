//! Chat completions HTTP client.

use super::conversion::{SseLine, request_body, response_text, sse_line};
use crate::http;
use futures_util::StreamExt;
use scriptorium_core::{GenerateRequest, GenerateResponse};
use scriptorium_error::{ModelsError, ModelsErrorKind, ScriptoriumResult};
use scriptorium_interface::{ScriptoriumDriver, TextStream};
use tracing::{debug, instrument, warn};

/// Default OpenAI API base.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Client for OpenAI and OpenAI-compatible chat completion servers.
///
/// The API key is resolved from the environment at construction. A missing key
/// surfaces as [`ModelsErrorKind::MissingApiKey`] on the first call, so a run
/// that never needs this provider is not blocked by it.
#[derive(Clone)]
pub struct OpenAICompatibleClient {
    client: reqwest::Client,
    api_key: Option<String>,
    api_key_env: Option<String>,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for OpenAICompatibleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAICompatibleClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

impl OpenAICompatibleClient {
    /// Create a client with an explicit key (`None` for servers without auth).
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            api_key_env: None,
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a client whose key is read from `api_key_env`.
    #[instrument(skip(model, base_url))]
    pub fn from_env(api_key_env: &str, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        let api_key = std::env::var(api_key_env).ok().filter(|key| !key.is_empty());
        if api_key.is_none() {
            warn!(api_key_env, "API key not set; calls will fail until it is");
        }
        let mut client = Self::new(api_key, model, base_url);
        client.api_key_env = Some(api_key_env.to_string());
        client
    }

    async fn post(&self, request: &GenerateRequest, stream: bool) -> ScriptoriumResult<reqwest::Response> {
        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Content-Type", "application/json");

        match (&self.api_key, &self.api_key_env) {
            (Some(key), _) => builder = builder.bearer_auth(key),
            (None, Some(env)) => {
                return Err(ModelsError::new(ModelsErrorKind::MissingApiKey(env.clone())).into());
            }
            (None, None) => {}
        }

        let model = request.model().as_deref().unwrap_or(&self.model);
        let body = request_body(model, request, stream);
        debug!(model, prompt_length = request.prompt().len(), "Sending chat completion request");

        http::send(builder.json(&body), self.provider_name()).await
    }
}

#[async_trait::async_trait]
impl ScriptoriumDriver for OpenAICompatibleClient {
    #[instrument(skip(self, request), fields(provider = "openai", model = %self.model))]
    async fn generate(&self, request: &GenerateRequest) -> ScriptoriumResult<GenerateResponse> {
        let response = self.post(request, false).await?;
        let value = http::read_json(response, self.provider_name()).await?;
        let text = response_text(self.provider_name(), &value)?;

        debug!(response_length = text.len(), "Received chat completion");
        Ok(GenerateResponse::from_text(text))
    }

    #[instrument(skip(self, request), fields(provider = "openai", model = %self.model))]
    async fn generate_stream(&self, request: &GenerateRequest) -> ScriptoriumResult<TextStream> {
        let response = self.post(request, true).await?;

        let fragments = async_stream::stream! {
            let mut lines = Box::pin(http::body_lines(response));
            while let Some(line) = lines.next().await {
                match line.and_then(|line| sse_line(&line)) {
                    Ok(SseLine::Delta(text)) if !text.is_empty() => yield Ok(text),
                    Ok(SseLine::Done) => break,
                    Ok(_) => {}
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
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
