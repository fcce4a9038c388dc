//! Replicate HTTP client.

use super::prediction::{Prediction, PredictionStatus, request_body};
use crate::http;
use scriptorium_core::{GenerateRequest, GenerateResponse};
use scriptorium_error::{ModelsError, ModelsErrorKind, ScriptoriumResult};
use scriptorium_interface::ScriptoriumDriver;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default Replicate API base.
pub const DEFAULT_REPLICATE_URL: &str = "https://api.replicate.com/v1";

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLLS: u32 = 600;

/// Replicate predictions client.
///
/// Creates a prediction with `Prefer: wait` and polls its `get` URL until it
/// reaches a terminal state. Streaming uses the single-chunk default.
#[derive(Clone)]
pub struct ReplicateClient {
    client: reqwest::Client,
    api_token: Option<String>,
    api_token_env: String,
    model: String,
    base_url: String,
    poll_interval: Duration,
}

impl std::fmt::Debug for ReplicateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicateClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("has_api_token", &self.api_token.is_some())
            .finish_non_exhaustive()
    }
}

impl ReplicateClient {
    /// Create a client whose token is read from `api_token_env`.
    #[instrument(skip(model, base_url))]
    pub fn from_env(api_token_env: &str, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        let api_token = std::env::var(api_token_env).ok().filter(|t| !t.is_empty());
        if api_token.is_none() {
            warn!(api_token_env, "API token not set; calls will fail until it is");
        }
        Self {
            client: reqwest::Client::new(),
            api_token,
            api_token_env: api_token_env.to_string(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Override the delay between status polls.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn token(&self) -> ScriptoriumResult<&str> {
        self.api_token.as_deref().ok_or_else(|| {
            ModelsError::new(ModelsErrorKind::MissingApiKey(self.api_token_env.clone())).into()
        })
    }

    async fn poll(&self, mut prediction: Prediction) -> ScriptoriumResult<Prediction> {
        let token = self.token()?;
        let mut polls = 0;

        while !prediction.status.is_terminal() {
            let Some(url) = prediction.urls.get.clone() else {
                return Err(ModelsError::new(ModelsErrorKind::Api {
                    provider: self.provider_name().to_string(),
                    message: "pending prediction has no poll URL".to_string(),
                })
                .into());
            };
            if polls >= MAX_POLLS {
                return Err(ModelsError::new(ModelsErrorKind::Api {
                    provider: self.provider_name().to_string(),
                    message: format!("prediction still {} after {} polls", prediction.status, polls),
                })
                .into());
            }

            tokio::time::sleep(self.poll_interval).await;
            polls += 1;

            let response =
                http::send(self.client.get(&url).bearer_auth(token), self.provider_name()).await?;
            prediction = decode_prediction(http::read_json(response, self.provider_name()).await?)?;
            debug!(status = %prediction.status, polls, "Polled prediction");
        }

        Ok(prediction)
    }
}

fn decode_prediction(value: serde_json::Value) -> ScriptoriumResult<Prediction> {
    serde_json::from_value(value).map_err(|e| {
        ModelsError::new(ModelsErrorKind::Api {
            provider: "replicate".to_string(),
            message: format!("unreadable prediction: {}", e),
        })
        .into()
    })
}

#[async_trait::async_trait]
impl ScriptoriumDriver for ReplicateClient {
    #[instrument(skip(self, request), fields(provider = "replicate", model = %self.model))]
    async fn generate(&self, request: &GenerateRequest) -> ScriptoriumResult<GenerateResponse> {
        let token = self.token()?;
        let model = request.model().as_deref().unwrap_or(&self.model);
        let url = format!("{}/models/{}/predictions", self.base_url, model);

        debug!(url = %url, prompt_length = request.prompt().len(), "Creating prediction");
        let response = http::send(
            self.client
                .post(&url)
                .bearer_auth(token)
                .header("Prefer", "wait")
                .json(&request_body(request)),
            self.provider_name(),
        )
        .await?;

        let created = decode_prediction(http::read_json(response, self.provider_name()).await?)?;
        let prediction = self.poll(created).await?;

        match prediction.status {
            PredictionStatus::Succeeded => {
                let text = prediction.output_text();
                debug!(response_length = text.len(), "Prediction succeeded");
                Ok(GenerateResponse::from_text(text))
            }
            _ => Err(ModelsError::new(ModelsErrorKind::Api {
                provider: self.provider_name().to_string(),
                message: prediction.error_message(),
            })
            .into()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "replicate"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
