//! Primary provider with a one-shot per-call fallback.

use crate::{GenerateOptions, ModelService};
use scriptorium_config::{ModelSelection, ScriptoriumConfig};
use scriptorium_core::Message;
use scriptorium_error::{ScriptoriumError, ScriptoriumResult};
use scriptorium_interface::ModelResponse;
use serde_json::Value;
use tracing::{instrument, warn};

/// How a tiered call resolved.
#[derive(Debug)]
pub enum TierOutcome {
    /// The primary provider answered
    Primary(ModelResponse),
    /// The primary failed and the fallback answered
    Fallback(ModelResponse),
    /// No tier produced a response
    Failed {
        /// What went wrong, including the primary failure when the fallback also failed
        reason: String,
        /// The last error raised
        error: ScriptoriumError,
    },
}

impl TierOutcome {
    /// Collapse into the response or the final error.
    pub fn into_result(self) -> ScriptoriumResult<ModelResponse> {
        match self {
            TierOutcome::Primary(response) | TierOutcome::Fallback(response) => Ok(response),
            TierOutcome::Failed { error, .. } => Err(error),
        }
    }

    /// Whether the answer came from the fallback.
    pub fn used_fallback(&self) -> bool {
        matches!(self, TierOutcome::Fallback(_))
    }
}

/// A primary [`ModelService`] with an optional fallback.
///
/// Only provider failures (transport, API status, stream breakage, missing
/// key) fall through to the fallback; a decode failure means the provider
/// answered, and is returned to the caller as is. The fallback is tried once
/// for the failing call only, with its own default model; the next call
/// starts on the primary again.
#[derive(Debug, Clone)]
pub struct TieredModel {
    primary: ModelService,
    fallback: Option<ModelService>,
}

impl TieredModel {
    /// Pair a primary with an optional fallback.
    pub fn new(primary: ModelService, fallback: Option<ModelService>) -> Self {
        Self { primary, fallback }
    }

    /// Build `primary` with the configured fallback provider and model.
    ///
    /// No fallback is attached when it is the same provider and model as the primary.
    pub fn from_config(
        primary: &ModelSelection,
        config: &ScriptoriumConfig,
    ) -> ScriptoriumResult<Self> {
        let fallback_selection = config.fallback();
        let fallback = if fallback_selection == *primary {
            None
        } else {
            Some(ModelService::from_selection(&fallback_selection, config)?)
        };
        Ok(Self::new(
            ModelService::from_selection(primary, config)?,
            fallback,
        ))
    }

    /// The primary service.
    pub fn primary(&self) -> &ModelService {
        &self.primary
    }

    /// The fallback service, if any.
    pub fn fallback(&self) -> Option<&ModelService> {
        self.fallback.as_ref()
    }

    /// Generate from a prompt, reporting which tier answered.
    #[instrument(skip(self, prompt, options), fields(primary = %self.primary.label()))]
    pub async fn generate_outcome(&self, prompt: &str, options: &GenerateOptions) -> TierOutcome {
        let primary = self.primary.generate(prompt, options).await;
        match primary {
            Ok(response) => TierOutcome::Primary(response),
            Err(error) => match self.fallback_for(&error) {
                Some(fallback) => {
                    let result = fallback.generate(prompt, &options.for_fallback()).await;
                    Self::resolve_fallback(fallback, error, result)
                }
                None => Self::fail(error),
            },
        }
    }

    /// Chat, reporting which tier answered.
    #[instrument(skip(self, messages, options), fields(primary = %self.primary.label()))]
    pub async fn chat_outcome(
        &self,
        messages: Vec<Message>,
        options: &GenerateOptions,
    ) -> TierOutcome {
        let primary = self.primary.chat(messages.clone(), options).await;
        match primary {
            Ok(response) => TierOutcome::Primary(response),
            Err(error) => match self.fallback_for(&error) {
                Some(fallback) => {
                    let result = fallback.chat(messages, &options.for_fallback()).await;
                    Self::resolve_fallback(fallback, error, result)
                }
                None => Self::fail(error),
            },
        }
    }

    /// Generate from a prompt.
    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> ScriptoriumResult<ModelResponse> {
        self.generate_outcome(prompt, options).await.into_result()
    }

    /// Chat.
    pub async fn chat(
        &self,
        messages: Vec<Message>,
        options: &GenerateOptions,
    ) -> ScriptoriumResult<ModelResponse> {
        self.chat_outcome(messages, options).await.into_result()
    }

    /// Generate and return the parsed JSON value.
    pub async fn generate_json(&self, prompt: &str) -> ScriptoriumResult<Value> {
        self.generate(prompt, &GenerateOptions::json())
            .await?
            .into_json()
    }

    fn fallback_for(&self, error: &ScriptoriumError) -> Option<&ModelService> {
        if !error.is_provider_failure() {
            return None;
        }
        let fallback = self.fallback.as_ref()?;
        warn!(
            error = %error,
            fallback = %fallback.label(),
            "Primary provider failed, retrying once on fallback"
        );
        Some(fallback)
    }

    fn resolve_fallback(
        fallback: &ModelService,
        primary_error: ScriptoriumError,
        result: ScriptoriumResult<ModelResponse>,
    ) -> TierOutcome {
        match result {
            Ok(response) => TierOutcome::Fallback(response),
            Err(error) => {
                warn!(error = %error, fallback = %fallback.label(), "Fallback provider failed");
                TierOutcome::Failed {
                    reason: format!(
                        "primary failed ({}); fallback {} failed",
                        primary_error,
                        fallback.label()
                    ),
                    error,
                }
            }
        }
    }

    fn fail(error: ScriptoriumError) -> TierOutcome {
        let reason = if error.is_provider_failure() {
            "primary failed and no fallback is configured".to_string()
        } else {
            "primary answered with unusable output".to_string()
        };
        TierOutcome::Failed { reason, error }
    }
}
