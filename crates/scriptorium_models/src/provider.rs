//! Provider selection by name.

use crate::{
    DEFAULT_OLLAMA_URL, DEFAULT_OPENAI_URL, DEFAULT_REPLICATE_URL, OllamaClient,
    OpenAICompatibleClient, ReplicateClient,
};
use scriptorium_config::ProviderSettings;
use scriptorium_error::{ModelsError, ModelsErrorKind, ScriptoriumResult};
use scriptorium_interface::ScriptoriumDriver;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Supported LLM backends.
///
/// ```
/// use scriptorium_models::ProviderKind;
///
/// assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAI);
/// assert_eq!(ProviderKind::Replicate.to_string(), "replicate");
/// assert!("gemini".parse::<ProviderKind>().is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum ProviderKind {
    /// Local Ollama server
    Ollama,
    /// OpenAI or an OpenAI-compatible server
    OpenAI,
    /// Replicate hosted predictions
    Replicate,
}

impl ProviderKind {
    /// Parse a provider name, failing with [`ModelsErrorKind::UnsupportedProvider`].
    pub fn from_name(name: &str) -> ScriptoriumResult<Self> {
        Self::from_str(name).map_err(|_| {
            ModelsError::new(ModelsErrorKind::UnsupportedProvider(name.to_string())).into()
        })
    }

    /// Base URL used when the configuration leaves it empty.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Ollama => DEFAULT_OLLAMA_URL,
            Self::OpenAI => DEFAULT_OPENAI_URL,
            Self::Replicate => DEFAULT_REPLICATE_URL,
        }
    }

    /// API key variable used when the configuration leaves it unset.
    pub fn default_api_key_env(self) -> Option<&'static str> {
        match self {
            Self::Ollama => None,
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Replicate => Some("REPLICATE_API_TOKEN"),
        }
    }
}

/// Build a driver for `provider` serving `model`.
///
/// # Errors
///
/// [`ModelsErrorKind::UnsupportedProvider`] for an unknown provider name.
/// Missing API keys are reported by the driver on its first call.
#[instrument(skip(settings))]
pub fn create_driver(
    provider: &str,
    model: &str,
    settings: &ProviderSettings,
) -> ScriptoriumResult<Arc<dyn ScriptoriumDriver>> {
    let kind = ProviderKind::from_name(provider)?;
    let base_url = if settings.base_url.is_empty() {
        kind.default_base_url().to_string()
    } else {
        settings.base_url.clone()
    };
    let api_key_env = settings
        .api_key_env
        .clone()
        .or_else(|| kind.default_api_key_env().map(str::to_string));

    debug!(%kind, base_url = %base_url, "Creating driver");

    let driver: Arc<dyn ScriptoriumDriver> = match (kind, api_key_env) {
        (ProviderKind::Ollama, _) => Arc::new(OllamaClient::with_base_url(model, base_url)),
        (ProviderKind::OpenAI, Some(env)) => {
            Arc::new(OpenAICompatibleClient::from_env(&env, model, base_url))
        }
        (ProviderKind::OpenAI, None) => {
            Arc::new(OpenAICompatibleClient::new(None, model, base_url))
        }
        (ProviderKind::Replicate, env) => Arc::new(ReplicateClient::from_env(
            env.as_deref().unwrap_or("REPLICATE_API_TOKEN"),
            model,
            base_url,
        )),
    };
    Ok(driver)
}
