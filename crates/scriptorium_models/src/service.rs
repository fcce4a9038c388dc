//! Provider-independent model calls.

use crate::{create_driver, decode_json};
use scriptorium_config::{ModelSelection, ScriptoriumConfig};
use scriptorium_core::{GenerateRequest, Message, Output, Prompt, ResponseFormat};
use scriptorium_error::{ModelsError, ModelsErrorKind, ScriptoriumResult};
use scriptorium_interface::{ModelResponse, ScriptoriumDriver};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Per-call options.
///
/// ```
/// use scriptorium_models::GenerateOptions;
///
/// let options = GenerateOptions::json().with_model("gpt-4o-mini");
/// assert!(options.wants_json());
/// assert!(!options.stream);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateOptions {
    /// Model override for this call
    pub model: Option<String>,
    /// Return incremental fragments
    pub stream: bool,
    /// Required output format
    pub format: Option<ResponseFormat>,
    /// Extra provider options (e.g. `temperature`)
    pub options: Map<String, Value>,
}

impl GenerateOptions {
    /// Plain, non-streamed text.
    pub fn text() -> Self {
        Self::default()
    }

    /// Parsed JSON.
    pub fn json() -> Self {
        Self {
            format: Some(ResponseFormat::Json),
            ..Self::default()
        }
    }

    /// Streamed text.
    pub fn streaming() -> Self {
        Self {
            stream: true,
            ..Self::default()
        }
    }

    /// Use `model` instead of the service default.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Whether JSON output was requested.
    pub fn wants_json(&self) -> bool {
        self.format == Some(ResponseFormat::Json)
    }

    /// The same options without the model override, for a fallback provider.
    ///
    /// ```
    /// use scriptorium_models::GenerateOptions;
    ///
    /// let options = GenerateOptions::json().with_model("llama3").for_fallback();
    /// assert_eq!(options.model, None);
    /// assert!(options.wants_json());
    /// ```
    pub fn for_fallback(&self) -> Self {
        Self {
            model: None,
            ..self.clone()
        }
    }

    fn request(&self, prompt: Prompt) -> ScriptoriumResult<GenerateRequest> {
        GenerateRequest::builder()
            .prompt(prompt)
            .model(self.model.clone())
            .stream(self.stream)
            .format(self.format)
            .options(self.options.clone())
            .build()
            .map_err(|e| ModelsError::new(ModelsErrorKind::Builder(e.to_string())).into())
    }
}

/// One provider and default model, with response decoding.
#[derive(Clone)]
pub struct ModelService {
    driver: Arc<dyn ScriptoriumDriver>,
}

impl std::fmt::Debug for ModelService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelService")
            .field("provider", &self.driver.provider_name())
            .field("model", &self.driver.model_name())
            .finish()
    }
}

impl ModelService {
    /// Wrap an existing driver.
    pub fn new(driver: Arc<dyn ScriptoriumDriver>) -> Self {
        Self { driver }
    }

    /// Build the driver for `selection` using the configured provider settings.
    pub fn from_selection(
        selection: &ModelSelection,
        config: &ScriptoriumConfig,
    ) -> ScriptoriumResult<Self> {
        let settings = config.provider_settings(&selection.provider);
        let driver = create_driver(&selection.provider, &selection.model, &settings)?;
        Ok(Self::new(driver))
    }

    /// Provider name of the underlying driver.
    pub fn provider_name(&self) -> &'static str {
        self.driver.provider_name()
    }

    /// Default model of the underlying driver.
    pub fn model_name(&self) -> &str {
        self.driver.model_name()
    }

    /// Human-readable `provider - model (default)` label.
    pub fn label(&self) -> String {
        format!("{} - {} (default)", self.provider_name(), self.model_name())
    }

    /// Generate from a single prompt string.
    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> ScriptoriumResult<ModelResponse> {
        self.call(Prompt::Text(prompt.to_string()), options).await
    }

    /// Generate from a chat history.
    pub async fn chat(
        &self,
        messages: Vec<Message>,
        options: &GenerateOptions,
    ) -> ScriptoriumResult<ModelResponse> {
        self.call(Prompt::Messages(messages), options).await
    }

    #[instrument(
        skip(self, prompt, options),
        fields(
            provider = self.provider_name(),
            model = options.model.as_deref().unwrap_or(self.model_name()),
            prompt_length = prompt.len(),
            json = options.wants_json(),
            stream = options.stream,
        )
    )]
    async fn call(
        &self,
        prompt: Prompt,
        options: &GenerateOptions,
    ) -> ScriptoriumResult<ModelResponse> {
        let request = options.request(prompt)?;

        if request.stream() {
            let stream = self.driver.generate_stream(&request).await?;
            return Ok(ModelResponse::Stream(stream));
        }

        let response = self.driver.generate(&request).await?;
        if !request.wants_json() {
            return Ok(ModelResponse::Text(response.text()));
        }

        if let Some(Output::Json(value)) = response
            .outputs
            .iter()
            .find(|output| matches!(output, Output::Json(_)))
        {
            return Ok(ModelResponse::Structured(value.clone()));
        }

        let text = response.text();
        debug!(response_length = text.len(), "Decoding JSON response");
        decode_json(&text).map(ModelResponse::Structured)
    }
}
