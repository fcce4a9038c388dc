//! Run configuration.
//!
//! The configuration system supports:
//! - Bundled defaults (include_str! from scriptorium.toml)
//! - User overrides (~/.config/scriptorium/scriptorium.toml, then ./scriptorium.toml)
//! - An explicit file, e.g. from `--config`
//! - `SCRIPTORIUM_*` environment variables
//!
//! Later sources take precedence; maps such as `[providers]` merge key by key.

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use scriptorium_error::{ConfigError, ScriptoriumError, ScriptoriumResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Bundled default configuration.
pub const DEFAULT_CONFIG: &str = include_str!("../scriptorium.toml");

/// A provider name paired with a model name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelSelection {
    /// Provider name, e.g. "ollama"
    pub provider: String,
    /// Model name, e.g. "gemma2:27b"
    pub model: String,
}

impl ModelSelection {
    /// Pair a provider with a model.
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }
}

impl std::fmt::Display for ModelSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// Connection settings for one provider.
///
/// # Example
///
/// ```toml
/// [providers.openai]
/// base_url = "https://api.openai.com/v1"
/// api_key_env = "OPENAI_API_KEY"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// API base URL without a trailing slash
    pub base_url: String,
    /// Environment variable holding the API key, if the provider needs one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

/// Where run inputs are read from and artifacts written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding concept.txt, style_guide.md and initial_script.md
    pub input_dir: PathBuf,
    /// Directory receiving every generated artifact
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
        }
    }
}

/// Complete run configuration.
///
/// Every key has a default, so a partial file is always valid.
///
/// # Example
///
/// ```
/// use scriptorium_config::ScriptoriumConfig;
///
/// let config = ScriptoriumConfig::from_toml_str(r#"
///     llm_model = "llama3.1:70b"
///     good_scene_threshold = 90
///     context_length = 4000
/// "#).unwrap();
///
/// assert_eq!(config.llm_model, "llama3.1:70b");
/// assert_eq!(config.good_scene_threshold, 90);
/// assert_eq!(config.context_length, Some(4000));
/// assert_eq!(config.max_scene_iterations, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptoriumConfig {
    /// Generation provider
    pub llm_provider: String,
    /// Generation model
    pub llm_model: String,
    /// Validation/evaluation provider
    pub llm_provider_validation: String,
    /// Validation/evaluation model
    pub llm_model_validation: String,
    /// Provider used once when a call fails
    pub llm_fallback_provider: String,
    /// Model used once when a call fails
    pub llm_fallback_model: String,
    /// Score-and-refine iterations per sub-scene
    pub max_scene_iterations: u32,
    /// Score at which a scene is accepted
    pub good_scene_threshold: i64,
    /// Generation attempts per outline stage before the run fails
    pub max_outline_generation_attempts: u32,
    /// Whole-script score below which flagged scenes are refined
    pub full_script_threshold: i64,
    /// Characters of running script kept as context; unbounded when `None`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_length: Option<usize>,
    /// Use extracted story elements as context instead of the running script
    pub use_local_context: bool,
    /// Genre handed to every prompt
    pub genre: String,
    /// Regeneration budget for undecodable or structurally invalid JSON
    pub max_json_attempts: u32,
    /// Prompt library overriding the bundled templates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts_path: Option<PathBuf>,
    /// Input and output directories
    pub paths: PathsConfig,
    /// Provider connection settings by provider name
    pub providers: BTreeMap<String, ProviderSettings>,
}

impl Default for ScriptoriumConfig {
    fn default() -> Self {
        let providers = [
            ("ollama", "http://localhost:11434", None),
            ("openai", "https://api.openai.com/v1", Some("OPENAI_API_KEY")),
            (
                "replicate",
                "https://api.replicate.com/v1",
                Some("REPLICATE_API_TOKEN"),
            ),
        ]
        .into_iter()
        .map(|(name, url, key)| {
            (
                name.to_string(),
                ProviderSettings {
                    base_url: url.to_string(),
                    api_key_env: key.map(str::to_string),
                },
            )
        })
        .collect();

        Self {
            llm_provider: "ollama".to_string(),
            llm_model: "gemma2:27b".to_string(),
            llm_provider_validation: "ollama".to_string(),
            llm_model_validation: "gemma2:27b".to_string(),
            llm_fallback_provider: "openai".to_string(),
            llm_fallback_model: "gpt-4o".to_string(),
            max_scene_iterations: 5,
            good_scene_threshold: 80,
            max_outline_generation_attempts: 3,
            full_script_threshold: 80,
            context_length: None,
            use_local_context: true,
            genre: "unknown".to_string(),
            max_json_attempts: 3,
            prompts_path: None,
            paths: PathsConfig::default(),
            providers,
        }
    }
}

impl ScriptoriumConfig {
    /// Load configuration from the standard locations.
    ///
    /// Sources in order of precedence (later sources override earlier):
    /// 1. Bundled defaults (scriptorium.toml shipped with the crate)
    /// 2. User config in home directory (~/.config/scriptorium/scriptorium.toml)
    /// 3. User config in current directory (./scriptorium.toml)
    /// 4. `SCRIPTORIUM_*` environment variables
    ///
    /// Missing user files are skipped silently.
    ///
    /// ```no_run
    /// use scriptorium_config::ScriptoriumConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = ScriptoriumConfig::load()?;
    /// println!("generating with {}", config.generation());
    /// # Ok(())
    /// # }
    /// ```
    pub fn load() -> ScriptoriumResult<Self> {
        Self::load_with(None)
    }

    /// Load configuration, layering `explicit` above the user files.
    ///
    /// Unlike the user files, an explicit file must exist.
    #[instrument(fields(explicit = ?explicit))]
    pub fn load_with(explicit: Option<&Path>) -> ScriptoriumResult<Self> {
        debug!("Loading configuration: env > explicit > current dir > home dir > bundled");

        let mut builder = Self::base_builder();

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/scriptorium/scriptorium.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("scriptorium").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("SCRIPTORIUM")
                .separator("__")
                .try_parsing(true),
        );

        Self::finish(builder)
    }

    /// Load bundled defaults overlaid with a single file.
    pub fn from_file(path: impl AsRef<Path>) -> ScriptoriumResult<Self> {
        debug!(path = %path.as_ref().display(), "Loading configuration from file");
        Self::finish(Self::base_builder().add_source(File::from(path.as_ref())))
    }

    /// Load bundled defaults overlaid with TOML text.
    pub fn from_toml_str(toml: &str) -> ScriptoriumResult<Self> {
        Self::finish(Self::base_builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn base_builder() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> ScriptoriumResult<Self> {
        let config: Self = builder
            .build()
            .map_err(|e| {
                ScriptoriumError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                ScriptoriumError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values no run can work with.
    pub fn validate(&self) -> ScriptoriumResult<()> {
        let budgets = [
            ("max_scene_iterations", self.max_scene_iterations),
            (
                "max_outline_generation_attempts",
                self.max_outline_generation_attempts,
            ),
            ("max_json_attempts", self.max_json_attempts),
        ];
        if let Some((name, _)) = budgets.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::new(format!("{} must be at least 1", name)).into());
        }

        let thresholds = [
            ("good_scene_threshold", self.good_scene_threshold),
            ("full_script_threshold", self.full_script_threshold),
        ];
        if let Some((name, value)) = thresholds
            .iter()
            .find(|(_, value)| !(0..=100).contains(value))
        {
            return Err(ConfigError::new(format!(
                "{} must be between 0 and 100, got {}",
                name, value
            ))
            .into());
        }

        if self.context_length == Some(0) {
            return Err(ConfigError::new("context_length must be positive when set").into());
        }

        Ok(())
    }

    /// Provider and model used for generation and refinement.
    pub fn generation(&self) -> ModelSelection {
        ModelSelection::new(&self.llm_provider, &self.llm_model)
    }

    /// Provider and model used for validation and evaluation.
    pub fn validation(&self) -> ModelSelection {
        ModelSelection::new(&self.llm_provider_validation, &self.llm_model_validation)
    }

    /// Provider and model used once when a call fails.
    pub fn fallback(&self) -> ModelSelection {
        ModelSelection::new(&self.llm_fallback_provider, &self.llm_fallback_model)
    }

    /// Connection settings for a provider, empty when unconfigured.
    pub fn provider_settings(&self, provider: &str) -> ProviderSettings {
        self.providers.get(provider).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_defaults_match_code_defaults() {
        let bundled = ScriptoriumConfig::from_toml_str("").unwrap();
        assert_eq!(bundled, ScriptoriumConfig::default());
    }

    #[test]
    fn zero_budget_is_rejected() {
        let err = ScriptoriumConfig::from_toml_str("max_scene_iterations = 0").unwrap_err();
        assert!(err.to_string().contains("max_scene_iterations"));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        assert!(ScriptoriumConfig::from_toml_str("good_scene_threshold = -5").is_err());
        let err = ScriptoriumConfig::from_toml_str("full_script_threshold = 120").unwrap_err();
        assert!(err.to_string().contains("full_script_threshold"));
    }
}
