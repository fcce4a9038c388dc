//! End-to-end run orchestration.

use crate::{
    CHARACTERS_ARTIFACT, OUTLINE_ARTIFACT, OutlineBuilder, PromptLibrary, SceneInputs,
    ScenePipeline, SceneSettings, ScriptReport, StageModels, StoryDeveloper, THEMES_ARTIFACT,
    ValidationLoop,
};
use derive_getters::Getters;
use scriptorium_config::ScriptoriumConfig;
use scriptorium_core::{Characters, Outline, Themes};
use scriptorium_error::{NarrativeError, NarrativeErrorKind, ScriptoriumResult};
use scriptorium_storage::{ArtifactStore, ArtifactStoreExt, FileSystemStore};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Input key of the concept (required).
pub const CONCEPT_INPUT: &str = "concept.txt";
/// Input key of the style guide (optional).
pub const STYLE_GUIDE_INPUT: &str = "style_guide.md";
/// Input key of the initial script (optional).
pub const INITIAL_SCRIPT_INPUT: &str = "initial_script.md";

/// Which artifacts a run regenerates.
///
/// Anything not regenerated is loaded from the output store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunFlags {
    /// Build a new outline
    pub outline: bool,
    /// Develop new characters
    pub characters: bool,
    /// Identify new themes
    pub themes: bool,
    /// Write the scenes
    pub scenes: bool,
}

impl RunFlags {
    /// Regenerate everything.
    pub fn all() -> Self {
        Self {
            outline: true,
            characters: true,
            themes: true,
            scenes: true,
        }
    }

    /// Whether nothing is regenerated.
    pub fn is_empty(&self) -> bool {
        !(self.outline || self.characters || self.themes || self.scenes)
    }
}

/// What a run produced or loaded.
#[derive(Debug, Clone, Getters)]
pub struct RunSummary {
    /// Outline used for the run
    outline: Outline,
    /// Character profiles used for the run
    characters: Characters,
    /// Thematic analysis used for the run
    themes: Themes,
    /// Scene pipeline results, when scenes were written
    script: Option<ScriptReport>,
}

/// Runs outline building, story development and scene generation.
#[derive(Clone)]
pub struct ScriptAutomator {
    config: ScriptoriumConfig,
    models: StageModels,
    prompts: Arc<PromptLibrary>,
    input: Arc<dyn ArtifactStore>,
    output: Arc<dyn ArtifactStore>,
}

impl std::fmt::Debug for ScriptAutomator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptAutomator")
            .field("generation", &self.models.generation.primary().label())
            .field("validation", &self.models.validation.primary().label())
            .field("input", &self.input.backend_name())
            .field("output", &self.output.backend_name())
            .finish()
    }
}

impl ScriptAutomator {
    /// Assemble an automator from explicit parts.
    pub fn new(
        config: ScriptoriumConfig,
        models: StageModels,
        prompts: Arc<PromptLibrary>,
        input: Arc<dyn ArtifactStore>,
        output: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            config,
            models,
            prompts,
            input,
            output,
        }
    }

    /// Build providers, prompts and filesystem stores from configuration.
    #[instrument(skip(config), fields(generation = %config.generation(), validation = %config.validation()))]
    pub fn from_config(config: ScriptoriumConfig) -> ScriptoriumResult<Self> {
        let models = StageModels::from_config(&config)?;
        let prompts = match &config.prompts_path {
            Some(path) => PromptLibrary::from_file(path)?,
            None => PromptLibrary::bundled()?,
        };
        let input: Arc<dyn ArtifactStore> =
            Arc::new(FileSystemStore::new(&config.paths.input_dir)?);
        let output: Arc<dyn ArtifactStore> =
            Arc::new(FileSystemStore::new(&config.paths.output_dir)?);
        Ok(Self::new(config, models, Arc::new(prompts), input, output))
    }

    /// Configuration in effect.
    pub fn config(&self) -> &ScriptoriumConfig {
        &self.config
    }

    /// Run the requested steps.
    ///
    /// # Errors
    ///
    /// Fails when `concept.txt` is missing, when an outline stage exhausts its
    /// attempts, when character or theme JSON cannot be obtained, or when a
    /// provider fails on both tiers.
    #[instrument(skip(self))]
    pub async fn run(&self, flags: RunFlags) -> ScriptoriumResult<RunSummary> {
        info!("Starting script automation");
        let concept = self
            .input
            .read_text(CONCEPT_INPUT)
            .await?
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                NarrativeError::new(NarrativeErrorKind::MissingInput(CONCEPT_INPUT.to_string()))
            })?;
        let style_guide = self.input.read_text(STYLE_GUIDE_INPUT).await?;
        let initial_script = self.input.read_text(INITIAL_SCRIPT_INPUT).await?;

        let outline = if flags.outline {
            self.outline_builder().build(&concept).await?
        } else {
            self.load_or_default(OUTLINE_ARTIFACT).await?
        };

        let developer = self.story_developer();
        let characters = if flags.characters {
            developer
                .develop_characters(&concept, &outline, initial_script.as_deref())
                .await?
        } else {
            self.load_or_default(CHARACTERS_ARTIFACT).await?
        };
        let themes = if flags.themes {
            developer
                .identify_themes(&concept, &outline, initial_script.as_deref())
                .await?
        } else {
            self.load_or_default(THEMES_ARTIFACT).await?
        };

        let script = if flags.scenes {
            let inputs = SceneInputs {
                outline: outline.clone(),
                characters: characters.clone(),
                themes: themes.clone(),
                style_guide,
                initial_script,
            };
            Some(self.scene_pipeline().run(&inputs).await?)
        } else {
            None
        };

        info!(
            output = self.output.backend_name(),
            "Generation complete"
        );
        Ok(RunSummary {
            outline,
            characters,
            themes,
            script,
        })
    }

    /// Outline builder wired to this run's models and output store.
    pub fn outline_builder(&self) -> OutlineBuilder {
        OutlineBuilder::new(
            ValidationLoop::new(
                self.models.clone(),
                Arc::clone(&self.prompts),
                self.config.max_outline_generation_attempts,
            ),
            Arc::clone(&self.output),
        )
    }

    /// Character and theme developer wired to this run's generation model.
    pub fn story_developer(&self) -> StoryDeveloper {
        StoryDeveloper::new(
            self.models.generation.clone(),
            Arc::clone(&self.prompts),
            Arc::clone(&self.output),
            self.config.max_json_attempts,
            self.config.genre.clone(),
        )
    }

    /// Scene pipeline wired to this run's models and output store.
    pub fn scene_pipeline(&self) -> ScenePipeline {
        ScenePipeline::new(
            self.models.clone(),
            Arc::clone(&self.prompts),
            Arc::clone(&self.output),
            SceneSettings::from_config(&self.config),
        )
    }

    async fn load_or_default<T>(&self, key: &str) -> ScriptoriumResult<T>
    where
        T: DeserializeOwned + Default + Send,
    {
        match self.output.read_json(key).await? {
            Some(value) => {
                info!(key, "Loaded existing artifact");
                Ok(value)
            }
            None => {
                warn!(key, "Artifact not found, using an empty one");
                Ok(T::default())
            }
        }
    }
}
