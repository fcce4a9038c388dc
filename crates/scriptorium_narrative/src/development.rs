//! Character development and theme identification.

use crate::{PromptKind, PromptLibrary, PromptVars, generate_typed};
use scriptorium_core::{Characters, Outline, Themes};
use scriptorium_error::ScriptoriumResult;
use scriptorium_models::TieredModel;
use scriptorium_storage::{ArtifactStore, ArtifactStoreExt};
use std::sync::Arc;
use tracing::{info, instrument};

/// Output key of the character profiles.
pub const CHARACTERS_ARTIFACT: &str = "characters.json";
/// Output key of the thematic analysis.
pub const THEMES_ARTIFACT: &str = "themes.json";

const NO_INITIAL_SCRIPT: &str = "None provided";

/// Produces the story bible: characters and themes.
///
/// Each is a single JSON generation from the concept, outline and optional
/// initial script, regenerated while the answer cannot be decoded.
#[derive(Clone)]
pub struct StoryDeveloper {
    model: TieredModel,
    prompts: Arc<PromptLibrary>,
    store: Arc<dyn ArtifactStore>,
    max_json_attempts: u32,
    genre: String,
}

impl std::fmt::Debug for StoryDeveloper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryDeveloper")
            .field("model", &self.model.primary().label())
            .field("max_json_attempts", &self.max_json_attempts)
            .field("genre", &self.genre)
            .finish()
    }
}

impl StoryDeveloper {
    /// Create a developer writing with `model` and persisting to `store`.
    pub fn new(
        model: TieredModel,
        prompts: Arc<PromptLibrary>,
        store: Arc<dyn ArtifactStore>,
        max_json_attempts: u32,
        genre: impl Into<String>,
    ) -> Self {
        Self {
            model,
            prompts,
            store,
            max_json_attempts,
            genre: genre.into(),
        }
    }

    /// Generate character profiles and persist them as `characters.json`.
    #[instrument(skip_all)]
    pub async fn develop_characters(
        &self,
        concept: &str,
        outline: &Outline,
        initial_script: Option<&str>,
    ) -> ScriptoriumResult<Characters> {
        let prompt = self.render(
            PromptKind::DevelopCharacters,
            concept,
            outline,
            initial_script,
        )?;
        let characters: Characters =
            generate_typed(&self.model, &prompt, self.max_json_attempts, "characters").await?;
        info!(count = characters.0.len(), "Characters developed");
        self.store
            .write_json(CHARACTERS_ARTIFACT, &characters)
            .await?;
        Ok(characters)
    }

    /// Generate the thematic analysis and persist it as `themes.json`.
    #[instrument(skip_all)]
    pub async fn identify_themes(
        &self,
        concept: &str,
        outline: &Outline,
        initial_script: Option<&str>,
    ) -> ScriptoriumResult<Themes> {
        let prompt = self.render(PromptKind::IdentifyThemes, concept, outline, initial_script)?;
        let themes: Themes =
            generate_typed(&self.model, &prompt, self.max_json_attempts, "themes").await?;
        info!(
            sub_themes = themes.sub_themes.len(),
            dilemmas = themes.ethical_dilemmas.len(),
            "Themes identified"
        );
        self.store.write_json(THEMES_ARTIFACT, &themes).await?;
        Ok(themes)
    }

    fn render(
        &self,
        kind: PromptKind,
        concept: &str,
        outline: &Outline,
        initial_script: Option<&str>,
    ) -> ScriptoriumResult<String> {
        let vars = PromptVars::new()
            .with("concept", concept)
            .with_json("outline", outline)?
            .with("initial_script", initial_script.unwrap_or(NO_INITIAL_SCRIPT))
            .with("genre", self.genre.as_str());
        self.prompts.render(kind, &vars)
    }
}
