//! Hierarchical outline construction.
//!
//! The outline is built top-down in four validated stages: acts, then the key
//! scenes of each act, then the sub-scenes of each key scene, then a review
//! pass whose sparse revision is merged back into the assembled outline.
//!
//! Every stage also rejects misnumbered candidates: act numbers are unique and
//! each scene or sub-scene number extends the number of its parent.

use crate::{PromptKind, PromptVars, Stage, ValidationLoop, merge_outlines};
use scriptorium_core::{Outline, Scene, ScenePlan, SubScenePlan};
use scriptorium_error::ScriptoriumResult;
use scriptorium_storage::{ArtifactStore, ArtifactStoreExt};
use std::sync::Arc;
use tracing::{info, instrument};

/// Output key of the finished outline.
pub const OUTLINE_ARTIFACT: &str = "outline.json";

/// Builds an [`Outline`] from a concept.
#[derive(Clone)]
pub struct OutlineBuilder {
    stages: ValidationLoop,
    store: Arc<dyn ArtifactStore>,
}

impl std::fmt::Debug for OutlineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutlineBuilder")
            .field("max_attempts", &self.stages.max_attempts())
            .field("store", &self.store.backend_name())
            .finish()
    }
}

impl OutlineBuilder {
    /// Create a builder persisting its result to `store`.
    pub fn new(stages: ValidationLoop, store: Arc<dyn ArtifactStore>) -> Self {
        Self { stages, store }
    }

    /// Run all four stages and persist the merged outline as `outline.json`.
    ///
    /// # Errors
    ///
    /// Fails when any stage exhausts its attempts; the error names the stage.
    #[instrument(skip(self, concept), fields(concept_length = concept.len()))]
    pub async fn build(&self, concept: &str) -> ScriptoriumResult<Outline> {
        let mut outline = self.generate_acts(concept).await?;
        info!(acts = outline.acts.len(), "Acts accepted");

        self.generate_key_scenes(concept, &mut outline).await?;
        self.generate_sub_scenes(concept, &mut outline).await?;

        let outline = self.review(concept, &outline).await?;
        info!(
            acts = outline.acts.len(),
            sub_scenes = outline.sub_scene_count(),
            "Outline complete"
        );

        self.store.write_json(OUTLINE_ARTIFACT, &outline).await?;
        Ok(outline)
    }

    async fn generate_acts(&self, concept: &str) -> ScriptoriumResult<Outline> {
        let vars = PromptVars::new().with("concept", concept);
        let stage = Stage::new(
            "acts",
            PromptKind::GenerateActs,
            PromptKind::ValidateActs,
            vars,
        );
        self.stages
            .run_checked(&stage, |outline: &Outline| outline.numbering_issue())
            .await
    }

    async fn generate_key_scenes(
        &self,
        concept: &str,
        outline: &mut Outline,
    ) -> ScriptoriumResult<()> {
        let full_acts = outline.acts.clone();

        for act in &mut outline.acts {
            let vars = PromptVars::new()
                .with("concept", concept)
                .with_json("act", &*act)?
                .with_json("full_acts", &full_acts)?;
            let stage = Stage::new(
                format!("key_scenes (act {})", act.act_number),
                PromptKind::GenerateKeyScenes,
                PromptKind::ValidateKeyScenes,
                vars,
            );

            let act_number = act.act_number;
            let plan: ScenePlan = self
                .stages
                .run_checked(&stage, |plan: &ScenePlan| plan.numbering_issue(act_number))
                .await?;
            info!(
                act_number = act.act_number,
                scenes = plan.scenes.len(),
                "Key scenes accepted"
            );
            act.scenes = plan.scenes;
        }

        Ok(())
    }

    async fn generate_sub_scenes(
        &self,
        concept: &str,
        outline: &mut Outline,
    ) -> ScriptoriumResult<()> {
        let mut previous: Option<Scene> = None;

        for act in &mut outline.acts {
            let full_scenes = act.scenes.clone();

            for scene in &mut act.scenes {
                let vars = PromptVars::new()
                    .with("concept", concept)
                    .with_json("scene", &*scene)?
                    .with_json("full_scenes", &full_scenes)?
                    .with_json("previous_scene", &previous)?;
                let stage = Stage::new(
                    format!("sub_scenes (scene {})", scene.scene_number),
                    PromptKind::GenerateSubScenes,
                    PromptKind::ValidateSubScenes,
                    vars,
                );

                let plan: SubScenePlan = self
                    .stages
                    .run_checked(&stage, |plan: &SubScenePlan| {
                        plan.numbering_issue(&scene.scene_number)
                    })
                    .await?;
                info!(
                    scene_number = %scene.scene_number,
                    sub_scenes = plan.sub_scenes.len(),
                    "Sub-scenes accepted"
                );
                scene.sub_scenes = plan.sub_scenes;
                previous = Some(scene.clone());
            }
        }

        Ok(())
    }

    async fn review(&self, concept: &str, outline: &Outline) -> ScriptoriumResult<Outline> {
        let vars = PromptVars::new()
            .with("concept", concept)
            .with_json("outline", outline)?;
        let stage = Stage::new(
            "review",
            PromptKind::ReviewOutline,
            PromptKind::ValidateFinalOutline,
            vars,
        );

        let revision: Outline = self
            .stages
            .run_checked(&stage, |revision: &Outline| revision.numbering_issue())
            .await?;
        info!(
            revised_acts = revision.acts.len(),
            "Outline revision accepted, merging"
        );
        Ok(merge_outlines(outline, &revision))
    }
}
