//! Scene generation, whole-script review and targeted refinement.
//!
//! Every sub-scene of the outline is written in order with
//! [`refine_until_threshold`]. Candidates come from the generation model as
//! JSON and must pass [`validate_scene`]; the validation model scores them.
//! Once all sub-scenes exist the validation model reviews the whole script,
//! and when it falls short the scenes it flags are refined again.

use crate::{
    PromptKind, PromptLibrary, PromptVars, Refinement, RefinementOutcome, RefinementStart,
    StageModels, StoryContext, generate_checked, refine_until_threshold, render_scene,
    render_script, script_tail, validate_scene,
};
use async_trait::async_trait;
use derive_getters::Getters;
use scriptorium_config::ScriptoriumConfig;
use scriptorium_core::{
    Characters, Evaluation, GeneratedScene, Outline, SceneContent, SceneNumber, ScriptEvaluation,
    StoryElement, Themes,
};
use scriptorium_error::{JsonError, ScriptoriumResult};
use scriptorium_storage::{ArtifactStore, ArtifactStoreExt};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Script of all generated scenes before targeted refinement.
pub const SCRIPT_INITIAL_ARTIFACT: &str = "script_initial.md";
/// Script after targeted refinement.
pub const SCRIPT_REFINED_ARTIFACT: &str = "script_refined.md";
/// Whole-script rubric.
pub const FULL_SCRIPT_EVALUATION_ARTIFACT: &str = "full_script_evaluation.json";
/// Written review of the final script.
pub const SCRIPT_ANALYSIS_ARTIFACT: &str = "script_analysis.json";

const FIRST_SCENE: &str = "None (this is the first scene)";
const NO_INITIAL_SCRIPT: &str = "None provided";

/// Output key of a generated sub-scene as JSON.
///
/// ```
/// use scriptorium_core::SceneNumber;
/// use scriptorium_narrative::sub_scene_key;
///
/// assert_eq!(sub_scene_key(&SceneNumber::from("1.2.1")), "sub_scenes/sub_scene_1.2.1.json");
/// assert_eq!(sub_scene_key(&SceneNumber::from("Scene 1/2")), "sub_scenes/sub_scene_Scene_1_2.json");
/// ```
pub fn sub_scene_key(scene_number: &SceneNumber) -> String {
    format!("sub_scenes/sub_scene_{}.json", artifact_stem(scene_number))
}

/// Output key of a generated sub-scene as markdown.
pub fn sub_scene_markdown_key(scene_number: &SceneNumber) -> String {
    format!("sub_scenes/sub_scene_{}.md", artifact_stem(scene_number))
}

/// Output key of the script up to and including a sub-scene.
pub fn up_to_scene_key(scene_number: &SceneNumber) -> String {
    format!("sub_scenes/up_to_scene/{}.md", artifact_stem(scene_number))
}

fn artifact_stem(scene_number: &SceneNumber) -> String {
    scene_number
        .as_str()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Scene loop tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneSettings {
    /// Iterations per sub-scene
    pub max_iterations: u32,
    /// Score at which a scene is accepted
    pub threshold: i64,
    /// Regenerations for undecodable or malformed JSON
    pub max_json_attempts: u32,
    /// Whole-script score below which flagged scenes are refined
    pub full_script_threshold: i64,
    /// Characters of running script passed as context
    pub context_length: Option<usize>,
    /// Pass story elements instead of the running script
    pub use_local_context: bool,
    /// Genre named in prompts
    pub genre: String,
}

impl SceneSettings {
    /// Settings from the run configuration.
    pub fn from_config(config: &ScriptoriumConfig) -> Self {
        Self {
            max_iterations: config.max_scene_iterations,
            threshold: config.good_scene_threshold,
            max_json_attempts: config.max_json_attempts,
            full_script_threshold: config.full_script_threshold,
            context_length: config.context_length,
            use_local_context: config.use_local_context,
            genre: config.genre.clone(),
        }
    }
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self::from_config(&ScriptoriumConfig::default())
    }
}

/// Everything the scene pipeline reads.
#[derive(Debug, Clone, Default)]
pub struct SceneInputs {
    /// Outline whose sub-scenes are written
    pub outline: Outline,
    /// Character profiles
    pub characters: Characters,
    /// Thematic analysis
    pub themes: Themes,
    /// Style guide appended to the first scene prompt
    pub style_guide: Option<String>,
    /// Existing script used as style reference and context seed
    pub initial_script: Option<String>,
}

/// What a scene pipeline run produced.
#[derive(Debug, Clone, Getters)]
pub struct ScriptReport {
    /// One entry per sub-scene, in outline order
    scenes: Vec<GeneratedScene>,
    /// Script before targeted refinement
    initial_script: String,
    /// Script after targeted refinement
    refined_script: String,
    /// Whole-script rubric, absent when no scene had content
    evaluation: Option<ScriptEvaluation>,
    /// Scenes replaced by targeted refinement
    refined_scenes: Vec<SceneNumber>,
    /// Written review of the final script
    analysis: Option<Value>,
}

/// Writes, scores and refines every scene of an outline.
#[derive(Clone)]
pub struct ScenePipeline {
    models: StageModels,
    prompts: Arc<PromptLibrary>,
    store: Arc<dyn ArtifactStore>,
    settings: SceneSettings,
}

impl std::fmt::Debug for ScenePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenePipeline")
            .field("settings", &self.settings)
            .field("store", &self.store.backend_name())
            .finish()
    }
}

/// One sub-scene's refinement job.
struct SceneJob<'a> {
    pipeline: &'a ScenePipeline,
    base: &'a PromptVars,
    scene_number: &'a SceneNumber,
    details: String,
    context_label: String,
    script_context: String,
    previous_scene: Option<&'a str>,
    style_guide: Option<&'a str>,
}

impl SceneJob<'_> {
    fn vars(&self) -> PromptVars {
        let mut vars = self.base.clone();
        vars.set("current_scene", self.details.as_str());
        vars.set("scene_details", self.details.as_str());
        vars.set("previous_scene", self.previous_scene.unwrap_or(FIRST_SCENE));
        vars.set("context_label", self.context_label.as_str());
        vars.set("script_context", self.script_context.as_str());
        vars
    }
}

#[async_trait]
impl<'a> Refinement for SceneJob<'a> {
    type Candidate = SceneContent;

    async fn generate(&self) -> ScriptoriumResult<Option<SceneContent>> {
        let mut prompt = self
            .pipeline
            .prompts
            .render(PromptKind::GenerateScene, &self.vars())?;
        if let (None, Some(guide)) = (self.previous_scene, self.style_guide) {
            prompt.push_str("\n\nStyle guide:\n");
            prompt.push_str(guide);
        }
        debug!(scene_number = %self.scene_number, prompt_length = prompt.len(), "Generating scene");
        self.pipeline.scene_candidate(&prompt).await
    }

    async fn evaluate(&self, candidate: &SceneContent) -> ScriptoriumResult<Evaluation> {
        let vars = self
            .vars()
            .with("scene_content", render_scene(self.scene_number, candidate));
        let prompt = self.pipeline.prompts.render(PromptKind::EvaluateScene, &vars)?;
        let payload = self.pipeline.judge(&prompt).await?;
        Ok(Evaluation::from_payload(&payload))
    }

    async fn refine(
        &self,
        candidate: &SceneContent,
        feedback: &str,
    ) -> ScriptoriumResult<Option<SceneContent>> {
        let vars = self
            .vars()
            .with_json("scene_content", candidate)?
            .with("feedback", feedback);
        let prompt = self.pipeline.prompts.render(PromptKind::RefineScene, &vars)?;
        debug!(scene_number = %self.scene_number, prompt_length = prompt.len(), "Refining scene");
        self.pipeline.scene_candidate(&prompt).await
    }
}

impl ScenePipeline {
    /// Create a pipeline persisting artifacts to `store`.
    pub fn new(
        models: StageModels,
        prompts: Arc<PromptLibrary>,
        store: Arc<dyn ArtifactStore>,
        settings: SceneSettings,
    ) -> Self {
        Self {
            models,
            prompts,
            store,
            settings,
        }
    }

    /// Loop tuning in effect.
    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    /// Write every sub-scene, review the script, refine flagged scenes and
    /// analyze the result.
    ///
    /// Artifacts are written as the run progresses, so an interrupted run
    /// leaves everything generated so far.
    #[instrument(skip(self, inputs), fields(sub_scenes = inputs.outline.sub_scene_count()))]
    pub async fn run(&self, inputs: &SceneInputs) -> ScriptoriumResult<ScriptReport> {
        let base = self.base_vars(inputs)?;
        let seed = inputs.initial_script.as_deref().unwrap_or("");
        let total = inputs.outline.sub_scene_count();

        let mut scenes: Vec<GeneratedScene> = Vec::with_capacity(total);
        let mut story = StoryContext::default();
        let mut previous: Option<String> = None;
        let mut script = String::new();

        for (index, position) in inputs.outline.sub_scenes().enumerate() {
            let scene_number = &position.sub_scene.sub_scene_number;
            story.enter_act(position.act.act_number);

            let (context_label, script_context) =
                self.context_for(&story, &running_script(seed, &script));
            let job = SceneJob {
                pipeline: self,
                base: &base,
                scene_number,
                details: to_pretty(position.sub_scene)?,
                context_label,
                script_context,
                previous_scene: previous.as_deref(),
                style_guide: inputs.style_guide.as_deref(),
            };

            let outcome = refine_until_threshold(
                &job,
                self.settings.max_iterations,
                self.settings.threshold,
                RefinementStart::Generate,
            )
            .await?;
            let generated = generated_scene(scene_number, outcome);

            if let Some(content) = &generated.content {
                let markdown = render_scene(scene_number, content);
                if self.settings.use_local_context {
                    let elements = self.extract_elements(&base, scene_number, &markdown).await?;
                    debug!(count = elements.len(), "Extracted story elements");
                    story.absorb(scene_number, elements);
                }
                previous = Some(markdown);
            } else {
                warn!(scene_number = %scene_number, "No usable content for sub-scene");
            }

            info!(
                scene_number = %scene_number,
                score = generated.score,
                accepted = generated.accepted,
                progress = %format!("{}/{}", index + 1, total),
                "Sub-scene finished"
            );

            scenes.push(generated);
            script = render_script(&scenes);
            self.persist_progress(&scenes, &script).await?;
        }

        let initial_script = script;
        if scenes.iter().all(|scene| scene.content.is_none()) {
            warn!("No scene produced content, skipping script review");
            self.store
                .write_text(SCRIPT_INITIAL_ARTIFACT, &initial_script)
                .await?;
            self.store
                .write_text(SCRIPT_REFINED_ARTIFACT, &initial_script)
                .await?;
            return Ok(ScriptReport {
                scenes,
                refined_script: initial_script.clone(),
                initial_script,
                evaluation: None,
                refined_scenes: Vec::new(),
                analysis: None,
            });
        }

        let evaluation = self.evaluate_script(&base, &initial_script).await?;
        self.store
            .write_json(FULL_SCRIPT_EVALUATION_ARTIFACT, &evaluation)
            .await?;

        let refined_scenes = if evaluation.total_score < self.settings.full_script_threshold {
            info!(
                score = evaluation.total_score,
                threshold = self.settings.full_script_threshold,
                flagged = evaluation.scenes_to_improve.len(),
                "Script below threshold, refining flagged scenes"
            );
            self.refine_flagged(&base, inputs, &evaluation, &mut scenes)
                .await?
        } else {
            info!(score = evaluation.total_score, "Script meets threshold");
            Vec::new()
        };

        let refined_script = render_script(&scenes);
        self.store
            .write_text(SCRIPT_REFINED_ARTIFACT, &refined_script)
            .await?;

        let analysis = self.analyze(&base, inputs, &refined_script).await?;
        self.store
            .write_json(
                SCRIPT_ANALYSIS_ARTIFACT,
                analysis.as_ref().unwrap_or(&Value::Null),
            )
            .await?;

        Ok(ScriptReport {
            scenes,
            initial_script,
            refined_script,
            evaluation: Some(evaluation),
            refined_scenes,
            analysis,
        })
    }

    fn base_vars(&self, inputs: &SceneInputs) -> ScriptoriumResult<PromptVars> {
        Ok(PromptVars::new()
            .with_json("characters", &inputs.characters)?
            .with_json("themes", &inputs.themes)?
            .with_json("outline", &inputs.outline)?
            .with("genre", self.settings.genre.as_str())
            .with(
                "title",
                inputs.outline.title.as_deref().unwrap_or("Untitled"),
            ))
    }

    fn context_for(&self, story: &StoryContext, running: &str) -> (String, String) {
        if self.settings.use_local_context {
            return ("story elements so far".to_string(), story.to_prompt_text());
        }
        let label = match self.settings.context_length {
            Some(limit) => format!("last {} characters", limit),
            None => "script so far".to_string(),
        };
        (
            label,
            script_tail(running, self.settings.context_length).to_string(),
        )
    }

    async fn scene_candidate(&self, prompt: &str) -> ScriptoriumResult<Option<SceneContent>> {
        generate_checked(
            &self.models.generation,
            prompt,
            self.settings.max_json_attempts,
            "scene",
            |payload| validate_scene(&payload).map_err(|issue| issue.to_string()),
        )
        .await
    }

    /// Call the validation model; an undecodable answer becomes `null`.
    async fn judge(&self, prompt: &str) -> ScriptoriumResult<Value> {
        match self.models.validation.generate_json(prompt).await {
            Ok(payload) => Ok(payload),
            Err(e) if e.is_decode() => {
                warn!(error = %e, "Undecodable evaluation");
                Ok(Value::Null)
            }
            Err(e) => Err(e),
        }
    }

    async fn extract_elements(
        &self,
        base: &PromptVars,
        scene_number: &SceneNumber,
        markdown: &str,
    ) -> ScriptoriumResult<Vec<StoryElement>> {
        let vars = base
            .clone()
            .with("scene_number", scene_number.as_str())
            .with("scene_content", markdown);
        let prompt = self
            .prompts
            .render(PromptKind::ExtractStoryElements, &vars)?;
        let elements = generate_checked(
            &self.models.generation,
            &prompt,
            self.settings.max_json_attempts,
            "story_elements",
            |payload| Ok(StoryElement::from_payload(&payload)),
        )
        .await?;
        Ok(elements.unwrap_or_default())
    }

    #[instrument(skip_all)]
    async fn evaluate_script(
        &self,
        base: &PromptVars,
        script: &str,
    ) -> ScriptoriumResult<ScriptEvaluation> {
        let vars = base.clone().with("full_script", script);
        let prompt = self
            .prompts
            .render(PromptKind::EvaluateFullScript, &vars)?;
        let evaluation = ScriptEvaluation::from_payload(&self.judge(&prompt).await?);
        info!(
            score = evaluation.total_score,
            well_formed = evaluation.well_formed,
            flagged = evaluation.scenes_to_improve.len(),
            "Full script evaluated"
        );
        Ok(evaluation)
    }

    #[instrument(skip_all)]
    async fn refine_flagged(
        &self,
        base: &PromptVars,
        inputs: &SceneInputs,
        evaluation: &ScriptEvaluation,
        scenes: &mut [GeneratedScene],
    ) -> ScriptoriumResult<Vec<SceneNumber>> {
        let seed = inputs.initial_script.as_deref().unwrap_or("");
        let mut refined = Vec::new();

        for flagged in &evaluation.scenes_to_improve {
            let Some(index) = scenes
                .iter()
                .position(|scene| same_scene(&flagged.scene_id, &scene.scene_number))
            else {
                warn!(scene_id = %flagged.scene_id, "Flagged scene is not in the script");
                continue;
            };
            let Some(current) = scenes[index].content.clone() else {
                warn!(scene_id = %flagged.scene_id, "Flagged scene has no content to refine");
                continue;
            };

            let scene_number = scenes[index].scene_number.clone();
            let details = match inputs
                .outline
                .sub_scenes()
                .find(|position| position.sub_scene.sub_scene_number == scene_number)
            {
                Some(position) => to_pretty(position.sub_scene)?,
                None => scene_number.to_string(),
            };
            let previous = scenes[..index]
                .iter()
                .rev()
                .find_map(|scene| {
                    scene
                        .content
                        .as_ref()
                        .map(|content| render_scene(&scene.scene_number, content))
                });
            let assembled = running_script(seed, &render_script(scenes));
            let context_label = match self.settings.context_length {
                Some(limit) => format!("last {} characters of the assembled script", limit),
                None => "assembled script".to_string(),
            };

            let job = SceneJob {
                pipeline: self,
                base,
                scene_number: &scene_number,
                details,
                context_label,
                script_context: script_tail(&assembled, self.settings.context_length)
                    .to_string(),
                previous_scene: previous.as_deref(),
                style_guide: None,
            };

            let outcome = refine_until_threshold(
                &job,
                self.settings.max_iterations,
                self.settings.threshold,
                RefinementStart::Refine {
                    candidate: current,
                    feedback: flagged.as_feedback(),
                },
            )
            .await?;
            let candidate = generated_scene(&scene_number, outcome);

            if candidate.content.is_some() && candidate.score >= scenes[index].score {
                info!(
                    scene_number = %scene_number,
                    previous_score = scenes[index].score,
                    score = candidate.score,
                    "Replacing flagged scene"
                );
                scenes[index] = candidate;
                self.persist_scene(&scenes[index]).await?;
                refined.push(scene_number);
            } else {
                info!(
                    scene_number = %scene_number,
                    previous_score = scenes[index].score,
                    score = candidate.score,
                    "Refinement did not improve scene, keeping original"
                );
            }
        }

        Ok(refined)
    }

    #[instrument(skip_all)]
    async fn analyze(
        &self,
        base: &PromptVars,
        inputs: &SceneInputs,
        script: &str,
    ) -> ScriptoriumResult<Option<Value>> {
        let vars = base.clone().with("script", script).with(
            "initial_script",
            inputs.initial_script.as_deref().unwrap_or(NO_INITIAL_SCRIPT),
        );
        let prompt = self.prompts.render(PromptKind::ReviewScript, &vars)?;
        generate_checked(
            &self.models.validation,
            &prompt,
            self.settings.max_json_attempts,
            "script_analysis",
            Ok,
        )
        .await
    }

    async fn persist_scene(&self, scene: &GeneratedScene) -> ScriptoriumResult<()> {
        self.store
            .write_json(&sub_scene_key(&scene.scene_number), scene)
            .await?;
        if let Some(content) = &scene.content {
            self.store
                .write_text(
                    &sub_scene_markdown_key(&scene.scene_number),
                    &render_scene(&scene.scene_number, content),
                )
                .await?;
        }
        Ok(())
    }

    async fn persist_progress(
        &self,
        scenes: &[GeneratedScene],
        script: &str,
    ) -> ScriptoriumResult<()> {
        let Some(latest) = scenes.last() else {
            return Ok(());
        };
        self.persist_scene(latest).await?;
        self.store
            .write_text(&up_to_scene_key(&latest.scene_number), script)
            .await?;
        self.store.write_text(SCRIPT_INITIAL_ARTIFACT, script).await
    }
}

fn generated_scene(
    scene_number: &SceneNumber,
    outcome: RefinementOutcome<SceneContent>,
) -> GeneratedScene {
    let accepted = outcome.is_accepted();
    let (content, evaluation, score) = outcome.into_parts();
    GeneratedScene {
        scene_number: scene_number.clone(),
        content,
        evaluation,
        score,
        accepted,
    }
}

fn running_script(seed: &str, script: &str) -> String {
    if seed.trim().is_empty() {
        script.to_string()
    } else {
        format!("{}\n\n{}", seed.trim_end(), script)
    }
}

/// Whether a reviewer's scene id names `scene_number`.
///
/// Reviewers sometimes prefix ids ("Scene 1.2.1"), so a leading non-numeric
/// prefix is ignored.
fn same_scene(id: &SceneNumber, scene_number: &SceneNumber) -> bool {
    if id == scene_number {
        return true;
    }
    let stripped = id
        .as_str()
        .trim_start_matches(|c: char| !c.is_ascii_digit());
    !stripped.is_empty() && stripped == scene_number.as_str()
}

fn to_pretty<T: serde::Serialize + ?Sized>(value: &T) -> ScriptoriumResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| JsonError::new(e.to_string()).into())
}
