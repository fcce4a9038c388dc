//! Generation pipeline for Scriptorium.
//!
//! A run turns a concept into a screenplay in stages:
//!
//! 1. [`OutlineBuilder`] builds an act / scene / sub-scene outline, each level
//!    accepted by a validation model ([`ValidationLoop`]), then merges a review
//!    revision into it ([`merge_outlines`]).
//! 2. [`StoryDeveloper`] writes character profiles and a thematic analysis.
//! 3. [`ScenePipeline`] writes every sub-scene, scoring and refining each one
//!    ([`refine_until_threshold`]), then reviews the whole script and reworks
//!    the scenes the review flags.
//!
//! [`ScriptAutomator`] wires the stages to configuration, prompts and
//! artifact stores.
//!
//! # Example
//!
//! ```no_run
//! use scriptorium_config::ScriptoriumConfig;
//! use scriptorium_narrative::{RunFlags, ScriptAutomator};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let automator = ScriptAutomator::from_config(ScriptoriumConfig::load()?)?;
//! let summary = automator.run(RunFlags::all()).await?;
//! println!("{} sub-scenes", summary.outline().sub_scene_count());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod automator;
mod context;
mod development;
mod engine;
mod merge;
mod outline;
mod prompts;
mod render;
mod scenes;
mod validator;

pub use automator::{
    CONCEPT_INPUT, INITIAL_SCRIPT_INPUT, RunFlags, RunSummary, STYLE_GUIDE_INPUT, ScriptAutomator,
};
pub use context::{StoryContext, script_tail};
pub use development::{CHARACTERS_ARTIFACT, StoryDeveloper, THEMES_ARTIFACT};
pub use engine::{
    Refinement, RefinementOutcome, RefinementStart, Stage, StageModels, ValidationLoop,
    feedback_block, generate_checked, generate_typed, refine_until_threshold,
};
pub use merge::{merge_outlines, sort_outline};
pub use outline::{OUTLINE_ARTIFACT, OutlineBuilder};
pub use prompts::{DEFAULT_PROMPTS, PromptKind, PromptLibrary, PromptVars};
pub use render::{act_of, render_scene, render_script};
pub use scenes::{
    FULL_SCRIPT_EVALUATION_ARTIFACT, SCRIPT_ANALYSIS_ARTIFACT, SCRIPT_INITIAL_ARTIFACT,
    SCRIPT_REFINED_ARTIFACT, SceneInputs, ScenePipeline, SceneSettings, ScriptReport,
    sub_scene_key, sub_scene_markdown_key, up_to_scene_key,
};
pub use validator::{SceneIssue, validate_scene};
