//! Core data types for the Scriptorium workspace.
//!
//! Two families of types live here:
//! - provider-neutral LLM request/response types ([`GenerateRequest`],
//!   [`Message`], [`Output`]);
//! - the script domain model: the [`Outline`] tree, generated
//!   [`SceneContent`], evaluation payloads and the story bible.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod evaluation;
mod message;
mod outline;
mod output;
mod request;
mod role;
mod scene;
mod scene_number;
mod story;

pub use evaluation::{
    Evaluation, INVALID_VALIDATION_FEEDBACK, MISSING_FEEDBACK, SceneImprovement, ScriptEvaluation,
    ValidationVerdict,
};
pub use message::{Message, MessageBuilder};
pub use outline::{Act, Outline, Scene, ScenePlan, SubScene, SubScenePlan, SubSceneRef};
pub use output::Output;
pub use request::{
    GenerateRequest, GenerateRequestBuilder, GenerateResponse, Prompt, ResponseFormat,
};
pub use role::Role;
pub use scene::{ContentItem, GeneratedScene, SceneContent};
pub use scene_number::{SceneNumber, compare_scene_numbers};
pub use story::{
    CharacterProfile, Characters, ElementScope, EthicalDilemma, MainTheme, StoryElement, SubTheme,
    Themes,
};
