//! Test utilities for pipeline tests.
//!
//! Prompts come from a tagged library where every template starts with
//! `<<kind>>`, and [`RoutedDriver`] answers by tag. That keeps the
//! interleaved generate, evaluate and extract calls of a run scriptable.

#![allow(dead_code)]

use scriptorium_core::{GenerateRequest, GenerateResponse};
use scriptorium_error::{ModelsError, ModelsErrorKind, ScriptoriumResult};
use scriptorium_interface::ScriptoriumDriver;
use scriptorium_models::{ModelService, TieredModel};
use scriptorium_narrative::{PromptKind, PromptLibrary, StageModels};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use strum::IntoEnumIterator;

/// One canned driver reply.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Answer with this text
    Text(String),
    /// Fail at the transport level
    Transport,
}

impl Reply {
    pub fn json(value: Value) -> Self {
        Reply::Text(value.to_string())
    }
}

#[derive(Default)]
struct Route {
    replies: VecDeque<Reply>,
    last: Option<Reply>,
}

/// Driver answering by prompt tag and recording every prompt.
///
/// Each prompt kind has its own reply queue; once a queue runs out its last
/// reply repeats. A prompt with no route fails at the transport level.
#[derive(Default)]
pub struct RoutedDriver {
    routes: Mutex<BTreeMap<PromptKind, Route>>,
    prompts: Mutex<Vec<String>>,
}

impl RoutedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, kind: PromptKind, replies: Vec<Reply>) -> Self {
        self.routes.lock().unwrap().insert(
            kind,
            Route {
                replies: replies.into(),
                last: None,
            },
        );
        self
    }

    pub fn json(self, kind: PromptKind, values: Vec<Value>) -> Self {
        self.route(kind, values.into_iter().map(Reply::json).collect())
    }

    /// Every prompt sent, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Prompts of one kind, in order.
    pub fn prompts_for(&self, kind: PromptKind) -> Vec<String> {
        self.prompts()
            .into_iter()
            .filter(|prompt| kind_of(prompt) == Some(kind))
            .collect()
    }

    pub fn calls(&self, kind: PromptKind) -> usize {
        self.prompts_for(kind).len()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

fn kind_of(prompt: &str) -> Option<PromptKind> {
    PromptKind::iter().find(|kind| prompt.starts_with(&tag(*kind)))
}

fn transport(message: String) -> scriptorium_error::ScriptoriumError {
    ModelsError::new(ModelsErrorKind::Transport {
        provider: "routed".to_string(),
        message,
    })
    .into()
}

fn tag(kind: PromptKind) -> String {
    format!("<<{}>>", kind)
}

#[async_trait::async_trait]
impl ScriptoriumDriver for RoutedDriver {
    async fn generate(&self, req: &GenerateRequest) -> ScriptoriumResult<GenerateResponse> {
        let prompt = req.prompt().to_plain_text();
        self.prompts.lock().unwrap().push(prompt.clone());

        let reply = kind_of(&prompt).and_then(|kind| {
            let mut routes = self.routes.lock().unwrap();
            let route = routes.get_mut(&kind)?;
            match route.replies.pop_front() {
                Some(reply) => {
                    route.last = Some(reply.clone());
                    Some(reply)
                }
                None => route.last.clone(),
            }
        });

        match reply {
            Some(Reply::Text(text)) => Ok(GenerateResponse::from_text(text)),
            Some(Reply::Transport) => Err(transport("connection refused".to_string())),
            None => Err(transport(format!("no route for prompt: {}", prompt))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "routed"
    }

    fn model_name(&self) -> &str {
        "routed-model"
    }
}

/// Variables echoed into the tagged templates so tests can inspect them.
fn echoed(kind: PromptKind) -> &'static str {
    match kind {
        PromptKind::GenerateActs => "{{concept}}",
        PromptKind::GenerateKeyScenes => "{{act}}",
        PromptKind::GenerateSubScenes => "scene={{scene}}\nprevious={{previous_scene}}",
        PromptKind::ReviewOutline => "{{outline}}",
        PromptKind::GenerateScene => {
            "{{current_scene}}\nprevious={{previous_scene}}\n{{context_label}}={{script_context}}"
        }
        PromptKind::EvaluateScene => "{{scene_content}}",
        PromptKind::RefineScene => "feedback={{feedback}}\n{{scene_content}}",
        PromptKind::ExtractStoryElements => "{{scene_number}}",
        PromptKind::EvaluateFullScript => "{{full_script}}",
        PromptKind::DevelopCharacters | PromptKind::IdentifyThemes => {
            "{{concept}}\ninitial={{initial_script}}"
        }
        PromptKind::ReviewScript => "{{script}}",
        _ => "{{content}}",
    }
}

/// Prompt library whose templates are `<<kind>>` followed by a few variables.
pub fn tagged_prompts() -> Arc<PromptLibrary> {
    let toml: String = PromptKind::iter()
        .map(|kind| {
            let template = format!("{}\n{}", tag(kind), echoed(kind));
            format!("{} = {:?}\n", kind, template)
        })
        .collect();
    Arc::new(PromptLibrary::from_toml_str(&toml).unwrap())
}

/// Generation and validation both answered by `driver`, without fallback.
pub fn models(driver: &Arc<RoutedDriver>) -> StageModels {
    let tier = || {
        let driver: Arc<dyn ScriptoriumDriver> = driver.clone();
        TieredModel::new(ModelService::new(driver), None)
    };
    StageModels::new(tier(), tier())
}

/// Generation and validation answered by separate drivers.
pub fn split_models(generation: &Arc<RoutedDriver>, validation: &Arc<RoutedDriver>) -> StageModels {
    let tier = |driver: &Arc<RoutedDriver>| {
        let driver: Arc<dyn ScriptoriumDriver> = driver.clone();
        TieredModel::new(ModelService::new(driver), None)
    };
    StageModels::new(tier(generation), tier(validation))
}
