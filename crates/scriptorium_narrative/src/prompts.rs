//! Prompt templates.
//!
//! Templates are plain text with `{{name}}` placeholders, one per
//! [`PromptKind`], kept in a TOML table keyed by the kind's snake_case name.
//! The bundled library ships with the crate; a replacement file must define
//! every kind.

use regex::Regex;
use scriptorium_error::{JsonError, NarrativeError, NarrativeErrorKind, ScriptoriumResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;
use strum::IntoEnumIterator;
use tracing::{debug, instrument, warn};

/// Bundled prompt library.
pub const DEFAULT_PROMPTS: &str = include_str!("../prompts.toml");

/// Every prompt the pipeline renders.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum PromptKind {
    /// Act list from the concept
    GenerateActs,
    /// Verdict on the act list
    ValidateActs,
    /// Key scenes of one act
    GenerateKeyScenes,
    /// Verdict on key scenes
    ValidateKeyScenes,
    /// Sub-scenes of one key scene
    GenerateSubScenes,
    /// Verdict on sub-scenes
    ValidateSubScenes,
    /// Sparse or full revision of the assembled outline
    ReviewOutline,
    /// Verdict on the outline revision
    ValidateFinalOutline,
    /// Scene content for one sub-scene
    GenerateScene,
    /// Rubric score for one scene
    EvaluateScene,
    /// Scene rewrite from feedback
    RefineScene,
    /// Story elements introduced by a scene
    ExtractStoryElements,
    /// Rubric score for the whole script
    EvaluateFullScript,
    /// Character profiles
    DevelopCharacters,
    /// Thematic analysis
    IdentifyThemes,
    /// Final written review of the script
    ReviewScript,
}

/// Named values substituted into a template.
///
/// # Examples
///
/// ```
/// use scriptorium_narrative::PromptVars;
/// use serde_json::json;
///
/// let vars = PromptVars::new()
///     .with("concept", "A lighthouse keeper finds a door in the sea.")
///     .with_json("act", &json!({"act_number": 1}))
///     .unwrap();
/// assert_eq!(vars.get("act"), Some("{\n  \"act_number\": 1\n}"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptVars(BTreeMap<String, String>);

impl PromptVars {
    /// Empty variable set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text variable.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Add a variable holding `value` as pretty-printed JSON.
    pub fn with_json<T: Serialize + ?Sized>(
        self,
        name: impl Into<String>,
        value: &T,
    ) -> ScriptoriumResult<Self> {
        let name = name.into();
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| JsonError::new(format!("prompt variable {}: {}", name, e)))?;
        Ok(self.with(name, text))
    }

    /// Insert or replace a text variable in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Look up a variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// A complete set of prompt templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptLibrary {
    templates: BTreeMap<PromptKind, String>,
}

fn placeholder_pattern() -> ScriptoriumResult<&'static Regex> {
    static PATTERN: OnceLock<Result<Regex, String>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\{\{([^{}]*)\}\}").map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| {
            NarrativeError::new(NarrativeErrorKind::TemplateError(format!(
                "Invalid template regex: {}",
                e
            )))
            .into()
        })
}

impl PromptLibrary {
    /// The templates shipped with the crate.
    pub fn bundled() -> ScriptoriumResult<Self> {
        Self::from_toml_str(DEFAULT_PROMPTS)
    }

    /// Load a complete library from a TOML file.
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> ScriptoriumResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            NarrativeError::new(NarrativeErrorKind::FileRead(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse a library from TOML text.
    ///
    /// Every [`PromptKind`] must be present as a string; unknown keys are
    /// ignored with a warning.
    pub fn from_toml_str(text: &str) -> ScriptoriumResult<Self> {
        let table: toml::Table = toml::from_str(text)
            .map_err(|e| NarrativeError::new(NarrativeErrorKind::TomlParse(e.to_string())))?;

        let mut templates = BTreeMap::new();
        for kind in PromptKind::iter() {
            let key = kind.to_string();
            let template = table
                .get(&key)
                .and_then(toml::Value::as_str)
                .ok_or_else(|| NarrativeError::new(NarrativeErrorKind::MissingPrompt(key)))?;
            templates.insert(kind, template.to_string());
        }

        for key in table.keys() {
            if key.parse::<PromptKind>().is_err() {
                warn!(key = %key, "Ignoring unknown prompt template");
            }
        }

        debug!(count = templates.len(), "Loaded prompt library");
        Ok(Self { templates })
    }

    /// Raw template text.
    pub fn template(&self, kind: PromptKind) -> ScriptoriumResult<&str> {
        self.templates.get(&kind).map(String::as_str).ok_or_else(|| {
            NarrativeError::new(NarrativeErrorKind::MissingPrompt(kind.to_string())).into()
        })
    }

    /// Render a template, substituting every `{{name}}` from `vars`.
    ///
    /// A placeholder with no matching variable is a template error; extra
    /// variables are ignored.
    ///
    /// ```
    /// use scriptorium_narrative::{PromptKind, PromptLibrary, PromptVars};
    ///
    /// let prompts = PromptLibrary::bundled().unwrap();
    /// let vars = PromptVars::new().with("concept", "Two rival bakers share one oven.");
    /// let prompt = prompts.render(PromptKind::GenerateActs, &vars).unwrap();
    /// assert!(prompt.contains("Two rival bakers"));
    ///
    /// let err = prompts.render(PromptKind::ValidateActs, &vars).unwrap_err();
    /// assert!(err.to_string().contains("content"));
    /// ```
    pub fn render(&self, kind: PromptKind, vars: &PromptVars) -> ScriptoriumResult<String> {
        let template = self.template(kind)?;
        let pattern = placeholder_pattern()?;

        let mut rendered = String::with_capacity(template.len());
        let mut last = 0;
        for captures in pattern.captures_iter(template) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let name = name.as_str().trim();
            let value = vars.get(name).ok_or_else(|| {
                NarrativeError::new(NarrativeErrorKind::TemplateError(format!(
                    "Template '{}' references unknown placeholder '{}'",
                    kind, name
                )))
            })?;
            rendered.push_str(&template[last..whole.start()]);
            rendered.push_str(value);
            last = whole.end();
        }
        rendered.push_str(&template[last..]);

        Ok(rendered)
    }
}
