//! Story bible: characters, themes and extracted story elements.

use crate::SceneNumber;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// How long an extracted story element stays in the generation context.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ElementScope {
    /// Relevant for the whole story
    Global,
    /// Relevant until the current act ends
    Act,
    /// Only relevant to the scene it came from
    Scene,
}

/// A fact extracted from generated content and carried forward as context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryElement {
    /// Element category, e.g. "character_name", "object", "event"
    #[serde(rename = "type")]
    pub kind: String,
    /// The extracted fact
    pub content: String,
    /// Context lifetime
    pub scope: ElementScope,
    /// Scene the element was extracted from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_number: Option<SceneNumber>,
}

impl StoryElement {
    /// Decode every well-formed element from an extraction payload.
    ///
    /// The payload is expected to look like `{"story_elements": [...]}`;
    /// malformed entries are skipped and a malformed payload yields nothing.
    ///
    /// ```
    /// use scriptorium_core::{ElementScope, StoryElement};
    /// use serde_json::json;
    ///
    /// let elements = StoryElement::from_payload(&json!({
    ///     "story_elements": [
    ///         {"type": "object", "content": "A cracked visor", "scope": "act"},
    ///         {"type": "event", "content": "missing scope"},
    ///         {"type": "location", "content": "Hangar 4", "scope": "Global", "scene_number": "1.1.1"}
    ///     ]
    /// }));
    /// assert_eq!(elements.len(), 2);
    /// assert_eq!(elements[1].scope, ElementScope::Global);
    /// ```
    pub fn from_payload(payload: &Value) -> Vec<StoryElement> {
        payload
            .get("story_elements")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Self::from_item).collect())
            .unwrap_or_default()
    }

    fn from_item(item: &Value) -> Option<StoryElement> {
        let scope = item.get("scope")?.as_str()?.parse::<ElementScope>().ok()?;
        let scene_number = match item.get("scene_number") {
            Some(Value::String(s)) => Some(SceneNumber::new(s.as_str())),
            Some(Value::Number(n)) => Some(SceneNumber::new(n.to_string())),
            _ => None,
        };
        Some(StoryElement {
            kind: item.get("type")?.as_str()?.to_string(),
            content: item.get("content")?.as_str()?.to_string(),
            scope,
            scene_number,
        })
    }
}

/// Profile of one character.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CharacterProfile {
    /// Rank or title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<String>,
    /// Species or origin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    /// Backstory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Personality traits
    #[serde(default, alias = "traits", skip_serializing_if = "Vec::is_empty")]
    pub personality: Vec<String>,
    /// Relationship notes keyed by the other character's name
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub relationships: Map<String, Value>,
    /// Character arc
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arc: Option<String>,
    /// Further attributes (strengths, fears, goals, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Character name → profile, generated once per run.
///
/// # Examples
///
/// ```
/// use scriptorium_core::Characters;
///
/// let cast: Characters = serde_json::from_str(r#"{
///     "Vega": {"rank": "Captain", "traits": ["stubborn"], "fears": ["silence"]}
/// }"#).unwrap();
/// let vega = &cast.0["Vega"];
/// assert_eq!(vega.rank.as_deref(), Some("Captain"));
/// assert_eq!(vega.personality, vec!["stubborn".to_string()]);
/// assert!(vega.extra.contains_key("fears"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Characters(pub BTreeMap<String, CharacterProfile>);

impl Characters {
    /// Whether no characters were developed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Central theme of the story.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MainTheme {
    /// What the theme is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// How the story explores it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exploration: Option<String>,
    /// Unrecognized keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A secondary theme.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubTheme {
    /// Theme name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// What the theme is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Why it matters to this story
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<String>,
    /// Unrecognized keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A moral dilemma the story poses.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EthicalDilemma {
    /// Situation that raises the dilemma
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub situation: Option<String>,
    /// The dilemma itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dilemma: Option<String>,
    /// Consequences of each choice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implications: Option<String>,
    /// Unrecognized keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Thematic analysis, generated once per run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Themes {
    /// Central theme
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_theme: Option<MainTheme>,
    /// Secondary themes
    #[serde(default)]
    pub sub_themes: Vec<SubTheme>,
    /// Dilemmas posed
    #[serde(default)]
    pub ethical_dilemmas: Vec<EthicalDilemma>,
    /// Further sections (concepts, genre connections, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Themes {
    /// Whether no analysis is present.
    pub fn is_empty(&self) -> bool {
        self.main_theme.is_none()
            && self.sub_themes.is_empty()
            && self.ethical_dilemmas.is_empty()
            && self.extra.is_empty()
    }
}
