//! Generated scene content.

use crate::{Evaluation, SceneNumber};
use serde::{Deserialize, Serialize};

/// One beat of a screenplay scene.
///
/// # Examples
///
/// ```
/// use scriptorium_core::ContentItem;
///
/// let item: ContentItem =
///     serde_json::from_str(r#"{"type": "dialog", "character": "Vega", "text": "Hold course."}"#)
///         .unwrap();
/// assert_eq!(item.text(), "Hold course.");
/// assert!(matches!(item, ContentItem::Dialog { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    /// Stage direction
    Action {
        /// Description of the action
        text: String,
    },
    /// A spoken line
    Dialog {
        /// Speaking character
        character: String,
        /// The line
        text: String,
    },
    /// Scene transition such as "cut to"
    Transition {
        /// Transition text
        text: String,
    },
}

impl ContentItem {
    /// The item's text regardless of kind.
    pub fn text(&self) -> &str {
        match self {
            ContentItem::Action { text }
            | ContentItem::Dialog { text, .. }
            | ContentItem::Transition { text } => text,
        }
    }
}

/// Structured content of one generated scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneContent {
    /// Scene number as reported by the model
    pub scene_number: SceneNumber,
    /// Where the scene takes place
    pub location: String,
    /// When the scene takes place
    pub time: String,
    /// Beats in order
    pub content: Vec<ContentItem>,
}

/// Result of generating one sub-scene.
///
/// `content` is `None` when no attempt produced structurally valid output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedScene {
    /// Outline sub-scene number this scene realizes
    pub scene_number: SceneNumber,
    /// Best content found
    pub content: Option<SceneContent>,
    /// Evaluation of `content`, when one was made
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Evaluation>,
    /// Score of `content`
    pub score: i64,
    /// Whether the score reached the acceptance threshold
    pub accepted: bool,
}
