//! The hierarchical story outline: acts, scenes and sub-scenes.

use crate::SceneNumber;
use crate::scene_number::lenient_u32;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Root of the outline tree.
///
/// Every node keeps the keys the model added beyond the known fields in
/// `extra`, so a round trip through the tree never loses information.
///
/// # Examples
///
/// ```
/// use scriptorium_core::Outline;
///
/// let outline: Outline = serde_json::from_str(r#"{
///     "title": "Low Orbit",
///     "acts": [
///         {"act_number": 1, "title": "Launch", "scenes": [
///             {"scene_number": "1.1", "sub_scenes": [
///                 {"sub_scene_number": "1.1.1", "title": "Countdown"}
///             ]}
///         ]}
///     ]
/// }"#).unwrap();
///
/// assert_eq!(outline.sub_scene_count(), 1);
/// assert_eq!(outline.act(1).unwrap().title.as_deref(), Some("Launch"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Outline {
    /// Working title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Concept restatement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,
    /// Acts in order
    #[serde(default)]
    pub acts: Vec<Act>,
    /// Unrecognized keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An act of the story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Act {
    /// Unique act number
    #[serde(deserialize_with = "lenient_u32")]
    pub act_number: u32,
    /// Act title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Act summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Key scenes of the act
    #[serde(default)]
    pub scenes: Vec<Scene>,
    /// Unrecognized keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A key scene within an act.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Dotted scene number, unique within its act
    pub scene_number: SceneNumber,
    /// Scene title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Scene summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Sub-scenes, the leaf units of generation
    #[serde(default)]
    pub sub_scenes: Vec<SubScene>,
    /// Unrecognized keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Smallest planned unit; one scene of prose is generated per sub-scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubScene {
    /// Dotted sub-scene number, unique within its scene
    pub sub_scene_number: SceneNumber,
    /// Sub-scene title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// What happens in the sub-scene
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unrecognized keys
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of the key-scene stage: the scenes of one act.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenePlan {
    /// Scenes in order
    pub scenes: Vec<Scene>,
}

/// Payload of the sub-scene stage: the sub-scenes of one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubScenePlan {
    /// Sub-scenes in order
    pub sub_scenes: Vec<SubScene>,
}

/// A sub-scene together with its position in the tree.
#[derive(Debug, Clone, Copy)]
pub struct SubSceneRef<'a> {
    /// Containing act
    pub act: &'a Act,
    /// Containing scene
    pub scene: &'a Scene,
    /// The sub-scene itself
    pub sub_scene: &'a SubScene,
}

impl Outline {
    /// Look up an act by number.
    pub fn act(&self, act_number: u32) -> Option<&Act> {
        self.acts.iter().find(|a| a.act_number == act_number)
    }

    /// Mutable lookup of an act by number.
    pub fn act_mut(&mut self, act_number: u32) -> Option<&mut Act> {
        self.acts.iter_mut().find(|a| a.act_number == act_number)
    }

    /// Sub-scenes in traversal order: act, then scene, then sub-scene.
    pub fn sub_scenes(&self) -> impl Iterator<Item = SubSceneRef<'_>> {
        self.acts.iter().flat_map(|act| {
            act.scenes.iter().flat_map(move |scene| {
                scene
                    .sub_scenes
                    .iter()
                    .map(move |sub_scene| SubSceneRef {
                        act,
                        scene,
                        sub_scene,
                    })
            })
        })
    }

    /// Number of sub-scenes in the whole tree.
    pub fn sub_scene_count(&self) -> usize {
        self.acts
            .iter()
            .flat_map(|a| &a.scenes)
            .map(|s| s.sub_scenes.len())
            .sum()
    }

    /// Whether the outline has no acts.
    pub fn is_empty(&self) -> bool {
        self.acts.is_empty()
    }

    /// First numbering problem in the tree, if any.
    ///
    /// Act numbers must be unique, and every scene and sub-scene number must
    /// extend the number of the node that contains it.
    ///
    /// ```
    /// use scriptorium_core::Outline;
    ///
    /// let outline: Outline = serde_json::from_str(
    ///     r#"{"acts": [{"act_number": 1}, {"act_number": 1}]}"#,
    /// ).unwrap();
    /// assert_eq!(
    ///     outline.numbering_issue().as_deref(),
    ///     Some("Act number 1 appears more than once")
    /// );
    /// ```
    pub fn numbering_issue(&self) -> Option<String> {
        let mut seen = BTreeSet::new();
        self.acts.iter().find_map(|act| {
            if !seen.insert(act.act_number) {
                return Some(format!(
                    "Act number {} appears more than once",
                    act.act_number
                ));
            }
            scenes_issue(act.act_number, &act.scenes)
        })
    }
}

impl ScenePlan {
    /// First numbering problem among the scenes planned for `act_number`.
    pub fn numbering_issue(&self, act_number: u32) -> Option<String> {
        scenes_issue(act_number, &self.scenes)
    }
}

impl SubScenePlan {
    /// First numbering problem among the sub-scenes planned for `scene_number`.
    pub fn numbering_issue(&self, scene_number: &SceneNumber) -> Option<String> {
        sub_scenes_issue(scene_number, &self.sub_scenes)
    }
}

fn scenes_issue(act_number: u32, scenes: &[Scene]) -> Option<String> {
    let act = act_number.to_string();
    let mut seen = BTreeSet::new();
    scenes.iter().find_map(|scene| {
        if !scene.scene_number.extends(&act) {
            return Some(format!(
                "Scene {} does not belong to act {}; number it {}.N",
                scene.scene_number, act, act
            ));
        }
        if !seen.insert(scene.scene_number.as_str()) {
            return Some(format!(
                "Scene {} appears more than once in act {}",
                scene.scene_number, act
            ));
        }
        sub_scenes_issue(&scene.scene_number, &scene.sub_scenes)
    })
}

fn sub_scenes_issue(scene_number: &SceneNumber, sub_scenes: &[SubScene]) -> Option<String> {
    let mut seen = BTreeSet::new();
    sub_scenes.iter().find_map(|sub_scene| {
        let number = &sub_scene.sub_scene_number;
        if !number.extends(scene_number.as_str()) {
            Some(format!(
                "Sub-scene {} does not belong to scene {}; number it {}.N",
                number, scene_number, scene_number
            ))
        } else if !seen.insert(number.as_str()) {
            Some(format!(
                "Sub-scene {} appears more than once in scene {}",
                number, scene_number
            ))
        } else {
            None
        }
    })
}

impl Act {
    /// Create an act with no scenes.
    pub fn new(act_number: u32) -> Self {
        Self {
            act_number,
            title: None,
            description: None,
            scenes: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl Scene {
    /// Create a scene with no sub-scenes.
    pub fn new(scene_number: impl Into<SceneNumber>) -> Self {
        Self {
            scene_number: scene_number.into(),
            title: None,
            description: None,
            sub_scenes: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl SubScene {
    /// Create an untitled sub-scene.
    pub fn new(sub_scene_number: impl Into<SceneNumber>) -> Self {
        Self {
            sub_scene_number: sub_scene_number.into(),
            title: None,
            description: None,
            extra: Map::new(),
        }
    }
}
