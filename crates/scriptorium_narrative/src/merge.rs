//! Outline merging and ordering.
//!
//! The outline review returns a sparse patch: only the acts, scenes and
//! sub-scenes it changed or added. [`merge_outlines`] folds such a patch into
//! the assembled outline without dropping anything the patch left out.

use scriptorium_core::{Act, Outline, Scene, SubScene};
use serde_json::{Map, Value};

/// Merge `patch` into `original`, then sort the result.
///
/// - `title` and `concept` come from the patch when present.
/// - Acts are matched by `act_number` and scenes by `scene_number`. An entry
///   on one side only passes through unchanged. An entry on both sides takes
///   the patch's fields where present and recurses into its children.
/// - Sub-scenes from the patch replace their originals wholesale; original
///   sub-scenes the patch does not mention are kept.
/// - Unrecognized keys are unioned, the patch winning on conflicts.
///
/// # Examples
///
/// ```
/// use scriptorium_core::Outline;
/// use scriptorium_narrative::merge_outlines;
///
/// let original: Outline = serde_json::from_str(r#"{
///     "title": "Tidewater",
///     "acts": [{"act_number": 1, "title": "Arrival", "scenes": [
///         {"scene_number": "1.1", "title": "Ferry", "sub_scenes": [
///             {"sub_scene_number": "1.1.1", "title": "Fog"}
///         ]}
///     ]}]
/// }"#).unwrap();
/// let patch: Outline = serde_json::from_str(r#"{
///     "acts": [{"act_number": 1, "scenes": [
///         {"scene_number": "1.2", "title": "Harbor"}
///     ]}]
/// }"#).unwrap();
///
/// let merged = merge_outlines(&original, &patch);
/// assert_eq!(merged.title.as_deref(), Some("Tidewater"));
/// let act = merged.act(1).unwrap();
/// assert_eq!(act.title.as_deref(), Some("Arrival"));
/// assert_eq!(act.scenes.len(), 2);
/// assert_eq!(act.scenes[0].sub_scenes.len(), 1);
/// ```
pub fn merge_outlines(original: &Outline, patch: &Outline) -> Outline {
    let mut merged = Outline {
        title: patch.title.clone().or_else(|| original.title.clone()),
        concept: patch.concept.clone().or_else(|| original.concept.clone()),
        acts: merge_keyed(&original.acts, &patch.acts, |a| a.act_number, merge_act),
        extra: merge_extra(&original.extra, &patch.extra),
    };
    sort_outline(&mut merged);
    merged
}

/// Sort acts by number, and scenes and sub-scenes by dotted-decimal order.
///
/// ```
/// use scriptorium_core::{Act, Outline, Scene};
/// use scriptorium_narrative::sort_outline;
///
/// let mut act = Act::new(1);
/// act.scenes = vec![Scene::new("1.10"), Scene::new("1.9"), Scene::new("1.2")];
/// let mut outline = Outline { acts: vec![Act::new(3), act], ..Outline::default() };
///
/// sort_outline(&mut outline);
/// assert_eq!(outline.acts[0].act_number, 1);
/// let order: Vec<&str> = outline.acts[0].scenes.iter().map(|s| s.scene_number.as_str()).collect();
/// assert_eq!(order, vec!["1.2", "1.9", "1.10"]);
/// ```
pub fn sort_outline(outline: &mut Outline) {
    outline.acts.sort_by_key(|act| act.act_number);
    for act in &mut outline.acts {
        act.scenes
            .sort_by(|a, b| a.scene_number.cmp(&b.scene_number));
        for scene in &mut act.scenes {
            scene
                .sub_scenes
                .sort_by(|a, b| a.sub_scene_number.cmp(&b.sub_scene_number));
        }
    }
}

fn merge_act(original: &Act, patch: &Act) -> Act {
    Act {
        act_number: patch.act_number,
        title: patch.title.clone().or_else(|| original.title.clone()),
        description: patch
            .description
            .clone()
            .or_else(|| original.description.clone()),
        scenes: merge_keyed(
            &original.scenes,
            &patch.scenes,
            |s| s.scene_number.clone(),
            merge_scene,
        ),
        extra: merge_extra(&original.extra, &patch.extra),
    }
}

fn merge_scene(original: &Scene, patch: &Scene) -> Scene {
    Scene {
        scene_number: patch.scene_number.clone(),
        title: patch.title.clone().or_else(|| original.title.clone()),
        description: patch
            .description
            .clone()
            .or_else(|| original.description.clone()),
        sub_scenes: merge_sub_scenes(&original.sub_scenes, &patch.sub_scenes),
        extra: merge_extra(&original.extra, &patch.extra),
    }
}

fn merge_sub_scenes(original: &[SubScene], patch: &[SubScene]) -> Vec<SubScene> {
    let mut merged = patch.to_vec();
    merged.extend(
        original
            .iter()
            .filter(|sub| {
                !patch
                    .iter()
                    .any(|p| p.sub_scene_number == sub.sub_scene_number)
            })
            .cloned(),
    );
    merged
}

/// Merge two keyed lists: originals in order (merged with their patch entry
/// when one exists), then patch-only entries. Only the first entry per key is
/// kept on either side.
fn merge_keyed<T, K, F, M>(original: &[T], patch: &[T], key: F, merge: M) -> Vec<T>
where
    T: Clone,
    K: PartialEq,
    F: Fn(&T) -> K,
    M: Fn(&T, &T) -> T,
{
    let mut seen: Vec<K> = Vec::with_capacity(original.len() + patch.len());
    let mut merged = Vec::with_capacity(original.len() + patch.len());

    for item in original.iter().chain(patch) {
        let k = key(item);
        if seen.contains(&k) {
            continue;
        }
        let base = original.iter().find(|o| key(o) == k);
        let update = patch.iter().find(|p| key(p) == k);
        merged.push(match (base, update) {
            (Some(base), Some(update)) => merge(base, update),
            (Some(only), None) | (None, Some(only)) => only.clone(),
            (None, None) => item.clone(),
        });
        seen.push(k);
    }

    merged
}

fn merge_extra(original: &Map<String, Value>, patch: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = original.clone();
    merged.extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}
