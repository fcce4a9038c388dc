//! Tests for merging outline review patches.

use scriptorium_core::Outline;
use scriptorium_narrative::{merge_outlines, sort_outline};
use serde_json::json;

fn outline(value: serde_json::Value) -> Outline {
    serde_json::from_value(value).expect("valid outline")
}

fn assembled() -> Outline {
    outline(json!({
        "title": "Salt Road",
        "concept": "Two smugglers cross a desert with a stolen bell.",
        "tone": "dry",
        "acts": [
            {"act_number": 2, "title": "Crossing", "scenes": [
                {"scene_number": "2.1", "title": "Dunes", "sub_scenes": [
                    {"sub_scene_number": "2.1.1", "title": "Sandstorm"}
                ]}
            ]},
            {"act_number": 1, "title": "Theft", "description": "The bell is taken.", "scenes": [
                {"scene_number": "1.10", "title": "Escape"},
                {"scene_number": "1.2", "title": "Temple", "mood": "hushed", "sub_scenes": [
                    {"sub_scene_number": "1.2.2", "title": "Alarm"},
                    {"sub_scene_number": "1.2.1", "title": "Entry", "description": "Over the wall."}
                ]}
            ]}
        ]
    }))
}

#[test]
fn test_merge_with_itself_only_sorts() {
    let original = assembled();
    let mut sorted = original.clone();
    sort_outline(&mut sorted);

    assert_eq!(merge_outlines(&original, &original), sorted);
}

#[test]
fn test_sparse_patch_keeps_untouched_nodes() {
    let patch = outline(json!({
        "acts": [{"act_number": 1, "title": "The Theft"}]
    }));

    let merged = merge_outlines(&assembled(), &patch);

    assert_eq!(merged.title.as_deref(), Some("Salt Road"));
    assert_eq!(merged.acts.len(), 2);
    let act = merged.act(1).unwrap();
    assert_eq!(act.title.as_deref(), Some("The Theft"));
    assert_eq!(act.description.as_deref(), Some("The bell is taken."));
    assert_eq!(act.scenes.len(), 2);
    assert_eq!(merged.sub_scene_count(), 3);
}

#[test]
fn test_patched_sub_scene_replaces_original_wholesale() {
    let patch = outline(json!({
        "acts": [{"act_number": 1, "scenes": [
            {"scene_number": "1.2", "sub_scenes": [
                {"sub_scene_number": "1.2.1", "title": "Through the Roof"}
            ]}
        ]}]
    }));

    let merged = merge_outlines(&assembled(), &patch);

    let scene = &merged.act(1).unwrap().scenes[0];
    assert_eq!(scene.scene_number.as_str(), "1.2");
    assert_eq!(scene.title.as_deref(), Some("Temple"));
    assert_eq!(scene.sub_scenes.len(), 2);
    let entry = &scene.sub_scenes[0];
    assert_eq!(entry.sub_scene_number.as_str(), "1.2.1");
    assert_eq!(entry.title.as_deref(), Some("Through the Roof"));
    assert_eq!(entry.description, None);
    assert_eq!(scene.sub_scenes[1].title.as_deref(), Some("Alarm"));
}

#[test]
fn test_new_nodes_land_in_order() {
    let patch = outline(json!({
        "acts": [
            {"act_number": 3, "title": "Homecoming"},
            {"act_number": 1, "scenes": [{"scene_number": "1.5", "title": "Bazaar"}]}
        ]
    }));

    let merged = merge_outlines(&assembled(), &patch);

    let acts: Vec<u32> = merged.acts.iter().map(|act| act.act_number).collect();
    assert_eq!(acts, vec![1, 2, 3]);
    let scenes: Vec<&str> = merged
        .act(1)
        .unwrap()
        .scenes
        .iter()
        .map(|scene| scene.scene_number.as_str())
        .collect();
    assert_eq!(scenes, vec!["1.2", "1.5", "1.10"]);
}

#[test]
fn test_extra_keys_are_unioned_patch_first() {
    let patch = outline(json!({
        "tone": "wry",
        "logline": "A bell, a desert, a grudge.",
        "acts": [{"act_number": 1, "scenes": [
            {"scene_number": "1.2", "lighting": "candles"}
        ]}]
    }));

    let merged = merge_outlines(&assembled(), &patch);

    assert_eq!(merged.extra["tone"], json!("wry"));
    assert_eq!(merged.extra["logline"], json!("A bell, a desert, a grudge."));
    let scene = &merged.act(1).unwrap().scenes[0];
    assert_eq!(scene.extra["mood"], json!("hushed"));
    assert_eq!(scene.extra["lighting"], json!("candles"));
}
