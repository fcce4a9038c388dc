//! Lenient decoding of model-produced payloads.

use scriptorium_core::{
    ContentItem, Evaluation, MISSING_FEEDBACK, Outline, SceneContent, ValidationVerdict,
};
use serde_json::json;

#[test]
fn verdict_without_is_valid_is_rejected() {
    let verdict = ValidationVerdict::from_payload(&json!({"feedback": "Missing act three"}));
    assert!(!verdict.is_valid);
    assert_eq!(verdict.feedback, "Missing act three");
}

#[test]
fn verdict_with_non_bool_is_valid_is_rejected() {
    let verdict = ValidationVerdict::from_payload(&json!({"is_valid": "yes"}));
    assert!(!verdict.is_valid);
    assert_eq!(verdict.feedback, MISSING_FEEDBACK);
}

#[test]
fn evaluation_on_array_payload_degrades_to_zero() {
    let evaluation = Evaluation::from_payload(&json!([1, 2, 3]));
    assert_eq!(evaluation.total_score, 0);
    assert!(!evaluation.well_formed);
    assert_eq!(evaluation.feedback, "[1,2,3]");
    assert!(evaluation.criteria.is_empty());
}

#[test]
fn evaluation_keeps_criteria() {
    let evaluation = Evaluation::from_payload(&json!({
        "criteria": {"dialogue_quality": {"score": 12, "justification": "crisp"}},
        "total_score": 77,
        "feedback": "Sharpen the ending."
    }));
    assert_eq!(evaluation.total_score, 77);
    assert_eq!(evaluation.criteria["dialogue_quality"]["score"], 12);
}

#[test]
fn float_score_is_not_well_formed() {
    let evaluation = Evaluation::from_payload(&json!({"total_score": 0.85, "feedback": "ok"}));
    assert_eq!(evaluation.total_score, 0);
    assert!(!evaluation.well_formed);
}

#[test]
fn scene_content_round_trips_through_tagged_items() {
    let scene = SceneContent {
        scene_number: "1.1.1".into(),
        location: "INT. BRIDGE".to_string(),
        time: "NIGHT".to_string(),
        content: vec![
            ContentItem::Action {
                text: "Alarms pulse.".to_string(),
            },
            ContentItem::Dialog {
                character: "Vega".to_string(),
                text: "Report.".to_string(),
            },
        ],
    };
    let value = serde_json::to_value(&scene).unwrap();
    assert_eq!(value["content"][1]["type"], "dialog");
    assert_eq!(value["scene_number"], "1.1.1");
}

#[test]
fn sparse_outline_patch_decodes() {
    let patch: Outline = serde_json::from_value(json!({
        "acts": [{"act_number": 2, "scenes": [{"scene_number": 2.1, "title": "Drift"}]}]
    }))
    .unwrap();
    assert!(patch.title.is_none());
    assert_eq!(patch.acts[0].scenes[0].scene_number.as_str(), "2.1");
    assert!(patch.acts[0].scenes[0].sub_scenes.is_empty());
}
