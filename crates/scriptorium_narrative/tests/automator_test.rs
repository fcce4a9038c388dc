//! Tests for end-to-end run orchestration.

mod test_utils;

use scriptorium_config::ScriptoriumConfig;
use scriptorium_core::Outline;
use scriptorium_error::{NarrativeErrorKind, ScriptoriumErrorKind};
use scriptorium_narrative::{
    CHARACTERS_ARTIFACT, CONCEPT_INPUT, OUTLINE_ARTIFACT, PromptKind, RunFlags,
    SCRIPT_REFINED_ARTIFACT, ScriptAutomator, THEMES_ARTIFACT,
};
use scriptorium_storage::{ArtifactStore, ArtifactStoreExt, FileSystemStore, InMemoryStore};
use serde_json::{Value, json};
use std::sync::Arc;
use test_utils::{RoutedDriver, models, tagged_prompts};

const CONCEPT: &str = "A night-shift radio host takes a call from their future self.";

fn automator(
    driver: &Arc<RoutedDriver>,
    input: Arc<dyn ArtifactStore>,
    output: Arc<dyn ArtifactStore>,
) -> ScriptAutomator {
    ScriptAutomator::new(
        ScriptoriumConfig::default(),
        models(driver),
        tagged_prompts(),
        input,
        output,
    )
}

fn small_outline() -> Value {
    json!({
        "title": "Dead Air",
        "acts": [{"act_number": 1, "scenes": [{"scene_number": "1.1", "sub_scenes": [
            {"sub_scene_number": "1.1.1", "title": "The Call"}
        ]}]}]
    })
}

fn accept() -> Value {
    json!({"is_valid": true, "feedback": ""})
}

#[tokio::test]
async fn test_missing_concept_is_reported() {
    let driver = Arc::new(RoutedDriver::new());
    let automator = automator(
        &driver,
        Arc::new(InMemoryStore::new()),
        Arc::new(InMemoryStore::new()),
    );

    let error = automator.run(RunFlags::all()).await.unwrap_err();

    match error.kind() {
        ScriptoriumErrorKind::Narrative(e) => assert_eq!(
            e.kind,
            NarrativeErrorKind::MissingInput(CONCEPT_INPUT.to_string())
        ),
        other => panic!("expected a narrative error, got {:?}", other),
    }
    assert_eq!(driver.call_count(), 0);
}

#[tokio::test]
async fn test_blank_concept_is_reported() {
    let driver = Arc::new(RoutedDriver::new());
    let input = Arc::new(InMemoryStore::new());
    input.write_text(CONCEPT_INPUT, "  \n").await.unwrap();
    let automator = automator(&driver, input, Arc::new(InMemoryStore::new()));

    let error = automator.run(RunFlags::all()).await.unwrap_err();

    assert!(error.to_string().contains(CONCEPT_INPUT));
}

#[tokio::test]
async fn test_nothing_requested_loads_existing_artifacts() {
    let driver = Arc::new(RoutedDriver::new());
    let input = Arc::new(InMemoryStore::new());
    input.write_text(CONCEPT_INPUT, CONCEPT).await.unwrap();
    let output = Arc::new(InMemoryStore::new());
    output.write_json(OUTLINE_ARTIFACT, &small_outline()).await.unwrap();
    let automator = automator(&driver, input, output);

    let summary = automator.run(RunFlags::default()).await.unwrap();

    assert_eq!(summary.outline().title.as_deref(), Some("Dead Air"));
    assert!(summary.characters().0.is_empty());
    assert!(summary.script().is_none());
    assert_eq!(driver.call_count(), 0);
}

#[tokio::test]
async fn test_characters_only_run_writes_to_disk() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    std::fs::write(input_dir.path().join(CONCEPT_INPUT), CONCEPT).unwrap();
    std::fs::write(
        output_dir.path().join(OUTLINE_ARTIFACT),
        small_outline().to_string(),
    )
    .unwrap();

    let driver = Arc::new(RoutedDriver::new().json(
        PromptKind::DevelopCharacters,
        vec![json!({"Rook": {"background": "Twenty years behind the microphone."}})],
    ));
    let automator = automator(
        &driver,
        Arc::new(FileSystemStore::new(input_dir.path()).unwrap()),
        Arc::new(FileSystemStore::new(output_dir.path()).unwrap()),
    );

    let flags = RunFlags {
        characters: true,
        ..RunFlags::default()
    };
    let summary = automator.run(flags).await.unwrap();

    assert!(summary.characters().0.contains_key("Rook"));
    assert!(output_dir.path().join(CHARACTERS_ARTIFACT).exists());
    assert!(!output_dir.path().join(THEMES_ARTIFACT).exists());

    let prompt = &driver.prompts_for(PromptKind::DevelopCharacters)[0];
    assert!(prompt.contains(CONCEPT));
    assert!(prompt.contains("initial=None provided"));
}

#[tokio::test]
async fn test_full_run_produces_script() {
    let driver = Arc::new(
        RoutedDriver::new()
            .json(PromptKind::GenerateActs, vec![json!({"title": "Dead Air", "acts": [{"act_number": 1}]})])
            .json(
                PromptKind::GenerateKeyScenes,
                vec![json!({"scenes": [{"scene_number": "1.1", "title": "Studio"}]})],
            )
            .json(
                PromptKind::GenerateSubScenes,
                vec![json!({"sub_scenes": [{"sub_scene_number": "1.1.1", "title": "The Call"}]})],
            )
            .json(PromptKind::ReviewOutline, vec![json!({})])
            .json(PromptKind::ValidateActs, vec![accept()])
            .json(PromptKind::ValidateKeyScenes, vec![accept()])
            .json(PromptKind::ValidateSubScenes, vec![accept()])
            .json(PromptKind::ValidateFinalOutline, vec![accept()])
            .json(
                PromptKind::DevelopCharacters,
                vec![json!({"Rook": {"arc": "Learns to listen."}})],
            )
            .json(
                PromptKind::IdentifyThemes,
                vec![json!({
                    "main_theme": {"description": "Regret"},
                    "sub_themes": [{"name": "Time"}]
                })],
            )
            .json(
                PromptKind::GenerateScene,
                vec![json!({
                    "scene_number": "1.1.1",
                    "location": "INT. RADIO BOOTH",
                    "time": "3 AM",
                    "content": [{"type": "dialog", "character": "Rook", "text": "You're on the air."}]
                })],
            )
            .json(PromptKind::EvaluateScene, vec![json!({"total_score": 88, "feedback": "Good."})])
            .json(PromptKind::ExtractStoryElements, vec![json!({"story_elements": []})])
            .json(PromptKind::EvaluateFullScript, vec![json!({"total_score": 91, "feedback": "Solid."})])
            .json(PromptKind::ReviewScript, vec![json!({"verdict": "Ship it."})]),
    );
    let input = Arc::new(InMemoryStore::new());
    input.write_text(CONCEPT_INPUT, CONCEPT).await.unwrap();
    let output = Arc::new(InMemoryStore::new());
    let automator = automator(&driver, input, output.clone());

    let summary = automator.run(RunFlags::all()).await.unwrap();

    assert_eq!(summary.outline().sub_scene_count(), 1);
    assert_eq!(summary.themes().sub_themes[0].name.as_deref(), Some("Time"));
    let script = summary.script().as_ref().unwrap();
    assert!(script.refined_script().contains("ROOK\nYou're on the air."));

    let saved: Outline = output.read_json(OUTLINE_ARTIFACT).await.unwrap().unwrap();
    assert_eq!(&saved, summary.outline());
    for key in [CHARACTERS_ARTIFACT, THEMES_ARTIFACT, SCRIPT_REFINED_ARTIFACT] {
        assert!(output.exists(key).await.unwrap(), "{}", key);
    }
}
