//! Tests for the validate-until-accepted and score-until-threshold loops.

mod test_utils;

use async_trait::async_trait;
use scriptorium_core::{Evaluation, Outline};
use scriptorium_error::{
    NarrativeErrorKind, ScriptoriumError, ScriptoriumErrorKind, ScriptoriumResult,
};
use scriptorium_interface::ScriptoriumDriver;
use scriptorium_models::{ModelService, TieredModel};
use scriptorium_narrative::{
    PromptKind, PromptVars, Refinement, RefinementOutcome, RefinementStart, Stage, StageModels,
    ValidationLoop, feedback_block, generate_typed, refine_until_threshold,
};
use serde_json::{Map, Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use test_utils::{Reply, RoutedDriver, models, tagged_prompts};

fn narrative_kind(error: &ScriptoriumError) -> NarrativeErrorKind {
    match error.kind() {
        ScriptoriumErrorKind::Narrative(e) => e.kind.clone(),
        other => panic!("expected a narrative error, got {:?}", other),
    }
}

fn acts_stage() -> Stage {
    Stage::new(
        "acts",
        PromptKind::GenerateActs,
        PromptKind::ValidateActs,
        PromptVars::new().with("concept", "A heist on a generation ship."),
    )
}

fn two_acts() -> Value {
    json!({
        "title": "Long Haul",
        "acts": [
            {"act_number": 1, "title": "The Plan"},
            {"act_number": 2, "title": "The Job"}
        ]
    })
}

fn verdict(is_valid: bool, feedback: &str) -> Value {
    json!({"is_valid": is_valid, "feedback": feedback})
}

// ============================================================================
// Validation loop
// ============================================================================

#[tokio::test]
async fn test_rejection_feedback_reaches_next_attempt() {
    let driver = Arc::new(
        RoutedDriver::new()
            .json(PromptKind::GenerateActs, vec![two_acts()])
            .json(
                PromptKind::ValidateActs,
                vec![verdict(false, "Act two is missing a midpoint."), verdict(true, "")],
            ),
    );
    let stages = ValidationLoop::new(models(&driver), tagged_prompts(), 3);

    let outline: Outline = stages.run(&acts_stage()).await.unwrap();

    assert_eq!(outline.acts.len(), 2);
    assert_eq!(driver.calls(PromptKind::GenerateActs), 2);
    assert_eq!(driver.calls(PromptKind::ValidateActs), 2);

    let prompts = driver.prompts_for(PromptKind::GenerateActs);
    assert!(!prompts[0].contains("Previous attempt feedback"));
    assert!(prompts[1].ends_with(&feedback_block("Act two is missing a midpoint.")));
}

#[tokio::test]
async fn test_validation_sees_candidate_as_content() {
    let driver = Arc::new(
        RoutedDriver::new()
            .json(PromptKind::GenerateActs, vec![two_acts()])
            .json(PromptKind::ValidateActs, vec![verdict(true, "")]),
    );
    let stages = ValidationLoop::new(models(&driver), tagged_prompts(), 3);

    let _: Outline = stages.run(&acts_stage()).await.unwrap();

    let validation = &driver.prompts_for(PromptKind::ValidateActs)[0];
    assert!(validation.contains("The Plan"));
    assert!(validation.contains("Long Haul"));
}

#[tokio::test]
async fn test_exhausted_stage_names_itself() {
    let driver = Arc::new(
        RoutedDriver::new()
            .json(PromptKind::GenerateActs, vec![two_acts()])
            .json(PromptKind::ValidateActs, vec![verdict(false, "Still wrong.")]),
    );
    let stages = ValidationLoop::new(models(&driver), tagged_prompts(), 3);

    let error = stages.run::<Outline>(&acts_stage()).await.unwrap_err();

    assert_eq!(
        narrative_kind(&error),
        NarrativeErrorKind::ExhaustedAttempts {
            stage: "acts".to_string(),
            attempts: 3,
        }
    );
    assert_eq!(driver.calls(PromptKind::GenerateActs), 3);
    assert_eq!(driver.calls(PromptKind::ValidateActs), 3);
}

#[tokio::test]
async fn test_undecodable_candidate_skips_validation() {
    let driver = Arc::new(
        RoutedDriver::new()
            .route(
                PromptKind::GenerateActs,
                vec![
                    Reply::Text("Here are some acts, I hope you like them.".into()),
                    Reply::json(two_acts()),
                ],
            )
            .json(PromptKind::ValidateActs, vec![verdict(true, "")]),
    );
    let stages = ValidationLoop::new(models(&driver), tagged_prompts(), 3);

    let _: Outline = stages.run(&acts_stage()).await.unwrap();

    assert_eq!(driver.calls(PromptKind::GenerateActs), 2);
    assert_eq!(driver.calls(PromptKind::ValidateActs), 1);
}

#[tokio::test]
async fn test_misshapen_candidate_consumes_attempt() {
    let driver = Arc::new(
        RoutedDriver::new()
            .json(
                PromptKind::GenerateActs,
                vec![json!({"acts": "three of them"}), two_acts()],
            )
            .json(PromptKind::ValidateActs, vec![verdict(true, "")]),
    );
    let stages = ValidationLoop::new(models(&driver), tagged_prompts(), 2);

    let outline: Outline = stages.run(&acts_stage()).await.unwrap();

    assert_eq!(outline.acts.len(), 2);
    assert_eq!(driver.calls(PromptKind::ValidateActs), 1);
}

#[tokio::test]
async fn test_undecodable_verdict_counts_as_rejection() {
    let driver = Arc::new(
        RoutedDriver::new()
            .json(PromptKind::GenerateActs, vec![two_acts()])
            .route(
                PromptKind::ValidateActs,
                vec![Reply::Text("Looks fine to me!".into())],
            ),
    );
    let stages = ValidationLoop::new(models(&driver), tagged_prompts(), 2);

    let error = stages.run::<Outline>(&acts_stage()).await.unwrap_err();

    assert!(matches!(
        narrative_kind(&error),
        NarrativeErrorKind::ExhaustedAttempts { attempts: 2, .. }
    ));
}

#[tokio::test]
async fn test_provider_failure_aborts_stage() {
    let driver = Arc::new(RoutedDriver::new().route(PromptKind::GenerateActs, vec![Reply::Transport]));
    let stages = ValidationLoop::new(models(&driver), tagged_prompts(), 3);

    let error = stages.run::<Outline>(&acts_stage()).await.unwrap_err();

    assert!(error.is_provider_failure());
    assert_eq!(driver.calls(PromptKind::GenerateActs), 1);
}

#[tokio::test]
async fn test_fallback_answers_when_primary_is_down() {
    let primary = Arc::new(RoutedDriver::new().route(PromptKind::GenerateActs, vec![Reply::Transport]));
    let fallback = Arc::new(RoutedDriver::new().json(PromptKind::GenerateActs, vec![two_acts()]));
    let validator = Arc::new(RoutedDriver::new().json(PromptKind::ValidateActs, vec![verdict(true, "")]));

    let service = |driver: &Arc<RoutedDriver>| {
        let driver: Arc<dyn ScriptoriumDriver> = driver.clone();
        ModelService::new(driver)
    };
    let models = StageModels::new(
        TieredModel::new(service(&primary), Some(service(&fallback))),
        TieredModel::new(service(&validator), None),
    );
    let stages = ValidationLoop::new(models, tagged_prompts(), 1);

    let outline: Outline = stages.run(&acts_stage()).await.unwrap();

    assert_eq!(outline.acts.len(), 2);
    assert_eq!(primary.call_count(), 1);
    assert_eq!(fallback.call_count(), 1);
}

#[tokio::test]
async fn test_typed_generation_gives_up_after_budget() {
    let driver = Arc::new(
        RoutedDriver::new().route(PromptKind::DevelopCharacters, vec![Reply::Text("nope".into())]),
    );
    let model = models(&driver).generation;

    let error = generate_typed::<Value>(&model, "<<develop_characters>>", 2, "characters")
        .await
        .unwrap_err();

    assert_eq!(
        narrative_kind(&error),
        NarrativeErrorKind::UndecodableOutput {
            stage: "characters".to_string(),
            attempts: 2,
        }
    );
    assert_eq!(driver.call_count(), 2);
}

// ============================================================================
// Refinement loop
// ============================================================================

/// Candidates are integers; refining adds one, scores come from a script.
#[derive(Default)]
struct Counter {
    generated: Mutex<VecDeque<Option<u32>>>,
    scores: Mutex<VecDeque<i64>>,
    generate_calls: Mutex<usize>,
    feedback: Mutex<Vec<String>>,
}

impl Counter {
    fn scored(scores: &[i64]) -> Self {
        Self {
            scores: Mutex::new(scores.iter().copied().collect()),
            ..Self::default()
        }
    }

    fn generating(mut self, generated: &[Option<u32>]) -> Self {
        self.generated = Mutex::new(generated.iter().copied().collect());
        self
    }

    fn generate_calls(&self) -> usize {
        *self.generate_calls.lock().unwrap()
    }

    fn feedback(&self) -> Vec<String> {
        self.feedback.lock().unwrap().clone()
    }
}

#[async_trait]
impl Refinement for Counter {
    type Candidate = u32;

    async fn generate(&self) -> ScriptoriumResult<Option<u32>> {
        *self.generate_calls.lock().unwrap() += 1;
        Ok(self.generated.lock().unwrap().pop_front().unwrap_or(Some(1)))
    }

    async fn evaluate(&self, _candidate: &u32) -> ScriptoriumResult<Evaluation> {
        let score = self.scores.lock().unwrap().pop_front().unwrap_or(0);
        Ok(Evaluation {
            total_score: score,
            feedback: format!("scored {}", score),
            criteria: Map::new(),
            well_formed: true,
        })
    }

    async fn refine(&self, candidate: &u32, feedback: &str) -> ScriptoriumResult<Option<u32>> {
        self.feedback.lock().unwrap().push(feedback.to_string());
        Ok(Some(candidate + 1))
    }
}

#[tokio::test]
async fn test_refinement_accepts_once_threshold_reached() {
    let counter = Counter::scored(&[50, 85]);

    let outcome = refine_until_threshold(&counter, 3, 80, RefinementStart::Generate)
        .await
        .unwrap();

    match outcome {
        RefinementOutcome::Accepted {
            candidate,
            evaluation,
            iterations,
        } => {
            assert_eq!(candidate, 2);
            assert_eq!(evaluation.total_score, 85);
            assert_eq!(iterations, 2);
        }
        other => panic!("expected acceptance, got {:?}", other),
    }
    assert_eq!(counter.feedback(), vec!["scored 50".to_string()]);
}

#[tokio::test]
async fn test_refinement_keeps_best_when_budget_runs_out() {
    let counter = Counter::scored(&[60, 75, 40]);

    let outcome = refine_until_threshold(&counter, 3, 80, RefinementStart::Generate)
        .await
        .unwrap();

    assert!(!outcome.is_accepted());
    assert_eq!(outcome.score(), 75);
    let (candidate, evaluation, _) = outcome.into_parts();
    assert_eq!(candidate, Some(2));
    assert_eq!(evaluation.unwrap().feedback, "scored 75");
    // No refinement after the last evaluation.
    assert_eq!(counter.feedback().len(), 2);
}

#[tokio::test]
async fn test_refinement_keeps_earlier_candidate_on_tie() {
    let counter = Counter::scored(&[70, 70]);

    let outcome = refine_until_threshold(&counter, 2, 80, RefinementStart::Generate)
        .await
        .unwrap();

    let (candidate, _, score) = outcome.into_parts();
    assert_eq!(candidate, Some(1));
    assert_eq!(score, 70);
}

#[tokio::test]
async fn test_refinement_regenerates_missing_candidate() {
    let counter = Counter::scored(&[90]).generating(&[None, Some(7)]);

    let outcome = refine_until_threshold(&counter, 3, 80, RefinementStart::Generate)
        .await
        .unwrap();

    match outcome {
        RefinementOutcome::Accepted {
            candidate,
            iterations,
            ..
        } => {
            assert_eq!(candidate, 7);
            assert_eq!(iterations, 2);
        }
        other => panic!("expected acceptance, got {:?}", other),
    }
    assert_eq!(counter.generate_calls(), 2);
}

#[tokio::test]
async fn test_refinement_without_any_candidate_scores_zero() {
    let counter = Counter::scored(&[]).generating(&[None, None, None]);

    let outcome = refine_until_threshold(&counter, 3, 80, RefinementStart::Generate)
        .await
        .unwrap();

    let (candidate, evaluation, score) = outcome.into_parts();
    assert!(candidate.is_none());
    assert!(evaluation.is_none());
    assert_eq!(score, 0);
}

#[tokio::test]
async fn test_refinement_can_start_from_existing_candidate() {
    let counter = Counter::scored(&[90]);

    let outcome = refine_until_threshold(
        &counter,
        2,
        80,
        RefinementStart::Refine {
            candidate: 10,
            feedback: "Tighten the dialog.".to_string(),
        },
    )
    .await
    .unwrap();

    let (candidate, _, _) = outcome.into_parts();
    assert_eq!(candidate, Some(11));
    assert_eq!(counter.generate_calls(), 0);
    assert_eq!(counter.feedback(), vec!["Tighten the dialog.".to_string()]);
}
