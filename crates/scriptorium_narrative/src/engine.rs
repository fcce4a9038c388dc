//! Generate-validate-retry loops.
//!
//! Two policies drive every model interaction in the pipeline:
//!
//! - [`ValidationLoop`] regenerates until the validation model accepts the
//!   candidate, and fails the stage once its attempts are spent.
//! - [`refine_until_threshold`] scores candidates and refines them until one
//!   reaches a threshold, returning the best candidate seen when the budget
//!   runs out.
//!
//! Only provider failures that survive the fallback abort either loop.
//! Undecodable output is a failed attempt, never an error.

use crate::{PromptKind, PromptLibrary, PromptVars};
use async_trait::async_trait;
use scriptorium_config::ScriptoriumConfig;
use scriptorium_core::{Evaluation, ValidationVerdict};
use scriptorium_error::{NarrativeError, NarrativeErrorKind, ScriptoriumResult};
use scriptorium_models::TieredModel;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// The generation and validation models of a run.
#[derive(Debug, Clone)]
pub struct StageModels {
    /// Writes outlines, scenes and refinements
    pub generation: TieredModel,
    /// Judges outlines and scores scenes and scripts
    pub validation: TieredModel,
}

impl StageModels {
    /// Pair explicit models.
    pub fn new(generation: TieredModel, validation: TieredModel) -> Self {
        Self {
            generation,
            validation,
        }
    }

    /// Build both models, each with the configured fallback.
    pub fn from_config(config: &ScriptoriumConfig) -> ScriptoriumResult<Self> {
        Ok(Self::new(
            TieredModel::from_config(&config.generation(), config)?,
            TieredModel::from_config(&config.validation(), config)?,
        ))
    }
}

/// Text appended to a regeneration prompt after a rejected attempt.
///
/// ```
/// use scriptorium_narrative::feedback_block;
///
/// assert_eq!(
///     feedback_block("Too many acts."),
///     "\n\nPrevious attempt feedback: Too many acts.\nPlease address these issues in your next generation attempt."
/// );
/// ```
pub fn feedback_block(feedback: &str) -> String {
    format!(
        "\n\nPrevious attempt feedback: {}\nPlease address these issues in your next generation attempt.",
        feedback
    )
}

/// One validate-until-accepted stage: which prompts to render with which variables.
#[derive(Debug, Clone)]
pub struct Stage {
    name: String,
    generate: PromptKind,
    validate: PromptKind,
    vars: PromptVars,
}

impl Stage {
    /// Describe a stage.
    ///
    /// The validation prompt is rendered with `vars` plus `content`, the
    /// generated candidate as JSON.
    pub fn new(
        name: impl Into<String>,
        generate: PromptKind,
        validate: PromptKind,
        vars: PromptVars,
    ) -> Self {
        Self {
            name: name.into(),
            generate,
            validate,
            vars,
        }
    }

    /// Stage name used in logs and errors.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Validate-until-accepted loop.
#[derive(Debug, Clone)]
pub struct ValidationLoop {
    models: StageModels,
    prompts: Arc<PromptLibrary>,
    max_attempts: u32,
}

impl ValidationLoop {
    /// Create a loop making at most `max_attempts` generation calls per stage.
    pub fn new(models: StageModels, prompts: Arc<PromptLibrary>, max_attempts: u32) -> Self {
        Self {
            models,
            prompts,
            max_attempts,
        }
    }

    /// Attempt budget per stage.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `stage` until the validation model accepts a candidate of type `T`.
    ///
    /// Output that is not JSON, or not shaped like `T`, consumes an attempt
    /// without a validation call. After a rejection the next generation
    /// prompt carries the reviewer's feedback.
    ///
    /// # Errors
    ///
    /// [`NarrativeErrorKind::ExhaustedAttempts`] when no candidate is
    /// accepted, or the provider error when a call fails on both tiers.
    pub async fn run<T: DeserializeOwned>(&self, stage: &Stage) -> ScriptoriumResult<T> {
        self.run_checked(stage, |_: &T| None).await
    }

    /// Like [`run`](Self::run), with a structural `check` on each decoded
    /// candidate before it reaches the validation model.
    ///
    /// A candidate for which `check` returns a problem consumes an attempt,
    /// and the problem becomes the feedback for the next generation prompt.
    #[instrument(skip(self, stage, check), fields(stage = %stage.name, max_attempts = self.max_attempts))]
    pub async fn run_checked<T, C>(&self, stage: &Stage, check: C) -> ScriptoriumResult<T>
    where
        T: DeserializeOwned,
        C: Fn(&T) -> Option<String>,
    {
        let base_prompt = self.prompts.render(stage.generate, &stage.vars)?;
        let mut feedback: Option<String> = None;

        for attempt in 1..=self.max_attempts {
            let prompt = match feedback.as_deref() {
                Some(feedback) => format!("{}{}", base_prompt, feedback_block(feedback)),
                None => base_prompt.clone(),
            };
            debug!(attempt, prompt_length = prompt.len(), "Generating candidate");

            let content = match self.models.generation.generate_json(&prompt).await {
                Ok(content) => content,
                Err(e) if e.is_decode() => {
                    warn!(attempt, error = %e, "Candidate was not valid JSON");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let typed: T = match serde_json::from_value(content.clone()) {
                Ok(typed) => typed,
                Err(e) => {
                    warn!(attempt, error = %e, "Candidate did not match the expected shape");
                    continue;
                }
            };

            if let Some(issue) = check(&typed) {
                warn!(attempt, issue = %issue, "Candidate failed the structural check");
                feedback = Some(issue);
                continue;
            }

            let vars = stage.vars.clone().with_json("content", &content)?;
            let validation_prompt = self.prompts.render(stage.validate, &vars)?;
            let verdict = match self.models.validation.generate_json(&validation_prompt).await {
                Ok(payload) => ValidationVerdict::from_payload(&payload),
                Err(e) if e.is_decode() => ValidationVerdict::from_payload(&Value::Null),
                Err(e) => return Err(e),
            };

            if verdict.is_valid {
                info!(attempt, "Stage accepted");
                return Ok(typed);
            }

            warn!(
                attempt,
                max_attempts = self.max_attempts,
                feedback = %verdict.feedback,
                "Validation failed"
            );
            feedback = Some(verdict.feedback);
        }

        Err(NarrativeError::new(NarrativeErrorKind::ExhaustedAttempts {
            stage: stage.name.clone(),
            attempts: self.max_attempts,
        })
        .into())
    }
}

/// Generate JSON and convert it with `check`, regenerating on failure.
///
/// Returns `Ok(None)` once `max_attempts` calls produced nothing usable.
/// Provider failures propagate.
#[instrument(skip(model, prompt, check), fields(prompt_length = prompt.len()))]
pub async fn generate_checked<T, F>(
    model: &TieredModel,
    prompt: &str,
    max_attempts: u32,
    stage: &str,
    check: F,
) -> ScriptoriumResult<Option<T>>
where
    F: Fn(Value) -> Result<T, String>,
{
    for attempt in 1..=max_attempts {
        let payload = match model.generate_json(prompt).await {
            Ok(payload) => payload,
            Err(e) if e.is_decode() => {
                warn!(attempt, error = %e, "Undecodable JSON, regenerating");
                continue;
            }
            Err(e) => return Err(e),
        };

        match check(payload) {
            Ok(value) => return Ok(Some(value)),
            Err(issue) => warn!(attempt, issue = %issue, "Unusable JSON, regenerating"),
        }
    }

    warn!(max_attempts, "No usable JSON produced");
    Ok(None)
}

/// Generate JSON deserializable as `T`, regenerating on failure.
///
/// # Errors
///
/// [`NarrativeErrorKind::UndecodableOutput`] when every attempt failed.
pub async fn generate_typed<T: DeserializeOwned>(
    model: &TieredModel,
    prompt: &str,
    max_attempts: u32,
    stage: &str,
) -> ScriptoriumResult<T> {
    generate_checked(model, prompt, max_attempts, stage, |payload| {
        serde_json::from_value(payload).map_err(|e| e.to_string())
    })
    .await?
    .ok_or_else(|| {
        NarrativeError::new(NarrativeErrorKind::UndecodableOutput {
            stage: stage.to_string(),
            attempts: max_attempts,
        })
        .into()
    })
}

/// The three operations of a score-until-threshold loop.
///
/// `generate` and `refine` return `None` when they could not produce a
/// usable candidate.
#[async_trait]
pub trait Refinement: Send + Sync {
    /// What is being refined.
    type Candidate: Clone + Send + Sync;

    /// Produce a fresh candidate.
    async fn generate(&self) -> ScriptoriumResult<Option<Self::Candidate>>;

    /// Score a candidate.
    async fn evaluate(&self, candidate: &Self::Candidate) -> ScriptoriumResult<Evaluation>;

    /// Rewrite a candidate from feedback.
    async fn refine(
        &self,
        candidate: &Self::Candidate,
        feedback: &str,
    ) -> ScriptoriumResult<Option<Self::Candidate>>;
}

/// How a refinement loop begins.
#[derive(Debug, Clone)]
pub enum RefinementStart<C> {
    /// Generate the first candidate from scratch
    Generate,
    /// Refine an existing candidate with the given feedback
    Refine {
        /// Candidate to start from
        candidate: C,
        /// Feedback for the first refinement
        feedback: String,
    },
}

/// Result of [`refine_until_threshold`].
#[derive(Debug, Clone)]
pub enum RefinementOutcome<C> {
    /// A candidate reached the threshold
    Accepted {
        /// The accepted candidate
        candidate: C,
        /// Its evaluation
        evaluation: Evaluation,
        /// Iterations used, including the accepting one
        iterations: u32,
    },
    /// The budget ran out; the best candidate seen, if any scored above 0
    BestEffort {
        /// Highest-scoring candidate
        candidate: Option<C>,
        /// Its evaluation
        evaluation: Option<Evaluation>,
        /// Its score, 0 when there is no candidate
        score: i64,
    },
}

impl<C> RefinementOutcome<C> {
    /// Whether the threshold was reached.
    pub fn is_accepted(&self) -> bool {
        matches!(self, RefinementOutcome::Accepted { .. })
    }

    /// Score of the returned candidate.
    pub fn score(&self) -> i64 {
        match self {
            RefinementOutcome::Accepted { evaluation, .. } => evaluation.total_score,
            RefinementOutcome::BestEffort { score, .. } => *score,
        }
    }

    /// Split into candidate, evaluation and score.
    pub fn into_parts(self) -> (Option<C>, Option<Evaluation>, i64) {
        match self {
            RefinementOutcome::Accepted {
                candidate,
                evaluation,
                ..
            } => {
                let score = evaluation.total_score;
                (Some(candidate), Some(evaluation), score)
            }
            RefinementOutcome::BestEffort {
                candidate,
                evaluation,
                score,
            } => (candidate, evaluation, score),
        }
    }
}

/// Score-until-threshold loop.
///
/// Each of the `max_iterations` iterations evaluates the current candidate
/// (or regenerates when there is none), keeps the best strictly-higher score,
/// stops when a score reaches `threshold`, and otherwise refines with the
/// evaluation feedback for the next iteration. Budget exhaustion is not an
/// error: the best candidate seen is returned.
#[instrument(skip(refinement, start))]
pub async fn refine_until_threshold<R>(
    refinement: &R,
    max_iterations: u32,
    threshold: i64,
    start: RefinementStart<R::Candidate>,
) -> ScriptoriumResult<RefinementOutcome<R::Candidate>>
where
    R: Refinement + ?Sized,
{
    let mut best: Option<(R::Candidate, Evaluation)> = None;
    let mut best_score = 0;

    let mut current = match start {
        RefinementStart::Generate => refinement.generate().await?,
        RefinementStart::Refine {
            candidate,
            feedback,
        } => refinement.refine(&candidate, &feedback).await?,
    };

    for iteration in 1..=max_iterations {
        let Some(candidate) = current.take() else {
            warn!(iteration, "No usable candidate");
            if iteration < max_iterations {
                current = refinement.generate().await?;
            }
            continue;
        };

        let evaluation = refinement.evaluate(&candidate).await?;
        let score = evaluation.total_score;
        if !evaluation.well_formed {
            warn!(iteration, "Evaluation had no integer score, counting it as 0");
        }

        if score > best_score {
            best_score = score;
            best = Some((candidate.clone(), evaluation.clone()));
        }

        if score >= threshold {
            info!(iteration, score, "Candidate reached threshold");
            return Ok(RefinementOutcome::Accepted {
                candidate,
                evaluation,
                iterations: iteration,
            });
        }

        info!(iteration, score, best_score, "Candidate below threshold");
        if iteration < max_iterations {
            current = refinement.refine(&candidate, &evaluation.feedback).await?;
        }
    }

    warn!(best_score, "Refinement budget exhausted, keeping best candidate");
    let (candidate, evaluation) = match best {
        Some((candidate, evaluation)) => (Some(candidate), Some(evaluation)),
        None => (None, None),
    };
    Ok(RefinementOutcome::BestEffort {
        candidate,
        evaluation,
        score: best_score,
    })
}
