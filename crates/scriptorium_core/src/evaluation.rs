//! Validation verdicts and scoring rubrics returned by the validation model.
//!
//! These payloads come straight from model output, so decoding never fails:
//! anything malformed degrades to the least-trusting value (invalid, score 0,
//! generic feedback) and the retry loops always have a defined next step.

use crate::SceneNumber;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Feedback used when a validation payload is not a JSON object.
pub const INVALID_VALIDATION_FEEDBACK: &str = "Invalid validation response";

/// Feedback used when a validation payload omits its feedback.
pub const MISSING_FEEDBACK: &str = "No feedback provided.";

/// Accept/reject decision for an outline stage.
///
/// # Examples
///
/// ```
/// use scriptorium_core::ValidationVerdict;
/// use serde_json::json;
///
/// let ok = ValidationVerdict::from_payload(&json!({"is_valid": true, "feedback": "fine"}));
/// assert!(ok.is_valid);
///
/// let junk = ValidationVerdict::from_payload(&json!("looks good to me"));
/// assert!(!junk.is_valid);
/// assert_eq!(junk.feedback, "Invalid validation response");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// Whether the candidate is accepted
    pub is_valid: bool,
    /// Reviewer feedback for the next attempt
    pub feedback: String,
}

impl ValidationVerdict {
    /// Decode a verdict leniently.
    pub fn from_payload(payload: &Value) -> Self {
        let Some(object) = payload.as_object() else {
            return Self {
                is_valid: false,
                feedback: INVALID_VALIDATION_FEEDBACK.to_string(),
            };
        };

        Self {
            is_valid: object
                .get("is_valid")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            feedback: object
                .get("feedback")
                .and_then(Value::as_str)
                .unwrap_or(MISSING_FEEDBACK)
                .to_string(),
        }
    }
}

/// Rubric score for a single scene.
///
/// # Examples
///
/// ```
/// use scriptorium_core::Evaluation;
/// use serde_json::json;
///
/// let good = Evaluation::from_payload(&json!({"total_score": 91, "feedback": "Tight."}));
/// assert_eq!(good.total_score, 91);
/// assert!(good.well_formed);
///
/// let bad = Evaluation::from_payload(&json!({"total_score": "high"}));
/// assert_eq!(bad.total_score, 0);
/// assert!(!bad.well_formed);
/// assert!(bad.feedback.contains("high"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Overall score, 0 when the payload was malformed
    pub total_score: i64,
    /// Feedback text, or the raw payload when no feedback was given
    pub feedback: String,
    /// Named sub-scores
    #[serde(default)]
    pub criteria: Map<String, Value>,
    /// Whether `total_score` was an integer in the payload
    #[serde(default)]
    pub well_formed: bool,
}

impl Evaluation {
    /// Decode an evaluation leniently.
    pub fn from_payload(payload: &Value) -> Self {
        let total = payload.get("total_score").and_then(Value::as_i64);
        Self {
            total_score: total.unwrap_or(0),
            feedback: feedback_or_raw(payload),
            criteria: criteria_of(payload),
            well_formed: total.is_some(),
        }
    }
}

/// Full-script rubric with the scenes the reviewer wants reworked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptEvaluation {
    /// Overall score, 0 when the payload was malformed
    pub total_score: i64,
    /// Overall feedback
    pub feedback: String,
    /// Named sub-scores
    #[serde(default)]
    pub criteria: Map<String, Value>,
    /// Scenes flagged for targeted refinement
    #[serde(default)]
    pub scenes_to_improve: Vec<SceneImprovement>,
    /// Whether `total_score` was an integer in the payload
    #[serde(default)]
    pub well_formed: bool,
}

/// One scene flagged by the full-script review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneImprovement {
    /// Scene identifier as written by the reviewer
    pub scene_id: SceneNumber,
    /// Why the scene needs work
    pub reason: String,
    /// How to improve it
    pub suggestions: String,
}

impl SceneImprovement {
    /// Feedback text handed to the refine step.
    pub fn as_feedback(&self) -> String {
        format!("{}\nSuggestions: {}", self.reason, self.suggestions)
    }
}

impl ScriptEvaluation {
    /// Decode a full-script evaluation leniently.
    ///
    /// Flagged scenes without an identifier are dropped.
    ///
    /// ```
    /// use scriptorium_core::ScriptEvaluation;
    /// use serde_json::json;
    ///
    /// let review = ScriptEvaluation::from_payload(&json!({
    ///     "total_score": 64,
    ///     "feedback": "Act two sags.",
    ///     "scenes_to_improve": [
    ///         {"scene_id": "2.1.1", "reason": "Flat", "suggestions": ["Raise stakes", "Cut exposition"]},
    ///         {"reason": "no id"}
    ///     ]
    /// }));
    /// assert_eq!(review.total_score, 64);
    /// assert_eq!(review.scenes_to_improve.len(), 1);
    /// assert_eq!(review.scenes_to_improve[0].suggestions, "Raise stakes\nCut exposition");
    /// ```
    pub fn from_payload(payload: &Value) -> Self {
        let total = payload.get("total_score").and_then(Value::as_i64);
        let scenes_to_improve = payload
            .get("scenes_to_improve")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(improvement_of).collect())
            .unwrap_or_default();

        Self {
            total_score: total.unwrap_or(0),
            feedback: feedback_or_raw(payload),
            criteria: criteria_of(payload),
            scenes_to_improve,
            well_formed: total.is_some(),
        }
    }
}

fn improvement_of(item: &Value) -> Option<SceneImprovement> {
    let scene_id = match item.get("scene_id")? {
        Value::String(s) => SceneNumber::new(s.as_str()),
        Value::Number(n) => SceneNumber::new(n.to_string()),
        _ => return None,
    };
    Some(SceneImprovement {
        scene_id,
        reason: text_of(item.get("reason")),
        suggestions: text_of(item.get("suggestions")),
    })
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join("\n"),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn feedback_or_raw(payload: &Value) -> String {
    payload
        .get("feedback")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| payload.to_string())
}

fn criteria_of(payload: &Value) -> Map<String, Value> {
    payload
        .get("criteria")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}
