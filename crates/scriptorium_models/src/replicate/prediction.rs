//! Prediction payloads.

use scriptorium_core::GenerateRequest;
use serde::Deserialize;
use serde_json::{Value, json};

/// Output token budget sent with every prediction.
const MAX_TOKENS: u32 = 8138;

/// Prediction lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(super) enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl PredictionStatus {
    pub(super) fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct PredictionUrls {
    pub(super) get: Option<String>,
}

/// A prediction as returned by create and poll calls.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct Prediction {
    pub(super) status: PredictionStatus,
    #[serde(default)]
    pub(super) output: Value,
    #[serde(default)]
    pub(super) error: Option<Value>,
    #[serde(default)]
    pub(super) urls: PredictionUrls,
}

impl Prediction {
    /// Output as text: token arrays are concatenated, strings pass through.
    pub(super) fn output_text(&self) -> String {
        match &self.output {
            Value::Array(parts) => parts
                .iter()
                .map(|part| match part {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    pub(super) fn error_message(&self) -> String {
        match &self.error {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => format!("prediction {}", self.status),
        }
    }
}

/// Build the prediction input. Chat histories are flattened to `role: content` lines.
pub(super) fn request_body(request: &GenerateRequest) -> Value {
    let mut input = serde_json::Map::new();
    input.insert("prompt".to_string(), json!(request.prompt().to_plain_text()));
    input.insert("max_tokens".to_string(), json!(MAX_TOKENS));
    if request.wants_json() {
        input.insert("format".to_string(), json!("json"));
    }
    input.extend(request.options().clone());
    json!({ "input": input })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_core::Message;

    #[test]
    fn test_output_tokens_are_joined() {
        let prediction: Prediction = serde_json::from_value(json!({
            "status": "succeeded",
            "output": ["INT. ", "BRIDGE", " - NIGHT"],
        }))
        .unwrap();

        assert!(prediction.status.is_terminal());
        assert_eq!(prediction.output_text(), "INT. BRIDGE - NIGHT");
    }

    #[test]
    fn test_pending_prediction_has_poll_url() {
        let prediction: Prediction = serde_json::from_value(json!({
            "status": "processing",
            "output": null,
            "urls": {"get": "https://api.replicate.com/v1/predictions/abc"},
        }))
        .unwrap();

        assert!(!prediction.status.is_terminal());
        assert_eq!(
            prediction.urls.get.as_deref(),
            Some("https://api.replicate.com/v1/predictions/abc")
        );
    }

    #[test]
    fn test_failed_prediction_message() {
        let prediction: Prediction = serde_json::from_value(json!({
            "status": "failed",
            "error": "CUDA out of memory",
        }))
        .unwrap();
        assert_eq!(prediction.error_message(), "CUDA out of memory");
    }

    #[test]
    fn test_chat_history_is_flattened() {
        let request = GenerateRequest::builder()
            .prompt(vec![Message::system("Be brief."), Message::user("Go.")])
            .build()
            .unwrap();

        let body = request_body(&request);
        assert_eq!(body["input"]["prompt"], "system: Be brief.\nuser: Go.");
        assert_eq!(body["input"]["max_tokens"], 8138);
    }
}
