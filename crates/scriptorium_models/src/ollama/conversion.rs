//! Conversions between Scriptorium requests and the Ollama wire format.

use scriptorium_core::{GenerateRequest, Prompt};
use scriptorium_error::{ModelsError, ModelsErrorKind, ScriptoriumResult};
use serde_json::{Map, Value, json};

/// Endpoint for a request: `/api/generate` for prompts, `/api/chat` for histories.
pub(super) fn endpoint(request: &GenerateRequest) -> &'static str {
    match request.prompt() {
        Prompt::Text(_) => "/api/generate",
        Prompt::Messages(_) => "/api/chat",
    }
}

/// Build the request body.
///
/// Output length is unbounded (`num_predict = -1`) unless the caller overrides it.
pub(super) fn request_body(model: &str, request: &GenerateRequest, stream: bool) -> Value {
    let mut options = Map::new();
    options.insert("num_predict".to_string(), json!(-1));
    options.extend(request.options().clone());

    let mut body = match request.prompt() {
        Prompt::Text(prompt) => json!({
            "model": model,
            "prompt": prompt,
            "stream": stream,
            "options": options,
        }),
        Prompt::Messages(messages) => json!({
            "model": model,
            "messages": messages,
            "stream": stream,
            "options": options,
        }),
    };

    if request.wants_json() {
        body["format"] = json!("json");
    }
    body
}

/// Text carried by one response object (whole response or one NDJSON line).
///
/// Generate responses carry `response`; chat responses carry `message.content`.
pub(super) fn response_text(value: &Value) -> ScriptoriumResult<String> {
    if let Some(message) = value.get("error").and_then(Value::as_str) {
        return Err(ModelsError::new(ModelsErrorKind::Api {
            provider: "ollama".to_string(),
            message: message.to_string(),
        })
        .into());
    }

    value
        .get("response")
        .and_then(Value::as_str)
        .or_else(|| value.pointer("/message/content").and_then(Value::as_str))
        .map(str::to_string)
        .ok_or_else(|| {
            ModelsError::new(ModelsErrorKind::Api {
                provider: "ollama".to_string(),
                message: "response carries neither `response` nor `message.content`".to_string(),
            })
            .into()
        })
}

/// Parse one NDJSON streaming line into its text fragment and completion flag.
pub(super) fn stream_line(line: &str) -> ScriptoriumResult<(String, bool)> {
    let value: Value = serde_json::from_str(line).map_err(|e| {
        ModelsError::new(ModelsErrorKind::Stream(format!(
            "unreadable ollama stream line: {}",
            e
        )))
    })?;
    let done = value.get("done").and_then(Value::as_bool).unwrap_or(false);
    let text = if done && value.get("response").is_none() && value.get("message").is_none() {
        String::new()
    } else {
        response_text(&value)?
    };
    Ok((text, done))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_core::{Message, ResponseFormat};

    #[test]
    fn test_generate_body_requests_json_and_unbounded_output() {
        let request = GenerateRequest::builder()
            .prompt("Outline the acts.")
            .format(ResponseFormat::Json)
            .build()
            .unwrap();

        let body = request_body("gemma2:27b", &request, false);

        assert_eq!(endpoint(&request), "/api/generate");
        assert_eq!(body["model"], "gemma2:27b");
        assert_eq!(body["prompt"], "Outline the acts.");
        assert_eq!(body["stream"], false);
        assert_eq!(body["format"], "json");
        assert_eq!(body["options"]["num_predict"], -1);
    }

    #[test]
    fn test_chat_body_carries_messages() {
        let request = GenerateRequest::builder()
            .prompt(vec![Message::system("Be terse."), Message::user("Hi")])
            .build()
            .unwrap();

        let body = request_body("llama3", &request, true);

        assert_eq!(endpoint(&request), "/api/chat");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Hi");
        assert!(body.get("format").is_none());
    }

    #[test]
    fn test_caller_options_override_defaults() {
        let mut options = Map::new();
        options.insert("num_predict".to_string(), json!(512));
        options.insert("temperature".to_string(), json!(0.2));
        let request = GenerateRequest::builder()
            .prompt("x")
            .options(options)
            .build()
            .unwrap();

        let body = request_body("m", &request, false);
        assert_eq!(body["options"]["num_predict"], 512);
        assert_eq!(body["options"]["temperature"], 0.2);
    }

    #[test]
    fn test_stream_lines() {
        let (text, done) = stream_line(r#"{"response":"FADE","done":false}"#).unwrap();
        assert_eq!((text.as_str(), done), ("FADE", false));

        let (text, done) = stream_line(r#"{"message":{"role":"assistant","content":" IN"},"done":false}"#).unwrap();
        assert_eq!((text.as_str(), done), (" IN", false));

        let (text, done) = stream_line(r#"{"done":true,"total_duration":12}"#).unwrap();
        assert_eq!((text.as_str(), done), ("", true));

        assert!(stream_line(r#"{"error":"model not found"}"#).is_err());
    }
}
