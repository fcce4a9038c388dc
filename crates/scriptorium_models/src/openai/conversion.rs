//! Conversions between Scriptorium requests and the chat completions wire format.

use scriptorium_core::{GenerateRequest, Message, Prompt};
use scriptorium_error::{ModelsError, ModelsErrorKind, ScriptoriumResult};
use serde_json::{Value, json};

/// One parsed server-sent event line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum SseLine {
    /// A content delta (possibly empty)
    Delta(String),
    /// `data: [DONE]`
    Done,
    /// Comments, event names and other non-data lines
    Skip,
}

/// Build the request body. A bare prompt becomes a single user message.
///
/// Extra options are merged at the top level (e.g. `temperature`).
pub(super) fn request_body(model: &str, request: &GenerateRequest, stream: bool) -> Value {
    let messages = match request.prompt() {
        Prompt::Text(text) => vec![Message::user(text.clone())],
        Prompt::Messages(messages) => messages.clone(),
    };

    let mut body = json!({
        "model": model,
        "messages": messages,
        "stream": stream,
    });

    if request.wants_json() {
        body["response_format"] = json!({"type": "json_object"});
    }
    if let Some(object) = body.as_object_mut() {
        object.extend(request.options().clone());
    }
    body
}

/// Text of the first choice of a completed response.
pub(super) fn response_text(provider: &str, value: &Value) -> ScriptoriumResult<String> {
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            ModelsError::new(ModelsErrorKind::Api {
                provider: provider.to_string(),
                message: "response carries no choices[0].message.content".to_string(),
            })
            .into()
        })
}

/// Parse one SSE line of a streamed completion.
pub(super) fn sse_line(line: &str) -> ScriptoriumResult<SseLine> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(SseLine::Skip);
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(SseLine::Done);
    }

    let chunk: Value = serde_json::from_str(data).map_err(|e| {
        ModelsError::new(ModelsErrorKind::Stream(format!(
            "unreadable completion chunk: {}",
            e
        )))
    })?;

    Ok(SseLine::Delta(
        chunk
            .pointer("/choices/0/delta/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_core::ResponseFormat;

    #[test]
    fn test_prompt_becomes_user_message_with_json_mode() {
        let request = GenerateRequest::builder()
            .prompt("Evaluate this scene.")
            .format(ResponseFormat::Json)
            .build()
            .unwrap();

        let body = request_body("gpt-4o", &request, false);

        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Evaluate this scene.");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn test_response_text() {
        let value = json!({"choices": [{"message": {"role": "assistant", "content": "{\"ok\":true}"}}]});
        assert_eq!(response_text("openai", &value).unwrap(), "{\"ok\":true}");
        assert!(response_text("openai", &json!({"choices": []})).is_err());
    }

    #[test]
    fn test_sse_lines() {
        assert_eq!(
            sse_line(r#"data: {"choices":[{"delta":{"content":"INT."}}]}"#).unwrap(),
            SseLine::Delta("INT.".to_string())
        );
        assert_eq!(
            sse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap(),
            SseLine::Delta(String::new())
        );
        assert_eq!(sse_line("data: [DONE]").unwrap(), SseLine::Done);
        assert_eq!(sse_line(": keep-alive").unwrap(), SseLine::Skip);
        assert!(sse_line("data: {broken").is_err());
    }
}
