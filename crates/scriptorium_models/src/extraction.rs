//! Utilities for extracting JSON from LLM responses.
//!
//! Models asked for JSON still wrap it in markdown fences or surround it with
//! chatter. Extraction handles the common patterns before giving up.

use scriptorium_error::{ModelsError, ModelsErrorKind, ScriptoriumResult};
use serde_json::Value;

/// Decode a model answer as JSON.
///
/// Tries a direct parse first, then [`extract_json`]. Failure is a
/// [`ModelsErrorKind::Decode`] error.
///
/// # Examples
///
/// ```
/// use scriptorium_models::decode_json;
///
/// let value = decode_json("Sure!\n```json\n{\"acts\": []}\n```").unwrap();
/// assert_eq!(value["acts"], serde_json::json!([]));
///
/// let err = decode_json("I'd rather not.").unwrap_err();
/// assert!(err.is_decode());
/// ```
pub fn decode_json(text: &str) -> ScriptoriumResult<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let candidate = extract_json(trimmed)?;
    serde_json::from_str(&candidate).map_err(|e| {
        let preview: String = candidate.chars().take(100).collect();
        tracing::warn!(error = %e, json_preview = %preview, "JSON parsing failed");
        ModelsError::new(ModelsErrorKind::Decode(format!(
            "{} (JSON: {}...)",
            e, preview
        )))
        .into()
    })
}

/// Extract a JSON document from a response that may contain markdown or extra text.
///
/// Strategies, in order:
/// 1. Markdown code blocks: ```json ... ```
/// 2. Balanced braces or brackets, whichever opens first
///
/// # Errors
///
/// Returns a decode error if no JSON-looking span is found.
pub fn extract_json(response: &str) -> ScriptoriumResult<String> {
    if let Some(json) = extract_from_code_block(response, "json") {
        return Ok(json);
    }

    let bracket_pos = response.find('[');
    let brace_pos = response.find('{');

    let order = match (bracket_pos, brace_pos) {
        (Some(b_pos), Some(c_pos)) if b_pos < c_pos => [('[', ']'), ('{', '}')],
        (Some(_), None) => [('[', ']'), ('{', '}')],
        _ => [('{', '}'), ('[', ']')],
    };

    if let Some(json) = order
        .iter()
        .find_map(|(open, close)| extract_balanced(response, *open, *close))
    {
        return Ok(json);
    }

    tracing::warn!(
        response_length = response.len(),
        "No JSON found in LLM response"
    );

    Err(ModelsError::new(ModelsErrorKind::Decode(format!(
        "No JSON found in response (length: {})",
        response.len()
    )))
    .into())
}

/// Content of the first fenced code block, preferring one tagged `language`.
///
/// A missing closing fence (truncated output) yields everything after the opening fence.
fn extract_from_code_block(response: &str, language: &str) -> Option<String> {
    let pattern = format!("```{}", language);

    if let Some(start) = response.find(&pattern) {
        let content_start = start + pattern.len();
        let body = &response[content_start..];
        let end = body.find("```").unwrap_or(body.len());
        return Some(body[..end].trim().to_string());
    }

    let start = response.find("```")?;
    let after_fence = start + 3;
    let skip_to = response[after_fence..]
        .find('\n')
        .map(|n| after_fence + n + 1)
        .unwrap_or(after_fence);
    let body = &response[skip_to..];
    let end = body.find("```").unwrap_or(body.len());
    let content = body[..end].trim();
    (!content.is_empty()).then(|| content.to_string())
}

/// Span from the first `open` to its matching `close`, ignoring delimiters inside strings.
fn extract_balanced(response: &str, open: char, close: char) -> Option<String> {
    let start = response.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(response[start..start + i + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }

    None
}
