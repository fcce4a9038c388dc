//! HTTP plumbing shared by the provider clients.

use futures_util::StreamExt;
use futures_util::stream::Stream;
use scriptorium_error::{ModelsError, ModelsErrorKind, ScriptoriumError, ScriptoriumResult};
use tracing::error;

/// Send a request, mapping transport failures and non-success statuses to provider errors.
pub(crate) async fn send(
    request: reqwest::RequestBuilder,
    provider: &str,
) -> ScriptoriumResult<reqwest::Response> {
    let response = request.send().await.map_err(|e| {
        error!(provider, error = ?e, "Failed to send request");
        ModelsError::new(ModelsErrorKind::Transport {
            provider: provider.to_string(),
            message: e.to_string(),
        })
    })?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!(provider, status = %status, body = %body, "Provider returned error");
        return Err(ModelsError::new(ModelsErrorKind::Api {
            provider: provider.to_string(),
            message: format!("{}: {}", status, body),
        })
        .into());
    }

    Ok(response)
}

/// Read a successful response body as JSON.
pub(crate) async fn read_json(
    response: reqwest::Response,
    provider: &str,
) -> ScriptoriumResult<serde_json::Value> {
    response.json().await.map_err(|e| {
        error!(provider, error = ?e, "Failed to parse response body");
        ModelsError::new(ModelsErrorKind::Api {
            provider: provider.to_string(),
            message: format!("unreadable response body: {}", e),
        })
        .into()
    })
}

/// Split a streaming body into trimmed, non-empty lines.
///
/// Chunks may end mid-line; a trailing line without a newline is emitted at the end.
pub(crate) fn body_lines(
    response: reqwest::Response,
) -> impl Stream<Item = ScriptoriumResult<String>> + Send {
    async_stream::stream! {
        let mut bytes = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = bytes.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    error!(error = ?e, "Stream broke off");
                    yield Err::<String, ScriptoriumError>(
                        ModelsError::new(ModelsErrorKind::Stream(e.to_string())).into(),
                    );
                    return;
                }
            };
            buffer.extend_from_slice(&chunk);

            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&line);
                let line = line.trim();
                if !line.is_empty() {
                    yield Ok(line.to_string());
                }
            }
        }

        let rest = String::from_utf8_lossy(&buffer);
        let rest = rest.trim();
        if !rest.is_empty() {
            yield Ok(rest.to_string());
        }
    }
}
