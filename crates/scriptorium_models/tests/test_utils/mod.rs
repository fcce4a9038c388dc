//! Test utilities for model layer tests.

use scriptorium_core::{GenerateRequest, GenerateResponse};
use scriptorium_error::{ModelsError, ModelsErrorKind, ScriptoriumResult};
use scriptorium_interface::ScriptoriumDriver;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One canned driver reply.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum Reply {
    /// Answer with this text
    Text(String),
    /// Fail at the transport level
    Transport,
    /// Answer with a non-success status
    Api(String),
}

/// Driver replaying canned replies in order and recording every request.
///
/// Once the script runs out the last reply repeats.
pub struct ScriptedDriver {
    provider: &'static str,
    model: String,
    replies: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<Reply>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

#[allow(dead_code)]
impl ScriptedDriver {
    pub fn new(provider: &'static str, replies: Vec<Reply>) -> Self {
        Self {
            provider,
            model: format!("{}-model", provider),
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(provider: &'static str, texts: &[&str]) -> Self {
        Self::new(
            provider,
            texts.iter().map(|t| Reply::Text(t.to_string())).collect(),
        )
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ScriptoriumDriver for ScriptedDriver {
    async fn generate(&self, req: &GenerateRequest) -> ScriptoriumResult<GenerateResponse> {
        self.requests.lock().unwrap().push(req.clone());

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            let mut last = self.last.lock().unwrap();
            match replies.pop_front() {
                Some(reply) => {
                    *last = Some(reply.clone());
                    reply
                }
                None => last.clone().expect("ScriptedDriver has no replies"),
            }
        };

        match reply {
            Reply::Text(text) => Ok(GenerateResponse::from_text(text)),
            Reply::Transport => Err(ModelsError::new(ModelsErrorKind::Transport {
                provider: self.provider.to_string(),
                message: "connection refused".to_string(),
            })
            .into()),
            Reply::Api(message) => Err(ModelsError::new(ModelsErrorKind::Api {
                provider: self.provider.to_string(),
                message,
            })
            .into()),
        }
    }

    fn provider_name(&self) -> &'static str {
        self.provider
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
