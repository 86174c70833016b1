//! Mock KB Agent Backend
//!
//! Programmable backend for dispatcher tests:
//! - `MockReply`: answer (optionally with audio) or a failure
//! - Records every request for assertions
//! - Serves audio bytes per URL, missing URLs fail like a 404

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{BackendError, QaBackend, QueryAnswer, QueryFailure, QueryRequest, QueryResult};

/// What the mock answers with
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    Answer {
        text: String,
        audio_url: Option<String>,
    },
    Fail(QueryFailure),
}

impl Default for MockReply {
    fn default() -> Self {
        Self::Answer {
            text: "Mock answer".to_string(),
            audio_url: None,
        }
    }
}

/// Mock backend with programmable replies and request recording
#[derive(Debug, Clone, Default)]
pub struct MockQaBackend {
    reply: Arc<Mutex<MockReply>>,
    requests: Arc<Mutex<Vec<QueryRequest>>>,
    audio: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MockQaBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every query with `text`
    pub fn answer_with(&self, text: &str, audio_url: Option<&str>) {
        self.set_reply(MockReply::Answer {
            text: text.to_string(),
            audio_url: audio_url.map(str::to_string),
        });
    }

    /// Fail every query with `failure`
    pub fn fail_with(&self, failure: QueryFailure) {
        self.set_reply(MockReply::Fail(failure));
    }

    pub fn set_reply(&self, reply: MockReply) {
        *self.reply.lock().expect("reply lock poisoned") = reply;
    }

    /// Serve `bytes` for `url` from `fetch_audio`
    pub fn serve_audio(&self, url: &str, bytes: Vec<u8>) {
        self.audio
            .lock()
            .expect("audio lock poisoned")
            .insert(url.to_string(), bytes);
    }

    /// Return all recorded requests
    pub fn recorded_requests(&self) -> Vec<QueryRequest> {
        self.requests
            .lock()
            .expect("requests lock poisoned")
            .clone()
    }
}

#[async_trait::async_trait]
impl QaBackend for MockQaBackend {
    async fn send(&self, request: QueryRequest) -> QueryResult {
        tracing::debug!(session_id = %request.session_id, "Mock backend: recording request");
        self.requests
            .lock()
            .map_err(|e| QueryFailure::Transport(format!("requests lock poisoned: {e}")))?
            .push(request);

        let reply = self
            .reply
            .lock()
            .map_err(|e| QueryFailure::Transport(format!("reply lock poisoned: {e}")))?
            .clone();

        match reply {
            MockReply::Answer { text, audio_url } => Ok(QueryAnswer {
                metadata: serde_json::json!({
                    "response": text,
                    "output": { "audio": audio_url },
                }),
                answer_text: text,
                audio_url,
            }),
            MockReply::Fail(failure) => Err(failure),
        }
    }

    async fn fetch_audio(&self, url: &str) -> Result<Vec<u8>, BackendError> {
        self.audio
            .lock()
            .map_err(|e| BackendError::Audio(format!("audio lock poisoned: {e}")))?
            .get(url)
            .cloned()
            .ok_or_else(|| BackendError::Audio(format!("no audio at {}", url)))
    }
}
