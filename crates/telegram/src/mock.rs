//! Mock Telegram Transport
//!
//! Records every outbound call in order for test assertions.
//! Thread-safe via `Arc<Mutex<>>`.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use crate::markdown::MAX_MESSAGE_LENGTH;
use crate::types::{Chat, InlineKeyboardMarkup, Message, ParseMode};
use crate::{ChatTransport, TransportError};

/// One recorded outbound call
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text {
        chat_id: i64,
        text: String,
        parse_mode: Option<ParseMode>,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    Voice {
        chat_id: i64,
        audio: Vec<u8>,
    },
    CallbackAnswer {
        callback_id: String,
        text: Option<String>,
    },
    Edit {
        chat_id: i64,
        message_id: i64,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    Webhook {
        url: String,
    },
}

/// Outbound operations the mock can be told to reject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    SendText,
    SendVoice,
    AnswerCallback,
    EditMessage,
    ResolveFile,
}

#[derive(Debug, Clone)]
pub struct MockTransport {
    outbound: Arc<Mutex<Vec<Outbound>>>,
    file_urls: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<Mutex<HashSet<MockOperation>>>,
    next_message_id: Arc<AtomicI64>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            outbound: Arc::new(Mutex::new(Vec::new())),
            file_urls: Arc::new(Mutex::new(HashMap::new())),
            failing: Arc::new(Mutex::new(HashSet::new())),
            next_message_id: Arc::new(AtomicI64::new(1000)),
        }
    }

    /// Return all recorded outbound calls in order
    pub fn recorded(&self) -> Vec<Outbound> {
        self.outbound
            .lock()
            .expect("outbound lock poisoned")
            .clone()
    }

    /// Recorded calls addressed to one chat
    pub fn recorded_for(&self, chat_id: i64) -> Vec<Outbound> {
        self.recorded()
            .into_iter()
            .filter(|o| match o {
                Outbound::Text { chat_id: id, .. }
                | Outbound::Voice { chat_id: id, .. }
                | Outbound::Edit { chat_id: id, .. } => *id == chat_id,
                Outbound::CallbackAnswer { .. } | Outbound::Webhook { .. } => false,
            })
            .collect()
    }

    /// Texts of all sent messages, in order
    pub fn sent_texts(&self) -> Vec<String> {
        self.recorded()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Register the URL `resolve_file_url` returns for `file_id`
    pub fn set_file_url(&self, file_id: &str, url: &str) {
        self.file_urls
            .lock()
            .expect("file_urls lock poisoned")
            .insert(file_id.to_string(), url.to_string());
    }

    /// Make `operation` fail with an API error from now on
    pub fn fail_on(&self, operation: MockOperation) {
        self.failing
            .lock()
            .expect("failing lock poisoned")
            .insert(operation);
    }

    /// Clear all recorded calls
    pub fn reset(&self) {
        self.outbound
            .lock()
            .expect("outbound lock poisoned")
            .clear();
    }

    fn check(&self, operation: MockOperation) -> Result<(), TransportError> {
        let failing = self
            .failing
            .lock()
            .map_err(|e| TransportError::Request(format!("failing lock poisoned: {e}")))?;
        if failing.contains(&operation) {
            return Err(TransportError::Api {
                code: Some(400),
                description: format!("mock rejected {:?}", operation),
            });
        }
        Ok(())
    }

    /// Reject text the Bot API refuses: empty, or over the length limit
    fn validate_text(text: &str) -> Result<(), TransportError> {
        if text.trim().is_empty() {
            return Err(TransportError::Api {
                code: Some(400),
                description: "Bad Request: message text is empty".to_string(),
            });
        }
        if text.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(TransportError::Api {
                code: Some(400),
                description: "Bad Request: message is too long".to_string(),
            });
        }
        Ok(())
    }

    fn record(&self, outbound: Outbound) -> Result<(), TransportError> {
        self.outbound
            .lock()
            .map_err(|e| TransportError::Request(format!("outbound lock poisoned: {e}")))?
            .push(outbound);
        Ok(())
    }

    fn message(&self, chat_id: i64, text: Option<String>) -> Message {
        Message {
            message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst),
            chat: Chat {
                id: chat_id,
                chat_type: Some("private".to_string()),
                first_name: None,
                username: None,
            },
            from: None,
            text,
            voice: None,
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ChatTransport for MockTransport {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<Message, TransportError> {
        self.check(MockOperation::SendText)?;
        Self::validate_text(text)?;
        tracing::debug!(chat_id, "Mock transport: recording text");
        self.record(Outbound::Text {
            chat_id,
            text: text.to_string(),
            parse_mode,
            keyboard,
        })?;
        Ok(self.message(chat_id, Some(text.to_string())))
    }

    async fn send_voice(&self, chat_id: i64, audio: Vec<u8>) -> Result<Message, TransportError> {
        self.check(MockOperation::SendVoice)?;
        tracing::debug!(chat_id, bytes = audio.len(), "Mock transport: recording voice");
        self.record(Outbound::Voice { chat_id, audio })?;
        Ok(self.message(chat_id, None))
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError> {
        self.check(MockOperation::AnswerCallback)?;
        self.record(Outbound::CallbackAnswer {
            callback_id: callback_id.to_string(),
            text: text.map(str::to_string),
        })
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TransportError> {
        self.check(MockOperation::EditMessage)?;
        Self::validate_text(text)?;
        self.record(Outbound::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
            keyboard,
        })
    }

    async fn resolve_file_url(&self, file_id: &str) -> Result<Option<String>, TransportError> {
        self.check(MockOperation::ResolveFile)?;
        Ok(self
            .file_urls
            .lock()
            .map_err(|e| TransportError::Request(format!("file_urls lock poisoned: {e}")))?
            .get(file_id)
            .cloned())
    }

    async fn set_webhook(&self, url: &str) -> Result<(), TransportError> {
        self.record(Outbound::Webhook {
            url: url.to_string(),
        })
    }
}
