//! Session language resolution
//!
//! The active language of a chat lives in the session store under
//! `"<chat_id>_language"`. Resolution never fails: a missing, unsupported
//! or unreadable value yields the configured default.

use std::collections::HashSet;
use std::sync::Arc;

use kbchat_sessions::{SessionError, SessionStore};

/// Session store key holding a chat's language
pub fn language_key(chat_id: i64) -> String {
    format!("{}_language", chat_id)
}

#[derive(Clone)]
pub struct LanguageResolver {
    store: Arc<dyn SessionStore>,
    default_language: String,
    supported: Arc<HashSet<String>>,
}

impl LanguageResolver {
    pub fn new(
        store: Arc<dyn SessionStore>,
        default_language: impl Into<String>,
        supported: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            store,
            default_language: default_language.into(),
            supported: Arc::new(supported.into_iter().collect()),
        }
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.supported.contains(code)
    }

    pub async fn resolve(&self, chat_id: i64) -> String {
        match self.store.get(&language_key(chat_id)).await {
            Ok(Some(code)) if self.is_supported(&code) => code,
            Ok(Some(code)) => {
                tracing::debug!(
                    id = chat_id,
                    stored = %code,
                    "Stored language no longer supported, using default"
                );
                self.default_language.clone()
            }
            Ok(None) => self.default_language.clone(),
            Err(e) => {
                tracing::warn!(
                    id = chat_id,
                    reason = e.reason(),
                    error = %e,
                    "Language lookup failed, using default"
                );
                self.default_language.clone()
            }
        }
    }

    /// Overwrite the chat's language
    pub async fn store(&self, chat_id: i64, code: &str) -> Result<(), SessionError> {
        self.store.set(&language_key(chat_id), code).await
    }
}
