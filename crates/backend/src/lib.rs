//! KB Agent Backend Service
//!
//! Forwards user queries to the knowledge-base agent and normalizes every
//! outcome into a [`QueryResult`]:
//! - HTTP client for the agent's `/chat/send` endpoint
//! - Mock backend with programmable replies for testing
//! - Configurable base URL and connect/read timeouts

pub mod client;
pub mod mock;

use std::time::Duration;

use kbchat_common::Config;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Channel tag sent with every query
pub const CHANNEL_ID: &str = "telegram";

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend configuration error: {0}")]
    Configuration(String),

    #[error("Audio fetch error: {0}")]
    Audio(String),
}

/// Why a query produced no answer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryFailure {
    /// Connection refused, DNS failure, timeout
    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend returned HTTP {status}")]
    Http { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl QueryFailure {
    /// Stable reason tag used in logs
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport_error",
            Self::Http { .. } => "http_error",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }
}

/// Body of `POST {base_url}/chat/send`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub session_id: String,
    pub channel_id: String,
    /// `None` for voice queries
    pub text: Option<String>,
    pub language: String,
    /// Voice file URL, empty for text queries
    #[serde(rename = "audio")]
    pub audio_reference: String,
}

impl QueryRequest {
    /// Build a request for a typed question
    pub fn text(session_id: impl ToString, text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            session_id: session_id.to_string(),
            channel_id: CHANNEL_ID.to_string(),
            text: Some(text.into()),
            language: language.into(),
            audio_reference: String::new(),
        }
    }

    /// Build a request for a voice question. An unresolved file URL is sent
    /// as an empty audio reference.
    pub fn voice(session_id: impl ToString, audio_url: Option<String>, language: impl Into<String>) -> Self {
        Self {
            session_id: session_id.to_string(),
            channel_id: CHANNEL_ID.to_string(),
            text: None,
            language: language.into(),
            audio_reference: audio_url.unwrap_or_default(),
        }
    }
}

/// A successful agent reply
#[derive(Debug, Clone, PartialEq)]
pub struct QueryAnswer {
    pub answer_text: String,
    /// Synthesized speech for the answer, if the agent produced any
    pub audio_url: Option<String>,
    /// The full response body as returned by the agent
    pub metadata: serde_json::Value,
}

pub type QueryResult = Result<QueryAnswer, QueryFailure>;

/// Backend service configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend provider (http, mock)
    pub provider: String,
    pub base_url: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub pool_max_idle_per_host: usize,
}

impl BackendConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            provider: config.backend_provider.clone(),
            base_url: config.kb_agent_base_url.clone(),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            read_timeout: Duration::from_secs(config.read_timeout_secs),
            pool_max_idle_per_host: config.connection_pool_size,
        }
    }
}

/// Q&A backend trait for different implementations
#[async_trait::async_trait]
pub trait QaBackend: Send + Sync {
    /// Issue exactly one query and normalize its outcome. Never retries.
    async fn send(&self, request: QueryRequest) -> QueryResult;

    /// Download the synthesized answer audio
    async fn fetch_audio(&self, url: &str) -> Result<Vec<u8>, BackendError>;
}

/// Factory for creating QaBackend implementations
pub struct QaBackendFactory;

impl QaBackendFactory {
    pub fn create(config: BackendConfig) -> Result<Box<dyn QaBackend>, BackendError> {
        match config.provider.as_str() {
            "http" => {
                tracing::info!(base_url = %config.base_url, "Creating KB agent HTTP backend");
                if config.base_url.is_empty() {
                    return Err(BackendError::Configuration(
                        "KB_AGENT_BASE_URL is required for the http backend".to_string(),
                    ));
                }
                Ok(Box::new(client::KbAgentClient::new(config)?))
            }
            "mock" => {
                tracing::info!("Creating mock KB agent backend");
                Ok(Box::new(mock::MockQaBackend::new()))
            }
            provider => Err(BackendError::Configuration(format!(
                "Unknown backend provider: {}. Supported providers: http, mock",
                provider
            ))),
        }
    }
}
