//! KB Agent HTTP Client Implementation
//!
//! POSTs queries to `{base_url}/chat/send` and maps transport failures,
//! non-2xx statuses and malformed bodies onto [`QueryFailure`].

use reqwest::Client;
use serde::Deserialize;

use crate::{
    BackendConfig, BackendError, QaBackend, QueryAnswer, QueryFailure, QueryRequest, QueryResult,
};

/// Agent response body
#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
    #[serde(default)]
    output: Option<ChatOutput>,
}

#[derive(Debug, Deserialize)]
struct ChatOutput {
    #[serde(default)]
    audio: Option<String>,
}

/// Real HTTP client for the knowledge-base agent
pub struct KbAgentClient {
    http: Client,
    endpoint: String,
}

impl KbAgentClient {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()
            .map_err(|e| BackendError::Configuration(format!("HTTP client build failed: {}", e)))?;

        let endpoint = format!("{}/chat/send", config.base_url.trim_end_matches('/'));

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Parse a 2xx body into an answer
fn parse_answer(body: &str) -> QueryResult {
    let metadata: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| QueryFailure::InvalidResponse(format!("body is not JSON: {}", e)))?;

    let parsed: ChatResponse = serde_json::from_value(metadata.clone())
        .map_err(|e| QueryFailure::InvalidResponse(format!("unexpected body shape: {}", e)))?;

    if parsed.response.trim().is_empty() {
        return Err(QueryFailure::InvalidResponse(
            "response field is empty".to_string(),
        ));
    }

    let audio_url = parsed
        .output
        .and_then(|output| output.audio)
        .filter(|url| !url.trim().is_empty());

    Ok(QueryAnswer {
        answer_text: parsed.response,
        audio_url,
        metadata,
    })
}

#[async_trait::async_trait]
impl QaBackend for KbAgentClient {
    async fn send(&self, request: QueryRequest) -> QueryResult {
        tracing::info!(
            session_id = %request.session_id,
            language = %request.language,
            has_audio = !request.audio_reference.is_empty(),
            "Sending KB agent request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| QueryFailure::Transport(e.to_string()))?;

        let status = response.status();

        let body = response
            .text()
            .await
            .map_err(|e| QueryFailure::Transport(format!("failed to read body: {}", e)))?;

        if !status.is_success() {
            return Err(QueryFailure::Http {
                status: status.as_u16(),
                body,
            });
        }

        parse_answer(&body)
    }

    async fn fetch_audio(&self, url: &str) -> Result<Vec<u8>, BackendError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| BackendError::Audio(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Audio(format!("audio host returned {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::Audio(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}
