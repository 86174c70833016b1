//! Telegram Bot API HTTP Client
//!
//! Calls `{api_url}/bot{token}/{method}` and unwraps the `{ok, result}`
//! envelope every Bot API method returns.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::types::{InlineKeyboardMarkup, Message, ParseMode, TelegramFile};
use crate::{ChatTransport, TelegramConfig, TransportError};

/// Bot API response envelope
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Debug, Serialize)]
struct SendMessageBody<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
struct EditMessageTextBody<'a> {
    chat_id: i64,
    message_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup>,
}

/// Real Telegram Bot API client
pub struct TelegramBotClient {
    http: Client,
    api_url: String,
    token: String,
}

impl TelegramBotClient {
    pub fn new(config: TelegramConfig) -> Result<Self, TransportError> {
        // Uploads get the write budget on top of the read budget
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .timeout(config.connect_timeout + config.read_timeout + config.write_timeout)
            .pool_idle_timeout(config.pool_timeout)
            .pool_max_idle_per_host(config.connection_pool_size)
            .build()
            .map_err(|e| TransportError::Configuration(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.bot_token,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    /// Download URL for a `file_path` returned by `getFile`
    pub fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_url, self.token, file_path)
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Request(format!("{} failed: {}", method, e)))?;

        Self::unwrap_envelope(method, response).await
    }

    async fn unwrap_envelope<T: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<T, TransportError> {
        let status = response.status();
        let envelope: ApiEnvelope<T> = response.json().await.map_err(|e| {
            TransportError::Response(format!("{} returned {} with unreadable body: {}", method, status, e))
        })?;

        if !envelope.ok {
            return Err(TransportError::Api {
                code: envelope.error_code,
                description: envelope
                    .description
                    .unwrap_or_else(|| format!("{} failed with {}", method, status)),
            });
        }

        envelope
            .result
            .ok_or_else(|| TransportError::Response(format!("{} returned no result", method)))
    }
}

#[async_trait::async_trait]
impl ChatTransport for TelegramBotClient {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<Message, TransportError> {
        let body = SendMessageBody {
            chat_id,
            text,
            parse_mode,
            reply_markup: keyboard,
        };
        self.call("sendMessage", &body).await
    }

    async fn send_voice(&self, chat_id: i64, audio: Vec<u8>) -> Result<Message, TransportError> {
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("voice", Part::bytes(audio).file_name("voice.ogg"));

        let response = self
            .http
            .post(self.method_url("sendVoice"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::Request(format!("sendVoice failed: {}", e)))?;

        Self::unwrap_envelope("sendVoice", response).await
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError> {
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        let _: bool = self.call("answerCallbackQuery", &body).await?;
        Ok(())
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TransportError> {
        let body = EditMessageTextBody {
            chat_id,
            message_id,
            text,
            reply_markup: keyboard,
        };
        // Result is the edited Message, or `true` for inline messages
        let _: serde_json::Value = self.call("editMessageText", &body).await?;
        Ok(())
    }

    async fn resolve_file_url(&self, file_id: &str) -> Result<Option<String>, TransportError> {
        let file: TelegramFile = self
            .call("getFile", &json!({ "file_id": file_id }))
            .await?;

        Ok(file.file_path.map(|path| self.file_url(&path)))
    }

    async fn set_webhook(&self, url: &str) -> Result<(), TransportError> {
        let body = json!({
            "url": url,
            "allowed_updates": ["message", "callback_query"],
        });
        let _: bool = self.call("setWebhook", &body).await?;
        tracing::info!(url = %url, "Telegram webhook registered");
        Ok(())
    }
}
