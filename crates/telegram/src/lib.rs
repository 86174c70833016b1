//! Telegram Transport
//!
//! Outbound side of the messaging platform:
//! - Bot API HTTP client (send text/voice, callback answers, message edits,
//!   file lookup, webhook registration)
//! - Recording mock transport for tests and local development
//! - Bot API wire types and legacy Markdown escaping

pub mod client;
pub mod markdown;
pub mod mock;
pub mod types;

use std::time::Duration;

use kbchat_common::Config;
use thiserror::Error;

pub use markdown::{escape_markdown, split_message, MAX_MESSAGE_LENGTH};
pub use types::{
    CallbackQuery, Chat, InlineKeyboardButton, InlineKeyboardMarkup, Message, ParseMode,
    TelegramFile, Update, User, Voice,
};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Telegram configuration error: {0}")]
    Configuration(String),

    #[error("Telegram request error: {0}")]
    Request(String),

    #[error("Telegram API error ({code:?}): {description}")]
    Api {
        code: Option<i64>,
        description: String,
    },

    #[error("Telegram response error: {0}")]
    Response(String),
}

/// Telegram transport configuration
#[derive(Clone)]
pub struct TelegramConfig {
    /// Transport provider (telegram, mock)
    pub provider: String,
    pub bot_token: String,
    pub bot_name: String,
    /// Bot API host, e.g. `https://api.telegram.org`
    pub api_url: String,
    /// Public URL Telegram posts updates to
    pub webhook_url: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub pool_timeout: Duration,
    pub connection_pool_size: usize,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("provider", &self.provider)
            .field("bot_token", &"[REDACTED]")
            .field("bot_name", &self.bot_name)
            .field("api_url", &self.api_url)
            .field("webhook_url", &self.webhook_url)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("pool_timeout", &self.pool_timeout)
            .field("connection_pool_size", &self.connection_pool_size)
            .finish()
    }
}

impl TelegramConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            provider: config.telegram_provider.clone(),
            bot_token: config.telegram_bot_token.clone(),
            bot_name: config.telegram_bot_name.clone(),
            api_url: config.telegram_api_url.clone(),
            webhook_url: format!(
                "{}/telegram",
                config.telegram_base_url.trim_end_matches('/')
            ),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            read_timeout: Duration::from_secs(config.read_timeout_secs),
            write_timeout: Duration::from_secs(config.write_timeout_secs),
            pool_timeout: Duration::from_secs(config.pool_timeout_secs),
            connection_pool_size: config.connection_pool_size,
        }
    }
}

/// Outbound messaging primitives used by the dispatcher
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a text message, optionally with markup and an inline keyboard
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<Message, TransportError>;

    /// Send audio bytes as a voice message
    async fn send_voice(&self, chat_id: i64, audio: Vec<u8>) -> Result<Message, TransportError>;

    /// Acknowledge a callback query so the client clears its spinner
    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), TransportError>;

    /// Replace the text and keyboard of an already sent message
    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TransportError>;

    /// Resolve a file id to a downloadable URL. `None` when Telegram has no
    /// path for the file.
    async fn resolve_file_url(&self, file_id: &str) -> Result<Option<String>, TransportError>;

    /// Register the webhook URL
    async fn set_webhook(&self, url: &str) -> Result<(), TransportError>;
}

/// Factory for creating ChatTransport implementations
pub struct ChatTransportFactory;

impl ChatTransportFactory {
    pub fn create(config: TelegramConfig) -> Result<Box<dyn ChatTransport>, TransportError> {
        match config.provider.as_str() {
            "telegram" => {
                tracing::info!(bot_name = %config.bot_name, "Creating Telegram Bot API transport");
                if config.bot_token.is_empty() {
                    return Err(TransportError::Configuration(
                        "TELEGRAM_BOT_TOKEN is required for the telegram transport".to_string(),
                    ));
                }
                Ok(Box::new(client::TelegramBotClient::new(config)?))
            }
            "mock" => {
                tracing::info!("Creating mock Telegram transport");
                Ok(Box::new(mock::MockTransport::new()))
            }
            provider => Err(TransportError::Configuration(format!(
                "Unknown transport provider: {}. Supported providers: telegram, mock",
                provider
            ))),
        }
    }
}
