//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::language::{default_languages, Language};

pub const DEFAULT_WELCOME_MSG: &str =
    "Namaste 🙏\nWelcome to *KB Support Assistant*\n_(Powered by Bhashini)_";
pub const DEFAULT_SUPPORTED_LANGUAGES: &str = "en,bn,gu,hi,kn,ml,mr,or,pa,ta,te";

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Knowledge-base agent (Q&A backend)
    pub kb_agent_base_url: String,
    pub backend_provider: String,

    /// Telegram configuration
    pub telegram_base_url: String,
    pub telegram_bot_token: String,
    pub telegram_bot_name: String,
    pub telegram_api_url: String,
    pub telegram_provider: String,

    /// Session store
    pub session_provider: String,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_index: i64,

    /// Update processing and outbound HTTP tuning
    pub concurrent_updates: usize,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub pool_timeout_secs: u64,
    pub connection_pool_size: usize,

    /// Conversation content
    pub welcome_msg: String,
    pub default_language: String,
    pub supported_languages: String,
    pub languages: Vec<Language>,
    pub languages_dir: String,

    /// Runtime configuration
    pub log_level: String,
    pub rust_log: String,
    pub port: u16,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("kb_agent_base_url", &self.kb_agent_base_url)
            .field("backend_provider", &self.backend_provider)
            .field("telegram_base_url", &self.telegram_base_url)
            .field("telegram_bot_token", &"[REDACTED]")
            .field("telegram_bot_name", &self.telegram_bot_name)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("telegram_provider", &self.telegram_provider)
            .field("session_provider", &self.session_provider)
            .field("redis_host", &self.redis_host)
            .field("redis_port", &self.redis_port)
            .field("redis_index", &self.redis_index)
            .field("concurrent_updates", &self.concurrent_updates)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("read_timeout_secs", &self.read_timeout_secs)
            .field("default_language", &self.default_language)
            .field("supported_languages", &self.supported_languages)
            .field("languages_dir", &self.languages_dir)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| var(name).ok_or_else(|| anyhow::anyhow!("{} is required", name));
        let or_default = |name: &str, default: &str| var(name).unwrap_or_else(|| default.to_string());

        let languages = match var("LANGUAGES") {
            Some(raw) => serde_json::from_str::<Vec<Language>>(&raw)
                .map_err(|e| anyhow::anyhow!("LANGUAGES is not a valid language list: {}", e))?,
            None => default_languages(),
        };

        let config = Self {
            kb_agent_base_url: required("KB_AGENT_BASE_URL")?,
            backend_provider: or_default("BACKEND_PROVIDER", "http"),

            telegram_base_url: required("TELEGRAM_BASE_URL")?,
            telegram_bot_token: required("TELEGRAM_BOT_TOKEN")?,
            telegram_bot_name: required("TELEGRAM_BOT_NAME")?,
            telegram_api_url: or_default("TELEGRAM_API_URL", "https://api.telegram.org"),
            telegram_provider: or_default("TELEGRAM_PROVIDER", "telegram"),

            session_provider: or_default("SESSION_PROVIDER", "redis"),
            redis_host: or_default("REDIS_HOST", "localhost"),
            redis_port: parse_or(var("REDIS_PORT"), 6379),
            redis_index: parse_or(var("REDIS_INDEX"), 1),

            concurrent_updates: parse_or(var("CONCURRENT_UPDATES"), 256),
            connect_timeout_secs: parse_or(var("CONNECT_TIMEOUT"), 300),
            read_timeout_secs: parse_or(var("READ_TIMEOUT"), 15),
            write_timeout_secs: parse_or(var("WRITE_TIMEOUT"), 10),
            pool_timeout_secs: parse_or(var("POOL_TIMEOUT"), 30),
            connection_pool_size: parse_or(var("CONNECTION_POOL_SIZE"), 1024),

            welcome_msg: or_default("WELCOME_MSG", DEFAULT_WELCOME_MSG),
            default_language: or_default("DEFAULT_LANGUAGE", "en"),
            supported_languages: or_default("SUPPORTED_LANGUAGES", DEFAULT_SUPPORTED_LANGUAGES),
            languages,
            languages_dir: or_default("LANGUAGES_DIR", "./languages"),

            log_level: or_default("LOG_LEVEL", "info"),
            rust_log: or_default("RUST_LOG", "kbchat=debug"),
            port: parse_or(var("PORT"), 8000),
        };

        Ok(config)
    }

    /// Tracing filter directives: `LOG_LEVEL` as the baseline, `RUST_LOG` on top
    pub fn log_filter(&self) -> String {
        [self.log_level.trim(), self.rust_log.trim()]
            .iter()
            .filter(|directive| !directive.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Codes from `SUPPORTED_LANGUAGES`, trimmed, empty entries dropped
    pub fn supported_language_codes(&self) -> Vec<String> {
        self.supported_languages
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
