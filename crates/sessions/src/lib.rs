//! Session Store
//!
//! Plain string key/value storage for per-chat state. Writes are whole-value
//! overwrites, so concurrent writers to the same key resolve last-writer-wins.
//! - Redis implementation for deployments
//! - In-memory implementation for tests and single-process development

pub mod memory;
pub mod redis;

use kbchat_common::Config;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session store configuration error: {0}")]
    Configuration(String),

    #[error("Session store unavailable: {0}")]
    Unavailable(String),
}

impl SessionError {
    /// Stable reason tag used in logs
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "store_misconfigured",
            Self::Unavailable(_) => "store_unavailable",
        }
    }
}

/// Session store configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Store provider (redis, memory)
    pub provider: String,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_index: i64,
}

impl SessionConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            provider: config.session_provider.clone(),
            redis_host: config.redis_host.clone(),
            redis_port: config.redis_port,
            redis_index: config.redis_index,
        }
    }

    pub fn redis_url(&self) -> String {
        format!(
            "redis://{}:{}/{}",
            self.redis_host, self.redis_port, self.redis_index
        )
    }
}

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Overwrite the value at `key`
    async fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;
}

/// Factory for creating SessionStore implementations
pub struct SessionStoreFactory;

impl SessionStoreFactory {
    pub fn create(config: SessionConfig) -> Result<Box<dyn SessionStore>, SessionError> {
        match config.provider.as_str() {
            "redis" => {
                tracing::info!(
                    host = %config.redis_host,
                    port = config.redis_port,
                    index = config.redis_index,
                    "Creating Redis session store"
                );
                Ok(Box::new(redis::RedisSessionStore::new(&config)?))
            }
            "memory" => {
                tracing::info!("Creating in-memory session store");
                Ok(Box::new(memory::InMemorySessionStore::new()))
            }
            provider => Err(SessionError::Configuration(format!(
                "Unknown session provider: {}. Supported providers: redis, memory",
                provider
            ))),
        }
    }
}
