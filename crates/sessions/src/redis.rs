//! Redis session store
//!
//! Values are stored as plain strings under the caller's key, in the
//! configured logical database. The connection is opened on first use so
//! the bot starts while Redis is down; until it comes up every call fails
//! as unavailable and the next call tries again.

use std::sync::Arc;
use std::time::Duration;

use ::redis::aio::ConnectionManager;
use ::redis::AsyncCommands;
use tokio::sync::OnceCell;

use crate::{SessionConfig, SessionError, SessionStore};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Redis-backed store sharing one auto-reconnecting connection
#[derive(Clone)]
pub struct RedisSessionStore {
    client: ::redis::Client,
    connection: Arc<OnceCell<ConnectionManager>>,
}

impl RedisSessionStore {
    /// Validates the URL only; no connection is made here
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        let client = ::redis::Client::open(config.redis_url())
            .map_err(|e| SessionError::Configuration(format!("invalid Redis URL: {}", e)))?;

        Ok(Self {
            client,
            connection: Arc::new(OnceCell::new()),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, SessionError> {
        let connection = self
            .connection
            .get_or_try_init(|| async {
                let connecting = ConnectionManager::new(self.client.clone());
                match tokio::time::timeout(CONNECT_TIMEOUT, connecting).await {
                    Ok(Ok(connection)) => {
                        tracing::info!("Redis connection established");
                        Ok(connection)
                    }
                    Ok(Err(e)) => Err(SessionError::Unavailable(format!(
                        "Redis connection failed: {}",
                        e
                    ))),
                    Err(_) => Err(SessionError::Unavailable(format!(
                        "Redis connection timed out after {:?}",
                        CONNECT_TIMEOUT
                    ))),
                }
            })
            .await?;

        Ok(connection.clone())
    }
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let mut connection = self.connection().await?;
        connection
            .get(key)
            .await
            .map_err(|e| SessionError::Unavailable(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut connection = self.connection().await?;
        connection
            .set::<_, _, ()>(key, value)
            .await
            .map_err(|e| SessionError::Unavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str, port: u16) -> SessionConfig {
        SessionConfig {
            provider: "redis".to_string(),
            redis_host: host.to_string(),
            redis_port: port,
            redis_index: 15,
        }
    }

    /// A local port with nothing listening on it
    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    #[ignore] // Requires a running Redis - run locally only
    async fn test_redis_round_trip() {
        let store = RedisSessionStore::new(&config("localhost", 6379)).unwrap();

        store.set("test_language", "hi").await.unwrap();
        assert_eq!(
            store.get("test_language").await.unwrap().as_deref(),
            Some("hi")
        );
    }

    #[test]
    fn test_invalid_url_is_configuration_error() {
        let result = RedisSessionStore::new(&config("bad host name", 6379));

        assert!(matches!(result, Err(SessionError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_store_starts_while_redis_is_down() {
        let store = RedisSessionStore::new(&config("127.0.0.1", closed_port())).unwrap();

        assert!(matches!(
            store.get("100_language").await,
            Err(SessionError::Unavailable(_))
        ));
        assert!(matches!(
            store.set("100_language", "hi").await,
            Err(SessionError::Unavailable(_))
        ));
        assert!(!store.connection.initialized());
    }
}
