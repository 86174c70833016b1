//! Common test utilities and fixtures for integration tests
//!
//! Builds the real router and worker pool around recording mocks:
//! - `MockTransport` captures everything the bot sends
//! - `MockQaBackend` or a wiremock-backed HTTP client answers queries
//! - `InMemorySessionStore` holds session languages

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use kbchat_app::{build_app, Application, Services};
use kbchat_backend::mock::MockQaBackend;
use kbchat_backend::{BackendConfig, QaBackend, QaBackendFactory};
use kbchat_common::Config;
use kbchat_conversations::MessageCatalog;
use kbchat_sessions::memory::InMemorySessionStore;
use kbchat_telegram::mock::MockTransport;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const CHAT_ID: i64 = 4242;
pub const USER_ID: i64 = 4242;

/// Configuration as the deployed bot would read it, with mock providers
pub fn test_config() -> Config {
    let languages_dir = format!("{}/../../languages", env!("CARGO_MANIFEST_DIR"));
    let vars: HashMap<&str, String> = HashMap::from([
        ("KB_AGENT_BASE_URL", "http://kb-agent.test".to_string()),
        ("BACKEND_PROVIDER", "mock".to_string()),
        ("TELEGRAM_BASE_URL", "https://bot.test".to_string()),
        ("TELEGRAM_BOT_TOKEN", "123:test-token".to_string()),
        ("TELEGRAM_BOT_NAME", "kb_support_bot".to_string()),
        ("TELEGRAM_PROVIDER", "mock".to_string()),
        ("SESSION_PROVIDER", "memory".to_string()),
        ("SUPPORTED_LANGUAGES", "en,hi".to_string()),
        ("CONCURRENT_UPDATES", "4".to_string()),
        ("LANGUAGES_DIR", languages_dir),
    ]);

    Config::from_vars(|name| vars.get(name).cloned()).expect("test config is valid")
}

/// Mock collaborators shared across the steps of one conversation
#[derive(Clone)]
pub struct Fixture {
    pub config: Config,
    pub transport: MockTransport,
    pub backend: MockQaBackend,
    pub store: InMemorySessionStore,
    pub catalog: Arc<MessageCatalog>,
}

impl Fixture {
    pub fn new() -> Self {
        let config = test_config();
        let catalog = MessageCatalog::load_dir(&config.languages_dir, &config.default_language)
            .expect("shipped catalog loads");

        Self {
            config,
            transport: MockTransport::new(),
            backend: MockQaBackend::new(),
            store: InMemorySessionStore::new(),
            catalog: Arc::new(catalog),
        }
    }

    /// Services backed by the mock backend
    pub fn services(&self) -> Services {
        self.services_with_backend(Arc::new(self.backend.clone()))
    }

    /// Services backed by the real HTTP client pointed at `base_url`
    pub fn services_with_http_backend(&self, base_url: &str) -> Services {
        let mut config = BackendConfig::from_config(&self.config);
        config.provider = "http".to_string();
        config.base_url = base_url.to_string();
        let backend = QaBackendFactory::create(config).expect("http backend builds");
        self.services_with_backend(Arc::from(backend))
    }

    fn services_with_backend(&self, backend: Arc<dyn QaBackend>) -> Services {
        Services {
            transport: Arc::new(self.transport.clone()),
            backend,
            sessions: Arc::new(self.store.clone()),
            catalog: self.catalog.clone(),
        }
    }

    pub fn app(&self) -> Application {
        build_app(&self.config, self.services())
    }

    /// Deliver updates through a fresh app and wait until all are handled
    pub async fn deliver(&self, updates: &[Value]) {
        deliver_to(self.app(), updates).await;
    }
}

pub async fn deliver_to(app: Application, updates: &[Value]) {
    for update in updates {
        let (status, _) = post_json(&app, "/telegram", update.clone()).await;
        assert_eq!(status, StatusCode::OK);
    }
    app.worker.drain().await;
}

pub async fn post_json(app: &Application, uri: &str, body: Value) -> (StatusCode, String) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request"),
    )
    .await
}

pub async fn get(app: &Application, uri: &str) -> (StatusCode, String) {
    send(
        app,
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("valid request"),
    )
    .await
}

pub async fn send(app: &Application, request: Request<Body>) -> (StatusCode, String) {
    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body is readable");
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

fn message(update_id: i64, extra: Value) -> Value {
    let mut message = json!({
        "message_id": update_id,
        "chat": {"id": CHAT_ID, "type": "private", "first_name": "Meera", "username": "meera"},
        "from": {"id": USER_ID, "is_bot": false, "first_name": "Meera"}
    });
    if let (Some(target), Some(extra)) = (message.as_object_mut(), extra.as_object()) {
        target.extend(extra.clone());
    }
    json!({"update_id": update_id, "message": message})
}

pub fn text_update(update_id: i64, text: &str) -> Value {
    message(update_id, json!({"text": text}))
}

pub fn voice_update(update_id: i64, file_id: &str) -> Value {
    message(
        update_id,
        json!({"voice": {"file_id": file_id, "file_unique_id": "uniq", "duration": 4}}),
    )
}

pub fn callback_update(update_id: i64, message_id: i64, data: &str) -> Value {
    json!({
        "update_id": update_id,
        "callback_query": {
            "id": format!("cb-{}", update_id),
            "from": {"id": USER_ID, "is_bot": false, "first_name": "Meera"},
            "message": {
                "message_id": message_id,
                "chat": {"id": CHAT_ID, "type": "private", "first_name": "Meera"}
            },
            "data": data
        }
    })
}
