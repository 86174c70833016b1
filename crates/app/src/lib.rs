//! KB chat bridge composition root
//!
//! Builds the collaborators from configuration and wires them into the
//! webhook router and the update worker pool.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use kbchat_backend::{BackendConfig, QaBackend, QaBackendFactory};
use kbchat_common::Config;
use kbchat_conversations::{
    supported_languages, BotState, Dispatcher, LanguageResolver, MessageCatalog, UpdateWorker,
};
use kbchat_sessions::{SessionConfig, SessionStore, SessionStoreFactory};
use kbchat_telegram::{ChatTransport, ChatTransportFactory, TelegramConfig};

/// External collaborators of the dispatcher
#[derive(Clone)]
pub struct Services {
    pub transport: Arc<dyn ChatTransport>,
    pub backend: Arc<dyn QaBackend>,
    pub sessions: Arc<dyn SessionStore>,
    pub catalog: Arc<MessageCatalog>,
}

impl Services {
    /// Create every collaborator with the provider named in `config`
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let transport = ChatTransportFactory::create(TelegramConfig::from_config(config))
            .context("Failed to create Telegram transport")?;
        let backend = QaBackendFactory::create(BackendConfig::from_config(config))
            .context("Failed to create KB agent backend")?;
        let sessions = SessionStoreFactory::create(SessionConfig::from_config(config))
            .context("Failed to create session store")?;
        let catalog = MessageCatalog::load_dir(&config.languages_dir, &config.default_language)
            .context("Failed to load message catalog")?;

        Ok(Self {
            transport: Arc::from(transport),
            backend: Arc::from(backend),
            sessions: Arc::from(sessions),
            catalog: Arc::new(catalog),
        })
    }
}

/// Router plus the worker that processes what the router accepts
pub struct Application {
    pub router: Router,
    pub worker: UpdateWorker,
}

/// Wire `services` into the application. Must run inside a Tokio runtime.
pub fn build_app(config: &Config, services: Services) -> Application {
    let supported = config.supported_language_codes();
    let languages = supported_languages(&config.languages, &supported);

    let resolver = LanguageResolver::new(
        services.sessions,
        config.default_language.clone(),
        supported,
    );
    let dispatcher = Dispatcher::new(
        services.transport,
        services.backend,
        resolver,
        services.catalog,
        languages,
        config.welcome_msg.clone(),
    )
    .with_bot_name(config.telegram_bot_name.clone());

    let (queue, worker) = UpdateWorker::spawn(Arc::new(dispatcher), config.concurrent_updates);

    let router = Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { "KB chat bridge v0.1.0" }),
        )
        .merge(kbchat_conversations::routes().with_state(BotState::new(queue)));

    Application { router, worker }
}

/// Create the application from configuration
pub async fn create_app(config: &Config) -> anyhow::Result<(Application, Services)> {
    let services = Services::from_config(config)?;
    let app = build_app(config, services.clone());
    Ok((app, services))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
