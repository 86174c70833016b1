//! Conversations domain: the bot's conversation flow
//!
//! Inbound updates are routed to events, events drive the dispatcher, and
//! the dispatcher talks to the KB agent, the session store and Telegram.

pub mod api;
pub mod dispatcher;
pub mod domain;
pub mod error;
pub mod feedback;
pub mod resolver;
pub mod worker;

// Re-export domain types at the crate root for convenience
pub use domain::catalog::{CatalogError, MessageCatalog, MessageKey};
pub use domain::events::{CallbackAction, Command, InboundEvent, Sender, Vote};
pub use domain::languages::{language_keyboard, supported_languages};
pub use domain::state::{
    ConversationEvent, ConversationState, ConversationStateMachine, StateError,
};

pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use feedback::FeedbackHandler;
pub use resolver::LanguageResolver;
pub use worker::{UpdateQueue, UpdateWorker};

// Re-export API types
pub use api::routes::routes;
pub use api::BotState;
