//! Webhook API: routes, handlers and shared state

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use middleware::BotState;
