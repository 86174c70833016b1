//! Route definitions for the webhook API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{health, webhook};
use super::middleware::BotState;

/// Create all webhook API routes
pub fn routes() -> Router<BotState> {
    Router::new()
        .route("/telegram", post(webhook::receive_update))
        .route("/healthcheck", get(health::healthcheck))
}
