//! Telegram webhook handler

use axum::{extract::State, http::StatusCode, Json};
use kbchat_common::Result;
use kbchat_telegram::Update;

use crate::api::middleware::BotState;

/// Accept one update and hand it to the worker pool. Telegram only needs a
/// 2xx; the reply is produced asynchronously.
pub async fn receive_update(
    State(state): State<BotState>,
    Json(update): Json<Update>,
) -> Result<StatusCode> {
    tracing::debug!(
        update_id = update.update_id,
        chat_id = update.chat().map(|c| c.id),
        "Webhook update received"
    );
    state.queue.enqueue(update)?;
    Ok(StatusCode::OK)
}
