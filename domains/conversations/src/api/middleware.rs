//! Shared state of the webhook routes

use crate::worker::UpdateQueue;

/// Application state for the webhook API
#[derive(Clone)]
pub struct BotState {
    pub queue: UpdateQueue,
}

impl BotState {
    pub fn new(queue: UpdateQueue) -> Self {
        Self { queue }
    }
}
