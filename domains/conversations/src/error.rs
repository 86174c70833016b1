//! Dispatcher errors
//!
//! Backend failures never show up here; they are part of the normal flow.
//! What remains is the transport refusing an outbound message and events
//! arriving in a state that cannot accept them.

use kbchat_telegram::TransportError;
use thiserror::Error;

use crate::domain::state::StateError;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Outbound delivery failed: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    State(#[from] StateError),
}
