//! State machine error types
//!
//! Returned by the conversation state machine when an event does not apply
//! to the state a session is in.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Invalid transition: {event} is not accepted in state {from}")]
    InvalidTransition { from: String, event: String },

    #[error("Terminal state: {0} accepts no further events")]
    TerminalState(String),
}
