//! Conversation domain model: events, state machine, languages, catalog

pub mod catalog;
pub mod events;
pub mod languages;
pub mod state;
