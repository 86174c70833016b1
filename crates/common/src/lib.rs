//! Shared configuration and error handling for the KB chat bridge
//!
//! This crate provides common functionality used across the workspace:
//! - Configuration management following 12-factor principles
//! - Error types and handling for the webhook HTTP surface
//! - The static language table consumed by the language picker

pub mod config;
pub mod error;
pub mod language;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use language::Language;
pub use state::StateError;
