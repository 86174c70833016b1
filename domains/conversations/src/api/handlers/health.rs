//! Liveness probe

pub const HEALTHCHECK_TEXT: &str = "The bot is still running fine :)";

pub async fn healthcheck() -> &'static str {
    HEALTHCHECK_TEXT
}
