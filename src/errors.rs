use thiserror::Error;

use crate::ai::client::TOO_LARGE_MESSAGE;
use crate::worker::CANONICAL_FAILURE_MESSAGE;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Discord rejected the credentials (401)")]
    Auth,

    #[error("Missing access to the channel (403)")]
    Permission,

    #[error("Channel not found (404)")]
    NotFound,

    #[error("Rate limited by Discord, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Discord API returned HTTP {status}")]
    Http { status: u16 },

    #[error("Failed to fetch message window: {0}")]
    FetchWindow(#[source] Box<DigestError>),

    #[error("Failed to send HTTP request: {0}")]
    Request(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Failed to access OpenAI API: {0}")]
    OpenAIError(String),

    #[error("Invalid message window: {0}")]
    InvalidWindow(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to write summary: {0}")]
    Io(String),

    #[error("Message fetch was cancelled")]
    Cancelled,
}

impl DigestError {
    /// Innermost cause once `FetchWindow` wrappers are peeled off.
    #[must_use]
    pub fn root_cause(&self) -> &DigestError {
        match self {
            DigestError::FetchWindow(inner) => inner.root_cause(),
            other => other,
        }
    }

    /// Short message suitable for showing to the person who asked for the summary.
    #[must_use]
    pub fn user_notice(&self) -> String {
        match self.root_cause() {
            DigestError::Auth => "Discord token is invalid. Check your settings.".to_string(),
            DigestError::Permission => {
                "No permission to read that channel. Check the channel ID and token.".to_string()
            }
            DigestError::NotFound => "Channel not found. Check the channel ID.".to_string(),
            DigestError::RateLimited {
                retry_after_seconds,
            } => format!("Rate limited by Discord. Try again in {retry_after_seconds} seconds."),
            DigestError::InvalidWindow(reason) => format!("Invalid date range: {reason}"),
            DigestError::Config(reason) => format!("Configuration problem: {reason}"),
            DigestError::Cancelled => "Summary cancelled.".to_string(),
            DigestError::OpenAIError(msg) if msg == TOO_LARGE_MESSAGE => msg.clone(),
            DigestError::Http { .. } | DigestError::Request(_) | DigestError::Parse(_) => {
                "Failed to fetch messages from Discord. Please try again later.".to_string()
            }
            DigestError::Io(reason) => format!("Could not write the summary: {reason}"),
            _ => CANONICAL_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for DigestError {
    fn from(error: reqwest::Error) -> Self {
        DigestError::Request(error.to_string())
    }
}

impl From<serde_json::Error> for DigestError {
    fn from(error: serde_json::Error) -> Self {
        DigestError::Parse(error.to_string())
    }
}

impl From<std::io::Error> for DigestError {
    fn from(error: std::io::Error) -> Self {
        DigestError::Io(error.to_string())
    }
}
