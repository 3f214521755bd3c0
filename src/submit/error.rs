use std::time::Duration;

use thiserror::Error;

const GENERIC_FAILURE: &str = "Failed to save post";

/// Why a save attempt failed. Every variant is local to one control.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SaveError {
    #[error("no auth token; the engine has not been activated")]
    MissingToken,

    #[error("could not reach save endpoint {endpoint}: {reason}")]
    Network { endpoint: String, reason: String },

    #[error("save endpoint rejected the token")]
    Unauthorized(Option<String>),

    #[error("save endpoint returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("save endpoint reported failure: {}", .0.as_deref().unwrap_or("no reason given"))]
    Rejected(Option<String>),

    #[error("save request timed out after {0:?}")]
    Timeout(Duration),

    #[error("unreadable response from save endpoint: {0}")]
    InvalidResponse(String),
}

impl SaveError {
    /// The text shown to the user in the error notification.
    pub fn user_message(&self) -> String {
        match self {
            SaveError::MissingToken => "Please activate the extension first".to_string(),
            SaveError::Network { endpoint, .. } => format!(
                "Cannot connect to server. Make sure the save service at {} is reachable.",
                endpoint
            ),
            SaveError::Unauthorized(_) => {
                "Invalid token. Please generate a new token from the dashboard.".to_string()
            }
            SaveError::Timeout(_) => "The save request timed out. Please try again.".to_string(),
            SaveError::Http { status, message } => {
                if message.trim().is_empty() {
                    format!("{} (HTTP {})", GENERIC_FAILURE, status)
                } else {
                    message.clone()
                }
            }
            SaveError::Rejected(Some(message)) if !message.trim().is_empty() => message.clone(),
            SaveError::Rejected(_) | SaveError::InvalidResponse(_) => GENERIC_FAILURE.to_string(),
        }
    }
}
