//! Error type for backend communication.

use thiserror::Error;

/// Errors that can occur while talking to the geofence backend or the user
/// directory service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Backend URL not configured")]
    NotConfigured,

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// The message to surface to the operator, preferring server-provided
    /// text when the backend sent any.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::NotFound(message) | ApiError::Service { message, .. }
                if !message.is_empty() =>
            {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}
