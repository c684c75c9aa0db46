//! Client error types

use crate::types::ErrorResponse;
use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network failure or undecodable response; carries no HTTP status
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// 401 from the server
    #[error("Authentication failed: {}", display_message(.error_message.as_deref()))]
    Unauthorized { error_message: Option<String> },

    /// 403 from the server
    #[error("Forbidden: {}", display_message(.error_message.as_deref()))]
    Forbidden { error_message: Option<String> },

    /// 404 from the server
    #[error("Resource not found: {}", display_message(.error_message.as_deref()))]
    NotFound { error_message: Option<String> },

    /// Any other non-success status
    #[error("Server error {status}: {}", display_message(.error_message.as_deref()))]
    ServerError {
        status: u16,
        error_message: Option<String>,
    },

    /// The request interceptor refused to forward the request
    #[error("{0}")]
    Rejected(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

fn display_message(message: Option<&str>) -> &str {
    message.unwrap_or("no details")
}

impl ClientError {
    /// Create error from HTTP status code and the raw response body
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let error_message = serde_json::from_str::<ErrorResponse>(body)
            .ok()
            .and_then(|response| response.error_message)
            .filter(|message| !message.is_empty());

        match status.as_u16() {
            401 => Self::Unauthorized { error_message },
            403 => Self::Forbidden { error_message },
            404 => Self::NotFound { error_message },
            status => Self::ServerError {
                status,
                error_message,
            },
        }
    }

    /// HTTP status of the failed response, `None` when no response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::ServerError { status, .. } => Some(*status),
            Self::Request(error) => error.status().map(|status| status.as_u16()),
            Self::Rejected(_) | Self::Serialization(_) | Self::Configuration(_) => None,
        }
    }

    /// The server-supplied `errorMessage`, if the response carried one
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { error_message }
            | Self::Forbidden { error_message }
            | Self::NotFound { error_message }
            | Self::ServerError { error_message, .. } => error_message.as_deref(),
            _ => None,
        }
    }

    /// Whether the session needs to be re-established
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
