//! API Error Types
//!
//! Errors returned by the signup service client, and their mapping onto the
//! three failure classes the controller reacts to.

use thiserror::Error;

/// Errors that can occur when talking to the signup service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request timeout")]
    Timeout,

    /// HTTP 401
    #[error("Unauthorized: {}", .detail.as_deref().unwrap_or("no detail"))]
    Unauthorized { detail: Option<String> },

    /// Any other non-success status
    #[error("API error {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Rejected { status: u16, detail: Option<String> },

    /// A success status whose body did not decode
    #[error("Invalid response body: {0}")]
    Decode(String),
}

/// How the client should react to a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No usable response; report generically
    Transport,
    /// The session is no longer accepted
    Authentication,
    /// The server refused the request; show its detail
    Domain,
}

impl ApiError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Transport(_) | ApiError::Timeout | ApiError::Decode(_) => {
                FailureKind::Transport
            }
            ApiError::Unauthorized { .. } => FailureKind::Authentication,
            ApiError::Rejected { .. } => FailureKind::Domain,
        }
    }

    /// Server-supplied detail text, if the failure carried one
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { detail } | ApiError::Rejected { detail, .. } => {
                detail.as_deref()
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Result type for client calls
pub type ApiResult<T> = Result<T, ApiError>;
