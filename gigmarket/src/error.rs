//! Error types.

use std::time::Duration;

use thiserror::Error;

/// The main error type for gigmarket operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Connectivity failure reaching the API.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A request did not complete within the client-side bound.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-2xx response that is not a client error.
    #[error("HTTP error [{status}]: {message}")]
    Http { status: u16, message: String },

    /// The server rejected the stored credentials (HTTP 401).
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Validation or business-rule rejection (4xx other than 401).
    #[error("Request rejected [{status}]: {message}")]
    Application { status: u16, message: String },

    /// A paged resource has nothing more to give right now.
    #[error("No more data")]
    NoMoreData,

    /// The conversation session was closed.
    #[error("Session closed")]
    SessionClosed,

    /// Operation requires authentication but none was provided.
    #[error("Authentication required")]
    AuthRequired,

    /// Invalid argument passed to an API method.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Error::Unauthorized { message },
            400..=499 => Error::Application { status, message },
            _ => Error::Http { status, message },
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } | Error::Application { status, .. } => Some(*status),
            Error::Unauthorized { .. } => Some(401),
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this is a connectivity or timeout failure.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Timeout(_))
    }

    /// Check if this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) | Error::Timeout(_) => true,
            Error::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::AuthRequired | Error::Unauthorized { .. })
    }
}

/// Result type alias for gigmarket operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::from_status(500, "boom");
        assert_eq!(format!("{}", e), "HTTP error [500]: boom");
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            Error::from_status(401, "expired"),
            Error::Unauthorized { .. }
        ));
        assert!(matches!(
            Error::from_status(422, "text too long"),
            Error::Application { status: 422, .. }
        ));
        assert!(matches!(
            Error::from_status(503, "down"),
            Error::Http { status: 503, .. }
        ));
    }

    #[test]
    fn test_retryable() {
        assert!(Error::Timeout(Duration::from_secs(12)).is_retryable());
        assert!(Error::from_status(502, "bad gateway").is_retryable());
        assert!(!Error::from_status(400, "bad request").is_retryable());
        assert!(!Error::from_status(401, "expired").is_retryable());
    }

    #[test]
    fn test_auth_error() {
        assert!(Error::from_status(401, "").is_auth_error());
        assert!(Error::AuthRequired.is_auth_error());
        assert!(!Error::NoMoreData.is_auth_error());
        assert_eq!(Error::from_status(401, "").status(), Some(401));
    }
}
