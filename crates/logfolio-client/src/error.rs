//! Client error types.

use logfolio_types::ErrorKind;
use thiserror::Error;

/// Message shown for HTTP 401. The client cannot tell "never logged in" from
/// "session expired", so both read the same.
pub const AUTH_FAILED_MESSAGE: &str =
    "Authentication failed: you are not logged in or your session has expired. \
     Log in again, or refresh and retry if you already are.";

/// Client error type.
///
/// `Clone` because a deduplicated request hands the same outcome to every
/// caller waiting on it.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The server answered 401.
    #[error("{message}")]
    Auth {
        /// Always 401.
        status: u16,
        /// User-facing explanation.
        message: String,
    },

    /// The server answered with another non-2xx status.
    #[error("HTTP {status}: {detail}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Server-provided `detail`, or the status text.
        detail: String,
    },

    /// The request never produced a response (connect, DNS, timeout, reset).
    #[error("Network error: {0}")]
    Network(String),

    /// A client-side precondition failed; nothing was sent.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A 2xx response body was not the JSON we expected.
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// URL building failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The background task driving a request died before settling.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build the 401 error.
    pub fn auth() -> Self {
        Error::Auth {
            status: 401,
            message: AUTH_FAILED_MESSAGE.to_string(),
        }
    }

    /// Machine-readable classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Auth { .. } => ErrorKind::Auth,
            Error::Http { .. } => ErrorKind::Http,
            Error::Network(_) => ErrorKind::Network,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Decode(_) => ErrorKind::Decode,
            Error::InvalidUrl(_) | Error::Config(_) => ErrorKind::Config,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Auth { status, .. } | Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth { .. })
    }

    /// Check if an automatic retry may help.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Text suitable for a toast or console line.
    pub fn user_message(&self) -> String {
        match self {
            Error::Auth { message, .. } => message.clone(),
            Error::Http { detail, .. } => detail.clone(),
            Error::Network(_) => "Network error, please try again later".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_carries_401() {
        let err = Error::auth();
        assert_eq!(err.status(), Some(401));
        assert!(err.is_auth_error());
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(err.user_message(), AUTH_FAILED_MESSAGE);
    }

    #[test]
    fn test_only_network_errors_retry() {
        assert!(Error::Network("connection refused".into()).is_retryable());
        assert!(
            !Error::Http {
                status: 503,
                detail: "unavailable".into()
            }
            .is_retryable()
        );
        assert!(!Error::auth().is_retryable());
        assert!(!Error::Validation("empty".into()).is_retryable());
    }

    #[test]
    fn test_http_error_display_and_user_message() {
        let err = Error::Http {
            status: 404,
            detail: "Category not found".into(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "HTTP 404: Category not found");
        assert_eq!(err.user_message(), "Category not found");
    }
}
