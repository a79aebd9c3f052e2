//! Machine-readable error classification.

use serde::Serialize;

/// Classification attached to every user-visible failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// HTTP 401. The user is not logged in or the session must be refreshed.
    Auth,
    /// Any other non-2xx response.
    Http,
    /// Transport failure; eligible for retry.
    Network,
    /// Client-side precondition failure; never reached the network.
    Validation,
    /// Response body was not the JSON we expected.
    Decode,
    /// Invalid local configuration.
    Config,
    /// Anything else (rendering, encoding, saving files).
    Internal,
}

impl ErrorKind {
    /// Whether an automatic retry may help.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Network)
    }

    /// Short stable label, used in log fields and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Auth => "auth",
            ErrorKind::Http => "http",
            ErrorKind::Network => "network",
            ErrorKind::Validation => "validation",
            ErrorKind::Decode => "decode",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_network_is_retryable() {
        assert!(ErrorKind::Network.is_retryable());
        assert!(!ErrorKind::Http.is_retryable());
        assert!(!ErrorKind::Auth.is_retryable());
        assert!(!ErrorKind::Validation.is_retryable());
    }

    #[test]
    fn test_display_uses_stable_label() {
        assert_eq!(ErrorKind::Validation.to_string(), "validation");
        assert_eq!(ErrorKind::Auth.to_string(), "auth");
    }
}
