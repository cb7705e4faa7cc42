//! Errors raised by the request gateway.

use thiserror::Error;

/// What went wrong during a gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The request never produced an HTTP response (DNS, connect, timeout, ...)
    Transport,
    /// The remote API answered with a non-success response
    Api { status: u16 },
    /// The remote API asked for a token refresh and the refresh failed
    TokenRefresh { status: u16 },
}

/// Raised failure of a non-silent gateway call.
///
/// The message always names the credential so operators can tell which
/// integration failed.
#[derive(Debug, Clone, Error)]
#[error("Connector \"{credential}\" connection error: \"{message}\"")]
pub struct ConnectionError {
    pub credential: String,
    pub message: String,
    pub kind: FailureKind,
}

impl ConnectionError {
    pub fn new(
        credential: impl Into<String>,
        message: impl Into<String>,
        kind: FailureKind,
    ) -> Self {
        Self {
            credential: credential.into(),
            message: message.into(),
            kind,
        }
    }

    pub fn transport(credential: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(credential, message, FailureKind::Transport)
    }

    /// HTTP status of the failed response, when there was one
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            FailureKind::Transport => None,
            FailureKind::Api { status } | FailureKind::TokenRefresh { status } => Some(status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names_credential() {
        let error = ConnectionError::new(
            "Test Credential",
            "Bad Request",
            FailureKind::Api { status: 400 },
        );
        assert_eq!(
            error.to_string(),
            "Connector \"Test Credential\" connection error: \"Bad Request\""
        );
        assert_eq!(error.status(), Some(400));
    }

    #[test]
    fn test_transport_has_no_status() {
        let error = ConnectionError::transport("Test Credential", "connection refused");
        assert_eq!(error.kind, FailureKind::Transport);
        assert_eq!(error.status(), None);
    }
}
