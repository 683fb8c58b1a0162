//! Webhook error types.

use thiserror::Error;

/// Result type for webhook operations.
pub type WebhookResult<T> = Result<T, WebhookError>;

/// Error type for webhook operations.
///
/// Variants split into two classes: failures that happen before admission
/// (the delivery was never attempted and nothing is logged) and transport
/// failures (the attempt was logged before the error reached the caller).
/// Use [`WebhookError::was_attempted`] to tell them apart.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Registration data failed validation.
    #[error("Invalid webhook data: {0}")]
    Validation(String),

    /// Endpoint not found.
    #[error("Webhook not found: {0}")]
    EndpointNotFound(String),

    /// Endpoint exists but is disabled.
    #[error("Webhook is not active: {0}")]
    InactiveEndpoint(String),

    /// Admission refused by the rate limiter.
    #[error("Rate limit exceeded for webhook {0}")]
    RateLimitExceeded(String),

    /// The outbound send failed. Always logged before being returned.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Invalid payload.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebhookError {
    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError(message.into())
    }

    /// Returns true if the delivery was admitted and logged as failed.
    pub fn was_attempted(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::InvalidPayload(_))
    }

    /// Returns the remote's HTTP status if a response was received.
    pub fn response_status(&self) -> Option<u16> {
        match self {
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }

    /// Returns an HTTP status code appropriate for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::InvalidPayload(_) => 422,
            Self::EndpointNotFound(_) => 404,
            Self::InactiveEndpoint(_) => 409,
            Self::RateLimitExceeded(_) => 429,
            Self::Transport(TransportError::Timeout { .. }) => 504,
            Self::Transport(_) => 502,
            _ => 500,
        }
    }
}

/// Failure reported by a [`Transport`](crate::Transport).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The send did not complete within the timeout.
    #[error("timeout of {timeout_ms}ms exceeded")]
    Timeout { timeout_ms: u64 },

    /// The remote answered outside the 2xx range.
    #[error("Request failed with status code {status}")]
    Status { status: u16, body: String },

    /// Connection, TLS, or other request-level failure.
    #[error("{0}")]
    Connection(String),

    /// The transport panicked mid-send.
    #[error("transport panicked: {0}")]
    Panicked(String),
}

impl TransportError {
    /// Returns the HTTP status if the remote produced a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::InvalidPayload(err.to_string())
    }
}

#[cfg(feature = "http-client")]
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            TransportError::Status {
                status: status.as_u16(),
                body: String::new(),
            }
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WebhookError::Validation("URL is required, Name is too long".into());
        assert_eq!(
            err.to_string(),
            "Invalid webhook data: URL is required, Name is too long"
        );

        let err = WebhookError::from(TransportError::Timeout { timeout_ms: 10000 });
        assert_eq!(err.to_string(), "timeout of 10000ms exceeded");

        let err = WebhookError::from(TransportError::Status {
            status: 404,
            body: "Unknown Webhook".into(),
        });
        assert_eq!(err.to_string(), "Request failed with status code 404");
    }

    #[test]
    fn test_was_attempted() {
        assert!(WebhookError::Transport(TransportError::Connection("refused".into())).was_attempted());
        assert!(!WebhookError::EndpointNotFound("abc".into()).was_attempted());
        assert!(!WebhookError::InactiveEndpoint("abc".into()).was_attempted());
        assert!(!WebhookError::RateLimitExceeded("abc".into()).was_attempted());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(WebhookError::EndpointNotFound("x".into()).status_code(), 404);
        assert_eq!(WebhookError::RateLimitExceeded("x".into()).status_code(), 429);
        assert_eq!(
            WebhookError::Transport(TransportError::Timeout { timeout_ms: 1 }).status_code(),
            504
        );
        assert_eq!(WebhookError::storage("down").status_code(), 500);
    }
}
