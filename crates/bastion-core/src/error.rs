//! Error taxonomy for reconciliation.
//!
//! A backend "not found" is not an error; it becomes an absent current
//! state. Everything here aborts the invocation and propagates to the
//! driver unmodified.

use thiserror::Error;

/// Error that can occur while reconciling a resource.
#[derive(Debug, Error)]
pub enum BastionError {
    /// The backend answered with a status outside the expected contract
    /// (GET 200/404, mutations 204). Carries the status and response
    /// body verbatim.
    #[error("backend error: status {status}: {body}")]
    Backend { status: u16, body: String },

    /// Transport-level failure before any status was received.
    #[error("network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Desired-state construction or transport configuration is
    /// invalid. Detected before any backend call.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// A payload could not be serialized or a response body parsed.
    #[error("serialization error: {message}")]
    Serialization { message: String },
}

impl BastionError {
    /// Create a backend error from a status code and response body.
    pub fn backend(status: u16, body: impl Into<String>) -> Self {
        BastionError::Backend {
            status,
            body: body.into(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        BastionError::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error with source.
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        BastionError::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        BastionError::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        BastionError::Serialization {
            message: message.into(),
        }
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            BastionError::Backend { .. } => "BACKEND_ERROR",
            BastionError::Network { .. } => "NETWORK_ERROR",
            BastionError::InvalidConfiguration { .. } => "INVALID_CONFIG",
            BastionError::Serialization { .. } => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error originated on the backend (as opposed to
    /// local validation or the transport layer).
    pub fn is_backend(&self) -> bool {
        matches!(self, BastionError::Backend { .. })
    }

    /// The HTTP status carried by a backend error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            BastionError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for reconciliation operations.
pub type BastionResult<T> = Result<T, BastionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_carries_status_and_body() {
        let err = BastionError::backend(500, "Internal Server Error");
        assert!(err.is_backend());
        assert_eq!(err.status(), Some(500));
        assert_eq!(
            err.to_string(),
            "backend error: status 500: Internal Server Error"
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(BastionError::backend(409, "conflict").error_code(), "BACKEND_ERROR");
        assert_eq!(BastionError::network("down").error_code(), "NETWORK_ERROR");
        assert_eq!(
            BastionError::invalid_config("missing base url").error_code(),
            "INVALID_CONFIG"
        );
    }

    #[test]
    fn test_network_error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = BastionError::network_with_source("connect failed", source);

        assert!(!err.is_backend());
        assert_eq!(err.status(), None);
        if let BastionError::Network { source, .. } = &err {
            assert!(source.is_some());
        } else {
            panic!("Expected Network variant");
        }
    }
}
