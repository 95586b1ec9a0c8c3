//! Error types for RIS operations.
//!
//! Every failure surfaces synchronously to the caller of
//! [`RisClient::exchange`](crate::RisClient::exchange); nothing here is
//! retried automatically. Retry policy belongs to the caller.

/// Error codes for FFI and mobile integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum RisErrorCode {
    /// Missing or invalid configuration
    Configuration = 1000,
    /// Configuration key failed fingerprint verification
    ConfigKeyMismatch = 1001,
    /// Transport/network layer error
    Transport = 2000,
    /// Connection failed
    ConnectionFailed = 2001,
    /// Connection or read timeout
    Timeout = 2002,
    /// Endpoint answered with an error status
    HttpStatus = 2003,
    /// Response body could not be decoded
    Decode = 2100,
    /// Payment token too short for the requested encoding
    TokenTooShort = 5000,
    /// Invalid request data
    InvalidData = 5001,
}

/// Comprehensive error type for RIS operations.
#[derive(Debug, thiserror::Error)]
pub enum RisError {
    /// Missing or invalid configuration. Fatal at construction time.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The decoded configuration key does not match the expected fingerprint.
    #[error("the configuration key is incorrect")]
    ConfigKeyMismatch,

    /// Generic transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Connection could not be established.
    #[error("connection to {target} failed: {reason}")]
    ConnectionFailed {
        /// Target endpoint
        target: String,
        /// Underlying error message
        reason: String,
    },

    /// Connect or read timeout.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        /// Operation that timed out
        operation: String,
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// Endpoint responded with a non-success status.
    #[error("{target} responded with status {status}: {body}")]
    HttpStatus {
        /// Target endpoint
        target: String,
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// Response body could not be read or decoded.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// Token is shorter than the encoding requires.
    #[error("payment token of {length} characters is too short, {minimum} required")]
    TokenTooShort {
        /// Actual token length in characters
        length: usize,
        /// Minimum length for the requested operation
        minimum: usize,
    },

    /// Invalid request data.
    #[error("invalid {field}: {reason}")]
    InvalidData {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

impl RisError {
    /// Get the error code for FFI/mobile integration.
    pub fn code(&self) -> RisErrorCode {
        match self {
            Self::Configuration(_) => RisErrorCode::Configuration,
            Self::ConfigKeyMismatch => RisErrorCode::ConfigKeyMismatch,
            Self::Transport(_) => RisErrorCode::Transport,
            Self::ConnectionFailed { .. } => RisErrorCode::ConnectionFailed,
            Self::Timeout { .. } => RisErrorCode::Timeout,
            Self::HttpStatus { .. } => RisErrorCode::HttpStatus,
            Self::Decode(_) => RisErrorCode::Decode,
            Self::TokenTooShort { .. } => RisErrorCode::TokenTooShort,
            Self::InvalidData { .. } => RisErrorCode::InvalidData,
        }
    }

    /// Returns true for configuration failures, which are never worth retrying.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::ConfigKeyMismatch)
    }

    /// Returns true for transport-class failures, decode failures included.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::ConnectionFailed { .. }
                | Self::Timeout { .. }
                | Self::HttpStatus { .. }
                | Self::Decode(_)
        )
    }

    /// Returns true if a caller-side retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } | Self::Transport(_) => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a decode error from any error type.
    pub fn decode<E: std::error::Error>(err: E) -> Self {
        Self::Decode(err.to_string())
    }

    /// Create an invalid data error.
    pub fn invalid_data(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidData {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Map a reqwest failure for `target` onto the transport taxonomy.
    pub(crate) fn from_reqwest(err: reqwest::Error, target: &str, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                operation: format!("request to {}", target),
                timeout_ms,
            }
        } else if err.is_connect() {
            Self::ConnectionFailed {
                target: target.to_string(),
                reason: err.to_string(),
            }
        } else if err.is_decode() || err.is_body() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RisError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = RisError::Timeout {
            operation: "request".to_string(),
            timeout_ms: 10_000,
        };
        assert_eq!(err.code(), RisErrorCode::Timeout);
        assert!(err.is_transport());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_decode_is_transport_class() {
        let err = RisError::Decode("stream closed mid-line".to_string());
        assert!(err.is_transport());
        assert!(!err.is_retryable());
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_status_retryability() {
        let server_error = RisError::HttpStatus {
            target: "auth".to_string(),
            status: 503,
            body: String::new(),
        };
        let client_error = RisError::HttpStatus {
            target: "auth".to_string(),
            status: 401,
            body: "invalid_client".to_string(),
        };
        assert!(server_error.is_retryable());
        assert!(!client_error.is_retryable());
        assert!(client_error.to_string().contains("401"));
    }

    #[test]
    fn test_helper_constructors() {
        let err = RisError::configuration("missing api key");
        assert!(err.is_configuration());
        assert_eq!(err.code(), RisErrorCode::Configuration);

        let err = RisError::invalid_data("MERC", "not a number");
        assert_eq!(err.code(), RisErrorCode::InvalidData);
        assert_eq!(err.to_string(), "invalid MERC: not a number");
    }
}
