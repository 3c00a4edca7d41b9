//! Error types for identity-provider API calls.
//!
//! Remote failures carry the service's error code so callers can tell a
//! missing resource apart from a throttled or conflicting request. The
//! [`ErrorCategory`] drives retry decisions in higher layers.

use serde::Deserialize;
use std::fmt;

/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error code returned when a resource server or user pool does not exist.
pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";
/// Error code returned when another request modified the same pool.
pub const CONCURRENT_MODIFICATION: &str = "ConcurrentModificationException";
/// Error code returned when the caller is being throttled.
pub const TOO_MANY_REQUESTS: &str = "TooManyRequestsException";
/// Error code returned for a server-side failure.
pub const INTERNAL_ERROR: &str = "InternalErrorException";
/// Error code returned when request parameters are rejected.
pub const INVALID_PARAMETER: &str = "InvalidParameterException";
/// Error code returned when a pool has reached its resource-server quota.
pub const LIMIT_EXCEEDED: &str = "LimitExceededException";

/// Categories of API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The addressed resource does not exist.
    NotFound,
    /// A concurrent change to the same pool conflicted with this one.
    Conflict,
    /// The caller exceeded the request rate.
    Throttled,
    /// Network failure or server-side error (transient).
    Transient,
    /// The request was rejected as invalid.
    Invalid,
    /// Credentials were missing or rejected.
    Auth,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Classify a service error code.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            RESOURCE_NOT_FOUND => Self::NotFound,
            CONCURRENT_MODIFICATION => Self::Conflict,
            TOO_MANY_REQUESTS => Self::Throttled,
            INTERNAL_ERROR | "ServiceUnavailable" | "InternalFailure" => Self::Transient,
            INVALID_PARAMETER | LIMIT_EXCEEDED | "ValidationException" => Self::Invalid,
            "NotAuthorizedException"
            | "UnrecognizedClientException"
            | "AccessDeniedException"
            | "ExpiredTokenException" => Self::Auth,
            _ => Self::Other,
        }
    }

    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict | Self::Throttled | Self::Transient)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "Resource not found",
            Self::Conflict => "Concurrent modification",
            Self::Throttled => "Request rate exceeded",
            Self::Transient => "Temporary service failure",
            Self::Invalid => "Invalid request",
            Self::Auth => "Authentication failed",
            Self::Other => "Unexpected error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the identity-provider API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The service answered with an error envelope.
    #[error("{code}: {message}")]
    Api {
        /// Service error code, e.g. `ResourceNotFoundException`.
        code: String,
        /// Human-readable message from the service.
        message: String,
        /// HTTP status code of the response.
        status: u16,
    },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(rename = "__type", default)]
    kind: Option<String>,
    #[serde(alias = "Message", default)]
    message: Option<String>,
}

impl Error {
    /// Build an API error from a code and message.
    pub fn api(code: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Self::Api {
            code: code.into(),
            message: message.into(),
            status,
        }
    }

    /// Shorthand for a not-found API error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::api(RESOURCE_NOT_FOUND, message, 400)
    }

    /// Decode a non-2xx response body into an error.
    ///
    /// The JSON 1.1 protocol reports errors as `{"__type": ..., "message": ...}`.
    /// The type may be namespaced (`com.amazonaws...#Code`); only the part
    /// after the last `#` is kept.
    pub fn from_api_response(status: u16, body: &str) -> Self {
        let envelope: Option<ErrorEnvelope> = serde_json::from_str(body).ok();
        let (kind, message) = match envelope {
            Some(env) => (env.kind, env.message),
            None => (None, None),
        };

        match kind {
            Some(kind) => {
                let code = kind.rsplit('#').next().unwrap_or(&kind).to_string();
                Self::Api {
                    code,
                    message: message.unwrap_or_default(),
                    status,
                }
            }
            None if status >= 500 => Self::Api {
                code: INTERNAL_ERROR.to_string(),
                message: format!("HTTP {status}"),
                status,
            },
            None => Self::InvalidResponse(format!("HTTP {status}: {}", body.trim())),
        }
    }

    /// The service error code, if this error came from the service.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Get the error category for retry logic.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Api { code, .. } => ErrorCategory::from_code(code),
            Error::Transport(_) => ErrorCategory::Transient,
            Error::InvalidResponse(_) | Error::Other(_) => ErrorCategory::Other,
        }
    }

    /// Whether the addressed resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::from_api_response(code, ""),
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::Conflict.is_retryable());
        assert!(ErrorCategory::Throttled.is_retryable());
        assert!(ErrorCategory::Transient.is_retryable());
        assert!(!ErrorCategory::NotFound.is_retryable());
        assert!(!ErrorCategory::Invalid.is_retryable());
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(!ErrorCategory::Other.is_retryable());
    }

    #[test]
    fn test_from_api_response_plain_code() {
        let err = Error::from_api_response(
            400,
            r#"{"__type":"ResourceNotFoundException","message":"Resource server not found"}"#,
        );
        assert!(err.is_not_found());
        assert_eq!(err.code(), Some(RESOURCE_NOT_FOUND));
        assert_eq!(
            err.to_string(),
            "ResourceNotFoundException: Resource server not found"
        );
    }

    #[test]
    fn test_from_api_response_namespaced_code() {
        let err = Error::from_api_response(
            400,
            r#"{"__type":"com.amazonaws.cognito#ConcurrentModificationException","Message":"busy"}"#,
        );
        assert_eq!(err.code(), Some(CONCURRENT_MODIFICATION));
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_from_api_response_server_error_without_body() {
        let err = Error::from_api_response(503, "");
        assert_eq!(err.category(), ErrorCategory::Transient);
    }

    #[test]
    fn test_from_api_response_garbage_client_error() {
        let err = Error::from_api_response(400, "<html>nope</html>");
        assert!(matches!(err, Error::InvalidResponse(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_transport_is_retryable() {
        assert!(Error::Transport("connection reset".into()).is_retryable());
    }

    #[test]
    fn test_auth_codes() {
        assert_eq!(
            ErrorCategory::from_code("NotAuthorizedException"),
            ErrorCategory::Auth
        );
        assert_eq!(ErrorCategory::from_code("Whatever"), ErrorCategory::Other);
    }
}
