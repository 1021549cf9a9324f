//! # Error Handling
//!
//! Error types for the Spark SDK core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Lifecycle Errors (100)                                            │
//! │  │   ├── NotInitialized        - Spark::initialize() not called        │
//! │  │   └── AlreadyInitialized    - Spark::initialize() called twice      │
//! │  │                                                                      │
//! │  ├── Configuration Errors (200)                                        │
//! │  │   ├── MissingAccessToken    - No bearer token configured            │
//! │  │   └── InvalidConfig         - Malformed URL, timeout, level...      │
//! │  │                                                                      │
//! │  ├── Argument Errors (300)                                             │
//! │  │   └── InvalidArgument       - Rejected before any request is sent   │
//! │  │                                                                      │
//! │  ├── Service Errors (400)      - Backend answered with a 4xx           │
//! │  │   ├── BadRequest / Unauthorized / Forbidden / NotFound              │
//! │  │   ├── Conflict / RateLimited                                        │
//! │  │   └── RequestFailed         - Any other 4xx                         │
//! │  │                                                                      │
//! │  ├── Transport Errors (500)                                            │
//! │  │   ├── ServerError           - Backend answered with a 5xx           │
//! │  │   ├── ConnectionFailed      - No response at all                    │
//! │  │   └── Timeout               - Request deadline expired              │
//! │  │                                                                      │
//! │  └── Payload Errors (600)                                              │
//! │      ├── InvalidResponse       - Required field missing                │
//! │      ├── SerializationError    - Request body could not be encoded     │
//! │      └── DeserializationError  - Response body could not be decoded    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Service errors carry the backend's human-readable `message` and, when the
//! backend supplied one, its `trackingId`. Nothing is retried locally.

use std::fmt;

use thiserror::Error;

/// Result type alias for Spark SDK operations
pub type Result<T> = std::result::Result<T, Error>;

/// Details the backend attached to a failed request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceFailure {
    /// Human-readable reason reported by the backend.
    pub message: String,
    /// Backend tracking id, useful when filing support requests.
    pub tracking_id: Option<String>,
}

impl ServiceFailure {
    /// Build a failure with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tracking_id: None,
        }
    }
}

impl fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tracking_id {
            Some(id) => write!(f, "{} (trackingId: {})", self.message, id),
            None => f.write_str(&self.message),
        }
    }
}

/// Main error type for the Spark SDK
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Lifecycle Errors (100-199)
    // ========================================================================

    /// The global instance has not been initialized
    #[error("Spark has not been initialized. Call Spark::initialize() first.")]
    NotInitialized,

    /// The global instance has already been initialized
    #[error("Spark has already been initialized.")]
    AlreadyInitialized,

    // ========================================================================
    // Configuration Errors (200-299)
    // ========================================================================

    /// No access token was configured
    #[error("No access token configured. Set SdkConfig::access_token or SPARK_ACCESS_TOKEN.")]
    MissingAccessToken,

    /// The configuration is malformed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Argument Errors (300-399)
    // ========================================================================

    /// An argument was rejected before any request was sent
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ========================================================================
    // Service Errors (400-499)
    // ========================================================================

    /// 400: the backend rejected the request
    #[error("Bad request: {0}")]
    BadRequest(ServiceFailure),

    /// 401: the access token is missing, expired or invalid
    #[error("Unauthorized: {0}")]
    Unauthorized(ServiceFailure),

    /// 403: the caller may not perform this operation
    #[error("Forbidden: {0}")]
    Forbidden(ServiceFailure),

    /// 404: the resource does not exist
    #[error("Not found: {0}")]
    NotFound(ServiceFailure),

    /// 409: the request conflicts with existing state
    #[error("Conflict: {0}")]
    Conflict(ServiceFailure),

    /// 429: the caller is being throttled
    #[error("Rate limited: {failure}")]
    RateLimited {
        /// Backend failure details
        failure: ServiceFailure,
        /// Seconds the backend asked the caller to wait, if it said so
        retry_after: Option<u64>,
    },

    /// Any other 4xx response
    #[error("Request failed with status {status}: {failure}")]
    RequestFailed {
        /// HTTP status code
        status: u16,
        /// Backend failure details
        failure: ServiceFailure,
    },

    // ========================================================================
    // Transport Errors (500-599)
    // ========================================================================

    /// 5xx: the backend failed to process the request
    #[error("Server error {status}: {failure}")]
    ServerError {
        /// HTTP status code
        status: u16,
        /// Backend failure details
        failure: ServiceFailure,
    },

    /// The request never produced a response
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The request deadline expired
    #[error("Request timed out: {0}")]
    Timeout(String),

    // ========================================================================
    // Payload Errors (600-699)
    // ========================================================================

    /// The backend answered successfully but the payload broke an invariant
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl Error {
    /// Map a non-success HTTP status to the matching service error.
    pub fn from_status(status: u16, failure: ServiceFailure, retry_after: Option<u64>) -> Self {
        match status {
            400 => Error::BadRequest(failure),
            401 => Error::Unauthorized(failure),
            403 => Error::Forbidden(failure),
            404 => Error::NotFound(failure),
            409 => Error::Conflict(failure),
            429 => Error::RateLimited {
                failure,
                retry_after,
            },
            500..=599 => Error::ServerError { status, failure },
            _ => Error::RequestFailed { status, failure },
        }
    }

    /// Get the numeric error code
    ///
    /// Error codes are organized by category:
    /// - 100-199: Lifecycle
    /// - 200-299: Configuration
    /// - 300-399: Arguments
    /// - 400-499: Service (mirrors the HTTP status where one exists)
    /// - 500-599: Transport
    /// - 600-699: Payload
    pub fn code(&self) -> i32 {
        match self {
            // Lifecycle (100-199)
            Error::NotInitialized => 100,
            Error::AlreadyInitialized => 101,

            // Configuration (200-299)
            Error::MissingAccessToken => 200,
            Error::InvalidConfig(_) => 201,

            // Arguments (300-399)
            Error::InvalidArgument(_) => 300,

            // Service (400-499)
            Error::BadRequest(_) => 400,
            Error::Unauthorized(_) => 401,
            Error::Forbidden(_) => 403,
            Error::NotFound(_) => 404,
            Error::Conflict(_) => 409,
            Error::RateLimited { .. } => 429,
            Error::RequestFailed { .. } => 499,

            // Transport (500-599)
            Error::ServerError { .. } => 500,
            Error::ConnectionFailed(_) => 501,
            Error::Timeout(_) => 502,

            // Payload (600-699)
            Error::InvalidResponse(_) => 600,
            Error::SerializationError(_) => 601,
            Error::DeserializationError(_) => 602,
        }
    }

    /// HTTP status of the response that produced this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::BadRequest(_) => Some(400),
            Error::Unauthorized(_) => Some(401),
            Error::Forbidden(_) => Some(403),
            Error::NotFound(_) => Some(404),
            Error::Conflict(_) => Some(409),
            Error::RateLimited { .. } => Some(429),
            Error::RequestFailed { status, .. } | Error::ServerError { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Backend failure details, for errors produced by a response
    pub fn service_failure(&self) -> Option<&ServiceFailure> {
        match self {
            Error::BadRequest(f)
            | Error::Unauthorized(f)
            | Error::Forbidden(f)
            | Error::NotFound(f)
            | Error::Conflict(f) => Some(f),
            Error::RateLimited { failure, .. }
            | Error::RequestFailed { failure, .. }
            | Error::ServerError { failure, .. } => Some(failure),
            _ => None,
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors may succeed if the caller retries later. The SDK
    /// itself never retries.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_)
                | Error::ConnectionFailed(_)
                | Error::RateLimited { .. }
                | Error::ServerError { .. }
        )
    }

    /// Check if the backend reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(err.to_string())
        } else if err.is_decode() {
            Error::DeserializationError(err.to_string())
        } else if err.is_builder() && serde_json_source(&err).is_some() {
            Error::SerializationError(err.to_string())
        } else if err.is_builder() {
            Error::InvalidConfig(err.to_string())
        } else {
            Error::ConnectionFailed(err.to_string())
        }
    }
}

/// The JSON error behind a reqwest error, if a request body failed to encode.
fn serde_json_source(err: &reqwest::Error) -> Option<&serde_json::Error> {
    std::error::Error::source(err).and_then(|e| e.downcast_ref::<serde_json::Error>())
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            Error::DeserializationError(err.to_string())
        } else {
            Error::SerializationError(err.to_string())
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::NotInitialized.code(), 100);
        assert_eq!(Error::MissingAccessToken.code(), 200);
        assert_eq!(Error::InvalidArgument("x".into()).code(), 300);
        assert_eq!(Error::NotFound(ServiceFailure::default()).code(), 404);
        assert_eq!(Error::Timeout("x".into()).code(), 502);
        assert_eq!(Error::InvalidResponse("x".into()).code(), 600);
        assert_eq!(Error::SerializationError("x".into()).code(), 601);
    }

    #[test]
    fn test_from_status() {
        let failure = ServiceFailure::new("nope");
        assert!(matches!(
            Error::from_status(400, failure.clone(), None),
            Error::BadRequest(_)
        ));
        assert!(Error::from_status(404, failure.clone(), None).is_not_found());
        assert!(matches!(
            Error::from_status(409, failure.clone(), None),
            Error::Conflict(_)
        ));
        assert!(matches!(
            Error::from_status(429, failure.clone(), Some(30)),
            Error::RateLimited {
                retry_after: Some(30),
                ..
            }
        ));
        assert!(matches!(
            Error::from_status(503, failure.clone(), None),
            Error::ServerError { status: 503, .. }
        ));
        assert!(matches!(
            Error::from_status(418, failure, None),
            Error::RequestFailed { status: 418, .. }
        ));
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(Error::Timeout("slow".into()).is_recoverable());
        assert!(Error::from_status(502, ServiceFailure::default(), None).is_recoverable());
        assert!(Error::from_status(429, ServiceFailure::default(), None).is_recoverable());
        assert!(!Error::from_status(404, ServiceFailure::default(), None).is_recoverable());
        assert!(!Error::MissingAccessToken.is_recoverable());
    }

    #[test]
    fn test_service_failure_display_includes_tracking_id() {
        let err = Error::NotFound(ServiceFailure {
            message: "The requested resource could not be found.".into(),
            tracking_id: Some("ROUTER_123".into()),
        });
        let text = err.to_string();
        assert!(text.contains("could not be found"));
        assert!(text.contains("ROUTER_123"));
        assert_eq!(err.status(), Some(404));
        assert_eq!(
            err.service_failure().and_then(|f| f.tracking_id.as_deref()),
            Some("ROUTER_123")
        );
    }

    #[test]
    fn test_malformed_json_is_deserialization_error() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::DeserializationError(_)));

        let err: Error = serde_json::from_str::<u32>("\"seven\"").unwrap_err().into();
        assert!(matches!(err, Error::DeserializationError(_)));
    }

    #[test]
    fn test_local_errors_have_no_status() {
        assert_eq!(Error::InvalidArgument("empty id".into()).status(), None);
        assert!(Error::InvalidArgument("empty id".into())
            .service_failure()
            .is_none());
    }
}
