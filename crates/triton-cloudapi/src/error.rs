//! Error taxonomy for CloudAPI operations.
//!
//! Every failure a caller can see maps to one [`Error`] variant. Variants
//! carry the server status and the original response body where one exists,
//! and [`Error::name`] gives the stable taxonomy name (`ResourceNotFoundError`,
//! `<code>Error` for server envelopes, ...).

use serde_json::Value;
use thiserror::Error;
use triton_auth::AuthError;

/// Result type alias for CloudAPI operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the client stack.
#[derive(Debug, Error)]
pub enum Error {
    /// The request could not be signed.
    #[error("signing error: {0}")]
    Signing(#[from] AuthError),

    /// The request never produced a response.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
        /// True if the failure was a timeout.
        timeout: bool,
    },

    /// TLS verification failed against a self-signed certificate.
    #[error(
        "TLS error connecting to {url}: {message} (the server may use a self-signed certificate; set \"insecure\": true in the profile to skip verification)"
    )]
    SelfSignedCert {
        /// Endpoint that was contacted.
        url: String,
        /// Underlying TLS message.
        message: String,
    },

    /// The decoded body length differs from `Content-Length`.
    #[error("incomplete content: expected {expected} bytes, received {received}")]
    IncompleteContent {
        /// Declared length.
        expected: u64,
        /// Observed length.
        received: u64,
    },

    /// The body digest differs from `Content-MD5`.
    #[error("bad digest: Content-MD5 {expected}, body hashes to {actual}")]
    BadDigest {
        /// Digest declared by the server.
        expected: String,
        /// Digest of the decoded body.
        actual: String,
    },

    /// The body could not be parsed as JSON.
    #[error("invalid content: {message}")]
    InvalidContent {
        /// Parse failure.
        message: String,
        /// Raw body.
        original_body: Option<String>,
    },

    /// The server answered with an error envelope (`{code, message}`).
    #[error("{message}")]
    Server {
        /// Server error code, e.g. `ResourceNotFound`.
        code: String,
        /// HTTP status.
        status: u16,
        /// Server message.
        message: String,
        /// Parsed error body.
        body: Option<Value>,
        /// Raw error body.
        original_body: Option<String>,
    },

    /// The server answered with an error status and no envelope.
    #[error("{message}")]
    Http {
        /// HTTP status.
        status: u16,
        /// Server message or the status reason.
        message: String,
        /// Parsed body, if any.
        body: Option<Value>,
        /// Raw body.
        original_body: Option<String>,
    },

    /// No resource matched an identifier.
    #[error("{message}")]
    ResourceNotFound {
        /// Description naming the identifier.
        message: String,
    },

    /// More than one resource matched an identifier.
    #[error("{message}")]
    AmbiguousIdentifier {
        /// Description naming the identifier.
        message: String,
        /// Ids of the matching resources.
        candidates: Vec<String>,
    },

    /// The instance exists only as a tombstone (410 Gone).
    #[error("instance {id} was deleted")]
    InstanceDeleted {
        /// Instance id.
        id: String,
        /// Partial instance body returned with the 410.
        body: Option<Value>,
    },

    /// A wait did not reach its target state in time.
    #[error("timeout: {message} (after {elapsed_secs:.1}s)")]
    Timeout {
        /// What was being waited for.
        message: String,
        /// Seconds spent waiting.
        elapsed_secs: f64,
    },

    /// Caller input was rejected before any request was made.
    #[error("{message}")]
    Usage {
        /// Description of the problem.
        message: String,
    },

    /// An unexpected server or client state.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the problem.
        message: String,
    },

    /// Several concurrent sub-operations failed.
    #[error("{} errors: {}", .0.len(), join_messages(.0))]
    Multi(Vec<Error>),
}

fn join_messages(errors: &[Error]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Creates a `Usage` error.
    #[must_use]
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Creates an `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a `ResourceNotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            message: message.into(),
        }
    }

    /// Creates an `AmbiguousIdentifier` error.
    #[must_use]
    pub fn ambiguous(message: impl Into<String>, candidates: Vec<String>) -> Self {
        Self::AmbiguousIdentifier {
            message: message.into(),
            candidates,
        }
    }

    /// Creates a `Transport` error.
    #[must_use]
    pub fn transport(message: impl Into<String>, timeout: bool) -> Self {
        Self::Transport {
            message: message.into(),
            timeout,
        }
    }

    /// Folds a list of failures: none is `Ok`, one is returned as is, more
    /// become `Multi`.
    pub fn from_many(mut errors: Vec<Error>) -> Result<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Self::Multi(errors)),
        }
    }

    /// Taxonomy name of the error.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Signing(_) => "SigningError".to_string(),
            Self::Transport { .. } => "TransportError".to_string(),
            Self::SelfSignedCert { .. } => "SelfSignedCertError".to_string(),
            Self::IncompleteContent { .. } => "IncompleteContentError".to_string(),
            Self::BadDigest { .. } => "BadDigestError".to_string(),
            Self::InvalidContent { .. } => "InvalidContentError".to_string(),
            Self::Server { code, .. } => error_name_for_code(code),
            Self::Http { .. } => "HttpError".to_string(),
            Self::ResourceNotFound { .. } => "ResourceNotFoundError".to_string(),
            Self::AmbiguousIdentifier { .. } => "AmbiguousIdentifierError".to_string(),
            Self::InstanceDeleted { .. } => "InstanceDeletedError".to_string(),
            Self::Timeout { .. } => "TimeoutError".to_string(),
            Self::Usage { .. } => "UsageError".to_string(),
            Self::Internal { .. } => "InternalError".to_string(),
            Self::Multi(_) => "MultiError".to_string(),
        }
    }

    /// HTTP status behind the error, if there was a response.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } | Self::Http { status, .. } => Some(*status),
            Self::InstanceDeleted { .. } => Some(410),
            _ => None,
        }
    }

    /// Raw response body attached to the error.
    #[must_use]
    pub fn original_body(&self) -> Option<&str> {
        match self {
            Self::Server { original_body, .. }
            | Self::Http { original_body, .. }
            | Self::InvalidContent { original_body, .. } => original_body.as_deref(),
            _ => None,
        }
    }

    /// Parsed response body attached to the error.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        match self {
            Self::Server { body, .. } | Self::Http { body, .. } | Self::InstanceDeleted { body, .. } => {
                body.as_ref()
            }
            _ => None,
        }
    }

    /// Server error code, for envelope errors.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Server { code, .. } => Some(code),
            _ => None,
        }
    }

    /// True if the error means "no such resource".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::ResourceNotFound { .. } => true,
            Self::Server { code, status, .. } => *status == 404 || code == "ResourceNotFound",
            Self::Http { status, .. } => *status == 404,
            _ => false,
        }
    }

    /// True for 410 Gone responses and tombstoned instances.
    #[must_use]
    pub const fn is_gone(&self) -> bool {
        matches!(self, Self::InstanceDeleted { .. }) || matches!(self.status_code(), Some(410))
    }

    /// True for failures a poll loop may ride out (gateway errors and
    /// transport timeouts).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport { timeout, .. } => *timeout,
            _ => matches!(self.status_code(), Some(502..=504)),
        }
    }
}

/// `<code>Error`, appending the suffix only when missing.
#[must_use]
pub fn error_name_for_code(code: &str) -> String {
    if code.ends_with("Error") {
        code.to_string()
    } else {
        format!("{code}Error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn server(code: &str, status: u16) -> Error {
        Error::Server {
            code: code.to_string(),
            status,
            message: "boom".to_string(),
            body: None,
            original_body: Some("{\"code\":\"x\"}".to_string()),
        }
    }

    #[test_case("ResourceNotFound", "ResourceNotFoundError" ; "suffix appended")]
    #[test_case("ValidationFailedError", "ValidationFailedError" ; "suffix kept")]
    #[test_case("InvalidArgument", "InvalidArgumentError" ; "other code")]
    fn test_error_name_for_code(code: &str, expected: &str) {
        assert_eq!(error_name_for_code(code), expected);
        assert_eq!(server(code, 409).name(), expected);
    }

    #[test]
    fn test_not_found_detection() {
        assert!(server("ResourceNotFound", 404).is_not_found());
        assert!(server("Whatever", 404).is_not_found());
        assert!(!server("Conflict", 409).is_not_found());
        assert!(Error::not_found("no such instance").is_not_found());
        assert!(
            Error::Http {
                status: 404,
                message: "Not Found".to_string(),
                body: None,
                original_body: None,
            }
            .is_not_found()
        );
    }

    #[test]
    fn test_transient_detection() {
        assert!(server("ServiceUnavailable", 503).is_transient());
        assert!(server("BadGateway", 502).is_transient());
        assert!(!server("InternalError", 500).is_transient());
        assert!(Error::transport("timed out", true).is_transient());
        assert!(!Error::transport("connection refused", false).is_transient());
    }

    #[test]
    fn test_original_body_and_status() {
        let err = server("Conflict", 409);
        assert_eq!(err.status_code(), Some(409));
        assert_eq!(err.original_body(), Some("{\"code\":\"x\"}"));
        assert_eq!(err.code(), Some("Conflict"));
        assert_eq!(Error::usage("bad").status_code(), None);
    }

    #[test]
    fn test_from_many() {
        assert!(Error::from_many(Vec::new()).is_ok());
        let one = Error::from_many(vec![Error::usage("a")]).expect_err("one error");
        assert_eq!(one.name(), "UsageError");
        let many = Error::from_many(vec![Error::usage("a"), Error::internal("b")])
            .expect_err("two errors");
        assert_eq!(many.name(), "MultiError");
        assert_eq!(many.to_string(), "2 errors: a; internal error: b");
    }

    #[test]
    fn test_instance_deleted_is_gone() {
        let err = Error::InstanceDeleted {
            id: "abc".to_string(),
            body: Some(serde_json::json!({"state": "deleted"})),
        };
        assert!(err.is_gone());
        assert_eq!(err.status_code(), Some(410));
        assert_eq!(err.name(), "InstanceDeletedError");
        assert!(err.body().is_some());
    }
}
