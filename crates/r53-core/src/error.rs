//! Error types for hosted-zone automation
//!
//! Every failure that leaves this crate is a [`ClassifiedError`]: a closed
//! [`ErrorKind`] plus the message and error code reported by the remote API.
//! Callers pick their retry policy from the kind alone.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for hosted-zone operations
pub type Result<T> = std::result::Result<T, ClassifiedError>;

/// Closed set of failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Target resource is absent (hosted zone, change, record)
    NotFound,
    /// Caller-supplied input is malformed
    Validation,
    /// Authorization failure on the remote side
    PermissionDenied,
    /// The remote API asked us to slow down
    Throttled,
    /// A local deadline expired (limiter capacity or polling)
    Timeout,
    /// Credentials missing or incomplete in the calling layer
    Credentials,
    /// Anything else, including transport and SDK failures
    Generic,
}

impl ErrorKind {
    /// Whether retrying the same call unchanged can reasonably succeed
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Throttled | ErrorKind::Timeout)
    }

    /// `Credentials` is reported as a sub-case of `Generic`
    pub fn is_generic(self) -> bool {
        matches!(self, ErrorKind::Generic | ErrorKind::Credentials)
    }

    /// Stable lowercase name, used in logs
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::Throttled => "throttled",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Credentials => "credentials",
            ErrorKind::Generic => "generic",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote or local failure normalized into an [`ErrorKind`]
///
/// The original remote code and message are kept verbatim. The value is
/// immutable once built; accessors only borrow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", render(.kind, .message, .remote_code))]
pub struct ClassifiedError {
    kind: ErrorKind,
    message: String,
    remote_code: String,
}

fn render(kind: &ErrorKind, message: &str, remote_code: &str) -> String {
    if remote_code.is_empty() {
        format!("{}: {}", kind, message)
    } else {
        format!("{} [{}]: {}", kind, remote_code, message)
    }
}

impl ClassifiedError {
    /// Build an error with an explicit kind and remote code
    pub fn new(kind: ErrorKind, message: impl Into<String>, remote_code: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            remote_code: remote_code.into(),
        }
    }

    /// Create a "not found" error without a remote code
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg, "")
    }

    /// Create a validation error without a remote code
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, msg, "")
    }

    /// Create a permission error without a remote code
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::PermissionDenied, msg, "")
    }

    /// Create a throttling error without a remote code
    pub fn throttled(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Throttled, msg, "")
    }

    /// Create a local timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, msg, "")
    }

    /// Create a credentials error
    pub fn credentials(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Credentials, msg, "")
    }

    /// Create a generic error
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Generic, msg, "")
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Error code reported by the remote API; empty for local failures
    pub fn remote_code(&self) -> &str {
        &self.remote_code
    }

    pub fn is_throttle(&self) -> bool {
        self.kind == ErrorKind::Throttled
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<std::io::Error> for ClassifiedError {
    fn from(err: std::io::Error) -> Self {
        Self::generic(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for ClassifiedError {
    fn from(err: serde_json::Error) -> Self {
        Self::generic(format!("JSON error: {}", err))
    }
}

/// Helper for converting anyhow::Error to our error type
impl From<anyhow::Error> for ClassifiedError {
    fn from(err: anyhow::Error) -> Self {
        Self::generic(err.to_string())
    }
}
