// # Error Classifier
//
// Turns whatever a remote call failed with into a `ClassifiedError`.
//
// Remote service errors are matched on their exact error code against a
// fixed table; unknown codes fall back to `Generic`. Failures that never
// reached the service (credentials, SDK, transport) carry no remote code.
// Already-classified errors pass through untouched, so classifying twice is
// the same as classifying once.

use crate::error::{ClassifiedError, ErrorKind};

/// A failure reported by a remote-call operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteFailure {
    /// The remote API answered with an error code
    Service { code: String, message: String },

    /// Credentials were missing (`partial == false`) or incomplete
    Credentials { message: String, partial: bool },

    /// The client library failed before or after the request
    Sdk(String),

    /// Network-level failure without a remote error code
    Transport(String),

    /// Already classified; passes through unchanged
    Classified(ClassifiedError),

    /// Anything else
    Other(String),
}

impl RemoteFailure {
    /// Shorthand for a service error
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        RemoteFailure::Service {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<ClassifiedError> for RemoteFailure {
    fn from(err: ClassifiedError) -> Self {
        RemoteFailure::Classified(err)
    }
}

impl From<std::io::Error> for RemoteFailure {
    fn from(err: std::io::Error) -> Self {
        RemoteFailure::Transport(err.to_string())
    }
}

impl From<anyhow::Error> for RemoteFailure {
    fn from(err: anyhow::Error) -> Self {
        RemoteFailure::Other(format!("{:#}", err))
    }
}

/// Remote error codes with a dedicated kind
const CODE_TABLE: &[(&str, ErrorKind)] = &[
    ("NoSuchHostedZone", ErrorKind::NotFound),
    ("NoSuchChange", ErrorKind::NotFound),
    ("InvalidInput", ErrorKind::Validation),
    ("InvalidChangeBatch", ErrorKind::Validation),
    ("InvalidDomainName", ErrorKind::Validation),
    ("AccessDenied", ErrorKind::PermissionDenied),
    ("AccessDeniedException", ErrorKind::PermissionDenied),
    ("Throttling", ErrorKind::Throttled),
    ("ThrottlingException", ErrorKind::Throttled),
    ("PriorRequestNotComplete", ErrorKind::Throttled),
];

/// Kind for a remote error code; unknown codes map to `Generic`
pub fn kind_for_code(code: &str) -> ErrorKind {
    CODE_TABLE
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, kind)| *kind)
        .unwrap_or(ErrorKind::Generic)
}

/// Classify a remote error code and message
///
/// Pure: identical inputs always produce identical output, and no input
/// panics.
pub fn classify_code(code: &str, message: &str) -> ClassifiedError {
    ClassifiedError::new(kind_for_code(code), message, code)
}

/// Classify any remote-call failure
pub fn classify(failure: RemoteFailure) -> ClassifiedError {
    match failure {
        RemoteFailure::Service { code, message } => classify_code(&code, &message),
        RemoteFailure::Credentials { message, partial } => {
            let prefix = if partial {
                "Incomplete credentials"
            } else {
                "Credentials not configured"
            };
            ClassifiedError::credentials(format!("{}: {}", prefix, message))
        }
        RemoteFailure::Sdk(message) => ClassifiedError::generic(format!("SDK error: {}", message)),
        RemoteFailure::Transport(message) => {
            ClassifiedError::generic(format!("Transport error: {}", message))
        }
        RemoteFailure::Classified(err) => err,
        RemoteFailure::Other(message) => {
            ClassifiedError::generic(format!("Unexpected error: {}", message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        let cases = [
            ("NoSuchHostedZone", ErrorKind::NotFound),
            ("InvalidInput", ErrorKind::Validation),
            ("AccessDenied", ErrorKind::PermissionDenied),
            ("Throttling", ErrorKind::Throttled),
        ];

        for (code, kind) in cases {
            let err = classify_code(code, "boom");
            assert_eq!(err.kind(), kind, "code {}", code);
            assert_eq!(err.remote_code(), code);
            assert_eq!(err.message(), "boom");
        }
    }

    #[test]
    fn test_unknown_code_is_generic() {
        let err = classify_code("ServiceUnavailable", "try later");
        assert_eq!(err.kind(), ErrorKind::Generic);
        assert_eq!(err.remote_code(), "ServiceUnavailable");

        let err = classify_code("", "");
        assert_eq!(err.kind(), ErrorKind::Generic);
    }

    #[test]
    fn test_codes_match_exactly() {
        assert_eq!(kind_for_code("throttling"), ErrorKind::Generic);
        assert_eq!(kind_for_code("Throttling "), ErrorKind::Generic);
    }

    #[test]
    fn test_credentials_failures() {
        let missing = classify(RemoteFailure::Credentials {
            message: "no profile".to_string(),
            partial: false,
        });
        assert_eq!(missing.kind(), ErrorKind::Credentials);
        assert!(missing.kind().is_generic());
        assert!(missing.message().contains("not configured"));
        assert!(missing.message().contains("no profile"));

        let partial = classify(RemoteFailure::Credentials {
            message: "secret key missing".to_string(),
            partial: true,
        });
        assert!(partial.message().starts_with("Incomplete credentials"));
    }

    #[test]
    fn test_transport_and_unexpected_preserve_message() {
        let transport = classify(RemoteFailure::Transport("connection reset".to_string()));
        assert_eq!(transport.kind(), ErrorKind::Generic);
        assert!(transport.message().contains("connection reset"));
        assert_eq!(transport.remote_code(), "");

        let other = classify(RemoteFailure::Other("index out of range".to_string()));
        assert!(other.message().contains("index out of range"));

        let sdk = classify(RemoteFailure::Sdk("bad endpoint".to_string()));
        assert!(sdk.message().contains("bad endpoint"));
    }

    #[test]
    fn test_classified_passes_through() {
        let original = ClassifiedError::new(ErrorKind::Throttled, "slow down", "Throttling");
        let again = classify(RemoteFailure::from(original.clone()));
        assert_eq!(again, original);
    }

    #[test]
    fn test_io_error_is_transport() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "read timed out");
        let err = classify(io.into());
        assert_eq!(err.kind(), ErrorKind::Generic);
        assert!(err.message().contains("read timed out"));
    }
}
