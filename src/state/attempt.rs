/// Attempt-level state definitions
///
/// This module defines what a single probe attempt can come back with.
use std::fmt;

/// Classified transport-level failure of one attempt
///
/// These never abort a run; they feed the fix-plan engine like any other
/// failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// The request did not complete within the configured timeout
    Timeout,

    /// The remote end (or the proxy) refused the connection
    ConnectionRefused,

    /// Name resolution failed
    HostNotFound,

    /// The connection was reset mid-flight
    ConnectionReset,

    /// The TLS certificate could not be validated
    CertificateError,

    /// Any other transport failure
    Unclassified,
}

impl TransportErrorKind {
    /// Returns true for failures that suggest the host variant itself is wrong
    ///
    /// The fix plan answers these by regenerating the full candidate list.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            Self::ConnectionRefused | Self::HostNotFound | Self::ConnectionReset
        )
    }

    /// Converts the error kind to its database/report label
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Timeout => "TIMEOUT",
            Self::ConnectionRefused => "CONNECTION_REFUSED",
            Self::HostNotFound => "HOST_NOT_FOUND",
            Self::ConnectionReset => "CONNECTION_RESET",
            Self::CertificateError => "SSL_ERROR",
            Self::Unclassified => "ERROR",
        }
    }

    /// Parses an error kind from its database label
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "TIMEOUT" => Some(Self::Timeout),
            "CONNECTION_REFUSED" => Some(Self::ConnectionRefused),
            "HOST_NOT_FOUND" => Some(Self::HostNotFound),
            "CONNECTION_RESET" => Some(Self::ConnectionReset),
            "SSL_ERROR" => Some(Self::CertificateError),
            "ERROR" => Some(Self::Unclassified),
            _ => None,
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// What one attempt produced: an HTTP status or a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptKind {
    Http(u16),
    Transport(TransportErrorKind),
}

impl AttemptKind {
    /// The HTTP status, if a response was received at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(status) => Some(*status),
            Self::Transport(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Http(200))
    }
}

/// Result of a single outbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptResult {
    pub kind: AttemptKind,

    /// Raw `Location` header of a 3xx response
    pub redirect_location: Option<String>,

    /// Title or leading body text; only filled for HTTP 200
    pub snippet: String,
}

impl AttemptResult {
    pub fn http(status: u16) -> Self {
        Self {
            kind: AttemptKind::Http(status),
            redirect_location: None,
            snippet: String::new(),
        }
    }

    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self {
            kind: AttemptKind::Http(status),
            redirect_location: Some(location.into()),
            snippet: String::new(),
        }
    }

    pub fn success(snippet: impl Into<String>) -> Self {
        Self {
            kind: AttemptKind::Http(200),
            redirect_location: None,
            snippet: snippet.into(),
        }
    }

    pub fn transport(kind: TransportErrorKind) -> Self {
        Self {
            kind: AttemptKind::Transport(kind),
            redirect_location: None,
            snippet: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_kind_roundtrip() {
        for kind in [
            TransportErrorKind::Timeout,
            TransportErrorKind::ConnectionRefused,
            TransportErrorKind::HostNotFound,
            TransportErrorKind::ConnectionReset,
            TransportErrorKind::CertificateError,
            TransportErrorKind::Unclassified,
        ] {
            assert_eq!(
                TransportErrorKind::from_db_string(kind.to_db_string()),
                Some(kind)
            );
        }
        assert_eq!(TransportErrorKind::from_db_string("nope"), None);
    }

    #[test]
    fn test_connection_failures() {
        assert!(TransportErrorKind::ConnectionRefused.is_connection_failure());
        assert!(TransportErrorKind::HostNotFound.is_connection_failure());
        assert!(TransportErrorKind::ConnectionReset.is_connection_failure());
        assert!(!TransportErrorKind::Timeout.is_connection_failure());
        assert!(!TransportErrorKind::CertificateError.is_connection_failure());
    }

    #[test]
    fn test_attempt_kind_status() {
        assert_eq!(AttemptKind::Http(301).status(), Some(301));
        assert_eq!(
            AttemptKind::Transport(TransportErrorKind::Timeout).status(),
            None
        );
        assert!(AttemptResult::success("Home").kind.is_success());
        assert!(!AttemptResult::http(204).kind.is_success());
    }
}
