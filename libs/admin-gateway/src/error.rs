use admin_http::{ErrorKind, HttpError};
use thiserror::Error;

/// The only error a gateway call returns.
///
/// Every other failure is folded into a `code: -1` envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("request cancelled")]
    Cancelled,
}

/// Errors raised while constructing a gateway.
#[derive(Debug, Error)]
pub enum GatewayBuildError {
    #[error("invalid {field} '{value}': {source}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{field} must be an http:// or https:// URL, got '{value}'")]
    UnsupportedScheme { field: &'static str, value: String },

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] HttpError),
}

/// Coarse category a normalized transport failure falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Non-2xx response
    Status,
    Timeout,
    /// Connection, DNS or TLS failure
    Network,
    /// Anything else (bad request input, decode error, overload)
    Other,
}

impl FailureClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Other => "other",
        }
    }
}

/// Classify a transport error by its typed kind.
#[must_use]
pub fn classify(err: &HttpError) -> FailureClass {
    match err.kind() {
        ErrorKind::Status => FailureClass::Status,
        ErrorKind::Timeout => FailureClass::Timeout,
        ErrorKind::Network => FailureClass::Network,
        _ => FailureClass::Other,
    }
}
