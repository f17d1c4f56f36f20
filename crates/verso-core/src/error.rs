//! Common error type definitions.

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
///
/// Commonly used as a source error in the structured [`Error`] type, wrapping
/// any error that implements the standard `Error` trait while maintaining
/// Send and Sync bounds.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of errors that can occur in verso operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid or rejected credentials.
    Authentication,
    /// Credentials lack the required permission level.
    Authorization,
    /// Repository, branch, or file absent. Several flows treat this as an
    /// empty result rather than a failure, so it must stay distinguishable
    /// from other HTTP failures.
    NotFound,
    /// Response content-type or body does not match the requested format.
    Parse,
    /// Malformed pagination token.
    CursorValidation,
    /// Transport-level failure, no response received.
    Network,
    /// Timeout occurred.
    Timeout,
    /// Invalid configuration, e.g. fork mode without the editorial workflow.
    Configuration,
    /// Serialization/deserialization error.
    Serialization,
    /// The provider returned an error status.
    ExternalError,
    /// The provider does not implement the requested optional operation.
    Unsupported,
    /// Unknown error occurred.
    Unknown,
}

/// A structured error type for verso operations.
#[derive(Debug, Error)]
#[error("{kind:?}{}", message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Creates a new authentication error.
    pub fn authentication() -> Self {
        Self::new(ErrorKind::Authentication)
    }

    /// Creates a new authorization error.
    pub fn authorization() -> Self {
        Self::new(ErrorKind::Authorization)
    }

    /// Creates a new not found error.
    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }

    /// Creates a new parse error.
    pub fn parse() -> Self {
        Self::new(ErrorKind::Parse)
    }

    /// Creates a new cursor validation error.
    pub fn cursor_validation() -> Self {
        Self::new(ErrorKind::CursorValidation)
    }

    /// Creates a new network error.
    pub fn network() -> Self {
        Self::new(ErrorKind::Network)
    }

    /// Creates a new timeout error.
    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout)
    }

    /// Creates a new configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Creates a new serialization error.
    pub fn serialization() -> Self {
        Self::new(ErrorKind::Serialization)
    }

    /// Creates a new external error.
    pub fn external() -> Self {
        Self::new(ErrorKind::ExternalError)
    }

    /// Creates a new unsupported operation error.
    pub fn unsupported() -> Self {
        Self::new(ErrorKind::Unsupported)
    }

    /// Creates a new unknown error.
    pub fn unknown() -> Self {
        Self::new(ErrorKind::Unknown)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns true if this error represents an absent resource.
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    /// Returns true if the provider does not support the operation.
    pub fn is_unsupported(&self) -> bool {
        self.kind == ErrorKind::Unsupported
    }

    /// Returns true if this error represents insufficient permissions.
    pub fn is_authorization(&self) -> bool {
        self.kind == ErrorKind::Authorization
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization()
            .with_message(err.to_string())
            .with_source(err)
    }
}
