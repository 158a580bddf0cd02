//! Typed status errors shared by the test-file parser, the options parser,
//! the modes-aware output model and the driver.
//!
//! Every fallible routine in those crates returns [`Result`] and propagates
//! with `?`. The [`ErrorKind`] set is deliberately small and stable; callers
//! that need to branch on failure class match on the kind, everything else
//! just renders the message.

use std::fmt;

use thiserror::Error;

/// Failure class attached to every [`StatusError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input: bad test-file syntax, unclosed brackets, invalid
    /// mode headers.
    InvalidArgument,
    /// A referenced file or entry does not exist.
    NotFound,
    /// An operation was attempted on a value in the wrong state.
    FailedPrecondition,
    /// The underlying OS refused access.
    PermissionDenied,
    /// An internal invariant was broken. Always a bug in this crate family.
    Internal,
    /// Errors without a more precise class: unknown option keywords,
    /// conflicting recorded outputs.
    Unknown,
    /// The requested operation is not implemented.
    Unimplemented,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::NotFound => "not found",
            ErrorKind::FailedPrecondition => "failed precondition",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::Internal => "internal",
            ErrorKind::Unknown => "unknown",
            ErrorKind::Unimplemented => "unimplemented",
        };
        f.write_str(name)
    }
}

/// An error with a failure class and a human-readable message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct StatusError {
    kind: ErrorKind,
    message: String,
}

impl StatusError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FailedPrecondition, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    pub fn unimplemented(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unimplemented, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Appends context to the message, keeping the kind. Used where the
    /// caller knows the file or test part a lower-level failure refers to.
    #[must_use]
    pub fn with_context(mut self, context: impl AsRef<str>) -> Self {
        self.message.push('\n');
        self.message.push_str(context.as_ref());
        self
    }
}

impl From<std::io::Error> for StatusError {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::Internal,
        };
        Self::new(kind, err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StatusError>;

/// Returns an `Internal` error when `cond` is false. The library-code
/// equivalent of a debug assertion; invariant breaches surface as errors
/// instead of panics.
#[macro_export]
macro_rules! ensure_internal {
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::StatusError::internal(format!($($arg)*)));
        }
    };
}
