//! Error types for the IAM runtime.

use thiserror::Error;

/// Semantic class of an [`IamRuntimeError`].
///
/// Callers branch on the class, never on the message: conflating "don't know"
/// (`Infrastructure`) with "no" (`Authorization`) is a correctness bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The credential does not resolve to a subject.
    Authentication,
    /// The subject lacks permission for one or more requested actions.
    Authorization,
    /// The request is malformed.
    Validation,
    /// The runtime or its backend could not answer.
    Infrastructure,
}

/// Errors returned by every IAM runtime contract, client and backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IamRuntimeError {
    /// The credential is empty, invalid or expired.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The subject was resolved but is not allowed to perform every action.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The request is malformed (e.g. an empty resource ID).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The runtime or its backend is unreachable or not ready.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IamRuntimeError {
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Unauthenticated(_) => ErrorClass::Authentication,
            Self::PermissionDenied(_) => ErrorClass::Authorization,
            Self::InvalidArgument(_) => ErrorClass::Validation,
            Self::Unavailable(_) | Self::Internal(_) => ErrorClass::Infrastructure,
        }
    }

    /// Whether the caller may retry the same request with backoff.
    ///
    /// Only infrastructure failures qualify: no side effect is guaranteed to
    /// have happened, and the answer may change once the runtime recovers.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Infrastructure
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn classes_are_distinct_per_variant_family() {
        assert_eq!(
            IamRuntimeError::Unauthenticated(String::new()).class(),
            ErrorClass::Authentication
        );
        assert_eq!(
            IamRuntimeError::PermissionDenied(String::new()).class(),
            ErrorClass::Authorization
        );
        assert_eq!(
            IamRuntimeError::InvalidArgument(String::new()).class(),
            ErrorClass::Validation
        );
        assert_eq!(
            IamRuntimeError::Unavailable(String::new()).class(),
            ErrorClass::Infrastructure
        );
        assert_eq!(
            IamRuntimeError::Internal(String::new()).class(),
            ErrorClass::Infrastructure
        );
    }

    #[test]
    fn only_infrastructure_failures_are_retryable() {
        assert!(IamRuntimeError::Unavailable("down".to_owned()).is_retryable());
        assert!(IamRuntimeError::Internal("boom".to_owned()).is_retryable());
        assert!(!IamRuntimeError::Unauthenticated("who?".to_owned()).is_retryable());
        assert!(!IamRuntimeError::PermissionDenied("no".to_owned()).is_retryable());
        assert!(!IamRuntimeError::InvalidArgument("bad".to_owned()).is_retryable());
    }
}
