//! Domain errors for the IAM runtime.

use iam_runtime_sdk::{AccessRequestAction, IamRuntimeError};

/// Internal domain errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("credential is empty")]
    EmptyCredential,

    #[error("credential is invalid")]
    InvalidCredential,

    #[error("access denied: {}", format_denied(.denied))]
    AccessDenied { denied: Vec<AccessRequestAction> },

    #[error("{0}")]
    Validation(String),

    #[error("backend returned {got} decisions for {expected} actions")]
    DecisionCountMismatch { expected: usize, got: usize },

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

fn format_denied(denied: &[AccessRequestAction]) -> String {
    if denied.is_empty() {
        return "backend refused the request".to_owned();
    }
    denied
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<IamRuntimeError> for DomainError {
    fn from(e: IamRuntimeError) -> Self {
        match e {
            IamRuntimeError::Unauthenticated(_) => Self::InvalidCredential,
            IamRuntimeError::PermissionDenied(_) => Self::AccessDenied { denied: Vec::new() },
            IamRuntimeError::InvalidArgument(msg) => Self::Validation(msg),
            IamRuntimeError::Unavailable(msg) => Self::BackendUnavailable(msg),
            IamRuntimeError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<DomainError> for IamRuntimeError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::EmptyCredential | DomainError::InvalidCredential => {
                Self::Unauthenticated(e.to_string())
            }
            DomainError::AccessDenied { .. } => Self::PermissionDenied(e.to_string()),
            DomainError::Validation(msg) => Self::InvalidArgument(msg),
            DomainError::BackendUnavailable(msg) => Self::Unavailable(msg),
            DomainError::DecisionCountMismatch { .. } | DomainError::Internal(_) => {
                Self::Internal(e.to_string())
            }
        }
    }
}
