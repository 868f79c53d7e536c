//! gRPC services of the IAM runtime.
//!
//! Each service translates between the wire messages and the domain service
//! and applies the configured [`ProtocolStyle`]: under `error_signal` an
//! invalid credential or a denial is a status, under `field_signal` it is the
//! `result` field of a successful response.

mod authentication;
mod authorization;
mod identity;

use iam_runtime_sdk::{IamRuntimeError, ProtocolStyle};
use tonic::Status;

use crate::domain::DomainError;

pub use authentication::AuthenticationService;
pub use authorization::AuthorizationService;
pub use identity::IdentityService;

fn to_status(op: &str, e: DomainError) -> Status {
    match &e {
        DomainError::BackendUnavailable(_)
        | DomainError::DecisionCountMismatch { .. }
        | DomainError::Internal(_) => {
            tracing::error!(operation = op, error = %e, "Request failed");
        }
        _ => tracing::debug!(operation = op, error = %e, "Request rejected"),
    }
    IamRuntimeError::from(e).into()
}

/// Whether a domain outcome is reported as a response field under `style`.
fn is_field_signal(style: ProtocolStyle) -> bool {
    style == ProtocolStyle::FieldSignal
}
