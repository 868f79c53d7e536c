//! Mapping between [`IamRuntimeError`] and gRPC statuses.
//!
//! | Error | Code |
//! |---|---|
//! | `Unauthenticated` | `UNAUTHENTICATED` |
//! | `PermissionDenied` | `PERMISSION_DENIED` |
//! | `InvalidArgument` | `INVALID_ARGUMENT` |
//! | `Unavailable` | `UNAVAILABLE` (also decoded from `DEADLINE_EXCEEDED`, `CANCELLED`, `RESOURCE_EXHAUSTED`) |
//! | `Internal` | `INTERNAL` (also decoded from every other code) |

use tonic::{Code, Status};

use crate::error::IamRuntimeError;

impl From<IamRuntimeError> for Status {
    fn from(e: IamRuntimeError) -> Self {
        match e {
            IamRuntimeError::Unauthenticated(msg) => Self::unauthenticated(msg),
            IamRuntimeError::PermissionDenied(msg) => Self::permission_denied(msg),
            IamRuntimeError::InvalidArgument(msg) => Self::invalid_argument(msg),
            IamRuntimeError::Unavailable(msg) => Self::unavailable(msg),
            IamRuntimeError::Internal(msg) => Self::internal(msg),
        }
    }
}

impl From<Status> for IamRuntimeError {
    fn from(status: Status) -> Self {
        let msg = if status.message().is_empty() {
            status.code().description().to_owned()
        } else {
            status.message().to_owned()
        };

        match status.code() {
            Code::Unauthenticated => Self::Unauthenticated(msg),
            Code::PermissionDenied => Self::PermissionDenied(msg),
            Code::InvalidArgument => Self::InvalidArgument(msg),
            Code::Unavailable
            | Code::DeadlineExceeded
            | Code::Cancelled
            | Code::ResourceExhausted => Self::Unavailable(msg),
            code => Self::Internal(format!("{}: {msg}", code.description())),
        }
    }
}
