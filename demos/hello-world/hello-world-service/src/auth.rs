//! Credential extraction and runtime error projection.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use iam_runtime_sdk::{Credential, ErrorClass, IamRuntimeError};

use crate::problem::Problem;

/// The raw credential of the caller.
///
/// A missing or non-UTF-8 `Authorization` header yields the empty credential,
/// which the runtime reports as unauthenticated.
#[derive(Debug, Clone)]
pub struct BearerCredential(pub Credential);

impl<S: Send + Sync> FromRequestParts<S> for BearerCredential {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(extract_credential(&parts.headers)))
    }
}

/// Strip a literal `"Bearer "` prefix if present; otherwise pass the header
/// value through unchanged.
#[must_use]
pub fn extract_credential(headers: &HeaderMap) -> Credential {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map_or_else(Credential::empty, |raw| {
            Credential::new(raw.strip_prefix("Bearer ").unwrap_or(raw))
        })
}

/// Convert an `IamRuntimeError` to an RFC 9457 problem response.
#[must_use]
pub fn runtime_error_to_response(err: &IamRuntimeError) -> Response {
    log_runtime_error(err);
    let (status, title, detail) = match err {
        IamRuntimeError::Unauthenticated(_) => {
            (StatusCode::UNAUTHORIZED, "Unauthorized", "who are you?".to_owned())
        }
        IamRuntimeError::PermissionDenied(msg) => (StatusCode::FORBIDDEN, "Forbidden", msg.clone()),
        IamRuntimeError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, "Bad Request", msg.clone()),
        IamRuntimeError::Unavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Service Unavailable",
            "IAM runtime unavailable".to_owned(),
        ),
        IamRuntimeError::Internal(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
            "Internal IAM runtime error".to_owned(),
        ),
    };
    Problem::new(status, title, detail).into_response()
}

fn log_runtime_error(err: &IamRuntimeError) {
    if err.class() == ErrorClass::Infrastructure {
        tracing::error!(error = %err, "IAM runtime call failed");
    } else {
        tracing::debug!(error = %err, "IAM runtime rejected request");
    }
}
