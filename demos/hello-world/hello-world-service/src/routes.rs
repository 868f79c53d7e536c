//! HTTP routes of the hello-world service.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use iam_runtime_sdk::{AccessRequestAction, Credential, IamRuntime, IamRuntimeError, Relationship};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::auth::{BearerCredential, runtime_error_to_response};

#[derive(Clone)]
pub struct AppState {
    pub runtime: IamRuntime,
}

/// Build the service router on top of an IAM runtime handle.
pub fn router(runtime: IamRuntime) -> Router {
    Router::new()
        .route("/whoami", get(whoami))
        .route("/can-i", get(can_i))
        .route("/access-token", get(access_token))
        .route(
            "/relationships/{resource_id}",
            put(create_relationships).delete(delete_relationships),
        )
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { runtime })
}

async fn whoami(State(state): State<AppState>, BearerCredential(credential): BearerCredential) -> Response {
    match state.runtime.validate_credential(&credential).await {
        Ok(subject) => format!("you are: {}\n", subject.subject_id).into_response(),
        Err(e) => runtime_error_to_response(&e),
    }
}

/// Missing parameters become empty strings, which the runtime rejects.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CanIQuery {
    what: String,
    who: String,
}

async fn can_i(
    State(state): State<AppState>,
    BearerCredential(credential): BearerCredential,
    Query(query): Query<CanIQuery>,
) -> Response {
    let actions = [AccessRequestAction::new(query.what, query.who)];

    match state.runtime.check_access(&credential, &actions).await {
        Ok(()) => "yes!\n".into_response(),
        Err(IamRuntimeError::PermissionDenied(msg)) => {
            tracing::debug!("Access denied: {msg}");
            (StatusCode::FORBIDDEN, "no!\n").into_response()
        }
        Err(e) => runtime_error_to_response(&e),
    }
}

async fn access_token(
    State(state): State<AppState>,
    BearerCredential(credential): BearerCredential,
) -> Response {
    match state.runtime.get_access_token(&credential).await {
        Ok(token) => format!("new token: {}\n", token.expose()).into_response(),
        Err(e) => runtime_error_to_response(&e),
    }
}

/// Action the caller needs on a resource to change its relationships.
pub const MANAGE_ACTION: &str = "manage";

async fn authorize_manage(
    state: &AppState,
    credential: &Credential,
    resource_id: &str,
) -> Result<(), IamRuntimeError> {
    state
        .runtime
        .check_access(credential, &[AccessRequestAction::new(MANAGE_ACTION, resource_id)])
        .await
}

#[derive(Debug, Deserialize)]
struct RelationshipsBody {
    relationships: Vec<Relationship>,
}

async fn create_relationships(
    State(state): State<AppState>,
    BearerCredential(credential): BearerCredential,
    Path(resource_id): Path<String>,
    Json(body): Json<RelationshipsBody>,
) -> Response {
    let result = async {
        authorize_manage(&state, &credential, &resource_id).await?;
        state
            .runtime
            .create_relationships(&resource_id, &body.relationships)
            .await
    }
    .await;

    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => runtime_error_to_response(&e),
    }
}

async fn delete_relationships(
    State(state): State<AppState>,
    BearerCredential(credential): BearerCredential,
    Path(resource_id): Path<String>,
    Json(body): Json<RelationshipsBody>,
) -> Response {
    let result = async {
        authorize_manage(&state, &credential, &resource_id).await?;
        state
            .runtime
            .delete_relationships(&resource_id, &body.relationships)
            .await
    }
    .await;

    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => runtime_error_to_response(&e),
    }
}

async fn healthz() -> &'static str {
    "ok"
}
