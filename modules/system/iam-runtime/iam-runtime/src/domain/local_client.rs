//! Local (in-process) client for the IAM runtime.

use std::sync::Arc;

use async_trait::async_trait;
use iam_runtime_sdk::{
    AccessRequestAction, AccessToken, AuthNRuntimeClient, AuthZRuntimeClient, Credential,
    IamRuntime, IamRuntimeError, IdentityRuntimeClient, Relationship, Subject,
};

use super::{DomainError, Service};

/// Local client wrapping the service.
pub struct IamRuntimeLocalClient {
    svc: Arc<Service>,
}

impl IamRuntimeLocalClient {
    #[must_use]
    pub fn new(svc: Arc<Service>) -> Self {
        Self { svc }
    }

    /// Aggregate handle for an application embedding the runtime in-process.
    #[must_use]
    pub fn into_runtime(self) -> IamRuntime {
        IamRuntime::from_client(Arc::new(self))
    }
}

fn log_and_convert(op: &str, e: DomainError) -> IamRuntimeError {
    match &e {
        DomainError::BackendUnavailable(_)
        | DomainError::DecisionCountMismatch { .. }
        | DomainError::Internal(_) => {
            tracing::error!(operation = op, error = ?e, "iam_runtime call failed");
        }
        _ => tracing::debug!(operation = op, error = %e, "iam_runtime call rejected"),
    }
    e.into()
}

#[async_trait]
impl AuthNRuntimeClient for IamRuntimeLocalClient {
    async fn validate_credential(
        &self,
        credential: &Credential,
    ) -> Result<Subject, IamRuntimeError> {
        self.svc
            .validate_credential(credential)
            .await
            .map_err(|e| log_and_convert("validate_credential", e))
    }
}

#[async_trait]
impl AuthZRuntimeClient for IamRuntimeLocalClient {
    async fn check_access(
        &self,
        credential: &Credential,
        actions: &[AccessRequestAction],
    ) -> Result<(), IamRuntimeError> {
        self.svc
            .check_access(credential, actions)
            .await
            .map_err(|e| log_and_convert("check_access", e))
    }

    async fn create_relationships(
        &self,
        resource_id: &str,
        relationships: &[Relationship],
    ) -> Result<(), IamRuntimeError> {
        self.svc
            .create_relationships(resource_id, relationships)
            .await
            .map_err(|e| log_and_convert("create_relationships", e))
    }

    async fn delete_relationships(
        &self,
        resource_id: &str,
        relationships: &[Relationship],
    ) -> Result<(), IamRuntimeError> {
        self.svc
            .delete_relationships(resource_id, relationships)
            .await
            .map_err(|e| log_and_convert("delete_relationships", e))
    }
}

#[async_trait]
impl IdentityRuntimeClient for IamRuntimeLocalClient {
    async fn get_access_token(
        &self,
        credential: &Credential,
    ) -> Result<AccessToken, IamRuntimeError> {
        self.svc
            .get_access_token(credential)
            .await
            .map_err(|e| log_and_convert("get_access_token", e))
    }
}
