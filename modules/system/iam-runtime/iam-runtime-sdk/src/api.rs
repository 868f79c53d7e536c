//! Public API traits for the IAM runtime.
//!
//! Applications talk to the runtime through these traits only. The gRPC
//! client in [`crate::grpc`] implements all three over the sidecar socket;
//! the runtime crate implements them in-process for tests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::credential::{AccessToken, Credential};
use crate::error::IamRuntimeError;
use crate::models::{AccessRequestAction, Relationship, Subject};

/// Authentication contract: credential to subject.
#[async_trait]
pub trait AuthNRuntimeClient: Send + Sync {
    /// Resolve the subject behind a credential.
    ///
    /// An empty credential is valid input and always fails validation.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` if the credential does not resolve to a subject
    /// - `Unavailable` / `Internal` if the runtime could not answer
    async fn validate_credential(&self, credential: &Credential)
    -> Result<Subject, IamRuntimeError>;
}

/// Authorization contract: access checks and relationship mutation.
#[async_trait]
pub trait AuthZRuntimeClient: Send + Sync {
    /// Check that the subject behind `credential` may perform every action.
    ///
    /// An empty `actions` slice is allowed.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` if the credential does not resolve to a subject
    /// - `PermissionDenied` if at least one action is not allowed
    /// - `InvalidArgument` if an action or resource ID is empty
    /// - `Unavailable` / `Internal` if the runtime could not answer
    async fn check_access(
        &self,
        credential: &Credential,
        actions: &[AccessRequestAction],
    ) -> Result<(), IamRuntimeError>;

    /// Create relationships scoped to `resource_id`.
    ///
    /// Idempotent; the batch is applied wholly or not at all.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an empty resource ID, relation or subject ID
    /// - `Unavailable` / `Internal` if the runtime could not answer
    async fn create_relationships(
        &self,
        resource_id: &str,
        relationships: &[Relationship],
    ) -> Result<(), IamRuntimeError>;

    /// Delete relationships scoped to `resource_id`.
    ///
    /// Deleting an absent relationship is not an error.
    ///
    /// # Errors
    ///
    /// Same as [`AuthZRuntimeClient::create_relationships`].
    async fn delete_relationships(
        &self,
        resource_id: &str,
        relationships: &[Relationship],
    ) -> Result<(), IamRuntimeError>;
}

/// Identity contract: credential to downstream access token.
#[async_trait]
pub trait IdentityRuntimeClient: Send + Sync {
    /// Mint an access token for the subject behind `credential`.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` if the credential does not resolve to a subject
    /// - `Unavailable` / `Internal` if the runtime could not answer
    async fn get_access_token(&self, credential: &Credential)
    -> Result<AccessToken, IamRuntimeError>;
}

/// Everything an application needs from the runtime, in one value.
///
/// Constructed once at startup and shared by reference (it is cheap to
/// clone). The three handles usually point at the same client.
#[derive(Clone)]
pub struct IamRuntime {
    authn: Arc<dyn AuthNRuntimeClient>,
    authz: Arc<dyn AuthZRuntimeClient>,
    identity: Arc<dyn IdentityRuntimeClient>,
}

impl IamRuntime {
    #[must_use]
    pub fn new(
        authn: Arc<dyn AuthNRuntimeClient>,
        authz: Arc<dyn AuthZRuntimeClient>,
        identity: Arc<dyn IdentityRuntimeClient>,
    ) -> Self {
        Self {
            authn,
            authz,
            identity,
        }
    }

    /// Build the aggregate from a single client implementing all contracts.
    #[must_use]
    pub fn from_client<C>(client: Arc<C>) -> Self
    where
        C: AuthNRuntimeClient + AuthZRuntimeClient + IdentityRuntimeClient + 'static,
    {
        Self {
            authn: client.clone(),
            authz: client.clone(),
            identity: client,
        }
    }

    /// See [`AuthNRuntimeClient::validate_credential`].
    ///
    /// # Errors
    ///
    /// Propagates the contract errors unchanged.
    pub async fn validate_credential(
        &self,
        credential: &Credential,
    ) -> Result<Subject, IamRuntimeError> {
        self.authn.validate_credential(credential).await
    }

    /// See [`AuthZRuntimeClient::check_access`].
    ///
    /// # Errors
    ///
    /// Propagates the contract errors unchanged.
    pub async fn check_access(
        &self,
        credential: &Credential,
        actions: &[AccessRequestAction],
    ) -> Result<(), IamRuntimeError> {
        self.authz.check_access(credential, actions).await
    }

    /// See [`AuthZRuntimeClient::create_relationships`].
    ///
    /// # Errors
    ///
    /// Propagates the contract errors unchanged.
    pub async fn create_relationships(
        &self,
        resource_id: &str,
        relationships: &[Relationship],
    ) -> Result<(), IamRuntimeError> {
        self.authz
            .create_relationships(resource_id, relationships)
            .await
    }

    /// See [`AuthZRuntimeClient::delete_relationships`].
    ///
    /// # Errors
    ///
    /// Propagates the contract errors unchanged.
    pub async fn delete_relationships(
        &self,
        resource_id: &str,
        relationships: &[Relationship],
    ) -> Result<(), IamRuntimeError> {
        self.authz
            .delete_relationships(resource_id, relationships)
            .await
    }

    /// See [`IdentityRuntimeClient::get_access_token`].
    ///
    /// # Errors
    ///
    /// Propagates the contract errors unchanged.
    pub async fn get_access_token(
        &self,
        credential: &Credential,
    ) -> Result<AccessToken, IamRuntimeError> {
        self.identity.get_access_token(credential).await
    }
}
