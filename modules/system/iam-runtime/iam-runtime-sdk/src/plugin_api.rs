//! Plugin API traits for IAM runtime backends.
//!
//! A backend (identity provider adapter, policy engine, relationship store)
//! implements these traits. The runtime owns the contract rules (empty
//! credentials, input validation, conjunction of decisions) and calls the
//! backend only for the parts that are genuinely backend-defined.

use async_trait::async_trait;

use crate::credential::{AccessToken, Credential};
use crate::error::IamRuntimeError;
use crate::models::{AccessDecision, AccessRequestAction, CredentialValidation, Relationship, Subject};

/// Backend credential lookup.
#[async_trait]
pub trait AuthNPluginClient: Send + Sync {
    /// Resolve a non-empty credential.
    ///
    /// # Errors
    ///
    /// Only infrastructure failures. An unknown credential is
    /// `Ok(CredentialValidation::Invalid)`.
    async fn validate_credential(
        &self,
        credential: &Credential,
    ) -> Result<CredentialValidation, IamRuntimeError>;
}

/// Backend policy evaluation and relationship storage.
#[async_trait]
pub trait AuthZPluginClient: Send + Sync {
    /// Evaluate each action for `subject`.
    ///
    /// Returns one decision per action, in input order. All decisions of one
    /// call must come from a consistent view of the relationship store.
    ///
    /// # Errors
    ///
    /// Only infrastructure failures. A missing permission is
    /// `AccessDecision::Denied`, never an error.
    async fn evaluate(
        &self,
        subject: &Subject,
        actions: &[AccessRequestAction],
    ) -> Result<Vec<AccessDecision>, IamRuntimeError>;

    /// Insert already-validated relationships scoped to `resource_id`.
    ///
    /// Must be idempotent and all-or-nothing.
    ///
    /// # Errors
    ///
    /// Only infrastructure failures.
    async fn create_relationships(
        &self,
        resource_id: &str,
        relationships: &[Relationship],
    ) -> Result<(), IamRuntimeError>;

    /// Remove already-validated relationships scoped to `resource_id`.
    ///
    /// Must be idempotent and all-or-nothing.
    ///
    /// # Errors
    ///
    /// Only infrastructure failures.
    async fn delete_relationships(
        &self,
        resource_id: &str,
        relationships: &[Relationship],
    ) -> Result<(), IamRuntimeError>;
}

/// Backend token issuance.
#[async_trait]
pub trait IdentityPluginClient: Send + Sync {
    /// Mint (or exchange, or fetch from cache) an access token for an
    /// authenticated subject.
    ///
    /// # Errors
    ///
    /// Only infrastructure failures.
    async fn mint_access_token(
        &self,
        credential: &Credential,
        subject: &Subject,
    ) -> Result<AccessToken, IamRuntimeError>;
}
