//! Domain service for the IAM runtime.

use std::collections::BTreeSet;
use std::sync::Arc;

use iam_runtime_sdk::{
    AccessDecision, AccessRequestAction, AccessToken, AuthNPluginClient, AuthZPluginClient,
    Credential, CredentialValidation, IdentityPluginClient, Relationship, Subject,
};

use super::error::DomainError;

/// IAM runtime service.
///
/// Holds the backend handles and applies the rules that do not depend on the
/// backend: empty credentials, input validation, conjunction of decisions.
pub struct Service {
    authn: Arc<dyn AuthNPluginClient>,
    authz: Arc<dyn AuthZPluginClient>,
    identity: Arc<dyn IdentityPluginClient>,
}

impl Service {
    #[must_use]
    pub fn new(
        authn: Arc<dyn AuthNPluginClient>,
        authz: Arc<dyn AuthZPluginClient>,
        identity: Arc<dyn IdentityPluginClient>,
    ) -> Self {
        Self {
            authn,
            authz,
            identity,
        }
    }

    /// Build the service on a backend implementing all three plugin traits.
    #[must_use]
    pub fn with_backend<P>(backend: Arc<P>) -> Self
    where
        P: AuthNPluginClient + AuthZPluginClient + IdentityPluginClient + 'static,
    {
        Self::new(backend.clone(), backend.clone(), backend)
    }

    /// Resolve a credential to a subject.
    ///
    /// # Errors
    ///
    /// - `EmptyCredential` / `InvalidCredential`
    /// - backend failures
    #[tracing::instrument(skip_all)]
    pub async fn validate_credential(&self, credential: &Credential) -> Result<Subject, DomainError> {
        if credential.is_empty() {
            tracing::debug!("Empty credential rejected");
            return Err(DomainError::EmptyCredential);
        }

        match self.authn.validate_credential(credential).await? {
            CredentialValidation::Valid(subject) => {
                tracing::debug!(subject_id = %subject.subject_id, "Credential validated");
                Ok(subject)
            }
            CredentialValidation::Invalid => {
                tracing::debug!("Credential rejected by backend");
                Err(DomainError::InvalidCredential)
            }
        }
    }

    /// Allow `actions` only if every one of them is allowed.
    ///
    /// The credential is resolved first; an empty action list is allowed.
    ///
    /// # Errors
    ///
    /// - authentication errors from [`Self::validate_credential`]
    /// - `Validation` for an empty action or resource ID
    /// - `AccessDenied` naming every denied pair
    /// - backend failures
    #[tracing::instrument(skip_all, fields(actions = actions.len()))]
    pub async fn check_access(
        &self,
        credential: &Credential,
        actions: &[AccessRequestAction],
    ) -> Result<(), DomainError> {
        let subject = self.validate_credential(credential).await?;

        for (i, a) in actions.iter().enumerate() {
            if a.action.is_empty() {
                return Err(DomainError::Validation(format!("actions[{i}]: action must not be empty")));
            }
            if a.resource_id.is_empty() {
                return Err(DomainError::Validation(format!(
                    "actions[{i}]: resource_id must not be empty"
                )));
            }
        }

        if actions.is_empty() {
            return Ok(());
        }

        let decisions = self.authz.evaluate(&subject, actions).await?;
        if decisions.len() != actions.len() {
            tracing::error!(
                expected = actions.len(),
                got = decisions.len(),
                "Backend returned a decision count that does not match the request"
            );
            return Err(DomainError::DecisionCountMismatch {
                expected: actions.len(),
                got: decisions.len(),
            });
        }

        if AccessDecision::all(decisions.iter().copied()).is_allowed() {
            tracing::debug!(subject_id = %subject.subject_id, "Access allowed");
            return Ok(());
        }

        let denied: Vec<AccessRequestAction> = actions
            .iter()
            .zip(&decisions)
            .filter(|(_, d)| !d.is_allowed())
            .map(|(a, _)| a.clone())
            .collect();
        tracing::debug!(subject_id = %subject.subject_id, denied = denied.len(), "Access denied");
        Err(DomainError::AccessDenied { denied })
    }

    /// Idempotently insert relationships on `resource_id`.
    ///
    /// # Errors
    ///
    /// - `Validation` for empty identifiers (nothing is applied)
    /// - backend failures
    #[tracing::instrument(skip_all, fields(resource_id = %resource_id))]
    pub async fn create_relationships(
        &self,
        resource_id: &str,
        relationships: &[Relationship],
    ) -> Result<(), DomainError> {
        let batch = validate_batch(resource_id, relationships)?;
        if batch.is_empty() {
            return Ok(());
        }

        self.authz.create_relationships(resource_id, &batch).await?;
        tracing::debug!(count = batch.len(), "Relationships created");
        Ok(())
    }

    /// Idempotently remove relationships from `resource_id`.
    ///
    /// # Errors
    ///
    /// - `Validation` for empty identifiers (nothing is applied)
    /// - backend failures
    #[tracing::instrument(skip_all, fields(resource_id = %resource_id))]
    pub async fn delete_relationships(
        &self,
        resource_id: &str,
        relationships: &[Relationship],
    ) -> Result<(), DomainError> {
        let batch = validate_batch(resource_id, relationships)?;
        if batch.is_empty() {
            return Ok(());
        }

        self.authz.delete_relationships(resource_id, &batch).await?;
        tracing::debug!(count = batch.len(), "Relationships deleted");
        Ok(())
    }

    /// Issue a downstream access token for the credential's subject.
    ///
    /// # Errors
    ///
    /// - authentication errors from [`Self::validate_credential`]
    /// - backend failures, or an empty token from the backend
    #[tracing::instrument(skip_all)]
    pub async fn get_access_token(&self, credential: &Credential) -> Result<AccessToken, DomainError> {
        let subject = self.validate_credential(credential).await?;

        let token = self.identity.mint_access_token(credential, &subject).await?;
        if token.is_empty() {
            return Err(DomainError::Internal("backend minted an empty access token".to_owned()));
        }

        tracing::debug!(subject_id = %subject.subject_id, "Access token issued");
        Ok(token)
    }
}

/// Reject empty identifiers and collapse duplicate tuples.
fn validate_batch(
    resource_id: &str,
    relationships: &[Relationship],
) -> Result<Vec<Relationship>, DomainError> {
    if resource_id.is_empty() {
        return Err(DomainError::Validation("resource_id must not be empty".to_owned()));
    }

    for (i, r) in relationships.iter().enumerate() {
        if r.relation.is_empty() {
            return Err(DomainError::Validation(format!(
                "relationships[{i}]: relation must not be empty"
            )));
        }
        if r.subject_id.is_empty() {
            return Err(DomainError::Validation(format!(
                "relationships[{i}]: subject_id must not be empty"
            )));
        }
    }

    Ok(relationships
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect())
}
