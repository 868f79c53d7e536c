//! Client implementation for the static IAM plugin.
//!
//! Implements the three backend traits of the IAM runtime using the domain
//! service.

use async_trait::async_trait;
use iam_runtime_sdk::{
    AccessDecision, AccessRequestAction, AccessToken, AuthNPluginClient, AuthZPluginClient,
    Credential, CredentialValidation, IamRuntimeError, IdentityPluginClient, Relationship, Subject,
};

use super::service::Service;

#[async_trait]
impl AuthNPluginClient for Service {
    async fn validate_credential(
        &self,
        credential: &Credential,
    ) -> Result<CredentialValidation, IamRuntimeError> {
        Ok(self.validate(credential.expose()))
    }
}

#[async_trait]
impl AuthZPluginClient for Service {
    async fn evaluate(
        &self,
        subject: &Subject,
        actions: &[AccessRequestAction],
    ) -> Result<Vec<AccessDecision>, IamRuntimeError> {
        Ok(Service::evaluate(self, subject, actions))
    }

    async fn create_relationships(
        &self,
        resource_id: &str,
        relationships: &[Relationship],
    ) -> Result<(), IamRuntimeError> {
        Service::create_relationships(self, resource_id, relationships);
        Ok(())
    }

    async fn delete_relationships(
        &self,
        resource_id: &str,
        relationships: &[Relationship],
    ) -> Result<(), IamRuntimeError> {
        Service::delete_relationships(self, resource_id, relationships);
        Ok(())
    }
}

#[async_trait]
impl IdentityPluginClient for Service {
    async fn mint_access_token(
        &self,
        _credential: &Credential,
        subject: &Subject,
    ) -> Result<AccessToken, IamRuntimeError> {
        self.mint(subject)
            .map(AccessToken::new)
            .map_err(|e| IamRuntimeError::Internal(format!("failed to encode access token: {e}")))
    }
}
