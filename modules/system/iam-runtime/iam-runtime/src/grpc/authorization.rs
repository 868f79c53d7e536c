use std::sync::Arc;

use iam_runtime_sdk::grpc::proto::authorization_server::Authorization;
use iam_runtime_sdk::grpc::proto::{
    CheckAccessRequest, CheckAccessResponse, CreateRelationshipsRequest,
    CreateRelationshipsResponse, DeleteRelationshipsRequest, DeleteRelationshipsResponse,
    check_access_response,
};
use iam_runtime_sdk::{AccessRequestAction, Credential, ProtocolStyle, Relationship};
use tonic::{Request, Response, Status};

use super::{is_field_signal, to_status};
use crate::domain::{DomainError, Service};

pub struct AuthorizationService {
    svc: Arc<Service>,
    style: ProtocolStyle,
}

impl AuthorizationService {
    #[must_use]
    pub fn new(svc: Arc<Service>, style: ProtocolStyle) -> Self {
        Self { svc, style }
    }
}

#[tonic::async_trait]
impl Authorization for AuthorizationService {
    async fn check_access(
        &self,
        request: Request<CheckAccessRequest>,
    ) -> Result<Response<CheckAccessResponse>, Status> {
        let request = request.into_inner();
        let credential = Credential::new(request.credential);
        let actions: Vec<AccessRequestAction> =
            request.actions.into_iter().map(Into::into).collect();

        // An unauthenticated caller gets a status in both styles, so it can
        // never be read as a denial.
        match self.svc.check_access(&credential, &actions).await {
            Ok(()) => Ok(Response::new(CheckAccessResponse {
                result: check_access_response::Result::Allowed.into(),
            })),
            Err(DomainError::AccessDenied { .. }) if is_field_signal(self.style) => {
                Ok(Response::new(CheckAccessResponse {
                    result: check_access_response::Result::Denied.into(),
                }))
            }
            Err(e) => Err(to_status("check_access", e)),
        }
    }

    async fn create_relationships(
        &self,
        request: Request<CreateRelationshipsRequest>,
    ) -> Result<Response<CreateRelationshipsResponse>, Status> {
        let request = request.into_inner();
        let relationships: Vec<Relationship> =
            request.relationships.into_iter().map(Into::into).collect();

        self.svc
            .create_relationships(&request.resource_id, &relationships)
            .await
            .map_err(|e| to_status("create_relationships", e))?;

        Ok(Response::new(CreateRelationshipsResponse {}))
    }

    async fn delete_relationships(
        &self,
        request: Request<DeleteRelationshipsRequest>,
    ) -> Result<Response<DeleteRelationshipsResponse>, Status> {
        let request = request.into_inner();
        let relationships: Vec<Relationship> =
            request.relationships.into_iter().map(Into::into).collect();

        self.svc
            .delete_relationships(&request.resource_id, &relationships)
            .await
            .map_err(|e| to_status("delete_relationships", e))?;

        Ok(Response::new(DeleteRelationshipsResponse {}))
    }
}
