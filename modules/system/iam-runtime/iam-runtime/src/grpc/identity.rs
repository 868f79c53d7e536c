use std::sync::Arc;

use iam_runtime_sdk::Credential;
use iam_runtime_sdk::grpc::proto::identity_server::Identity;
use iam_runtime_sdk::grpc::proto::{GetAccessTokenRequest, GetAccessTokenResponse};
use tonic::{Request, Response, Status};

use super::to_status;
use crate::domain::Service;

pub struct IdentityService {
    svc: Arc<Service>,
}

impl IdentityService {
    #[must_use]
    pub fn new(svc: Arc<Service>) -> Self {
        Self { svc }
    }
}

#[tonic::async_trait]
impl Identity for IdentityService {
    async fn get_access_token(
        &self,
        request: Request<GetAccessTokenRequest>,
    ) -> Result<Response<GetAccessTokenResponse>, Status> {
        let credential = Credential::new(request.into_inner().token);

        let token = self
            .svc
            .get_access_token(&credential)
            .await
            .map_err(|e| to_status("get_access_token", e))?;

        Ok(Response::new(GetAccessTokenResponse {
            token: token.expose().to_owned(),
        }))
    }
}
