use std::sync::Arc;

use iam_runtime_sdk::grpc::proto::authentication_server::Authentication;
use iam_runtime_sdk::grpc::proto::{
    self, ValidateCredentialRequest, ValidateCredentialResponse, validate_credential_response,
};
use iam_runtime_sdk::{Credential, ProtocolStyle};
use tonic::{Request, Response, Status};

use super::{is_field_signal, to_status};
use crate::domain::{DomainError, Service};

pub struct AuthenticationService {
    svc: Arc<Service>,
    style: ProtocolStyle,
}

impl AuthenticationService {
    #[must_use]
    pub fn new(svc: Arc<Service>, style: ProtocolStyle) -> Self {
        Self { svc, style }
    }
}

#[tonic::async_trait]
impl Authentication for AuthenticationService {
    async fn validate_credential(
        &self,
        request: Request<ValidateCredentialRequest>,
    ) -> Result<Response<ValidateCredentialResponse>, Status> {
        let credential = Credential::new(request.into_inner().credential);

        match self.svc.validate_credential(&credential).await {
            Ok(subject) => Ok(Response::new(ValidateCredentialResponse {
                result: validate_credential_response::Result::Valid.into(),
                subject: Some(proto::Subject::from(&subject)),
            })),
            Err(DomainError::EmptyCredential | DomainError::InvalidCredential)
                if is_field_signal(self.style) =>
            {
                Ok(Response::new(ValidateCredentialResponse {
                    result: validate_credential_response::Result::Invalid.into(),
                    subject: None,
                }))
            }
            Err(e) => Err(to_status("validate_credential", e)),
        }
    }
}
