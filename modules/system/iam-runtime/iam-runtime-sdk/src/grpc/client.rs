//! gRPC client for the IAM runtime over a unix-domain socket.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hyper_util::rt::TokioIo;
use tokio::net::UnixStream;
use tonic::Status;
use tonic::transport::{Channel, Endpoint, Uri};
use tower::service_fn;

use super::proto::authentication_client::AuthenticationClient;
use super::proto::authorization_client::AuthorizationClient;
use super::proto::identity_client::IdentityClient;
use super::proto::{self, check_access_response, validate_credential_response};
use crate::api::{AuthNRuntimeClient, AuthZRuntimeClient, IamRuntime, IdentityRuntimeClient};
use crate::credential::{AccessToken, Credential};
use crate::error::IamRuntimeError;
use crate::models::{AccessRequestAction, Relationship, Subject};

/// Authority used for HTTP/2 requests; the connector ignores it and dials the
/// socket instead.
const UDS_AUTHORITY: &str = "http://iam-runtime.local";

/// Client-side timeouts. The runtime makes no latency promise, so callers
/// bound every call themselves.
#[derive(Debug, Clone, Default)]
pub struct GrpcClientOptions {
    /// Maximum time to establish the socket connection.
    pub connect_timeout: Option<Duration>,
    /// Maximum time for a single call, including backend work.
    pub request_timeout: Option<Duration>,
}

/// Client for the `Authentication`, `Authorization` and `Identity` services
/// hosted on one runtime socket.
///
/// All three stubs share a single HTTP/2 channel; concurrent calls are
/// multiplexed over it. Cloning is cheap.
///
/// With a `request_timeout`, every call is bounded end to end, including
/// dialing the socket and the HTTP/2 handshake of a lazy channel.
#[derive(Debug, Clone)]
pub struct IamRuntimeGrpcClient {
    authn: AuthenticationClient<Channel>,
    authz: AuthorizationClient<Channel>,
    identity: IdentityClient<Channel>,
    request_timeout: Option<Duration>,
}

impl IamRuntimeGrpcClient {
    /// Create a client without connecting. The socket is dialed on first use
    /// and redialed after failures.
    ///
    /// `target` is a socket path or a `unix://` URI.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `target` is empty.
    pub fn connect_lazy(
        target: &str,
        options: &GrpcClientOptions,
    ) -> Result<Self, IamRuntimeError> {
        let channel = lazy_channel(target, options)?;
        Ok(Self::from_channel(channel).with_request_timeout(options.request_timeout))
    }

    /// Create a client and connect to the runtime socket immediately.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `target` is empty
    /// - `Unavailable` if the socket cannot be reached
    pub async fn connect(
        target: &str,
        options: &GrpcClientOptions,
    ) -> Result<Self, IamRuntimeError> {
        let path = socket_path(target)?;
        let socket_display = path.display().to_string();
        let channel = endpoint(options)
            .connect_with_connector(uds_connector(path))
            .await
            .map_err(|e| {
                IamRuntimeError::Unavailable(format!(
                    "failed to connect to IAM runtime at '{socket_display}': {e}"
                ))
            })?;
        tracing::debug!(socket = %socket_display, "Connected to IAM runtime");
        Ok(Self::from_channel(channel).with_request_timeout(options.request_timeout))
    }

    /// Wrap an existing channel. No client-side timeout is applied.
    #[must_use]
    pub fn from_channel(channel: Channel) -> Self {
        Self {
            authn: AuthenticationClient::new(channel.clone()),
            authz: AuthorizationClient::new(channel.clone()),
            identity: IdentityClient::new(channel),
            request_timeout: None,
        }
    }

    /// Bound every call by `timeout`; `None` waits indefinitely.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    async fn call<T, F>(&self, op: &str, request: F) -> Result<T, IamRuntimeError>
    where
        F: Future<Output = Result<tonic::Response<T>, Status>> + Send,
    {
        let result = match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, request).await.unwrap_or_else(|_| {
                Err(Status::deadline_exceeded(format!(
                    "no response from IAM runtime within {} ms",
                    limit.as_millis()
                )))
            }),
            None => request.await,
        };
        result
            .map(tonic::Response::into_inner)
            .map_err(|s| log_and_convert(op, s))
    }

    /// Wrap this client into the application-facing aggregate.
    #[must_use]
    pub fn into_runtime(self) -> IamRuntime {
        IamRuntime::from_client(Arc::new(self))
    }
}

/// Resolve a runtime target (`/path/to.sock` or `unix:///path/to.sock`) to
/// a socket path.
///
/// # Errors
///
/// `InvalidArgument` if the target names no path.
pub fn socket_path(target: &str) -> Result<PathBuf, IamRuntimeError> {
    let path = target.strip_prefix("unix://").unwrap_or(target);
    if path.is_empty() {
        return Err(IamRuntimeError::InvalidArgument(
            "runtime socket path must not be empty".to_owned(),
        ));
    }
    Ok(PathBuf::from(path))
}

/// A channel to the runtime socket that connects on first use.
///
/// For callers that need the raw generated stubs.
///
/// # Errors
///
/// `InvalidArgument` if `target` is empty.
pub fn lazy_channel(target: &str, options: &GrpcClientOptions) -> Result<Channel, IamRuntimeError> {
    let path = socket_path(target)?;
    Ok(endpoint(options).connect_with_connector_lazy(uds_connector(path)))
}

fn endpoint(options: &GrpcClientOptions) -> Endpoint {
    let mut endpoint = Endpoint::from_static(UDS_AUTHORITY);
    if let Some(timeout) = options.connect_timeout {
        endpoint = endpoint.connect_timeout(timeout);
    }
    if let Some(timeout) = options.request_timeout {
        endpoint = endpoint.timeout(timeout);
    }
    endpoint
}

fn uds_connector(
    path: PathBuf,
) -> impl tower::Service<
    Uri,
    Response = TokioIo<UnixStream>,
    Error = std::io::Error,
    Future = impl Future<Output = std::io::Result<TokioIo<UnixStream>>> + Send,
> + Send
+ 'static {
    let path = Arc::new(path);
    service_fn(move |_: Uri| {
        let path = Arc::clone(&path);
        async move { UnixStream::connect(path.as_path()).await.map(TokioIo::new) }
    })
}

fn log_and_convert(op: &str, status: Status) -> IamRuntimeError {
    tracing::debug!(operation = op, code = ?status.code(), "IAM runtime call failed");
    status.into()
}

#[async_trait]
impl AuthNRuntimeClient for IamRuntimeGrpcClient {
    async fn validate_credential(
        &self,
        credential: &Credential,
    ) -> Result<Subject, IamRuntimeError> {
        let request = proto::ValidateCredentialRequest {
            credential: credential.expose().to_owned(),
        };

        let mut authn = self.authn.clone();
        let response = self
            .call("validate_credential", authn.validate_credential(request))
            .await?;

        match validate_credential_response::Result::try_from(response.result) {
            Ok(validate_credential_response::Result::Valid) => {
                response.subject.map(Subject::from).ok_or_else(|| {
                    IamRuntimeError::Internal(
                        "runtime reported a valid credential without a subject".to_owned(),
                    )
                })
            }
            Ok(validate_credential_response::Result::Invalid) => Err(
                IamRuntimeError::Unauthenticated("credential is invalid".to_owned()),
            ),
            Err(e) => Err(IamRuntimeError::Internal(format!(
                "unknown credential validation result: {e}"
            ))),
        }
    }
}

#[async_trait]
impl AuthZRuntimeClient for IamRuntimeGrpcClient {
    async fn check_access(
        &self,
        credential: &Credential,
        actions: &[AccessRequestAction],
    ) -> Result<(), IamRuntimeError> {
        let request = proto::CheckAccessRequest {
            credential: credential.expose().to_owned(),
            actions: actions.iter().map(proto::AccessRequestAction::from).collect(),
        };

        let mut authz = self.authz.clone();
        let response = self.call("check_access", authz.check_access(request)).await?;

        match check_access_response::Result::try_from(response.result) {
            Ok(check_access_response::Result::Allowed) => Ok(()),
            Ok(check_access_response::Result::Denied) => Err(IamRuntimeError::PermissionDenied(
                "access denied".to_owned(),
            )),
            Err(e) => Err(IamRuntimeError::Internal(format!(
                "unknown access check result: {e}"
            ))),
        }
    }

    async fn create_relationships(
        &self,
        resource_id: &str,
        relationships: &[Relationship],
    ) -> Result<(), IamRuntimeError> {
        let request = proto::CreateRelationshipsRequest {
            resource_id: resource_id.to_owned(),
            relationships: relationships.iter().map(proto::Relationship::from).collect(),
        };

        let mut authz = self.authz.clone();
        self.call("create_relationships", authz.create_relationships(request))
            .await?;
        Ok(())
    }

    async fn delete_relationships(
        &self,
        resource_id: &str,
        relationships: &[Relationship],
    ) -> Result<(), IamRuntimeError> {
        let request = proto::DeleteRelationshipsRequest {
            resource_id: resource_id.to_owned(),
            relationships: relationships.iter().map(proto::Relationship::from).collect(),
        };

        let mut authz = self.authz.clone();
        self.call("delete_relationships", authz.delete_relationships(request))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityRuntimeClient for IamRuntimeGrpcClient {
    async fn get_access_token(
        &self,
        credential: &Credential,
    ) -> Result<AccessToken, IamRuntimeError> {
        let request = proto::GetAccessTokenRequest {
            token: credential.expose().to_owned(),
        };

        let mut identity = self.identity.clone();
        let response = self
            .call("get_access_token", identity.get_access_token(request))
            .await?;

        if response.token.is_empty() {
            return Err(IamRuntimeError::Internal(
                "runtime returned an empty access token".to_owned(),
            ));
        }
        Ok(AccessToken::new(response.token))
    }
}
