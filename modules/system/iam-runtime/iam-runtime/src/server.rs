//! Runtime server lifecycle: bind the socket, serve until cancelled, release.

use std::path::Path;
use std::sync::Arc;

use iam_runtime_sdk::ProtocolStyle;
use iam_runtime_sdk::grpc::proto::authentication_server::AuthenticationServer;
use iam_runtime_sdk::grpc::proto::authorization_server::AuthorizationServer;
use iam_runtime_sdk::grpc::proto::identity_server::IdentityServer;
use tokio_stream::wrappers::UnixListenerStream;
use tokio_util::sync::CancellationToken;

use crate::config::IamRuntimeConfig;
use crate::domain::Service;
use crate::grpc::{AuthenticationService, AuthorizationService, IdentityService};
use crate::socket::{SocketError, SocketGuard};

/// The runtime bound to its socket, ready to serve.
pub struct RuntimeServer {
    socket: SocketGuard,
    svc: Arc<Service>,
    style: ProtocolStyle,
}

impl RuntimeServer {
    /// Bind the configured socket. Clients may connect as soon as this
    /// returns; calls are answered once [`Self::serve`] runs.
    ///
    /// # Errors
    ///
    /// See [`SocketGuard::bind`].
    pub fn bind(config: &IamRuntimeConfig, svc: Arc<Service>) -> Result<Self, SocketError> {
        let socket = SocketGuard::bind(&config.socket_path)?;
        Ok(Self {
            socket,
            svc,
            style: config.protocol_style,
        })
    }

    #[must_use]
    pub fn socket_path(&self) -> &Path {
        self.socket.path()
    }

    /// Serve all three services until `cancel` fires, then drain in-flight
    /// calls and remove the socket.
    ///
    /// # Errors
    ///
    /// Transport failures of the gRPC server.
    pub async fn serve(mut self, cancel: CancellationToken) -> anyhow::Result<()> {
        let listener = self
            .socket
            .take_listener()
            .ok_or_else(|| anyhow::anyhow!("socket listener already consumed"))?;

        tracing::info!(
            socket = %self.socket.path().display(),
            protocol_style = %self.style,
            "IAM runtime serving"
        );

        let shutdown = {
            let cancel = cancel.clone();
            async move {
                cancel.cancelled().await;
                tracing::info!("IAM runtime shutting down gracefully (cancellation)");
            }
        };

        tonic::transport::Server::builder()
            .add_service(AuthenticationServer::new(AuthenticationService::new(
                Arc::clone(&self.svc),
                self.style,
            )))
            .add_service(AuthorizationServer::new(AuthorizationService::new(
                Arc::clone(&self.svc),
                self.style,
            )))
            .add_service(IdentityServer::new(IdentityService::new(Arc::clone(
                &self.svc,
            ))))
            .serve_with_incoming_shutdown(UnixListenerStream::new(listener), shutdown)
            .await
            .map_err(|e| anyhow::anyhow!(e))?;

        tracing::info!("IAM runtime stopped");
        Ok(())
    }
}
