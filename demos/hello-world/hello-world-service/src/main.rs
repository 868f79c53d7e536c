//! Hello-world service binary.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use iam_runtime_sdk::grpc::{GrpcClientOptions, IamRuntimeGrpcClient};
use tracing_subscriber::EnvFilter;

/// Example HTTP service backed by the IAM runtime.
#[derive(Debug, Parser)]
#[command(name = "hello-world-service", version, about)]
struct Cli {
    /// Runtime socket (path or unix:// URI)
    #[arg(long, default_value = "unix:///tmp/runtime.sock")]
    runtime: String,

    /// HTTP listen address
    #[arg(long, default_value = "0.0.0.0:8080")]
    address: String,

    /// Upper bound for each runtime call, including connecting (e.g. "5s", "500ms")
    #[arg(long, default_value = "5s", value_parser = humantime::parse_duration)]
    runtime_timeout: Duration,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let options = GrpcClientOptions {
        connect_timeout: Some(cli.runtime_timeout),
        request_timeout: Some(cli.runtime_timeout),
    };
    let runtime = IamRuntimeGrpcClient::connect_lazy(&cli.runtime, &options)
        .context("invalid runtime address")?
        .into_runtime();

    let address = normalize_address(&cli.address);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!(
        address = %address,
        runtime = %cli.runtime,
        timeout = %humantime::format_duration(cli.runtime_timeout),
        "server listening"
    );

    axum::serve(listener, hello_world_service::router(runtime))
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("HTTP server shutting down gracefully");
        })
        .await
        .map_err(|e| anyhow::anyhow!(e))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("SIGINT received"),
        () = terminate => tracing::info!("SIGTERM received"),
    }
}

/// Accept `:8080` as shorthand for listening on all interfaces.
fn normalize_address(address: &str) -> String {
    if address.starts_with(':') {
        format!("0.0.0.0{address}")
    } else {
        address.to_owned()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn runtime_calls_are_bounded_by_default() {
        let cli = Cli::try_parse_from(["hello-world-service"]).unwrap();

        assert_eq!(cli.runtime_timeout, Duration::from_secs(5));
    }

    #[test]
    fn runtime_timeout_accepts_human_durations() {
        let cli =
            Cli::try_parse_from(["hello-world-service", "--runtime-timeout", "250ms"]).unwrap();
        assert_eq!(cli.runtime_timeout, Duration::from_millis(250));

        assert!(Cli::try_parse_from(["hello-world-service", "--runtime-timeout", "soon"]).is_err());
    }

    #[test]
    fn port_shorthand_listens_on_all_interfaces() {
        assert_eq!(normalize_address(":8080"), "0.0.0.0:8080");
        assert_eq!(normalize_address("127.0.0.1:9000"), "127.0.0.1:9000");
    }
}
