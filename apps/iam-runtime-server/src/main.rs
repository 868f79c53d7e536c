//! IAM runtime sidecar.

mod config;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use iam_runtime::{RuntimeServer, Service};
use iam_runtime_sdk::ProtocolStyle;
use tokio_util::sync::CancellationToken;

use crate::config::{AppConfig, Overrides};

/// Serve the IAM runtime protocol on a unix-domain socket.
#[derive(Debug, Parser)]
#[command(name = "iam-runtime-server", version, about)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Socket path to serve on
    #[arg(long)]
    socket: Option<PathBuf>,

    /// How denials are reported: error_signal or field_signal
    #[arg(long)]
    protocol_style: Option<ProtocolStyle>,

    /// Log filter (RUST_LOG takes precedence)
    #[arg(long)]
    log_level: Option<String>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = Overrides {
        socket_path: cli.socket,
        protocol_style: cli.protocol_style,
        log_level: cli.log_level,
    };
    let config = AppConfig::load(cli.config.as_deref(), &overrides)
        .context("failed to load configuration")?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    logging::init(&config.logging)?;

    let backend = static_iam_plugin::build(&config.static_plugin)
        .context("invalid static_plugin configuration")?;
    let svc = Arc::new(Service::with_backend(backend));
    let server = RuntimeServer::bind(&config.runtime, svc)?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    server.serve(cancel).await
}

async fn cancel_on_signal(cancel: CancellationToken) {
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
    cancel.cancel();
}
