use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Args;
use dockwatch_server::ServerConfig;
use tokio::sync::broadcast;

/// Flags override the environment configuration.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address (env: DOCKWATCH_BIND)
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Seconds between reconciliation cycles (env: POLL_INTERVAL_SECS)
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Expose the remote command endpoint (env: ENABLE_EXECUTE)
    #[arg(long)]
    pub enable_execute: bool,
}

pub async fn cmd_serve(args: &ServeArgs) -> Result<()> {
    let mut config = ServerConfig::from_env().context("load server configuration")?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(secs) = args.poll_interval {
        if secs == 0 {
            bail!("--poll-interval must be greater than zero");
        }
        config.poll_interval = Duration::from_secs(secs);
    }
    if args.enable_execute {
        config.enable_execute = true;
    }
    let bind = config.bind;
    let (shutdown_tx, _) = broadcast::channel(1);

    // Handle Ctrl-C and SIGTERM for graceful shutdown
    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        let mut term =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl-C received, shutting down...");
            }
            _ = async {
                if let Some(ref mut t) = term { t.recv().await; }
            } => {
                tracing::info!("SIGTERM received, shutting down...");
            }
        }
        let _ = signal_tx.send(());
    });

    tracing::info!(
        "HTTP docs available at http://{}/api/docs/ (OpenAPI: /api/openapi.json)",
        bind
    );
    dockwatch_server::serve(config, shutdown_tx)
        .await
        .context("dashboard server")
}
