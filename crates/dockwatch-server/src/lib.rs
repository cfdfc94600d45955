//! Dashboard server: owns the remote executor, the reconciliation loop and
//! the HTTP API.

pub mod adapters;
pub mod config;
pub mod error;
pub mod feed;
pub mod http;
pub mod poller;

use std::sync::Arc;

use dockwatch_core::{AccessPolicy, AccessRegistry, ContainerReader};
use tokio::sync::broadcast;

pub use config::{ConfigError, RemoteConfig, ServerConfig, SshConfig};
pub use error::ServerError;
pub use feed::{DashboardFeed, SharedFeed};
pub use http::{ApiSettings, AppState};
pub use poller::Poller;

/// Build every component from `config` and serve until `shutdown_tx` fires.
pub async fn serve(
    config: ServerConfig,
    shutdown_tx: broadcast::Sender<()>,
) -> Result<(), ServerError> {
    let executor = adapters::make_executor(&config);
    tracing::info!(
        host = executor.target(),
        allowed_users = config.allowed_users.len(),
        execute_enabled = config.enable_execute,
        "starting dockwatch server"
    );
    let reader = ContainerReader::new(executor).with_excluded_name(config.excluded_name.clone());
    let policy = AccessPolicy::new(config.allowed_users.clone(), Arc::new(AccessRegistry::new()));
    let feed = DashboardFeed::new().shared();

    let poller = Poller::new(
        reader.clone(),
        feed.clone(),
        config.poll_interval,
        config.log_tail_lines,
        shutdown_tx.subscribe(),
    );
    let poller_handle = poller::spawn_poller(poller);

    let state = AppState::new(reader, policy, feed, ApiSettings::from(&config));
    let http_result = http::spawn_http_server(config.bind, state, shutdown_tx.clone()).await;

    // Stop the poller whether the server ended cleanly or not.
    let _ = shutdown_tx.send(());
    poller_handle.await?;
    http_result?
}
