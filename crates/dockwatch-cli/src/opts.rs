//! Global CLI options.

use anyhow::{Context, Result};
use clap::Args;
use dockwatch_client::{ClientConfig, DEFAULT_IDENTITY_HEADER, DEFAULT_SERVER_URL, DockwatchClient};

/// Options shared by every client command. All can be set via env vars.
#[derive(Args, Debug, Clone)]
pub struct ClientOpts {
    /// Dashboard server URL (env: DOCKWATCH_URL)
    #[arg(short = 's', long, global = true, env = "DOCKWATCH_URL", default_value = DEFAULT_SERVER_URL)]
    pub server: String,

    /// Username sent in the identity header (env: DOCKWATCH_USER)
    #[arg(short = 'u', long, global = true, env = "DOCKWATCH_USER")]
    pub user: Option<String>,

    /// Identity header name (env: IDENTITY_HEADER)
    #[arg(long, global = true, env = "IDENTITY_HEADER", default_value = DEFAULT_IDENTITY_HEADER)]
    pub identity_header: String,

    /// JSON output
    #[arg(long, global = true)]
    pub json: bool,
}

impl ClientOpts {
    pub fn client(&self) -> Result<DockwatchClient> {
        let mut config = ClientConfig::new(self.server.clone());
        config.user = self.user.clone();
        config.identity_header = self.identity_header.to_ascii_lowercase();
        DockwatchClient::new(config).context("create client")
    }
}
