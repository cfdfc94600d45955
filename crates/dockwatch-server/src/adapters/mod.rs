//! [`RemoteExecutor`] implementations backed by local processes.

use std::sync::Arc;

use dockwatch_core::RemoteExecutor;

use crate::config::{RemoteConfig, ServerConfig};

pub mod local;
mod process;
pub mod ssh;

pub use local::LocalExecutor;
pub use ssh::SshExecutor;

/// Build the single executor shared by the poller and request handlers.
pub fn make_executor(config: &ServerConfig) -> Arc<dyn RemoteExecutor> {
    match &config.remote {
        RemoteConfig::Local => Arc::new(LocalExecutor::new(config.command_timeout)),
        RemoteConfig::Ssh(ssh) => Arc::new(SshExecutor::new(ssh.clone(), config.command_timeout)),
    }
}
