//! The remote command channel consumed by the reader.
//!
//! Implementations live outside the core (see the server's adapters); the core
//! only depends on this trait so it can be driven by scripted fixtures.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Captured output of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    pub fn failed(stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: Some(exit_code),
        }
    }

    /// Any bytes on stderr count, whitespace included.
    pub fn has_stderr(&self) -> bool {
        !self.stderr.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("failed to connect to {target}: {message}")]
    Connect { target: String, message: String },
    #[error("command timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to spawn command: {0}")]
    Spawn(String),
}

/// Runs shell commands on one fixed, pre-configured host.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Human-readable target, used in logs and errors.
    fn target(&self) -> &str;

    async fn run_command(&self, command: &str) -> Result<CommandOutput, ExecError>;
}
