use std::time::Duration;

use async_trait::async_trait;
use dockwatch_core::{CommandOutput, ExecError, RemoteExecutor};
use tokio::process::Command;

use super::process::run_with_timeout;

/// Runs commands through `sh -c` on this machine, for dashboards deployed on
/// the docker host itself.
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    timeout: Duration,
}

impl LocalExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl RemoteExecutor for LocalExecutor {
    fn target(&self) -> &str {
        "local"
    }

    async fn run_command(&self, command: &str) -> Result<CommandOutput, ExecError> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        run_with_timeout(cmd, self.timeout).await
    }
}
