//! Scripted executor for tests.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::docker::LIST_CONTAINERS_COMMAND;
use crate::executor::{CommandOutput, ExecError, RemoteExecutor};

/// Answers commands from a table keyed by the exact command string.
///
/// Unscripted commands fail with [`ExecError::Spawn`]. Calling
/// [`MockExecutor::disconnect`] makes every command fail with
/// [`ExecError::Connect`] until [`MockExecutor::reconnect`].
#[derive(Debug, Default)]
pub struct MockExecutor {
    inner: Mutex<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    responses: HashMap<String, Result<CommandOutput, ExecError>>,
    calls: Vec<String>,
    disconnected: bool,
    delay: Option<Duration>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, command: impl Into<String>, output: CommandOutput) {
        self.state().responses.insert(command.into(), Ok(output));
    }

    pub fn fail(&self, command: impl Into<String>, err: ExecError) {
        self.state().responses.insert(command.into(), Err(err));
    }

    /// Script the listing command with the given tab-separated lines.
    pub fn respond_listing(&self, lines: &[&str]) {
        self.respond(LIST_CONTAINERS_COMMAND, CommandOutput::ok(lines.join("\n")));
    }

    /// Script the log command for `container_id` at `tail` lines.
    pub fn respond_logs(&self, container_id: &str, tail: usize, logs: &str) {
        self.respond(
            format!("docker logs --tail {tail} --timestamps {container_id}"),
            CommandOutput::ok(logs),
        );
    }

    pub fn disconnect(&self) {
        self.state().disconnected = true;
    }

    pub fn reconnect(&self) {
        self.state().disconnected = false;
    }

    /// Hold every command for `delay` before answering, like a slow host.
    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = Some(delay);
    }

    /// Commands received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RemoteExecutor for MockExecutor {
    fn target(&self) -> &str {
        "mock"
    }

    async fn run_command(&self, command: &str) -> Result<CommandOutput, ExecError> {
        let delay = {
            let mut state = self.state();
            state.calls.push(command.to_string());
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let state = self.state();
        if state.disconnected {
            return Err(ExecError::Connect {
                target: "mock".into(),
                message: "connection refused".into(),
            });
        }
        state
            .responses
            .get(command)
            .cloned()
            .unwrap_or_else(|| Err(ExecError::Spawn(format!("no scripted response for `{command}`"))))
    }
}
