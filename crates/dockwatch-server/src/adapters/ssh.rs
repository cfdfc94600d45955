use std::ffi::OsString;
use std::time::Duration;

use async_trait::async_trait;
use dockwatch_core::{CommandOutput, ExecError, RemoteExecutor};
use tokio::process::Command;

use super::process::run_with_timeout;
use crate::config::SshConfig;

/// Exit status the OpenSSH client uses for its own failures (unreachable host,
/// rejected key, ...), as opposed to the remote command's status.
const SSH_CLIENT_FAILURE: i32 = 255;

/// How long the shared master connection outlives its last command.
const CONTROL_PERSIST: &str = "10m";

/// Runs commands on the remote host through the system `ssh` client.
///
/// All commands are multiplexed over a single master connection
/// (`ControlMaster=auto`), so the listing and every log fetch in a cycle reuse
/// one authenticated session.
#[derive(Debug, Clone)]
pub struct SshExecutor {
    config: SshConfig,
    destination: String,
    timeout: Duration,
    program: OsString,
}

impl SshExecutor {
    pub fn new(config: SshConfig, timeout: Duration) -> Self {
        let destination = config.destination();
        Self {
            config,
            destination,
            timeout,
            program: "ssh".into(),
        }
    }

    /// Use another ssh client binary instead of `ssh` from `PATH`.
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments passed to `ssh` for `command`.
    pub fn ssh_args(&self, command: &str) -> Vec<OsString> {
        let connect_timeout = self.timeout.as_secs().max(1);
        let control_path = self.config.control_dir.join("dockwatch-%C");

        let mut args: Vec<OsString> = vec![
            "-o".into(),
            "BatchMode=yes".into(),
            "-o".into(),
            format!("ConnectTimeout={connect_timeout}").into(),
            "-o".into(),
            "ControlMaster=auto".into(),
            "-o".into(),
            format!("ControlPersist={CONTROL_PERSIST}").into(),
            "-o".into(),
        ];
        let mut control = OsString::from("ControlPath=");
        control.push(control_path.as_os_str());
        args.push(control);

        if let Some(port) = self.config.port {
            args.push("-p".into());
            args.push(port.to_string().into());
        }
        if let Some(identity) = &self.config.identity_file {
            args.push("-i".into());
            args.push(identity.as_os_str().to_owned());
        }
        args.push(self.destination.as_str().into());
        args.push("--".into());
        args.push(command.into());
        args
    }
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    fn target(&self) -> &str {
        &self.destination
    }

    async fn run_command(&self, command: &str) -> Result<CommandOutput, ExecError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.ssh_args(command));
        let output = run_with_timeout(cmd, self.timeout).await?;
        if output.exit_code == Some(SSH_CLIENT_FAILURE) {
            tracing::warn!(host = %self.destination, "ssh connection failed");
            return Err(ExecError::Connect {
                target: self.destination.clone(),
                message: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }
}
