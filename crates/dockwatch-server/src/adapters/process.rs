use std::process::Stdio;
use std::time::Duration;

use dockwatch_core::{CommandOutput, ExecError};
use tokio::process::Command;

/// Run `command` to completion, killing it if it outlives `timeout`.
pub(crate) async fn run_with_timeout(
    mut command: Command,
    timeout: Duration,
) -> Result<CommandOutput, ExecError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = command
        .spawn()
        .map_err(|err| ExecError::Spawn(err.to_string()))?;

    // Dropping the wait future on timeout drops the child, which kills it.
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => return Err(ExecError::Spawn(err.to_string())),
        Err(_) => return Err(ExecError::Timeout(timeout)),
    };

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code(),
    })
}
