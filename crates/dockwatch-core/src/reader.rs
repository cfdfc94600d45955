//! Container status reader: issues the listing and log commands through a
//! [`RemoteExecutor`] and turns their output into records.

use std::sync::Arc;

use thiserror::Error;

use crate::container::{ContainerListing, ContainerRecord, DEFAULT_EXCLUDED_NAME, parse_listing};
use crate::docker::{InvalidContainerId, LIST_CONTAINERS_COMMAND, logs_command};
use crate::executor::{ExecError, RemoteExecutor};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("remote command reported an error: {0}")]
    Command(String),
    #[error(transparent)]
    InvalidId(#[from] InvalidContainerId),
}

#[derive(Clone)]
pub struct ContainerReader {
    executor: Arc<dyn RemoteExecutor>,
    excluded_name: String,
}

impl ContainerReader {
    pub fn new(executor: Arc<dyn RemoteExecutor>) -> Self {
        Self {
            executor,
            excluded_name: DEFAULT_EXCLUDED_NAME.to_string(),
        }
    }

    pub fn with_excluded_name(mut self, excluded_name: impl Into<String>) -> Self {
        self.excluded_name = excluded_name.into();
        self
    }

    pub fn executor(&self) -> &Arc<dyn RemoteExecutor> {
        &self.executor
    }

    /// Read the current container listing.
    ///
    /// Any output on stderr fails the whole read; partial listings are never
    /// returned.
    pub async fn read_containers(&self) -> Result<ContainerListing, ReadError> {
        let output = self.executor.run_command(LIST_CONTAINERS_COMMAND).await?;
        if output.has_stderr() {
            return Err(ReadError::Command(output.stderr.trim().to_string()));
        }
        let listing = parse_listing(&output.stdout, &self.excluded_name);
        if listing.is_degraded() {
            tracing::warn!(
                host = self.executor.target(),
                malformed = listing.malformed.len(),
                "container listing contained malformed lines"
            );
        }
        Ok(listing)
    }

    /// Listing for callers that cannot tell "no containers" apart from a
    /// failed read. Failures are logged and yield an empty list.
    pub async fn containers_or_empty(&self) -> Vec<ContainerRecord> {
        match self.read_containers().await {
            Ok(listing) => listing.containers,
            Err(err) => {
                tracing::warn!(host = self.executor.target(), "container listing failed: {err}");
                Vec::new()
            }
        }
    }

    /// Fetch the last `lines` timestamped log lines of a container.
    ///
    /// docker writes the container's own stderr stream to stderr, so stderr is
    /// used whenever stdout is empty. A non-zero exit with nothing on stdout
    /// is docker itself failing (no such container, daemon down).
    pub async fn container_logs(&self, container_id: &str, lines: usize) -> Result<String, ReadError> {
        let command = logs_command(container_id, lines)?;
        let output = self.executor.run_command(&command).await?;
        if !output.stdout.is_empty() {
            return Ok(output.stdout);
        }
        match output.exit_code {
            Some(code) if code != 0 => Err(ReadError::Command(output.stderr.trim().to_string())),
            _ => Ok(output.stderr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::CommandOutput;
    use crate::fixtures::MockExecutor;

    fn reader(mock: &Arc<MockExecutor>) -> ContainerReader {
        ContainerReader::new(mock.clone())
    }

    #[tokio::test]
    async fn stderr_fails_the_read() {
        let mock = Arc::new(MockExecutor::new());
        mock.respond(
            LIST_CONTAINERS_COMMAND,
            CommandOutput {
                stdout: "abc\tnginx\tUp\tweb\trunning\n".into(),
                stderr: "Cannot connect to the Docker daemon".into(),
                exit_code: Some(1),
            },
        );
        let err = reader(&mock).read_containers().await.unwrap_err();
        assert_eq!(
            err,
            ReadError::Command("Cannot connect to the Docker daemon".into())
        );
        assert!(reader(&mock).containers_or_empty().await.is_empty());
    }

    #[tokio::test]
    async fn logs_fall_back_to_stderr() {
        let mock = Arc::new(MockExecutor::new());
        mock.respond(
            "docker logs --tail 10 --timestamps abc",
            CommandOutput::failed("2024-01-01T00:00:00Z boom", 0),
        );
        let logs = reader(&mock).container_logs("abc", 10).await.unwrap();
        assert_eq!(logs, "2024-01-01T00:00:00Z boom");
    }

    #[tokio::test]
    async fn docker_failure_is_not_log_content() {
        let mock = Arc::new(MockExecutor::new());
        mock.respond(
            "docker logs --tail 10 --timestamps abc",
            CommandOutput::failed("Error response from daemon: No such container: abc\n", 1),
        );
        let err = reader(&mock).container_logs("abc", 10).await.unwrap_err();
        assert_eq!(
            err,
            ReadError::Command("Error response from daemon: No such container: abc".into())
        );
    }

    #[tokio::test]
    async fn whitespace_on_stderr_fails_the_listing() {
        let mock = Arc::new(MockExecutor::new());
        mock.respond(
            LIST_CONTAINERS_COMMAND,
            CommandOutput {
                stdout: "abc\tnginx\tUp\tweb\trunning\n".into(),
                stderr: "\n".into(),
                exit_code: Some(0),
            },
        );
        assert!(matches!(
            reader(&mock).read_containers().await,
            Err(ReadError::Command(_))
        ));
    }

    #[tokio::test]
    async fn invalid_id_never_reaches_executor() {
        let mock = Arc::new(MockExecutor::new());
        let err = reader(&mock).container_logs("x; reboot", 10).await.unwrap_err();
        assert!(matches!(err, ReadError::InvalidId(_)));
        assert!(mock.calls().is_empty());
    }
}
