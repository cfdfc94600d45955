//! The two command shapes issued against the remote host.

use thiserror::Error;

/// Lists every container (running or not) as tab-separated columns.
pub const LIST_CONTAINERS_COMMAND: &str =
    r#"docker ps -a --format "{{.ID}}\t{{.Image}}\t{{.Status}}\t{{.Names}}\t{{.State}}""#;

/// Default number of log lines fetched per container.
pub const DEFAULT_LOG_LINES: usize = 10;

const MAX_CONTAINER_ID_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid container id '{0}'")]
pub struct InvalidContainerId(pub String);

/// Container ids and names are interpolated into a shell command, so only
/// the characters docker itself allows in names are accepted.
pub fn validate_container_id(id: &str) -> Result<&str, InvalidContainerId> {
    let mut chars = id.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => chars
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')),
        _ => false,
    };
    if valid && id.len() <= MAX_CONTAINER_ID_LEN {
        Ok(id)
    } else {
        Err(InvalidContainerId(id.to_string()))
    }
}

/// `docker logs --tail <lines> --timestamps <id>`.
pub fn logs_command(container_id: &str, lines: usize) -> Result<String, InvalidContainerId> {
    let id = validate_container_id(container_id)?;
    Ok(format!("docker logs --tail {lines} --timestamps {id}"))
}
