//! Container records parsed from `docker ps` output.
//!
//! The listing command prints one container per line with five tab-separated
//! columns: `id`, `image`, `status`, `name`, `state`. Parsing is positional.
//! Lines with fewer than five columns are reported as [`ParseError`]s and
//! skipped; trailing extra columns are ignored.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Containers whose name contains this substring are management
/// infrastructure and never surfaced.
pub const DEFAULT_EXCLUDED_NAME: &str = "portainer";

/// Downtime reported for offline containers whose status cannot be parsed.
pub const UNKNOWN_DOWNTIME: &str = "unknown time";

const RUNNING_STATE: &str = "running";
const FIELD_COUNT: usize = 5;

static EXITED_STATUS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Exited \(\d+\) (.*) ago").expect("exited status pattern is valid")
});

/// One container as reported by the remote host at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRecord {
    pub id: String,
    pub image: String,
    /// Free-text status, e.g. `Up 3 hours` or `Exited (0) 2 hours ago`.
    pub status: String,
    pub name: String,
    /// Coarse lifecycle tag (`running`, `exited`, `restarting`, ...).
    pub state: String,
    pub is_offline: bool,
    /// Elapsed time since the container went down; `None` while running.
    pub downtime: Option<String>,
}

impl ContainerRecord {
    /// Build a record from raw columns, deriving `is_offline` and `downtime`.
    pub fn new(
        id: impl Into<String>,
        image: impl Into<String>,
        status: impl Into<String>,
        name: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        let status = status.into();
        let state = state.into();
        let is_offline = state != RUNNING_STATE;
        let downtime = is_offline.then(|| parse_downtime(&status));
        Self {
            id: id.into(),
            image: image.into(),
            status,
            name: name.into(),
            state,
            is_offline,
            downtime,
        }
    }

    /// First twelve characters of the id, the short form docker prints.
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(12) {
            Some((idx, _)) => &self.id[..idx],
            None => &self.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: expected 5 tab-separated fields, found {found}")]
    MissingFields { line: usize, found: usize },
    #[error("line {line}: empty container id")]
    EmptyId { line: usize },
}

/// Result of parsing a full listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerListing {
    pub containers: Vec<ContainerRecord>,
    /// Lines that could not be parsed. Non-empty means the data is degraded.
    pub malformed: Vec<ParseError>,
}

impl ContainerListing {
    pub fn is_degraded(&self) -> bool {
        !self.malformed.is_empty()
    }
}

/// Extract the downtime from an `Exited (<code>) <duration> ago` status.
pub fn parse_downtime(status: &str) -> String {
    EXITED_STATUS
        .captures(status)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN_DOWNTIME.to_string())
}

/// Parse a single listing line. `line_no` is 1-based and only used in errors.
pub fn parse_line(line_no: usize, line: &str) -> Result<ContainerRecord, ParseError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < FIELD_COUNT {
        return Err(ParseError::MissingFields {
            line: line_no,
            found: fields.len(),
        });
    }
    let id = fields[0].trim();
    if id.is_empty() {
        return Err(ParseError::EmptyId { line: line_no });
    }
    Ok(ContainerRecord::new(
        id,
        fields[1],
        fields[2],
        fields[3],
        fields[4].trim(),
    ))
}

/// Parse the whole listing output, skipping blank lines, reporting malformed
/// ones, and dropping records whose name contains `excluded_name`.
pub fn parse_listing(output: &str, excluded_name: &str) -> ContainerListing {
    let mut listing = ContainerListing::default();
    for (idx, line) in output.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(idx + 1, line) {
            Ok(record) => listing.containers.push(record),
            Err(err) => listing.malformed.push(err),
        }
    }
    if !excluded_name.is_empty() {
        listing
            .containers
            .retain(|record| !record.name.contains(excluded_name));
    }
    listing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_iff_not_running() {
        for state in ["running", "exited", "restarting", "paused", "created", "dead"] {
            let record = ContainerRecord::new("abc", "img", "whatever", "svc", state);
            assert_eq!(record.is_offline, state != "running", "state {state}");
        }
    }

    #[test]
    fn downtime_extracted_from_exited_status() {
        assert_eq!(parse_downtime("Exited (0) 2 hours ago"), "2 hours");
        assert_eq!(parse_downtime("Exited (137) About a minute ago"), "About a minute");
        assert_eq!(parse_downtime("Exited (1) 3 days ago"), "3 days");
    }

    #[test]
    fn unmatched_status_is_unknown_time() {
        assert_eq!(parse_downtime("Restarting (1) 5 seconds ago"), UNKNOWN_DOWNTIME);
        assert_eq!(parse_downtime("Created"), UNKNOWN_DOWNTIME);
        assert_eq!(parse_downtime(""), UNKNOWN_DOWNTIME);
    }

    #[test]
    fn running_container_has_no_downtime() {
        let record = parse_line(1, "abc123\tnginx:latest\tUp 2 hours\tweb-1\trunning").unwrap();
        assert!(!record.is_offline);
        assert_eq!(record.downtime, None);
    }

    #[test]
    fn two_line_listing() {
        let output = "abc123\tnginx:latest\tUp 2 hours\tweb-1\trunning\n\
                      def456\talpine\tExited (0) 3 hours ago\tworker-1\texited\n";
        let listing = parse_listing(output, DEFAULT_EXCLUDED_NAME);
        assert!(!listing.is_degraded());
        assert_eq!(listing.containers.len(), 2);

        let web = &listing.containers[0];
        assert_eq!(web.id, "abc123");
        assert_eq!(web.image, "nginx:latest");
        assert_eq!(web.name, "web-1");
        assert!(!web.is_offline);
        assert_eq!(web.downtime, None);

        let worker = &listing.containers[1];
        assert!(worker.is_offline);
        assert_eq!(worker.downtime.as_deref(), Some("3 hours"));
    }

    #[test]
    fn excluded_names_never_surface() {
        let output = "aaa\tportainer/agent\tUp 1 hour\tportainer-agent\trunning\n\
                      bbb\tportainer/portainer-ce\tExited (2) 1 day ago\tportainer\texited\n\
                      ccc\tredis\tUp 1 hour\tcache\trunning";
        let listing = parse_listing(output, DEFAULT_EXCLUDED_NAME);
        let names: Vec<_> = listing.containers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["cache"]);
    }

    #[test]
    fn exclusion_is_case_sensitive() {
        let output = "aaa\timg\tUp 1 hour\tPortainer-UI\trunning";
        let listing = parse_listing(output, DEFAULT_EXCLUDED_NAME);
        assert_eq!(listing.containers.len(), 1);
    }

    #[test]
    fn malformed_lines_are_reported_not_surfaced() {
        let output = "\nabc\tnginx\tUp 1 hour\n\nddd\tredis\tUp 1 hour\tcache\trunning\n\tx\ty\tz\tw";
        let listing = parse_listing(output, DEFAULT_EXCLUDED_NAME);
        assert_eq!(listing.containers.len(), 1);
        assert_eq!(
            listing.malformed,
            vec![
                ParseError::MissingFields { line: 2, found: 3 },
                ParseError::EmptyId { line: 5 },
            ]
        );
        assert!(listing.is_degraded());
    }

    #[test]
    fn extra_fields_are_ignored() {
        let record = parse_line(1, "abc\tnginx\tUp 1 hour\tweb\trunning\textra").unwrap();
        assert_eq!(record.state, "running");
    }

    #[test]
    fn serializes_camel_case_with_null_downtime() {
        let record = ContainerRecord::new("abc", "nginx", "Up 1 hour", "web", "running");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["isOffline"], false);
        assert!(value["downtime"].is_null());
    }

    #[test]
    fn short_id_truncates_to_twelve() {
        let record = ContainerRecord::new("0123456789abcdef", "img", "Up", "svc", "running");
        assert_eq!(record.short_id(), "0123456789ab");
        let record = ContainerRecord::new("abc", "img", "Up", "svc", "running");
        assert_eq!(record.short_id(), "abc");
    }
}
