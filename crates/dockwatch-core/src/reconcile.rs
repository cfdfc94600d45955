//! Reconciliation of successive polls into presentation events.
//!
//! Each cycle produces a fresh list of [`ContainerView`]s. [`Dashboard`]
//! keeps the last rendered view per container id and emits only what
//! changed, so a consumer that applies the events in order always mirrors
//! the latest poll. Identical polls produce no events.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::container::{ContainerRecord, UNKNOWN_DOWNTIME};
use crate::reader::ContainerReader;

/// Rendered log tail of one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum LogTail {
    Lines(Vec<String>),
    /// Fetch failed for this container only.
    Error(String),
}

impl LogTail {
    /// Last `n` non-blank lines of raw log output.
    pub fn from_raw(raw: &str, n: usize) -> Self {
        let lines: Vec<&str> = raw
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();
        let start = lines.len().saturating_sub(n);
        LogTail::Lines(lines[start..].iter().map(|l| l.to_string()).collect())
    }
}

/// What the presentation layer shows for one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContainerView {
    pub id: String,
    pub line: String,
    pub logs: LogTail,
}

/// `web-1 [abc123def456] Up 2 hours` or `worker-1 [def456] offline for 3 hours`.
pub fn display_line(record: &ContainerRecord) -> String {
    if record.is_offline {
        let downtime = record.downtime.as_deref().unwrap_or(UNKNOWN_DOWNTIME);
        format!("{} [{}] offline for {}", record.name, record.short_id(), downtime)
    } else {
        format!("{} [{}] {}", record.name, record.short_id(), record.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DashboardEvent {
    Added { id: String, line: String, logs: LogTail },
    LineChanged { id: String, line: String },
    LogsChanged { id: String, logs: LogTail },
    Removed { id: String },
    /// The listing could not be read; the last known view stays in place.
    ErrorRaised { message: String },
    ErrorCleared,
    /// Number of malformed listing lines changed.
    Degraded { malformed: usize },
}

/// Result of one poll of the remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Listed {
        views: Vec<ContainerView>,
        malformed: usize,
    },
    Failed {
        message: String,
    },
}

/// Read the listing and every container's log tail.
///
/// A failing log fetch only marks that container; a failing listing fails
/// the whole cycle.
pub async fn poll_once(reader: &ContainerReader, log_lines: usize) -> CycleOutcome {
    let listing = match reader.read_containers().await {
        Ok(listing) => listing,
        Err(err) => {
            return CycleOutcome::Failed {
                message: err.to_string(),
            };
        }
    };
    let mut views = Vec::with_capacity(listing.containers.len());
    for record in &listing.containers {
        let logs = match reader.container_logs(&record.id, log_lines).await {
            Ok(raw) => LogTail::from_raw(&raw, log_lines),
            Err(err) => {
                tracing::debug!(container = %record.id, "log fetch failed: {err}");
                LogTail::Error(format!("Failed to fetch logs: {err}"))
            }
        };
        views.push(ContainerView {
            id: record.id.clone(),
            line: display_line(record),
            logs,
        });
    }
    CycleOutcome::Listed {
        views,
        malformed: listing.malformed.len(),
    }
}

#[derive(Debug, Clone)]
struct Tracked {
    line: String,
    logs: LogTail,
}

/// Last rendered state, keyed by container id.
#[derive(Debug, Default)]
pub struct Dashboard {
    tracked: HashMap<String, Tracked>,
    order: Vec<String>,
    error: Option<String>,
    malformed: usize,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, outcome: CycleOutcome) -> Vec<DashboardEvent> {
        match outcome {
            CycleOutcome::Listed { views, malformed } => self.reconcile(views, malformed),
            CycleOutcome::Failed { message } => self.record_failure(message),
        }
    }

    /// Diff a successful poll against the tracked set.
    pub fn reconcile(&mut self, views: Vec<ContainerView>, malformed: usize) -> Vec<DashboardEvent> {
        let mut events = Vec::new();
        if self.error.take().is_some() {
            events.push(DashboardEvent::ErrorCleared);
        }
        if malformed != self.malformed {
            self.malformed = malformed;
            events.push(DashboardEvent::Degraded { malformed });
        }

        let mut seen = HashSet::with_capacity(views.len());
        let mut order = Vec::with_capacity(views.len());
        for view in views {
            if !seen.insert(view.id.clone()) {
                continue;
            }
            order.push(view.id.clone());
            match self.tracked.get_mut(&view.id) {
                None => {
                    self.tracked.insert(
                        view.id.clone(),
                        Tracked {
                            line: view.line.clone(),
                            logs: view.logs.clone(),
                        },
                    );
                    events.push(DashboardEvent::Added {
                        id: view.id,
                        line: view.line,
                        logs: view.logs,
                    });
                }
                Some(tracked) => {
                    if tracked.line != view.line {
                        tracked.line = view.line.clone();
                        events.push(DashboardEvent::LineChanged {
                            id: view.id.clone(),
                            line: view.line,
                        });
                    }
                    if tracked.logs != view.logs {
                        tracked.logs = view.logs.clone();
                        events.push(DashboardEvent::LogsChanged {
                            id: view.id,
                            logs: view.logs,
                        });
                    }
                }
            }
        }

        for id in &self.order {
            if !seen.contains(id) {
                self.tracked.remove(id);
                events.push(DashboardEvent::Removed { id: id.clone() });
            }
        }
        self.order = order;
        events
    }

    /// Record a failed poll. Tracked containers are kept; the error is only
    /// announced when its text changes.
    pub fn record_failure(&mut self, message: String) -> Vec<DashboardEvent> {
        if self.error.as_deref() == Some(message.as_str()) {
            return Vec::new();
        }
        self.error = Some(message.clone());
        vec![DashboardEvent::ErrorRaised { message }]
    }

    /// Current view in poll order.
    pub fn views(&self) -> Vec<ContainerView> {
        self.order
            .iter()
            .filter_map(|id| {
                self.tracked.get(id).map(|t| ContainerView {
                    id: id.clone(),
                    line: t.line.clone(),
                    logs: t.logs.clone(),
                })
            })
            .collect()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn malformed(&self) -> usize {
        self.malformed
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::executor::CommandOutput;
    use crate::fixtures::MockExecutor;

    fn view(id: &str, line: &str, logs: &[&str]) -> ContainerView {
        ContainerView {
            id: id.into(),
            line: line.into(),
            logs: LogTail::Lines(logs.iter().map(|l| l.to_string()).collect()),
        }
    }

    #[test]
    fn tail_keeps_last_non_blank_lines() {
        let raw = "a\n\n  \nb\nc  \n\nd\n";
        assert_eq!(
            LogTail::from_raw(raw, 3),
            LogTail::Lines(vec!["b".into(), "c".into(), "d".into()])
        );
        assert_eq!(LogTail::from_raw("", 3), LogTail::Lines(vec![]));
    }

    #[test]
    fn display_lines() {
        let running = ContainerRecord::new("0123456789abcdef", "nginx", "Up 2 hours", "web-1", "running");
        assert_eq!(display_line(&running), "web-1 [0123456789ab] Up 2 hours");
        let exited = ContainerRecord::new("def456", "alpine", "Exited (0) 3 hours ago", "worker-1", "exited");
        assert_eq!(display_line(&exited), "worker-1 [def456] offline for 3 hours");
        let restarting = ContainerRecord::new("aaa", "x", "Restarting (1) 2 seconds ago", "job", "restarting");
        assert_eq!(display_line(&restarting), "job [aaa] offline for unknown time");
    }

    #[test]
    fn first_poll_adds_everything() {
        let mut dash = Dashboard::new();
        let events = dash.reconcile(vec![view("a", "A up", &["l1"]), view("b", "B up", &[])], 0);
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], DashboardEvent::Added { id, .. } if id == "a"));
        assert!(matches!(&events[1], DashboardEvent::Added { id, .. } if id == "b"));
        assert_eq!(dash.len(), 2);
    }

    #[test]
    fn identical_poll_is_silent() {
        let mut dash = Dashboard::new();
        let poll = vec![view("a", "A up", &["l1", "l2"]), view("b", "B down", &[])];
        dash.reconcile(poll.clone(), 0);
        assert!(dash.reconcile(poll, 0).is_empty());
    }

    #[test]
    fn changes_and_removals() {
        let mut dash = Dashboard::new();
        dash.reconcile(
            vec![view("a", "A up", &["l1"]), view("b", "B up", &["x"]), view("c", "C up", &[])],
            0,
        );
        let events = dash.reconcile(
            vec![view("a", "A offline for 1 minute", &["l1"]), view("b", "B up", &["x", "y"])],
            0,
        );
        assert_eq!(
            events,
            vec![
                DashboardEvent::LineChanged {
                    id: "a".into(),
                    line: "A offline for 1 minute".into()
                },
                DashboardEvent::LogsChanged {
                    id: "b".into(),
                    logs: LogTail::Lines(vec!["x".into(), "y".into()])
                },
                DashboardEvent::Removed { id: "c".into() },
            ]
        );
        let ids: Vec<_> = dash.views().into_iter().map(|v| v.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn failure_keeps_view_and_is_announced_once() {
        let mut dash = Dashboard::new();
        dash.reconcile(vec![view("a", "A up", &[])], 0);

        let first = dash.record_failure("connection refused".into());
        assert_eq!(
            first,
            vec![DashboardEvent::ErrorRaised {
                message: "connection refused".into()
            }]
        );
        assert!(dash.record_failure("connection refused".into()).is_empty());
        assert_eq!(dash.len(), 1);
        assert_eq!(dash.error(), Some("connection refused"));

        let recovered = dash.reconcile(vec![view("a", "A up", &[])], 0);
        assert_eq!(recovered, vec![DashboardEvent::ErrorCleared]);
        assert_eq!(dash.error(), None);
    }

    #[test]
    fn degraded_count_reported_on_change() {
        let mut dash = Dashboard::new();
        assert_eq!(dash.reconcile(vec![], 2), vec![DashboardEvent::Degraded { malformed: 2 }]);
        assert!(dash.reconcile(vec![], 2).is_empty());
        assert_eq!(dash.reconcile(vec![], 0), vec![DashboardEvent::Degraded { malformed: 0 }]);
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let mut dash = Dashboard::new();
        let events = dash.reconcile(vec![view("a", "first", &[]), view("a", "second", &[])], 0);
        assert_eq!(events.len(), 1);
        assert_eq!(dash.views()[0].line, "first");
    }

    #[test]
    fn event_json_shape() {
        let event = DashboardEvent::LogsChanged {
            id: "a".into(),
            logs: LogTail::Error("boom".into()),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], "logs_changed");
        assert_eq!(value["logs"]["error"], "boom");
    }

    #[tokio::test]
    async fn poll_isolates_log_failures() {
        let mock = Arc::new(MockExecutor::new());
        mock.respond_listing(&[
            "abc123\tnginx:latest\tUp 2 hours\tweb-1\trunning",
            "def456\talpine\tExited (0) 3 hours ago\tworker-1\texited",
            "fff999\tportainer/agent\tUp 1 hour\tportainer-agent\trunning",
        ]);
        mock.respond_logs("abc123", 10, "2024-01-01T00:00:00Z hello\n");
        // def456 has no scripted log response and fails.
        let reader = ContainerReader::new(mock.clone());

        let outcome = poll_once(&reader, 10).await;
        let CycleOutcome::Listed { views, malformed } = outcome else {
            panic!("expected a listing");
        };
        assert_eq!(malformed, 0);
        assert_eq!(views.len(), 2);
        assert_eq!(
            views[0].logs,
            LogTail::Lines(vec!["2024-01-01T00:00:00Z hello".into()])
        );
        assert!(matches!(&views[1].logs, LogTail::Error(msg) if msg.starts_with("Failed to fetch logs")));
        assert_eq!(views[1].line, "worker-1 [def456] offline for 3 hours");
        // The excluded container's logs are never requested.
        assert!(!mock.calls().iter().any(|c| c.contains("fff999")));
    }

    #[tokio::test]
    async fn poll_marks_docker_log_errors_inline() {
        let mock = Arc::new(MockExecutor::new());
        mock.respond_listing(&[
            "abc123\tnginx:latest\tUp 2 hours\tweb-1\trunning",
            "def456\talpine\tUp 1 hour\tworker-1\trunning",
        ]);
        mock.respond(
            "docker logs --tail 10 --timestamps abc123",
            CommandOutput::failed("Error response from daemon: No such container: abc123", 1),
        );
        mock.respond_logs("def456", 10, "2024-01-01T00:00:00Z ok\n");
        let reader = ContainerReader::new(mock.clone());

        let CycleOutcome::Listed { views, .. } = poll_once(&reader, 10).await else {
            panic!("expected a listing");
        };
        assert!(matches!(
            &views[0].logs,
            LogTail::Error(msg) if msg.contains("No such container: abc123")
        ));
        assert_eq!(
            views[1].logs,
            LogTail::Lines(vec!["2024-01-01T00:00:00Z ok".into()])
        );
    }

    #[tokio::test]
    async fn poll_reports_connectivity_failure() {
        let mock = Arc::new(MockExecutor::new());
        mock.disconnect();
        let reader = ContainerReader::new(mock.clone());
        let outcome = poll_once(&reader, 10).await;
        assert!(matches!(outcome, CycleOutcome::Failed { message } if message.contains("connection refused")));
    }
}
