//! Dashboard state shared between the poller and the HTTP handlers.
//!
//! The feed wraps a [`Dashboard`] with a monotonically increasing sequence
//! number and a bounded log of the events each cycle produced, so polling
//! clients can fetch only what changed since their last request.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dockwatch_core::api::{DashboardSnapshot, EventsPage, SequencedEvent};
use dockwatch_core::{CycleOutcome, Dashboard};
use tokio::sync::RwLock;

pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

pub type SharedFeed = Arc<RwLock<DashboardFeed>>;

#[derive(Debug)]
pub struct DashboardFeed {
    dashboard: Dashboard,
    events: VecDeque<SequencedEvent>,
    capacity: usize,
    epoch: u64,
    seq: u64,
    last_cycle_at: Option<DateTime<Utc>>,
}

impl Default for DashboardFeed {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }
}

impl DashboardFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            dashboard: Dashboard::new(),
            events: VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_CAPACITY)),
            capacity: capacity.max(1),
            epoch: boot_epoch(),
            seq: 0,
            last_cycle_at: None,
        }
    }

    pub fn shared(self) -> SharedFeed {
        Arc::new(RwLock::new(self))
    }

    /// Apply one cycle's outcome; returns the number of events appended.
    pub fn apply(&mut self, outcome: CycleOutcome, now: DateTime<Utc>) -> usize {
        self.last_cycle_at = Some(now);
        let events = self.dashboard.apply(outcome);
        let count = events.len();
        for event in events {
            self.seq += 1;
            if self.events.len() == self.capacity {
                self.events.pop_front();
            }
            self.events.push_back(SequencedEvent {
                seq: self.seq,
                event,
            });
        }
        count
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            epoch: self.epoch,
            seq: self.seq,
            error: self.dashboard.error().map(str::to_string),
            degraded: self.dashboard.malformed(),
            last_cycle_at: self.last_cycle_at,
            containers: self.dashboard.views(),
        }
    }

    /// Events with `seq > since`.
    ///
    /// `reset` is set when `epoch` names another server process, when events
    /// after `since` were already evicted, or when `since` is ahead of this
    /// feed. Without an epoch the cursor is trusted as is.
    pub fn events_since(&self, since: u64, epoch: Option<u64>) -> EventsPage {
        let evicted = match self.events.front() {
            Some(first) => first.seq > since.saturating_add(1),
            None => false,
        };
        let restarted = epoch.is_some_and(|epoch| epoch != self.epoch);
        if restarted || since > self.seq || (since < self.seq && evicted) {
            return EventsPage {
                epoch: self.epoch,
                seq: self.seq,
                reset: true,
                events: Vec::new(),
            };
        }
        EventsPage {
            epoch: self.epoch,
            seq: self.seq,
            reset: false,
            events: self
                .events
                .iter()
                .filter(|e| e.seq > since)
                .cloned()
                .collect(),
        }
    }
}

/// Boot time in nanoseconds, unique per server process.
fn boot_epoch() -> u64 {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .map(|nanos| nanos as u64)
        .unwrap_or(now.timestamp_millis() as u64)
}
