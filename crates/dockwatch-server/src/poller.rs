//! Reconciliation loop.
//!
//! One ticker drives the loop. Each cycle is awaited before the next tick is
//! taken and missed ticks are skipped, so cycles never overlap and a slow
//! remote host only delays the schedule. Remote failures are recorded in the
//! feed and retried on the next tick; they never end the loop.

use std::time::Duration;

use chrono::Utc;
use dockwatch_core::{ContainerReader, CycleOutcome, poll_once};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::feed::SharedFeed;

pub struct Poller {
    reader: ContainerReader,
    feed: SharedFeed,
    interval: Duration,
    log_lines: usize,
    shutdown_rx: broadcast::Receiver<()>,
}

impl Poller {
    pub fn new(
        reader: ContainerReader,
        feed: SharedFeed,
        interval: Duration,
        log_lines: usize,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            reader,
            feed,
            interval,
            log_lines,
            shutdown_rx,
        }
    }

    /// Run until a shutdown signal arrives or every shutdown sender is gone.
    pub async fn run(mut self) {
        tracing::info!(
            host = self.reader.executor().target(),
            interval_secs = self.interval.as_secs_f64(),
            "poller started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.shutdown_rx.recv() => break,
            }
            // A cycle in flight is dropped on shutdown; dropping it kills any
            // remote command still running.
            let Self {
                reader,
                feed,
                log_lines,
                shutdown_rx,
                ..
            } = &mut self;
            tokio::select! {
                _ = cycle(reader, feed, *log_lines) => {}
                _ = shutdown_rx.recv() => break,
            }
        }
        tracing::info!("poller stopping");
    }

    /// Poll once and publish the resulting events. Returns how many events
    /// the cycle produced.
    pub async fn run_cycle(&self) -> usize {
        cycle(&self.reader, &self.feed, self.log_lines).await
    }
}

async fn cycle(reader: &ContainerReader, feed: &SharedFeed, log_lines: usize) -> usize {
    let outcome = poll_once(reader, log_lines).await;
    if let CycleOutcome::Failed { message } = &outcome {
        tracing::warn!(host = reader.executor().target(), "poll cycle failed: {message}");
    }
    let emitted = feed.write().await.apply(outcome, Utc::now());
    if emitted > 0 {
        tracing::debug!("cycle produced {emitted} dashboard event(s)");
    }
    emitted
}

pub fn spawn_poller(poller: Poller) -> JoinHandle<()> {
    tokio::spawn(poller.run())
}
