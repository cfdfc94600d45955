//! Polling dashboard client.
//!
//! Prints the snapshot once, then the events that follow it. When the
//! server can no longer serve the requested range the snapshot is fetched
//! and printed again.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use dockwatch_core::api::DashboardSnapshot;
use dockwatch_core::{DashboardEvent, LogTail};

use crate::opts::ClientOpts;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Seconds between polls
    #[arg(short = 'i', long, default_value_t = 5)]
    pub interval: u64,

    /// Stop after this many polls
    #[arg(long)]
    pub polls: Option<u64>,
}

pub async fn cmd_watch(opts: &ClientOpts, args: &WatchArgs) -> Result<()> {
    let client = opts.client()?;
    let snapshot = client.dashboard().await?;
    print_snapshot(opts, &snapshot)?;
    let mut cursor = Cursor::from(&snapshot);

    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval.max(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    ticker.tick().await;

    let mut polls = 0u64;
    loop {
        if args.polls.is_some_and(|limit| polls >= limit) {
            return Ok(());
        }
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
        polls += 1;

        let page = match client.events_since(cursor.seq, cursor.epoch).await {
            Ok(page) => page,
            Err(err) => {
                eprintln!("poll failed: {err}");
                continue;
            }
        };
        if page.reset {
            // On failure the stale cursor stays and the next poll resets again.
            match client.dashboard().await {
                Ok(snapshot) => {
                    print_snapshot(opts, &snapshot)?;
                    cursor = Cursor::from(&snapshot);
                }
                Err(err) => eprintln!("snapshot refresh failed: {err}"),
            }
            continue;
        }
        for event in &page.events {
            if opts.json {
                println!("{}", serde_json::to_string(event)?);
            } else {
                for line in render_event(&event.event) {
                    println!("{line}");
                }
            }
        }
        cursor.seq = page.seq;
    }
}

/// Position in one server process's event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    epoch: u64,
    seq: u64,
}

impl From<&DashboardSnapshot> for Cursor {
    fn from(snapshot: &DashboardSnapshot) -> Self {
        Self {
            epoch: snapshot.epoch,
            seq: snapshot.seq,
        }
    }
}

fn print_snapshot(opts: &ClientOpts, snapshot: &DashboardSnapshot) -> Result<()> {
    if opts.json {
        println!("{}", serde_json::to_string(snapshot)?);
        return Ok(());
    }
    if let Some(error) = &snapshot.error {
        println!("! {error}");
    }
    if snapshot.degraded > 0 {
        println!("! {} malformed listing line(s) skipped", snapshot.degraded);
    }
    if snapshot.containers.is_empty() {
        println!("No containers found");
    }
    for view in &snapshot.containers {
        println!("{}", view.line);
        for line in render_logs(&view.logs) {
            println!("{line}");
        }
    }
    Ok(())
}

fn render_logs(logs: &LogTail) -> Vec<String> {
    match logs {
        LogTail::Lines(lines) => lines.iter().map(|l| format!("    {l}")).collect(),
        LogTail::Error(message) => vec![format!("    {message}")],
    }
}

fn render_event(event: &DashboardEvent) -> Vec<String> {
    match event {
        DashboardEvent::Added { line, logs, .. } => {
            let mut out = vec![format!("+ {line}")];
            out.extend(render_logs(logs));
            out
        }
        DashboardEvent::LineChanged { line, .. } => vec![format!("~ {line}")],
        DashboardEvent::LogsChanged { id, logs } => {
            let mut out = vec![format!("~ logs of {id}")];
            out.extend(render_logs(logs));
            out
        }
        DashboardEvent::Removed { id } => vec![format!("- {id}")],
        DashboardEvent::ErrorRaised { message } => vec![format!("! {message}")],
        DashboardEvent::ErrorCleared => vec!["! remote host reachable again".to_string()],
        DashboardEvent::Degraded { malformed } => {
            vec![format!("! {malformed} malformed listing line(s) skipped")]
        }
    }
}
