//! Temporary access grants layered on top of the permanent allow-list.
//!
//! The registry is in-memory only: it starts empty and every restart revokes
//! all temporary access. Expiry is evaluated lazily on read; there is no
//! background sweeper.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Default duration for grants issued through the administrative text
/// command (a bare username).
pub const ADHOC_GRANT_HOURS: f64 = 0.5;

/// Default duration when a grant request omits the duration.
pub const DEFAULT_GRANT_HOURS: f64 = 24.0;

// Keeps `now + duration` comfortably inside chrono's representable range.
const MAX_GRANT_HOURS: f64 = 24.0 * 365.0 * 1000.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessGrant {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccessError {
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("invalid grant duration {0} hours")]
    InvalidDuration(f64),
}

/// Expiring grants keyed by username. A later grant overwrites an earlier one.
#[derive(Debug, Default)]
pub struct AccessRegistry {
    grants: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl AccessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, username: &str, duration_hours: f64) -> Result<AccessGrant, AccessError> {
        self.grant_at(username, duration_hours, Utc::now())
    }

    /// Insert or overwrite the grant for `username`, expiring
    /// `duration_hours` after `now`. Negative durations yield a grant that is
    /// already expired.
    pub fn grant_at(
        &self,
        username: &str,
        duration_hours: f64,
        now: DateTime<Utc>,
    ) -> Result<AccessGrant, AccessError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AccessError::EmptyUsername);
        }
        let duration = hours_to_duration(duration_hours)?;
        let expires_at = now
            .checked_add_signed(duration)
            .ok_or(AccessError::InvalidDuration(duration_hours))?;
        self.lock().insert(username.to_string(), expires_at);
        tracing::info!(username, %expires_at, "temporary access granted");
        Ok(AccessGrant {
            username: username.to_string(),
            expires_at,
        })
    }

    /// Remove any grant for `username`. Returns whether one existed; removing
    /// a missing or expired grant is not an error.
    pub fn revoke(&self, username: &str) -> bool {
        let removed = self.lock().remove(username.trim()).is_some();
        if removed {
            tracing::info!(username, "temporary access revoked");
        }
        removed
    }

    pub fn is_active(&self, username: &str) -> bool {
        self.is_active_at(username, Utc::now())
    }

    /// True iff a grant exists and expires strictly after `now`. An expired
    /// entry encountered here is dropped.
    pub fn is_active_at(&self, username: &str, now: DateTime<Utc>) -> bool {
        let mut grants = self.lock();
        match grants.get(username) {
            Some(expires_at) if *expires_at > now => true,
            Some(_) => {
                grants.remove(username);
                false
            }
            None => false,
        }
    }

    pub fn list_active(&self) -> Vec<AccessGrant> {
        self.list_active_at(Utc::now())
    }

    /// Active grants sorted by username. Expired entries are skipped but left
    /// in place.
    pub fn list_active_at(&self, now: DateTime<Utc>) -> Vec<AccessGrant> {
        let mut active: Vec<AccessGrant> = self
            .lock()
            .iter()
            .filter(|(_, expires_at)| **expires_at > now)
            .map(|(username, expires_at)| AccessGrant {
                username: username.clone(),
                expires_at: *expires_at,
            })
            .collect();
        active.sort_by(|a, b| a.username.cmp(&b.username));
        active
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.grants.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn hours_to_duration(hours: f64) -> Result<Duration, AccessError> {
    if !hours.is_finite() || hours.abs() > MAX_GRANT_HOURS {
        return Err(AccessError::InvalidDuration(hours));
    }
    let millis = (hours * 3_600_000.0).round() as i64;
    Ok(Duration::milliseconds(millis))
}

/// Static, configuration-sourced set of permanently authorized usernames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    users: BTreeSet<String>,
}

impl AllowList {
    pub fn new<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let users = users
            .into_iter()
            .map(|u| u.as_ref().trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        Self { users }
    }

    /// Parse a comma-separated list, ignoring blanks around entries.
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains(username)
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.users.iter().map(String::as_str)
    }
}

/// Authorization decisions: allow-list OR active temporary grant.
///
/// The two sources are evaluated independently; the registry never sees the
/// allow-list.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    allow_list: AllowList,
    registry: Arc<AccessRegistry>,
}

impl AccessPolicy {
    pub fn new(allow_list: AllowList, registry: Arc<AccessRegistry>) -> Self {
        Self {
            allow_list,
            registry,
        }
    }

    /// May `username` use the dashboard at all.
    pub fn is_authorized(&self, username: &str) -> bool {
        self.allow_list.contains(username) || self.registry.is_active(username)
    }

    /// May `username` manage temporary grants. Temporary grantees never can.
    pub fn is_admin(&self, username: &str) -> bool {
        self.allow_list.contains(username)
    }

    pub fn registry(&self) -> &Arc<AccessRegistry> {
        &self.registry
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }
}
