// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-peer brute-force lockout.
//!
//! Each failed authentication extends the peer's lockout by as many minutes
//! as it had failures before, so repeated offenders are locked out for
//! progressively longer. The first failure only opens a record; it does not
//! block. A success clears the record. State is process-scoped.
//!
//! A caller that checks the ban, verifies credentials and then records the
//! outcome holds an [`AttemptPermit`] for the whole sequence, so one peer's
//! attempts are decided one at a time.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Failure count and lockout expiry for one peer identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanRecord {
    pub identity: String,
    pub fail_count: u32,
    pub banned_until: DateTime<Utc>,
}

/// Tracks failed authentications per peer identity.
///
/// Cloning is cheap and every clone shares the same records. All mutation of
/// one identity's record happens under that entry's shard lock, so
/// concurrent failures from the same peer are never lost.
#[derive(Debug, Clone, Default)]
pub struct IntrusionGuard {
    records: Arc<DashMap<String, BanRecord>>,
    attempts: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

/// Exclusive right to run one authentication attempt for an identity.
///
/// Released on drop. The identity's lock entry is removed once nobody else
/// holds or awaits it.
#[derive(Debug)]
pub struct AttemptPermit {
    identity: String,
    attempts: Arc<DashMap<String, Arc<Mutex<()>>>>,
    held: Option<OwnedMutexGuard<()>>,
}

impl Drop for AttemptPermit {
    fn drop(&mut self) {
        self.held.take();
        // Clones are only taken under the shard lock, so a count of one
        // means no waiter can still be holding this mutex.
        self.attempts
            .remove_if(&self.identity, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl IntrusionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other attempt for `identity` is in flight.
    pub async fn begin_attempt(&self, identity: &str) -> AttemptPermit {
        let lock = self
            .attempts
            .entry(identity.to_string())
            .or_default()
            .value()
            .clone();
        let held = lock.lock_owned().await;
        AttemptPermit {
            identity: identity.to_string(),
            attempts: Arc::clone(&self.attempts),
            held: Some(held),
        }
    }

    /// True iff `identity` has a record and the lockout has not elapsed.
    pub fn is_banned(&self, identity: &str) -> bool {
        self.is_banned_at(identity, Utc::now())
    }

    pub fn is_banned_at(&self, identity: &str, now: DateTime<Utc>) -> bool {
        self.records
            .get(identity)
            .is_some_and(|record| now < record.banned_until)
    }

    /// Record a failed authentication and return the updated record.
    pub fn record_failure(&self, identity: &str) -> BanRecord {
        self.record_failure_at(identity, Utc::now())
    }

    /// The extension is added to the previous `banned_until`, not to `now`.
    /// After a long pause the lockout may already lie in the past, so further
    /// failures run unblocked until the accumulated extensions catch up.
    pub fn record_failure_at(&self, identity: &str, now: DateTime<Utc>) -> BanRecord {
        let record = self
            .records
            .entry(identity.to_string())
            .and_modify(|record| {
                let extension = TimeDelta::minutes(i64::from(record.fail_count));
                record.banned_until = record
                    .banned_until
                    .checked_add_signed(extension)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                record.fail_count = record.fail_count.saturating_add(1);
            })
            .or_insert_with(|| BanRecord {
                identity: identity.to_string(),
                fail_count: 1,
                banned_until: now,
            })
            .value()
            .clone();

        debug!(
            identity,
            fail_count = record.fail_count,
            banned_until = %record.banned_until,
            "recorded authentication failure"
        );
        record
    }

    /// Forget every failure recorded for `identity`.
    pub fn record_success(&self, identity: &str) {
        if self.records.remove(identity).is_some() {
            debug!(identity, "cleared ban record");
        }
    }

    /// Snapshot of the record for `identity`, if any.
    pub fn record(&self, identity: &str) -> Option<BanRecord> {
        self.records.get(identity).map(|r| r.value().clone())
    }

    /// Number of identities with a record.
    pub fn tracked(&self) -> usize {
        self.records.len()
    }
}
