// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory lease table with row-level atomic operations
//!
//! Every operation takes the store's current time as `now`. A row is live
//! while it carries a token and `expires_at > now`; anything else is
//! logically dead and may be overwritten by the next acquirer.

use crate::clock::add_duration;
use crate::lease::Pool;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// One lease row
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaseRow {
    pub pool: Pool,
    pub slot: u32,
    /// Cleared when every lease is force-released
    pub token: Option<String>,
    pub expires_at: DateTime<Utc>,
    /// Timeout the lease was acquired with; extensions reuse it
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    pub context: String,
}

impl LeaseRow {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.token.is_some() && self.expires_at > now
    }

    fn owned_by(&self, token: &str) -> bool {
        self.token.as_deref() == Some(token)
    }
}

/// The write-intent row of a resource
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntentRow {
    pub token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub context: String,
}

impl IntentRow {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.token.is_some() && self.expires_at > now
    }
}

/// A lease to be written by [`LeaseTable::try_insert`]
#[derive(Clone, Debug)]
pub struct NewLease {
    pub pool: Pool,
    pub key: String,
    pub slot: u32,
    pub token: String,
    pub ttl: Duration,
    pub context: String,
}

/// Outcome of removing a lease by token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Removal {
    /// The token owned a live lease, now deleted
    Live,
    /// The token still owned the row but its expiry had passed
    Expired,
    /// No row carries the token; the lease was reclaimed or force-released
    Missing,
}

/// Live lease as reported by diagnostics (tokens are never exposed)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaseSummary {
    pub pool: Pool,
    pub slot: u32,
    pub expires_at: DateTime<Utc>,
    pub context: String,
}

/// Live write intent as reported by diagnostics
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntentSummary {
    pub expires_at: DateTime<Utc>,
    pub context: String,
}

/// Live rows of one resource key
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceStatus {
    pub key: String,
    pub leases: Vec<LeaseSummary>,
    pub write_intent: Option<IntentSummary>,
}

impl ResourceStatus {
    pub fn count(&self, pool: Pool) -> usize {
        self.leases.iter().filter(|l| l.pool == pool).count()
    }

    pub fn is_free(&self) -> bool {
        self.leases.is_empty() && self.write_intent.is_none()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct ResourceRows {
    #[serde(default)]
    leases: Vec<LeaseRow>,
    #[serde(default)]
    intent: Option<IntentRow>,
}

impl ResourceRows {
    fn is_empty(&self) -> bool {
        self.leases.is_empty() && self.intent.is_none()
    }

    fn live_intent(&self, now: DateTime<Utc>) -> Option<&IntentRow> {
        self.intent.as_ref().filter(|i| i.is_live(now))
    }
}

/// All lease and intent rows, keyed by resource
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LeaseTable {
    #[serde(default)]
    resources: BTreeMap<String, ResourceRows>,
}

impl LeaseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert-if-absent-or-expired for one `(pool, key, slot)`
    pub fn try_insert(&mut self, lease: NewLease, now: DateTime<Utc>) -> bool {
        let rows = self.resources.entry(lease.key).or_default();
        let row = LeaseRow {
            pool: lease.pool,
            slot: lease.slot,
            token: Some(lease.token),
            expires_at: add_duration(now, lease.ttl),
            ttl: lease.ttl,
            context: lease.context,
        };

        match rows
            .leases
            .iter_mut()
            .find(|r| r.pool == row.pool && r.slot == row.slot)
        {
            Some(existing) if existing.is_live(now) => false,
            Some(existing) => {
                *existing = row;
                true
            }
            None => {
                rows.leases.push(row);
                true
            }
        }
    }

    /// Delete-if-token-matches
    pub fn try_remove(
        &mut self,
        pool: Pool,
        key: &str,
        slot: u32,
        token: &str,
        now: DateTime<Utc>,
    ) -> Removal {
        let Some(rows) = self.resources.get_mut(key) else {
            return Removal::Missing;
        };
        let Some(index) = rows
            .leases
            .iter()
            .position(|r| r.pool == pool && r.slot == slot && r.owned_by(token))
        else {
            return Removal::Missing;
        };

        let row = rows.leases.remove(index);
        if rows.is_empty() {
            self.resources.remove(key);
        }

        if row.expires_at > now {
            Removal::Live
        } else {
            Removal::Expired
        }
    }

    /// Push a live lease's expiry to `now + ttl`
    pub fn try_extend(
        &mut self,
        pool: Pool,
        key: &str,
        slot: u32,
        token: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(rows) = self.resources.get_mut(key) else {
            return false;
        };
        match rows
            .leases
            .iter_mut()
            .find(|r| r.pool == pool && r.slot == slot && r.owned_by(token))
        {
            Some(row) if row.is_live(now) => {
                row.expires_at = add_duration(now, row.ttl);
                true
            }
            _ => false,
        }
    }

    pub fn count_live(
        &self,
        pool: Pool,
        key: &str,
        excluding_slot: Option<u32>,
        now: DateTime<Utc>,
    ) -> usize {
        self.resources.get(key).map_or(0, |rows| {
            rows.leases
                .iter()
                .filter(|r| r.pool == pool && Some(r.slot) != excluding_slot && r.is_live(now))
                .count()
        })
    }

    /// Context of the live lease in `pool` that expires first
    pub fn first_live_context(&self, pool: Pool, key: &str, now: DateTime<Utc>) -> Option<String> {
        self.resources.get(key).and_then(|rows| {
            rows.leases
                .iter()
                .filter(|r| r.pool == pool && r.is_live(now))
                .min_by_key(|r| r.expires_at)
                .map(|r| r.context.clone())
        })
    }

    pub fn try_insert_intent(
        &mut self,
        key: &str,
        token: &str,
        ttl: Duration,
        context: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let rows = self.resources.entry(key.to_string()).or_default();
        if rows.live_intent(now).is_some() {
            return false;
        }
        rows.intent = Some(IntentRow {
            token: Some(token.to_string()),
            expires_at: add_duration(now, ttl),
            context: context.to_string(),
        });
        true
    }

    /// Reset the intent's expiry if `token` still owns it
    ///
    /// A lapsed intent that nobody replaced is still owned by its token.
    pub fn try_refresh_intent(
        &mut self,
        key: &str,
        token: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(intent) = self
            .resources
            .get_mut(key)
            .and_then(|rows| rows.intent.as_mut())
        else {
            return false;
        };
        if intent.token.as_deref() != Some(token) {
            return false;
        }
        intent.expires_at = add_duration(now, ttl);
        true
    }

    pub fn remove_intent(&mut self, key: &str, token: &str) -> bool {
        let Some(rows) = self.resources.get_mut(key) else {
            return false;
        };
        let owned = rows
            .intent
            .as_ref()
            .is_some_and(|i| i.token.as_deref() == Some(token));
        if !owned {
            return false;
        }
        rows.intent = None;
        if rows.is_empty() {
            self.resources.remove(key);
        }
        true
    }

    pub fn live_intent_context(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
        self.resources
            .get(key)
            .and_then(|rows| rows.live_intent(now))
            .map(|i| i.context.clone())
    }

    /// Force every lease and intent to expire now and forget their tokens
    pub fn release_all(&mut self, now: DateTime<Utc>) {
        for rows in self.resources.values_mut() {
            for row in &mut rows.leases {
                row.token = None;
                row.expires_at = row.expires_at.min(now);
            }
            if let Some(intent) = rows.intent.as_mut() {
                intent.token = None;
                intent.expires_at = intent.expires_at.min(now);
            }
        }
    }

    /// Physically delete dead rows; returns how many were removed
    pub fn collect_garbage(&mut self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        for rows in self.resources.values_mut() {
            let before = rows.leases.len();
            rows.leases.retain(|r| r.is_live(now));
            removed += before - rows.leases.len();
            if rows.intent.as_ref().is_some_and(|i| !i.is_live(now)) {
                rows.intent = None;
                removed += 1;
            }
        }
        self.resources.retain(|_, rows| !rows.is_empty());
        removed
    }

    /// Physical rows, dead or alive
    pub fn row_count(&self) -> usize {
        self.resources
            .values()
            .map(|rows| rows.leases.len() + usize::from(rows.intent.is_some()))
            .sum()
    }

    pub fn resource_keys(&self) -> Vec<String> {
        self.resources.keys().cloned().collect()
    }

    pub fn snapshot(&self, key: &str, now: DateTime<Utc>) -> ResourceStatus {
        let Some(rows) = self.resources.get(key) else {
            return ResourceStatus {
                key: key.to_string(),
                ..ResourceStatus::default()
            };
        };

        let mut leases: Vec<LeaseSummary> = rows
            .leases
            .iter()
            .filter(|r| r.is_live(now))
            .map(|r| LeaseSummary {
                pool: r.pool,
                slot: r.slot,
                expires_at: r.expires_at,
                context: r.context.clone(),
            })
            .collect();
        leases.sort_by_key(|l| (l.pool, l.slot));

        ResourceStatus {
            key: key.to_string(),
            leases,
            write_intent: rows.live_intent(now).map(|i| IntentSummary {
                expires_at: i.expires_at,
                context: i.context.clone(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
