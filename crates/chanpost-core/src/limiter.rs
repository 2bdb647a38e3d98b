//! Anti-spam quota: per-operator publish counts under one global window.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use crate::domain::UserId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuotaDecision {
    Allowed,
    Denied { limit: u32 },
}

/// Fixed-window publish quota shared by all operators.
///
/// One global `last_reset` governs the window: the first check after expiry
/// clears every operator's counter. Counters are incremented once per
/// successfully published item via [`PostQuota::record_at`], not per batch,
/// and the batch-start check does not pre-reserve capacity — a batch that
/// starts below the limit may finish above it (documented, non-strict quota).
#[derive(Clone, Debug)]
pub struct PostQuota {
    limit: u32,
    window: Duration,
    last_reset: Instant,
    counts: HashMap<UserId, u32>,
}

impl PostQuota {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            last_reset: Instant::now(),
            counts: HashMap::new(),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    fn roll_window(&mut self, now: Instant) {
        if now.duration_since(self.last_reset) >= self.window {
            self.counts.clear();
            self.last_reset = now;
        }
    }

    pub fn check(&mut self, owner: UserId) -> QuotaDecision {
        self.check_at(owner, Instant::now())
    }

    /// Is the operator allowed to start publishing right now?
    ///
    /// Rolling the window is a side effect of any operator's check.
    pub fn check_at(&mut self, owner: UserId, now: Instant) -> QuotaDecision {
        self.roll_window(now);
        let used = self.counts.get(&owner).copied().unwrap_or(0);
        if used >= self.limit {
            QuotaDecision::Denied { limit: self.limit }
        } else {
            QuotaDecision::Allowed
        }
    }

    pub fn record(&mut self, owner: UserId) {
        self.record_at(owner, Instant::now());
    }

    /// Consume one unit of quota for a successfully published item.
    pub fn record_at(&mut self, owner: UserId, now: Instant) {
        self.roll_window(now);
        *self.counts.entry(owner).or_insert(0) += 1;
    }

    pub fn used(&self, owner: UserId) -> u32 {
        self.counts.get(&owner).copied().unwrap_or(0)
    }
}
