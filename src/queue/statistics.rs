//! Queue Statistics
//!
//! Relaxed counters updated on the push/release paths and a point-in-time
//! snapshot for reporting.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Snapshot of a queue's accounting and activity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueStatistics {
    /// Bytes currently reserved
    pub current_size: i64,

    /// Configured quota
    pub max_size: i64,

    /// Highest reserved total seen so far (may exceed `max_size` by the overshoot margin)
    pub peak_size: i64,

    /// Elements buffered in the transport
    pub queued_elements: usize,

    /// Transport element capacity
    pub capacity: usize,

    /// Producers currently parked on the monitor
    pub waiters: usize,

    /// Successful pushes
    pub total_pushed: u64,

    /// Bytes released by consumers
    pub total_released_bytes: u64,

    /// Times a producer had to wait for headroom
    pub total_waits: u64,

    /// Producers woken by releases or close
    pub total_wakeups: u64,

    /// Pushes rejected (too large, closed, timed out)
    pub total_rejected: u64,

    /// Whether the queue has been closed
    pub closed: bool,
}

impl QueueStatistics {
    /// Fraction of the quota in use, as a percentage.
    /// A zero quota with bytes outstanding counts as fully used.
    pub fn usage_percent(&self) -> f64 {
        if self.max_size == 0 {
            return if self.current_size > 0 { 100.0 } else { 0.0 };
        }
        (self.current_size as f64 / self.max_size as f64) * 100.0
    }

    /// Bytes by which the peak exceeded the quota
    pub fn overshoot(&self) -> i64 {
        (self.peak_size - self.max_size).max(0)
    }
}

/// Activity counters owned by a queue
#[derive(Debug, Default)]
pub(crate) struct QueueCounters {
    pushed: AtomicU64,
    released_bytes: AtomicU64,
    waits: AtomicU64,
    wakeups: AtomicU64,
    rejected: AtomicU64,
}

impl QueueCounters {
    pub(crate) fn record_push(&self) {
        self.pushed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_release(&self, bytes: i64) {
        self.released_bytes.fetch_add(bytes.max(0) as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_wait(&self) {
        self.waits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_wakeups(&self, count: usize) {
        if count > 0 {
            self.wakeups.fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_rejection(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn pushed(&self) -> u64 {
        self.pushed.load(Ordering::Relaxed)
    }

    pub(crate) fn released_bytes(&self) -> u64 {
        self.released_bytes.load(Ordering::Relaxed)
    }

    pub(crate) fn waits(&self) -> u64 {
        self.waits.load(Ordering::Relaxed)
    }

    pub(crate) fn wakeups(&self) -> u64 {
        self.wakeups.load(Ordering::Relaxed)
    }

    pub(crate) fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}
