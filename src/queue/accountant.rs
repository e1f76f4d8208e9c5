//! Size Accounting
//!
//! Tracks the running byte total of admitted-but-unreleased elements against
//! a mutable quota. All reads are lock-free.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::queue::error::{QueueError, QueueResult};

/// Byte accountant shared by producers and consumers
#[derive(Debug)]
pub struct SizeAccountant {
    current_size: AtomicI64,
    max_size: AtomicI64,
    peak_size: AtomicI64,
}

impl SizeAccountant {
    /// Create a new accountant with the given quota
    pub fn new(max_size: i64) -> QueueResult<Self> {
        if max_size < 0 {
            return Err(QueueError::InvalidQuota { max_size });
        }
        Ok(Self {
            current_size: AtomicI64::new(0),
            max_size: AtomicI64::new(max_size),
            peak_size: AtomicI64::new(0),
        })
    }

    /// Bytes currently reserved
    pub fn current_size(&self) -> i64 {
        self.current_size.load(Ordering::SeqCst)
    }

    /// Configured quota
    pub fn max_size(&self) -> i64 {
        self.max_size.load(Ordering::SeqCst)
    }

    /// Highest total ever observed after a reservation
    pub fn peak_size(&self) -> i64 {
        self.peak_size.load(Ordering::Relaxed)
    }

    /// Replace the quota. Already-admitted bytes are not affected.
    pub fn set_max_size(&self, max_size: i64) -> QueueResult<()> {
        if max_size < 0 {
            return Err(QueueError::InvalidQuota { max_size });
        }
        self.max_size.store(max_size, Ordering::SeqCst);
        Ok(())
    }

    /// Would admitting `bytes` keep the total within quota?
    pub fn has_headroom(&self, bytes: i64) -> bool {
        self.current_size()
            .checked_add(bytes)
            .is_some_and(|total| total <= self.max_size())
    }

    /// Add `bytes` to the running total and return the new total.
    ///
    /// Not guarded against the quota: concurrent producers that all passed
    /// `has_headroom` may push the total past the quota by the sum of their
    /// in-flight reservations. The total saturates at `i64::MAX`.
    pub fn reserve(&self, bytes: i64) -> i64 {
        let previous = self
            .current_size
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_add(bytes))
            })
            .unwrap_or_else(|current| current);
        let new_size = previous.saturating_add(bytes);
        self.peak_size.fetch_max(new_size, Ordering::Relaxed);
        new_size
    }

    /// Subtract `bytes` from the running total and return the new total.
    ///
    /// A release that would leave the total negative is rejected and not applied.
    pub fn release(&self, bytes: i64) -> QueueResult<i64> {
        self.current_size
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                current.checked_sub(bytes).filter(|next| *next >= 0)
            })
            .map(|previous| previous - bytes)
            .map_err(|current| QueueError::InvalidSize { size: bytes, current })
    }

    /// Get memory usage as percentage of the quota
    pub fn usage_percent(&self) -> f64 {
        let max_size = self.max_size();
        if max_size == 0 {
            return if self.current_size() > 0 { 100.0 } else { 0.0 };
        }
        (self.current_size() as f64 / max_size as f64) * 100.0
    }

    /// Check if memory usage exceeds threshold
    pub fn exceeds_threshold(&self, threshold_percent: f64) -> bool {
        self.usage_percent() > threshold_percent
    }
}
