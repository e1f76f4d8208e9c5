//! Queue Error Types
//!
//! Defines error types specific to the memory-bounded queue operations.

use std::time::Duration;
use thiserror::Error;

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors that can occur during queue operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// A single element is larger than the whole quota and can never be admitted
    #[error("Element size {size} is more than the max allowed queue size {max_size}")]
    ElementTooLarge { size: i64, max_size: i64 },

    /// The queue has been closed
    #[error("Queue is closed")]
    Closed,

    /// Attempted to configure a negative quota
    #[error("Max queue size must not be negative (got {max_size})")]
    InvalidQuota { max_size: i64 },

    /// A release would drive the running total below zero
    #[error("Total size of all elements can not go below zero (release of {size} with {current} outstanding)")]
    InvalidSize { size: i64, current: i64 },

    /// A bounded push gave up waiting for headroom
    #[error("Timed out after {waited:?} waiting for queue headroom")]
    Timeout { waited: Duration },

    /// Configuration failed validation
    #[error("Invalid queue configuration: {0}")]
    InvalidConfiguration(String),
}

impl QueueError {
    /// Create an invalid configuration error
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    /// Whether retrying the same operation later could succeed.
    ///
    /// `ElementTooLarge` and `InvalidQuota` depend on the quota only and are
    /// permanent for the given arguments; `InvalidSize` is a caller bug.
    pub fn is_transient(&self) -> bool {
        matches!(self, QueueError::Timeout { .. })
    }
}
