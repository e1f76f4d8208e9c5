//! Memory-Bounded Queue
//!
//! A FIFO channel between producers and consumers that blocks producers once
//! the cumulative declared byte size of buffered elements reaches a quota.
//!
//! # Architecture
//!
//! - **SizeAccountant**: lock-free running total and mutable quota
//! - **BackpressureMonitor**: mutex + condition variable parking producers
//! - **WaitStrategy / WakePolicy**: how producers wait and how many wake per release
//! - **MemBoundQueue**: the primitive, layered over a bounded crossbeam channel
//!
//! The quota is best-effort: the headroom check and the reservation are not
//! one atomic step, so concurrent producers may overshoot the quota by the
//! sum of their in-flight reservations.
//!
//! # Usage
//!
//! ```rust
//! use membound::queue::MemBoundQueue;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let queue = Arc::new(MemBoundQueue::new(1000, 128).unwrap());
//!
//! let consumer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || {
//!         let mut count = 0;
//!         while let Some(envelope) = queue.recv() {
//!             // Every receive must be paired with a release
//!             queue.decr_size(envelope.size).unwrap();
//!             count += 1;
//!         }
//!         count
//!     })
//! };
//!
//! for i in 0..100 {
//!     queue.push(format!("message {}", i), 16).unwrap();
//! }
//! queue.close();
//!
//! assert_eq!(consumer.join().unwrap(), 100);
//! assert_eq!(queue.get_size(), 0);
//! ```

pub mod accountant;
pub mod config;
pub mod delivery;
pub mod error;
pub mod memory_queue;
pub mod monitor;
pub mod statistics;
pub mod wait_strategy;

// Re-export main types for convenience
pub use accountant::SizeAccountant;
pub use config::{DebugConfig, QueueConfig, QueuePreset, WaitConfig};
pub use delivery::{Delivery, Envelope};
pub use error::{QueueError, QueueResult};
pub use memory_queue::MemBoundQueue;
pub use monitor::{BackpressureMonitor, WaitOutcome};
pub use statistics::QueueStatistics;
pub use wait_strategy::{WaitStrategy, WakePolicy};

pub use crossbeam_channel::{RecvTimeoutError, TryRecvError};

#[cfg(test)]
mod tests;
