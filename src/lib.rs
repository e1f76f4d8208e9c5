pub mod queue;

pub use queue::{
    Delivery, Envelope, MemBoundQueue, QueueConfig, QueueError, QueueResult, QueueStatistics,
    WaitStrategy, WakePolicy,
};
