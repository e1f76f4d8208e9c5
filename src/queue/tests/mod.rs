//! Test module organization for the memory-bounded queue

pub mod accounting;

use std::thread;
use std::time::{Duration, Instant};

use crate::queue::MemBoundQueue;

/// Route `log` output through the test harness
pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Poll until `expected` producers are parked on the queue's monitor
pub(crate) fn wait_for_waiters<T>(queue: &MemBoundQueue<T>, expected: usize) {
    wait_for(|| queue.waiters() == expected, "waiter count");
}

/// Poll `condition` for up to five seconds
pub(crate) fn wait_for(condition: impl Fn() -> bool, what: &str) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::sleep(Duration::from_millis(1));
    }
}
