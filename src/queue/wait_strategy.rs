//! Producer Wait Strategies
//!
//! Selects how a producer waits for headroom once the quota is exhausted,
//! and how many waiters a release wakes.

use std::fmt;
use std::str::FromStr;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::utils::Backoff;
use serde::{Deserialize, Serialize};

/// How a blocked producer waits for headroom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitStrategy {
    /// Park on the backpressure monitor's condition variable until a release
    /// or close wakes the producer.
    #[default]
    Monitor,
    /// Busy-wait with exponential spinning, then yield. Once spinning is
    /// exhausted the producer sleeps for `idle_sleep` between re-checks
    /// (zero means keep yielding). Only suited to very short waits.
    Spin { idle_sleep: Duration },
}

impl WaitStrategy {
    /// Spin strategy that never sleeps
    pub fn spin() -> Self {
        Self::Spin { idle_sleep: Duration::ZERO }
    }

    /// Whether producers using this strategy register with the monitor
    pub fn uses_monitor(&self) -> bool {
        matches!(self, WaitStrategy::Monitor)
    }
}

impl fmt::Display for WaitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitStrategy::Monitor => write!(f, "monitor"),
            WaitStrategy::Spin { idle_sleep } => write!(f, "spin({:?})", idle_sleep),
        }
    }
}

/// Which waiters a release wakes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WakePolicy {
    /// Wake a single waiter. Cheap under contention, but the woken producer
    /// may need more than was freed and go back to sleep while others could
    /// have proceeded.
    #[default]
    Signal,
    /// Wake every waiter on each release. Fair, but every waiter contends
    /// for the monitor lock on every release.
    Broadcast,
}

impl FromStr for WakePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "signal" => Ok(WakePolicy::Signal),
            "broadcast" => Ok(WakePolicy::Broadcast),
            _ => Err(format!("Invalid wake policy: {}. Valid options: signal, broadcast", s)),
        }
    }
}

/// Per-call spin state for `WaitStrategy::Spin`
pub(crate) struct SpinWait {
    backoff: Backoff,
    idle_sleep: Duration,
    rounds: u64,
}

impl SpinWait {
    pub(crate) fn new(idle_sleep: Duration) -> Self {
        Self {
            backoff: Backoff::new(),
            idle_sleep,
            rounds: 0,
        }
    }

    /// Wait one round. Returns `false` once `deadline` has passed.
    pub(crate) fn wait(&mut self, deadline: Option<Instant>) -> bool {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return false;
        }
        self.rounds += 1;
        if !self.backoff.is_completed() {
            self.backoff.snooze();
        } else if self.idle_sleep.is_zero() {
            thread::yield_now();
        } else {
            let sleep = match deadline {
                Some(d) => self.idle_sleep.min(d.saturating_duration_since(Instant::now())),
                None => self.idle_sleep,
            };
            thread::sleep(sleep);
        }
        true
    }

    pub(crate) fn rounds(&self) -> u64 {
        self.rounds
    }
}
