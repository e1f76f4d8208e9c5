//! Backpressure Monitor
//!
//! Suspends producers that found no headroom and resumes them on release or
//! close. The waiter count is only changed while the monitor lock is held;
//! releasers read it without the lock to skip locking when nobody waits.
//!
//! A producer registers itself and re-evaluates its wake condition under the
//! lock before parking, and notifiers always take the lock before notifying,
//! so a release landing between "check" and "wait" cannot be lost.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

use crate::queue::wait_strategy::WakePolicy;

/// Outcome of a single monitor wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The condition already held once the lock was taken; nothing waited
    Ready,
    /// Woken by a release or close
    Woken,
    /// Deadline passed before any wake-up
    TimedOut,
}

/// Mutex + condition variable guarding producer suspension
#[derive(Debug)]
pub struct BackpressureMonitor {
    lock: Mutex<()>,
    not_full: Condvar,
    waiters: AtomicUsize,
    policy: WakePolicy,
}

impl BackpressureMonitor {
    pub fn new(policy: WakePolicy) -> Self {
        Self {
            lock: Mutex::new(()),
            not_full: Condvar::new(),
            waiters: AtomicUsize::new(0),
            policy,
        }
    }

    pub fn policy(&self) -> WakePolicy {
        self.policy
    }

    /// Number of producers currently parked
    pub fn waiters(&self) -> usize {
        self.waiters.load(Ordering::SeqCst)
    }

    /// Park until woken, unless `ready` already holds.
    ///
    /// `ready` is evaluated after registering as a waiter and while holding
    /// the lock. A timed-out waiter deregisters itself before returning.
    pub fn wait_until<F>(&self, ready: F, deadline: Option<Instant>) -> WaitOutcome
    where
        F: Fn() -> bool,
    {
        let mut guard = self.lock.lock();
        self.waiters.fetch_add(1, Ordering::SeqCst);
        if ready() {
            self.waiters.fetch_sub(1, Ordering::SeqCst);
            return WaitOutcome::Ready;
        }

        match deadline {
            None => {
                self.not_full.wait(&mut guard);
                WaitOutcome::Woken
            }
            Some(deadline) => {
                if self.not_full.wait_until(&mut guard, deadline).timed_out() {
                    // Nobody notified us, so nobody accounted for our wake-up
                    self.deregister();
                    WaitOutcome::TimedOut
                } else {
                    WaitOutcome::Woken
                }
            }
        }
    }

    /// Wake waiters after a release according to the wake policy.
    /// Returns the number of producers woken.
    pub fn notify_release(&self) -> usize {
        if self.waiters() == 0 {
            return 0;
        }
        let _guard = self.lock.lock();
        match self.policy {
            WakePolicy::Signal => {
                if self.not_full.notify_one() {
                    self.deregister();
                    1
                } else {
                    0
                }
            }
            WakePolicy::Broadcast => self.wake_all_locked(),
        }
    }

    /// Wake every waiter regardless of policy (quota change, close).
    pub fn notify_all(&self) -> usize {
        let _guard = self.lock.lock();
        self.wake_all_locked()
    }

    fn wake_all_locked(&self) -> usize {
        let woken = self.not_full.notify_all();
        // Timed-out waiters have already left the condvar and deregister themselves
        self.deregister_many(woken);
        woken
    }

    fn deregister(&self) {
        self.deregister_many(1);
    }

    fn deregister_many(&self, count: usize) {
        if count == 0 {
            return;
        }
        let _ = self
            .waiters
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_sub(count))
            });
    }
}
