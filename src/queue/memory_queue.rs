//! Memory-Bounded Queue Implementation
//!
//! MPMC queue that blocks producers once the cumulative declared size of
//! buffered elements reaches the quota. Consumers must return each element's
//! size with `decr_size` (or receive through `recv_guarded`), otherwise
//! producers eventually block forever.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::{debug, trace, warn};
use parking_lot::RwLock;

use crate::queue::accountant::SizeAccountant;
use crate::queue::config::QueueConfig;
use crate::queue::delivery::{Delivery, Envelope};
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::monitor::{BackpressureMonitor, WaitOutcome};
use crate::queue::statistics::{QueueCounters, QueueStatistics};
use crate::queue::wait_strategy::{SpinWait, WaitStrategy, WakePolicy};

/// Memory-bounded multi-producer, multi-consumer queue
pub struct MemBoundQueue<T> {
    // Dropped on close; the transport disconnects once in-flight sends finish
    sender: RwLock<Option<Sender<Envelope<T>>>>,
    receiver: Receiver<Envelope<T>>,
    capacity: usize,
    accountant: SizeAccountant,
    monitor: BackpressureMonitor,
    strategy: WaitStrategy,
    closed: AtomicBool,
    counters: QueueCounters,
    pressure_warning_percent: Option<f64>,
}

impl<T> MemBoundQueue<T> {
    /// Create a queue holding at most `capacity` elements and roughly
    /// `max_size` bytes, with the default wait strategy and wake policy
    pub fn new(capacity: usize, max_size: i64) -> QueueResult<Self> {
        Self::with_options(capacity, max_size, WaitStrategy::default(), WakePolicy::default())
    }

    /// Create a queue with an explicit wait strategy and wake policy
    pub fn with_options(
        capacity: usize,
        max_size: i64,
        strategy: WaitStrategy,
        wake_policy: WakePolicy,
    ) -> QueueResult<Self> {
        let accountant = SizeAccountant::new(max_size)?;
        let (sender, receiver) = crossbeam_channel::bounded(capacity);

        debug!(
            "Created memory-bounded queue: capacity={}, max_size={}, strategy={}, wake_policy={:?}",
            capacity, max_size, strategy, wake_policy
        );

        Ok(Self {
            sender: RwLock::new(Some(sender)),
            receiver,
            capacity,
            accountant,
            monitor: BackpressureMonitor::new(wake_policy),
            strategy,
            closed: AtomicBool::new(false),
            counters: QueueCounters::default(),
            pressure_warning_percent: None,
        })
    }

    /// Create a queue from a validated configuration
    pub fn with_config(config: &QueueConfig) -> QueueResult<Self> {
        config.validate()?;
        let strategy = config.wait.to_wait_strategy()?;
        let mut queue = Self::with_options(config.capacity, config.max_size, strategy, config.wake_policy)?;
        if config.debug.enabled {
            queue.pressure_warning_percent = Some(config.debug.pressure_warning_percent);
        }
        Ok(queue)
    }

    /// Push an element of the declared `size`, blocking while the quota is exhausted.
    ///
    /// Fails with `ElementTooLarge` if `size` exceeds the quota and with
    /// `Closed` once the queue is closed, including while blocked.
    pub fn push(&self, element: T, size: i64) -> QueueResult<()> {
        self.push_until(element, size, Instant::now(), None)
    }

    /// Like `push`, but gives up with `Timeout` if no headroom appears within `timeout`.
    ///
    /// The timeout bounds the wait for byte headroom only; the transport send
    /// may still block while the element-count capacity is full.
    pub fn push_timeout(&self, element: T, size: i64, timeout: Duration) -> QueueResult<()> {
        let started = Instant::now();
        self.push_until(element, size, started, started.checked_add(timeout))
    }

    fn push_until(
        &self,
        element: T,
        size: i64,
        started: Instant,
        deadline: Option<Instant>,
    ) -> QueueResult<()> {
        if size < 0 {
            self.counters.record_rejection();
            return Err(QueueError::InvalidSize {
                size,
                current: self.accountant.current_size(),
            });
        }

        let mut spin: Option<SpinWait> = None;
        let mut waited = false;

        loop {
            let max_size = self.accountant.max_size();
            if size > max_size {
                self.counters.record_rejection();
                return Err(QueueError::ElementTooLarge { size, max_size });
            }

            if self.is_closed() {
                self.counters.record_rejection();
                return Err(QueueError::Closed);
            }

            if self.accountant.has_headroom(size) {
                break;
            }

            if !waited {
                waited = true;
                self.counters.record_wait();
                trace!(
                    "Producer waiting for {} bytes ({} of {} in use)",
                    size,
                    self.accountant.current_size(),
                    max_size
                );
            }

            let timed_out = match self.strategy {
                WaitStrategy::Monitor => {
                    let outcome = self.monitor.wait_until(|| self.should_wake(size), deadline);
                    outcome == WaitOutcome::TimedOut
                }
                WaitStrategy::Spin { idle_sleep } => {
                    !spin.get_or_insert_with(|| SpinWait::new(idle_sleep)).wait(deadline)
                }
            };

            if timed_out {
                self.counters.record_rejection();
                let waited = started.elapsed();
                trace!("Producer gave up waiting for {} bytes after {:?}", size, waited);
                return Err(QueueError::Timeout { waited });
            }
        }

        let new_size = self.accountant.reserve(size);

        let sender = self.sender.read().clone();
        let sent = match sender {
            Some(sender) => sender.send(Envelope::new(element, size)).is_ok(),
            None => false,
        };
        if !sent {
            // Closed between the closed check and the send
            self.rollback(size);
            self.counters.record_rejection();
            return Err(QueueError::Closed);
        }

        self.counters.record_push();
        self.log_pressure(new_size);
        Ok(())
    }

    /// Wake condition for a producer needing `size` bytes
    fn should_wake(&self, size: i64) -> bool {
        self.is_closed()
            || size > self.accountant.max_size()
            || self.accountant.has_headroom(size)
    }

    fn rollback(&self, size: i64) {
        if let Ok(new_size) = self.accountant.release(size) {
            self.wake_after_release(new_size);
        }
    }

    /// Return `size` bytes after consuming an element.
    ///
    /// Must be called once per received element with the size passed to the
    /// matching push. A release that would take the total below zero is
    /// rejected with `InvalidSize` and indicates a double or mismatched release.
    pub fn decr_size(&self, size: i64) -> QueueResult<()> {
        if size < 0 {
            return Err(QueueError::InvalidSize {
                size,
                current: self.accountant.current_size(),
            });
        }

        match self.accountant.release(size) {
            Ok(new_size) => {
                self.counters.record_release(size);
                self.wake_after_release(new_size);
                Ok(())
            }
            Err(e) => {
                warn!("Rejected queue release: {}", e);
                Err(e)
            }
        }
    }

    fn wake_after_release(&self, new_size: i64) {
        // The total may sit above the quota after an overshoot; only wake once below it
        if new_size < self.accountant.max_size() {
            let woken = self.monitor.notify_release();
            self.counters.record_wakeups(woken);
        }
    }

    /// Replace the byte quota. Waiting producers re-evaluate against the new quota.
    pub fn set_max_size(&self, max_size: i64) -> QueueResult<()> {
        self.accountant.set_max_size(max_size)?;
        debug!("Queue max_size set to {}", max_size);
        if self.monitor.waiters() > 0 {
            let woken = self.monitor.notify_all();
            self.counters.record_wakeups(woken);
        }
        Ok(())
    }

    /// Configured byte quota
    pub fn max_size(&self) -> i64 {
        self.accountant.max_size()
    }

    /// Bytes admitted and not yet released
    pub fn get_size(&self) -> i64 {
        self.accountant.current_size()
    }

    /// Close the queue. Only the first call has any effect.
    ///
    /// Blocked producers wake and fail with `Closed`; consumers keep draining
    /// buffered elements until end of stream.
    pub fn close(&self) {
        if self
            .closed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let woken = self.monitor.notify_all();
        self.counters.record_wakeups(woken);
        drop(self.sender.write().take());

        debug!(
            "Queue closed: woke {} waiting producers, {} elements ({} bytes) left to drain",
            woken,
            self.len(),
            self.get_size()
        );
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Blocking receive. `None` means the queue is closed and drained.
    pub fn recv(&self) -> Option<Envelope<T>> {
        self.receiver.recv().ok()
    }

    /// Receive with a timeout. `Disconnected` means closed and drained.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Envelope<T>, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Non-blocking receive
    pub fn try_recv(&self) -> Result<Envelope<T>, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Blocking receive whose reservation is released when the delivery drops
    pub fn recv_guarded(&self) -> Option<Delivery<'_, T>> {
        self.recv().map(|envelope| Delivery::new(self, envelope))
    }

    /// Elements currently buffered
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Element-count capacity of the transport
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Producers currently parked waiting for headroom
    pub fn waiters(&self) -> usize {
        self.monitor.waiters()
    }

    pub fn wait_strategy(&self) -> WaitStrategy {
        self.strategy
    }

    pub fn wake_policy(&self) -> WakePolicy {
        self.monitor.policy()
    }

    /// Snapshot of accounting and activity counters
    pub fn statistics(&self) -> QueueStatistics {
        QueueStatistics {
            current_size: self.accountant.current_size(),
            max_size: self.accountant.max_size(),
            peak_size: self.accountant.peak_size(),
            queued_elements: self.len(),
            capacity: self.capacity,
            waiters: self.monitor.waiters(),
            total_pushed: self.counters.pushed(),
            total_released_bytes: self.counters.released_bytes(),
            total_waits: self.counters.waits(),
            total_wakeups: self.counters.wakeups(),
            total_rejected: self.counters.rejected(),
            closed: self.is_closed(),
        }
    }

    fn log_pressure(&self, new_size: i64) {
        if let Some(threshold) = self.pressure_warning_percent {
            if self.accountant.exceeds_threshold(threshold) {
                debug!(
                    "Queue memory pressure: {} of {} bytes in use ({:.1}%)",
                    new_size,
                    self.accountant.max_size(),
                    self.accountant.usage_percent()
                );
            }
        }
    }
}

impl<T> fmt::Debug for MemBoundQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemBoundQueue")
            .field("capacity", &self.capacity)
            .field("current_size", &self.get_size())
            .field("max_size", &self.max_size())
            .field("len", &self.len())
            .field("waiters", &self.waiters())
            .field("strategy", &self.strategy)
            .field("closed", &self.is_closed())
            .finish()
    }
}
