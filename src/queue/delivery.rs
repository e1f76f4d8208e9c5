//! Envelopes and Scoped Deliveries
//!
//! Elements travel through the transport together with the size declared at
//! push time, so a consumer always knows how much to release.
//! `Delivery` pairs a received element with its release: dropping the
//! delivery returns the bytes to the queue.

use std::fmt;
use std::ops::{Deref, DerefMut};

use log::warn;

use crate::queue::memory_queue::MemBoundQueue;

/// An element as carried by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope<T> {
    pub element: T,
    /// Size declared by the producer; pass it to `decr_size`
    pub size: i64,
}

impl<T> Envelope<T> {
    pub fn new(element: T, size: i64) -> Self {
        Self { element, size }
    }

    pub fn into_parts(self) -> (T, i64) {
        (self.element, self.size)
    }
}

/// A received element whose reservation is released when dropped
pub struct Delivery<'a, T> {
    queue: &'a MemBoundQueue<T>,
    envelope: Option<Envelope<T>>,
}

impl<'a, T> Delivery<'a, T> {
    pub(crate) fn new(queue: &'a MemBoundQueue<T>, envelope: Envelope<T>) -> Self {
        Self {
            queue,
            envelope: Some(envelope),
        }
    }

    /// Size declared for this element
    pub fn size(&self) -> i64 {
        self.envelope.as_ref().map_or(0, |e| e.size)
    }

    /// Release the reservation now and take the element
    pub fn into_inner(mut self) -> T {
        let envelope = self
            .envelope
            .take()
            .expect("delivery envelope present until consumed");
        self.release(envelope.size);
        envelope.element
    }

    fn release(&self, size: i64) {
        if let Err(e) = self.queue.decr_size(size) {
            warn!("Scoped delivery release of {} bytes failed: {}", size, e);
        }
    }
}

impl<T> Deref for Delivery<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self
            .envelope
            .as_ref()
            .expect("delivery envelope present until consumed")
            .element
    }
}

impl<T> DerefMut for Delivery<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self
            .envelope
            .as_mut()
            .expect("delivery envelope present until consumed")
            .element
    }
}

impl<T> Drop for Delivery<'_, T> {
    fn drop(&mut self) {
        if let Some(envelope) = self.envelope.take() {
            self.release(envelope.size);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Delivery<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("envelope", &self.envelope)
            .finish()
    }
}
