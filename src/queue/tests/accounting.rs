//! Accounting conservation tests

use std::sync::Arc;
use std::thread;

use proptest::prelude::*;

use super::init_logging;
use crate::queue::{MemBoundQueue, QueueError};

#[test]
fn test_sequential_push_release_returns_to_zero() {
    init_logging();
    let queue = MemBoundQueue::new(1000, 128).unwrap();
    for _ in 0..3 {
        queue.push("12345678", 40).unwrap();
        let envelope = queue.recv().unwrap();
        queue.decr_size(envelope.size).unwrap();
    }
    assert_eq!(queue.get_size(), 0);
    assert_eq!(queue.statistics().total_pushed, 3);
}

#[test]
fn test_rejected_push_reserves_nothing() {
    init_logging();
    let queue = MemBoundQueue::new(10, 100).unwrap();
    queue.push(1u8, 30).unwrap();

    assert!(matches!(queue.push(2u8, 101), Err(QueueError::ElementTooLarge { .. })));
    assert_eq!(queue.get_size(), 30);
    assert_eq!(queue.len(), 1);
}

#[test]
fn test_mismatched_release_leaves_total_intact() {
    init_logging();
    let queue = MemBoundQueue::new(10, 100).unwrap();
    queue.push(1u8, 30).unwrap();
    let _ = queue.recv().unwrap();

    assert_eq!(
        queue.decr_size(31),
        Err(QueueError::InvalidSize { size: 31, current: 30 })
    );
    assert_eq!(queue.get_size(), 30);
    queue.decr_size(30).unwrap();
    assert_eq!(queue.get_size(), 0);
}

#[test]
fn test_multi_producer_multi_consumer_conservation() {
    init_logging();
    const PRODUCERS: u64 = 4;
    const CONSUMERS: usize = 3;
    const PER_PRODUCER: u64 = 1000;

    let queue = Arc::new(MemBoundQueue::new(64, 512).unwrap());

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut sum = 0u64;
                while let Some(envelope) = queue.recv() {
                    queue.decr_size(envelope.size).unwrap();
                    sum += envelope.element;
                }
                sum
            })
        })
        .collect();

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    let value = p * PER_PRODUCER + i;
                    queue.push(value, 1 + (value % 32) as i64).unwrap();
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }
    queue.close();

    let total: u64 = consumers.into_iter().map(|c| c.join().unwrap()).sum();
    let n = PRODUCERS * PER_PRODUCER;
    assert_eq!(total, n * (n - 1) / 2);
    assert_eq!(queue.get_size(), 0);
}

proptest! {
    #[test]
    fn prop_matched_releases_return_to_zero(sizes in proptest::collection::vec(0i64..=64, 1..50)) {
        let queue = MemBoundQueue::new(sizes.len(), 64).unwrap();
        for (i, size) in sizes.iter().enumerate() {
            queue.push(i, *size).unwrap();
            // Drain eagerly so the quota never blocks this single thread
            let envelope = queue.recv().unwrap();
            prop_assert_eq!(envelope.element, i);
            queue.decr_size(envelope.size).unwrap();
        }
        prop_assert_eq!(queue.get_size(), 0);
    }

    #[test]
    fn prop_oversized_never_admitted(quota in 0i64..1000, excess in 1i64..1000) {
        let queue = MemBoundQueue::new(4, quota).unwrap();
        let result = queue.push((), quota + excess);
        prop_assert_eq!(result, Err(QueueError::ElementTooLarge { size: quota + excess, max_size: quota }));
        prop_assert_eq!(queue.get_size(), 0);
        prop_assert!(queue.is_empty());
    }
}
