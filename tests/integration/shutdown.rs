//! Shutdown behaviour seen from producers and consumers

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use membound::{MemBoundQueue, QueueError};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn wait_for_waiters<T>(queue: &MemBoundQueue<T>, expected: usize) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while queue.waiters() < expected {
        assert!(Instant::now() < deadline, "producers never blocked");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_close_releases_blocked_producer() {
    init_logging();
    let queue = Arc::new(MemBoundQueue::new(10, 100).unwrap());
    queue.push(0u32, 100).unwrap();

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.push(1u32, 1))
    };
    wait_for_waiters(&queue, 1);

    queue.close();
    assert_eq!(producer.join().unwrap(), Err(QueueError::Closed));

    // A second close changes nothing
    queue.close();
    assert_eq!(queue.recv().map(|e| e.element), Some(0));
    assert!(queue.recv().is_none());
}

#[test]
fn test_close_from_many_threads_while_producers_block() {
    init_logging();
    const CLOSERS: usize = 8;
    const PRODUCERS: usize = 8;

    let queue = Arc::new(MemBoundQueue::new(100, 10).unwrap());
    queue.push(usize::MAX, 10).unwrap();

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|i| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push(i, 5))
        })
        .collect();
    wait_for_waiters(&queue, PRODUCERS);

    let barrier = Arc::new(Barrier::new(CLOSERS));
    let closers: Vec<_> = (0..CLOSERS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                queue.close();
            })
        })
        .collect();

    for closer in closers {
        closer.join().unwrap();
    }
    for producer in producers {
        assert_eq!(producer.join().unwrap(), Err(QueueError::Closed));
    }
    assert_eq!(queue.waiters(), 0);
    assert_eq!(queue.len(), 1);
}

#[test]
fn test_drain_into_fresh_queue_after_close() {
    init_logging();
    let old = MemBoundQueue::new(10, 100).unwrap();
    for i in 0..4u32 {
        old.push(i, 20).unwrap();
    }
    old.close();
    assert_eq!(old.push(99, 1), Err(QueueError::Closed));

    // Recovery: move the remaining elements into a fresh queue
    let fresh = MemBoundQueue::new(10, 100).unwrap();
    while let Some(envelope) = old.recv() {
        old.decr_size(envelope.size).unwrap();
        fresh.push(envelope.element, envelope.size).unwrap();
    }
    fresh.push(99, 1).unwrap();

    assert_eq!(old.get_size(), 0);
    assert_eq!(fresh.get_size(), 81);
    let order: Vec<_> = std::iter::from_fn(|| fresh.try_recv().ok())
        .map(|e| e.element)
        .collect();
    assert_eq!(order, vec![0, 1, 2, 3, 99]);
}
