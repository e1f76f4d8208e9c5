//! End-to-end producer/consumer scenarios

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use membound::{MemBoundQueue, QueueError};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn wait_for(condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_three_sequential_pushes_with_release() {
    init_logging();
    let queue = MemBoundQueue::new(1000, 128).unwrap();

    for _ in 0..3 {
        assert_eq!(queue.push(vec![0u8; 40], 40), Ok(()));
        let envelope = queue.recv().unwrap();
        queue.decr_size(envelope.size).unwrap();
    }
    assert_eq!(queue.get_size(), 0);
}

#[test]
fn test_concurrent_producers_share_quota() {
    init_logging();
    let queue = Arc::new(MemBoundQueue::new(1000, 100).unwrap());

    let producers: Vec<_> = (0..2)
        .map(|id| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push(id, 60))
        })
        .collect();

    wait_for(|| queue.len() == 1 && queue.waiters() == 1);
    assert_eq!(queue.get_size(), 60);

    let envelope = queue.recv().unwrap();
    queue.decr_size(envelope.size).unwrap();

    for producer in producers {
        assert_eq!(producer.join().unwrap(), Ok(()));
    }
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.get_size(), 60);
}

#[test]
fn test_oversized_element_fails_immediately() {
    init_logging();
    let queue = MemBoundQueue::new(1000, 100).unwrap();

    let started = Instant::now();
    let result = queue.push("too big", 150);
    assert_eq!(result, Err(QueueError::ElementTooLarge { size: 150, max_size: 100 }));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(queue.get_size(), 0);
}

#[test]
fn test_streaming_consumer_sees_every_element() {
    init_logging();
    const COUNT: usize = 1000;
    let queue = Arc::new(MemBoundQueue::new(1000, 128).unwrap());
    let payload = "12345678";
    let size = std::mem::size_of_val(&payload) as i64;

    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let mut count = 0;
            while let Some(delivery) = queue.recv_guarded() {
                assert_eq!(*delivery, payload);
                count += 1;
            }
            count
        })
    };

    for _ in 0..COUNT {
        queue.push(payload, size).unwrap();
    }
    queue.close();

    assert_eq!(consumer.join().unwrap(), COUNT);
    assert_eq!(queue.get_size(), 0);
    let stats = queue.statistics();
    assert_eq!(stats.total_pushed, COUNT as u64);
    assert_eq!(stats.total_released_bytes, COUNT as u64 * size as u64);
}
