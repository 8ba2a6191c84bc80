// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Ingress queue between the bus callback and the fusion consumer

use std::sync::atomic::{AtomicU64, Ordering};
use crossbeam::queue::SegQueue;
use tokio::sync::Notify;

use super::RawEvent;

/// Lock-free FIFO of raw bus events.
///
/// Producers call [`IngressQueue::enqueue`] from any thread; the single
/// consumer calls [`IngressQueue::drain_all`]. Every enqueue also wakes the
/// consumer through [`IngressQueue::notified`].
pub struct IngressQueue {
    events: SegQueue<RawEvent>,
    notify: Notify,
    enqueued: AtomicU64,
}

impl IngressQueue {
    pub fn new() -> Self {
        Self {
            events: SegQueue::new(),
            notify: Notify::new(),
            enqueued: AtomicU64::new(0),
        }
    }

    /// Push an event. Never blocks.
    pub fn enqueue(&self, event: RawEvent) {
        self.events.push(event);
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        self.notify.notify_one();
    }

    /// Take everything queued at the time of the call, in arrival order.
    ///
    /// Events pushed while draining stay queued for the next call.
    pub fn drain_all(&self) -> Vec<RawEvent> {
        let available = self.events.len();
        let mut drained = Vec::with_capacity(available);
        for _ in 0..available {
            match self.events.pop() {
                Some(event) => drained.push(event),
                None => break,
            }
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total events ever enqueued
    pub fn total_enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    /// Resolves once an event has been enqueued since the last wake-up
    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}

impl Default for IngressQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_drain_preserves_order() {
        let queue = IngressQueue::new();
        for i in 0..5 {
            queue.enqueue(RawEvent::new("t", &i.to_string()));
        }

        let drained = queue.drain_all();
        let payloads: Vec<_> = drained.iter().map(|e| e.payload.as_str()).collect();
        assert_eq!(payloads, vec!["0", "1", "2", "3", "4"]);
        assert!(queue.is_empty());
        assert!(queue.drain_all().is_empty());
    }

    #[test]
    fn test_concurrent_enqueue_and_drain_preserves_count() {
        const PRODUCERS: usize = 4;
        const PER_PRODUCER: usize = 5_000;

        let queue = Arc::new(IngressQueue::new());
        let done = Arc::new(AtomicBool::new(false));

        let consumer = {
            let queue = Arc::clone(&queue);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut seen = Vec::new();
                loop {
                    let finished = done.load(Ordering::Acquire);
                    seen.extend(queue.drain_all());
                    if finished && queue.is_empty() {
                        break;
                    }
                    thread::yield_now();
                }
                seen
            })
        };

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        queue.enqueue(RawEvent::new("stress", &format!("{}-{}", p, i)));
                    }
                })
            })
            .collect();

        for producer in producers {
            producer.join().unwrap();
        }
        done.store(true, Ordering::Release);

        let seen = consumer.join().unwrap();
        let unique: HashSet<_> = seen.iter().map(|e| e.payload.clone()).collect();

        assert_eq!(seen.len(), PRODUCERS * PER_PRODUCER);
        assert_eq!(unique.len(), PRODUCERS * PER_PRODUCER);
        assert_eq!(queue.total_enqueued(), (PRODUCERS * PER_PRODUCER) as u64);
    }

    #[test]
    fn test_per_producer_order_survives_interleaving() {
        let queue = Arc::new(IngressQueue::new());
        let handles: Vec<_> = (0..2)
            .map(|p| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..1_000 {
                        queue.enqueue(RawEvent::new(&p.to_string(), &i.to_string()));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut last = [-1i64; 2];
        for event in queue.drain_all() {
            let p: usize = event.topic.parse().unwrap();
            let i: i64 = event.payload.parse().unwrap();
            assert!(i > last[p]);
            last[p] = i;
        }
        assert_eq!(last, [999, 999]);
    }
}
