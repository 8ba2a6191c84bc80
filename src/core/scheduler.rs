// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Refresh scheduler - wakes on new data or on an idle timer

use std::time::{Duration, Instant};
use tracing::trace;

use super::IngressQueue;

/// Why the consumer woke up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    Data,
    Idle,
}

/// Decides when the console drains and redraws.
///
/// A redraw happens right away when a tick changed state, and at least once
/// per idle interval otherwise so wall-clock elements stay fresh.
#[derive(Debug)]
pub struct RefreshScheduler {
    idle: Duration,
    last_render: Option<Instant>,
}

impl RefreshScheduler {
    pub fn new(idle: Duration) -> Self {
        Self {
            idle,
            last_render: None,
        }
    }

    pub fn idle(&self) -> Duration {
        self.idle
    }

    /// Sleep until the queue signals or the idle interval elapses
    pub async fn wait(&self, queue: &IngressQueue) -> WakeReason {
        let reason = tokio::select! {
            _ = queue.notified() => WakeReason::Data,
            _ = tokio::time::sleep(self.idle) => WakeReason::Idle,
        };
        trace!("Console woke: {:?}", reason);
        reason
    }

    pub fn should_render(&mut self, changed: bool) -> bool {
        self.should_render_at(changed, Instant::now())
    }

    pub fn should_render_at(&mut self, changed: bool, now: Instant) -> bool {
        let due = match self.last_render {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.idle,
        };

        if changed || due {
            self.last_render = Some(now);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RawEvent;

    #[test]
    fn test_render_on_change_or_when_idle_elapsed() {
        let mut scheduler = RefreshScheduler::new(Duration::from_secs(5));
        let start = Instant::now();

        assert!(scheduler.should_render_at(false, start));
        assert!(!scheduler.should_render_at(false, start + Duration::from_secs(1)));
        assert!(scheduler.should_render_at(true, start + Duration::from_secs(2)));
        assert!(!scheduler.should_render_at(false, start + Duration::from_secs(6)));
        assert!(scheduler.should_render_at(false, start + Duration::from_secs(7)));
    }

    #[tokio::test]
    async fn test_wait_wakes_on_enqueue() {
        let queue = IngressQueue::new();
        let scheduler = RefreshScheduler::new(Duration::from_secs(60));

        queue.enqueue(RawEvent::new("t", "p"));
        assert_eq!(scheduler.wait(&queue).await, WakeReason::Data);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_when_quiet() {
        let queue = IngressQueue::new();
        let scheduler = RefreshScheduler::new(Duration::from_secs(3));

        assert_eq!(scheduler.wait(&queue).await, WakeReason::Idle);
    }
}
