//! Core module - ingress queue, console orchestration and refresh scheduling

mod engine;
mod queue;
mod scheduler;
mod commands;

pub use engine::Console;
pub use queue::IngressQueue;
pub use scheduler::{RefreshScheduler, WakeReason};
pub use commands::OperatorCommand;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A message exactly as it came off the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub topic: String,
    pub payload: String,
    pub received_at: DateTime<Local>,
}

impl RawEvent {
    pub fn new(topic: &str, payload: &str) -> Self {
        Self::at(topic, payload, Local::now())
    }

    pub fn at(topic: &str, payload: &str, received_at: DateTime<Local>) -> Self {
        Self {
            topic: topic.to_string(),
            payload: payload.to_string(),
            received_at,
        }
    }

    /// Console timestamp format, second resolution
    pub fn timestamp(&self) -> String {
        self.received_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Console-wide counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsoleStats {
    pub bus_connected: bool,
    pub events_received: u64,
    pub events_applied: u64,
    pub events_dropped: u64,
    pub media_requests: u64,
    pub fetch_failures: u64,
    pub renders: u64,
}
