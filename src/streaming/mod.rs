//! Streaming module - MQTT bus client, loopback bus and protocol layout

mod mqtt;
mod protocol;

pub use mqtt::*;
pub use protocol::*;

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{IngressQueue, RawEvent};

/// Bus failures
#[derive(Debug, Error)]
pub enum BusError {
    /// Broker refused or dropped the session during startup
    #[error("Cannot connect to broker {broker}: {reason}")]
    Connect { broker: String, reason: String },

    /// No CONNACK within the startup window
    #[error("Timed out connecting to broker {0}")]
    Timeout(String),

    #[error("Failed to publish to '{topic}': {reason}")]
    Publish { topic: String, reason: String },

    #[error("Failed to subscribe: {0}")]
    Subscribe(String),
}

/// Broker connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub broker: String,
    pub port: u16,
    /// A random suffix is appended per session
    pub client_id_prefix: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive_secs: u64,
    pub connect_timeout_secs: u64,
    pub reconnect_interval_ms: u64,
    /// Capacity of the client's outgoing request channel
    pub request_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            broker: "broker.hivemq.com".to_string(),
            port: 1883,
            client_id_prefix: "BrankasConsole".to_string(),
            username: None,
            password: None,
            keep_alive_secs: 60,
            connect_timeout_secs: 10,
            reconnect_interval_ms: 5000,
            request_capacity: 100,
        }
    }
}

/// Outbound side of the bus. Publishes are fire-and-forget.
pub trait Publisher: Send + Sync {
    fn publish(&self, topic: &str, payload: &str) -> Result<(), BusError>;

    /// Whether a broker session is currently up
    fn is_connected(&self) -> bool {
        true
    }
}

/// Publisher that feeds straight back into the ingress queue
pub struct LoopbackBus {
    queue: Arc<IngressQueue>,
}

impl LoopbackBus {
    pub fn new(queue: Arc<IngressQueue>) -> Self {
        Self { queue }
    }
}

impl Publisher for LoopbackBus {
    fn publish(&self, topic: &str, payload: &str) -> Result<(), BusError> {
        self.queue.enqueue(RawEvent::new(topic, payload));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_enqueues_published_messages() {
        let queue = Arc::new(IngressQueue::new());
        let bus = LoopbackBus::new(Arc::clone(&queue));

        bus.publish("ai/face/result", "USER_A").unwrap();

        let events = queue.drain_all();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].topic, "ai/face/result");
        assert_eq!(events[0].payload, "USER_A");
    }
}
