// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Scripted safe controller for demo mode

use std::sync::Arc;
use std::time::Duration;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::streaming::{ProtocolConfig, ProtocolVariant, Publisher};

/// One incident the simulator plays back
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub status: &'static str,
    pub distance_cm: f64,
    pub motion: bool,
    pub face: &'static str,
    pub voice: &'static str,
}

impl Scenario {
    /// Bus messages for this incident in the given protocol, in publish order
    pub fn messages(&self, protocol: &ProtocolConfig) -> Vec<(String, String)> {
        let pir = i32::from(self.motion);
        let mut messages = Vec::new();

        match protocol.variant {
            ProtocolVariant::Consolidated => {
                let envelope = json!({
                    "status_val": self.status,
                    "jarak_val": self.distance_cm,
                    "pir_val": pir,
                });
                messages.push((protocol.status_topic.clone(), envelope.to_string()));
            }
            ProtocolVariant::Legacy => {
                messages.push((protocol.status_topic.clone(), self.status.to_string()));
                messages.push((protocol.distance_topic.clone(), self.distance_cm.to_string()));
                messages.push((protocol.motion_topic.clone(), pir.to_string()));
            }
        }

        messages.push((protocol.face_result_topic.clone(), self.face.to_string()));
        messages.push((protocol.voice_result_topic.clone(), self.voice.to_string()));
        messages
    }
}

/// The default demo cycle
pub fn demo_scenarios() -> Vec<Scenario> {
    vec![
        Scenario { name: "owner visit", status: "SAFE", distance_cm: 40.0, motion: false, face: "USER_A", voice: "MY_YES" },
        Scenario { name: "stranger", status: "SAFE", distance_cm: 38.0, motion: false, face: "OTHER_FACES", voice: "MY_YES" },
        Scenario { name: "movement", status: "SAFE", distance_cm: 60.0, motion: true, face: "USER_B", voice: "MY_YES" },
        Scenario { name: "hand on door", status: "LOCKED", distance_cm: 3.0, motion: false, face: "USER_A", voice: "MY_YES" },
        Scenario { name: "model failure", status: "SAFE", distance_cm: 45.0, motion: false, face: "Model Error", voice: "MY_YES" },
        Scenario { name: "break-in", status: "forced-open", distance_cm: 12.0, motion: true, face: "Unknown", voice: "Not_User" },
    ]
}

/// Publishes a looping script of incidents through a [`Publisher`]
pub struct SafeSimulator {
    protocol: ProtocolConfig,
    scenarios: Vec<Scenario>,
    message_interval: Duration,
}

impl SafeSimulator {
    pub fn new(protocol: ProtocolConfig, message_interval: Duration) -> Self {
        Self {
            protocol,
            scenarios: demo_scenarios(),
            message_interval,
        }
    }

    pub fn with_scenarios(mut self, scenarios: Vec<Scenario>) -> Self {
        self.scenarios = scenarios;
        self
    }

    pub async fn run(self, publisher: Arc<dyn Publisher>, mut shutdown: broadcast::Receiver<()>) {
        info!("Safe simulator started with {} scenarios", self.scenarios.len());
        if self.scenarios.is_empty() {
            return;
        }

        for scenario in self.scenarios.iter().cycle() {
            debug!("Simulating '{}'", scenario.name);
            for (topic, payload) in scenario.messages(&self.protocol) {
                tokio::select! {
                    _ = tokio::time::sleep(self.message_interval) => {}
                    _ = shutdown.recv() => {
                        info!("Safe simulator stopped");
                        return;
                    }
                }
                if let Err(e) = publisher.publish(&topic, &payload) {
                    warn!("Simulator publish failed: {}", e);
                }
            }
        }
    }
}
