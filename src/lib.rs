// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Brankas - Safe Security Console
//!
//! Watches an instrumented safe over MQTT and turns fragmented telemetry and
//! classifier results into one security verdict per incident:
//! - Lock-free ingress queue between the bus task and the console
//! - Incident fusion keyed on the current open incident
//! - Ordered verdict rule cascade (breach, pending, motion, proximity, ML)
//! - Camera/microphone capture fetch and face/voice classification
//! - Consolidated (JSON) and legacy (per-sensor topic) protocols
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────┐
//! │ MQTT Bus │ → │ Ingress Queue│ → │ Fusion Engine│ → │ Renderer │
//! └──────────┘   └──────────────┘   └──────────────┘   └──────────┘
//!      ↑                                   ↓
//!      │                            ┌──────────────┐
//!      └──── synthetic results ──── │ Media Handler│
//!                                   └──────────────┘
//! ```

pub mod core;
pub mod detection;
pub mod streaming;
pub mod media;
pub mod sensors;
pub mod config;
pub mod ui;

// Re-exports for convenience
pub use config::Config;
pub use core::{Console, IngressQueue, RawEvent};
pub use detection::{FusionEngine, IncidentRecord, Verdict, VerdictClassifier};
pub use streaming::{LoopbackBus, MqttBus, Publisher};
pub use media::MediaHandler;

/// Brankas version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
