// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Bus protocol description - which topics exist and how each is decoded

use std::collections::HashMap;
use serde::{Deserialize, Serialize};

/// Wire protocol spoken by the safe controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVariant {
    /// Status, distance and PIR travel together in one JSON envelope
    Consolidated,
    /// Bare status token, distance and PIR on their own topics
    Legacy,
}

impl ProtocolVariant {
    /// Near-field distance threshold the controller firmware was tuned for
    pub fn default_near_field_cm(&self) -> f64 {
        match self {
            ProtocolVariant::Consolidated => 5.0,
            ProtocolVariant::Legacy => 25.0,
        }
    }
}

/// How a status payload is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEncoding {
    /// `{"status_val": .., "jarak_val": .., "pir_val": ..}`
    Json,
    /// Payload is the status token verbatim
    Plain,
}

/// Role of an inbound topic in the merge step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    Status,
    Distance,
    Motion,
    FaceResult,
    VoiceResult,
    CameraUrl,
    AudioUrl,
}

/// Protocol configuration: variant plus every topic name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub variant: ProtocolVariant,

    // Inbound
    pub status_topic: String,
    pub face_result_topic: String,
    pub voice_result_topic: String,
    pub camera_url_topic: String,
    pub audio_url_topic: String,
    /// Only subscribed in the legacy variant
    pub distance_topic: String,
    /// Only subscribed in the legacy variant
    pub motion_topic: String,

    // Outbound
    pub camera_trigger_topic: String,
    pub mic_trigger_topic: String,
    pub alarm_control_topic: String,
    pub status_reset_topic: String,
    pub open_command_topic: String,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self::consolidated()
    }
}

impl ProtocolConfig {
    pub fn consolidated() -> Self {
        Self {
            variant: ProtocolVariant::Consolidated,
            status_topic: "data/status/kontrol".to_string(),
            face_result_topic: "ai/face/result".to_string(),
            voice_result_topic: "ai/voice/result".to_string(),
            camera_url_topic: "/iot/camera/photo".to_string(),
            audio_url_topic: "data/audio/link".to_string(),
            distance_topic: "data/dist/kontrol".to_string(),
            motion_topic: "data/pir/kontrol".to_string(),
            camera_trigger_topic: "/iot/camera/trigger".to_string(),
            mic_trigger_topic: "/iot/mic/trigger".to_string(),
            alarm_control_topic: "data/alarm/kontrol".to_string(),
            status_reset_topic: "data/status/reset".to_string(),
            open_command_topic: "data/brankas/open".to_string(),
        }
    }

    pub fn legacy() -> Self {
        Self {
            variant: ProtocolVariant::Legacy,
            ..Self::consolidated()
        }
    }

    pub fn status_encoding(&self) -> StatusEncoding {
        match self.variant {
            ProtocolVariant::Consolidated => StatusEncoding::Json,
            ProtocolVariant::Legacy => StatusEncoding::Plain,
        }
    }

    /// Topics the console subscribes to, in a stable order
    pub fn subscriptions(&self) -> Vec<&str> {
        let mut topics = vec![
            self.status_topic.as_str(),
            self.face_result_topic.as_str(),
            self.voice_result_topic.as_str(),
            self.camera_url_topic.as_str(),
            self.audio_url_topic.as_str(),
        ];
        if self.variant == ProtocolVariant::Legacy {
            topics.push(self.distance_topic.as_str());
            topics.push(self.motion_topic.as_str());
        }
        topics
    }

    /// Build the inbound routing table for this configuration
    pub fn router(&self) -> TopicRouter {
        let mut routes = HashMap::new();
        routes.insert(self.status_topic.clone(), TopicKind::Status);
        routes.insert(self.face_result_topic.clone(), TopicKind::FaceResult);
        routes.insert(self.voice_result_topic.clone(), TopicKind::VoiceResult);
        routes.insert(self.camera_url_topic.clone(), TopicKind::CameraUrl);
        routes.insert(self.audio_url_topic.clone(), TopicKind::AudioUrl);
        if self.variant == ProtocolVariant::Legacy {
            routes.insert(self.distance_topic.clone(), TopicKind::Distance);
            routes.insert(self.motion_topic.clone(), TopicKind::Motion);
        }

        TopicRouter {
            routes,
            status_encoding: self.status_encoding(),
        }
    }
}

/// Maps inbound topic names to their merge role
#[derive(Debug, Clone)]
pub struct TopicRouter {
    routes: HashMap<String, TopicKind>,
    status_encoding: StatusEncoding,
}

impl TopicRouter {
    pub fn route(&self, topic: &str) -> Option<TopicKind> {
        self.routes.get(topic).copied()
    }

    pub fn status_encoding(&self) -> StatusEncoding {
        self.status_encoding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consolidated_has_no_sensor_topics() {
        let protocol = ProtocolConfig::consolidated();
        let router = protocol.router();

        assert_eq!(router.route("data/status/kontrol"), Some(TopicKind::Status));
        assert_eq!(router.route("data/dist/kontrol"), None);
        assert_eq!(router.status_encoding(), StatusEncoding::Json);
        assert_eq!(protocol.subscriptions().len(), 5);
    }

    #[test]
    fn test_legacy_routes_sensor_topics() {
        let protocol = ProtocolConfig::legacy();
        let router = protocol.router();

        assert_eq!(router.route("data/dist/kontrol"), Some(TopicKind::Distance));
        assert_eq!(router.route("data/pir/kontrol"), Some(TopicKind::Motion));
        assert_eq!(router.status_encoding(), StatusEncoding::Plain);
        assert_eq!(protocol.subscriptions().len(), 7);
        assert_eq!(protocol.variant.default_near_field_cm(), 25.0);
    }
}
