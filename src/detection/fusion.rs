// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Incident fusion engine - merges per-topic fragments into incident records

use std::collections::VecDeque;
use serde_json::Value;
use tracing::{debug, trace};

use super::{
    IncidentRecord, MediaKind, MediaLink, MediaRequest, PredictionLogEntry, PredictionOutcome,
    VerdictClassifier,
};
use crate::core::RawEvent;
use crate::streaming::{StatusEncoding, TopicKind, TopicRouter};

const LOG_NOTE: &str = "MQTT live result";

/// Retention limits for the fused state
#[derive(Debug, Clone, Copy)]
pub struct FusionLimits {
    pub max_incidents: usize,
    pub max_log_entries: usize,
}

impl Default for FusionLimits {
    fn default() -> Self {
        Self {
            max_incidents: 1000,
            max_log_entries: 1000,
        }
    }
}

/// Decoded status payload
#[derive(Debug, Clone, PartialEq)]
struct StatusFields {
    status: String,
    distance_cm: Option<f64>,
    motion_detected: Option<bool>,
    malformed: bool,
}

/// Owns the incident table, the prediction logs and the latest media links.
///
/// Single-threaded: events reach it only through [`FusionEngine::process_batch`].
pub struct FusionEngine {
    router: TopicRouter,
    classifier: VerdictClassifier,
    limits: FusionLimits,

    incidents: VecDeque<IncidentRecord>,
    face_log: VecDeque<PredictionLogEntry>,
    voice_log: VecDeque<PredictionLogEntry>,
    photo: Option<MediaLink>,
    audio: Option<MediaLink>,

    pending_media: Vec<MediaRequest>,
    next_incident_id: u64,
    applied: u64,
    dropped: u64,
}

impl FusionEngine {
    pub fn new(router: TopicRouter, classifier: VerdictClassifier, limits: FusionLimits) -> Self {
        Self {
            router,
            classifier,
            limits: FusionLimits {
                max_incidents: limits.max_incidents.max(1),
                max_log_entries: limits.max_log_entries.max(1),
            },
            incidents: VecDeque::new(),
            face_log: VecDeque::new(),
            voice_log: VecDeque::new(),
            photo: None,
            audio: None,
            pending_media: Vec::new(),
            next_incident_id: 1,
            applied: 0,
            dropped: 0,
        }
    }

    /// Merge a batch of events and refresh every verdict if anything changed
    pub fn process_batch(&mut self, events: &[RawEvent]) -> bool {
        let mut changed = false;

        for event in events {
            if self.apply(event) {
                self.applied += 1;
                changed = true;
            } else {
                self.dropped += 1;
            }
        }

        if changed {
            self.reclassify();
        }

        changed
    }

    fn apply(&mut self, event: &RawEvent) -> bool {
        let Some(kind) = self.router.route(&event.topic) else {
            trace!("Dropping event on unrouted topic {}", event.topic);
            return false;
        };

        match kind {
            TopicKind::Status => {
                self.open_incident(event);
                true
            }
            TopicKind::CameraUrl => self.attach_media(event, MediaKind::Picture),
            TopicKind::AudioUrl => self.attach_media(event, MediaKind::Voice),
            TopicKind::Distance
            | TopicKind::Motion
            | TopicKind::FaceResult
            | TopicKind::VoiceResult => self.update_current(kind, event),
        }
    }

    fn update_current(&mut self, kind: TopicKind, event: &RawEvent) -> bool {
        let payload = event.payload.trim();
        let entry = self.log_entry(event, payload);
        let limit = self.limits.max_log_entries;

        let Some(current) = self.incidents.back_mut() else {
            trace!("Dropping {:?} event, no open incident", kind);
            return false;
        };

        match kind {
            TopicKind::Distance => match parse_distance(payload) {
                Some(distance) => {
                    current.distance_cm = Some(distance);
                    true
                }
                None => {
                    debug!("Ignoring unparseable distance {:?}", payload);
                    false
                }
            },
            TopicKind::Motion => match parse_motion(payload) {
                Some(motion) => {
                    current.motion_detected = Some(motion);
                    true
                }
                None => {
                    debug!("Ignoring unparseable PIR value {:?}", payload);
                    false
                }
            },
            TopicKind::FaceResult => {
                current.face_prediction = Some(payload.to_string());
                push_bounded(&mut self.face_log, entry, limit);
                true
            }
            TopicKind::VoiceResult => {
                current.voice_prediction = Some(payload.to_string());
                push_bounded(&mut self.voice_log, entry, limit);
                true
            }
            _ => false,
        }
    }

    fn open_incident(&mut self, event: &RawEvent) {
        let fields = match self.router.status_encoding() {
            StatusEncoding::Json => decode_status_json(&event.payload),
            StatusEncoding::Plain => StatusFields {
                status: event.payload.clone(),
                distance_cm: None,
                motion_detected: None,
                malformed: false,
            },
        };

        let mut record = IncidentRecord::new(self.next_incident_id, event.timestamp(), fields.status);
        record.distance_cm = fields.distance_cm;
        record.motion_detected = fields.motion_detected;
        record.malformed = fields.malformed;
        self.next_incident_id += 1;

        debug!("Opened incident #{} with status {:?}", record.id, record.status_raw);
        push_bounded(&mut self.incidents, record, self.limits.max_incidents);
    }

    fn attach_media(&mut self, event: &RawEvent, kind: MediaKind) -> bool {
        let url = event.payload.trim();
        let Some(incident_id) = self.incidents.back().map(|r| r.id) else {
            return false;
        };
        if url.is_empty() {
            debug!("Ignoring empty {} URL", kind);
            return false;
        }

        let link = MediaLink {
            url: url.to_string(),
            fetched_at: event.received_at,
        };
        match kind {
            MediaKind::Picture => self.photo = Some(link),
            MediaKind::Voice => self.audio = Some(link),
        }

        self.pending_media.push(MediaRequest {
            url: url.to_string(),
            kind,
            incident_id,
        });
        true
    }

    fn log_entry(&self, event: &RawEvent, label: &str) -> PredictionLogEntry {
        let outcome = if self.classifier.is_error_label(label) {
            PredictionOutcome::Error
        } else {
            PredictionOutcome::Success
        };

        PredictionLogEntry {
            timestamp: event.timestamp(),
            label: label.to_string(),
            outcome,
            note: LOG_NOTE.to_string(),
        }
    }

    fn reclassify(&mut self) {
        let classifier = &self.classifier;
        for record in self.incidents.iter_mut() {
            record.verdict = classifier.classify(record);
        }
    }

    /// Media work queued by camera/audio URL events since the last call
    pub fn take_media_requests(&mut self) -> Vec<MediaRequest> {
        std::mem::take(&mut self.pending_media)
    }

    pub fn incidents(&self) -> &VecDeque<IncidentRecord> {
        &self.incidents
    }

    pub fn current(&self) -> Option<&IncidentRecord> {
        self.incidents.back()
    }

    pub fn face_log(&self) -> &VecDeque<PredictionLogEntry> {
        &self.face_log
    }

    pub fn voice_log(&self) -> &VecDeque<PredictionLogEntry> {
        &self.voice_log
    }

    pub fn photo(&self) -> Option<&MediaLink> {
        self.photo.as_ref()
    }

    pub fn audio(&self) -> Option<&MediaLink> {
        self.audio.as_ref()
    }

    pub fn classifier(&self) -> &VerdictClassifier {
        &self.classifier
    }

    pub fn applied_count(&self) -> u64 {
        self.applied
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }
}

fn push_bounded<T>(buffer: &mut VecDeque<T>, item: T, max: usize) {
    buffer.push_back(item);
    while buffer.len() > max {
        buffer.pop_front();
    }
}

fn parse_distance(payload: &str) -> Option<f64> {
    payload.parse::<f64>().ok().filter(|d| d.is_finite())
}

fn parse_motion(payload: &str) -> Option<bool> {
    payload.parse::<i64>().ok().and_then(motion_flag)
}

fn motion_flag(value: i64) -> Option<bool> {
    match value {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

fn decode_status_json(payload: &str) -> StatusFields {
    let map = match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(map)) => map,
        _ => {
            return StatusFields {
                status: payload.to_string(),
                distance_cm: None,
                motion_detected: None,
                malformed: true,
            }
        }
    };

    let status = match map.get("status_val") {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => "Unknown".to_string(),
        Some(other) => other.to_string(),
    };

    let distance_cm = map.get("jarak_val").and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
    .filter(|d| d.is_finite());

    let motion_detected = map.get("pir_val").and_then(|v| match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    })
    .and_then(motion_flag);

    StatusFields {
        status,
        distance_cm,
        motion_detected,
        malformed: false,
    }
}
