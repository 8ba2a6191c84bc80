//! Detection module - incident fusion and verdict classification

mod fusion;
mod classification;

pub use fusion::*;
pub use classification::*;

use std::fmt;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Placeholder shown for a prediction that has not arrived yet
pub const PENDING: &str = "PENDING";

/// One row per safe-status transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// Monotonic incident number, never reused
    pub id: u64,
    pub timestamp: String,
    pub status_raw: String,
    /// Status payload could not be decoded and was kept verbatim
    pub malformed: bool,
    pub distance_cm: Option<f64>,
    pub motion_detected: Option<bool>,
    /// `None` while PENDING
    pub face_prediction: Option<String>,
    /// `None` while PENDING
    pub voice_prediction: Option<String>,
    pub verdict: Verdict,
}

impl IncidentRecord {
    pub fn new(id: u64, timestamp: String, status_raw: String) -> Self {
        Self {
            id,
            timestamp,
            status_raw,
            malformed: false,
            distance_cm: None,
            motion_detected: None,
            face_prediction: None,
            voice_prediction: None,
            verdict: Verdict::PendingData,
        }
    }

    pub fn face_label(&self) -> &str {
        self.face_prediction.as_deref().unwrap_or(PENDING)
    }

    pub fn voice_label(&self) -> &str {
        self.voice_prediction.as_deref().unwrap_or(PENDING)
    }

    /// True once every modality has reported for this incident
    pub fn is_complete(&self) -> bool {
        self.distance_cm.is_some()
            && self.motion_detected.is_some()
            && self.face_prediction.is_some()
            && self.voice_prediction.is_some()
    }
}

/// Human-facing security verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Breached,
    PendingData,
    /// Alert state reported by the controller while ML data is outstanding
    Controller(String),
    MotionDetected,
    ObjectNear,
    MlError,
    RejectedSuspicious,
    Accepted,
    Standby,
}

impl Verdict {
    pub fn as_str(&self) -> &str {
        match self {
            Verdict::Breached => "BREACHED",
            Verdict::PendingData => "PENDING_DATA",
            Verdict::Controller(status) => status,
            Verdict::MotionDetected => "MOTION_DETECTED",
            Verdict::ObjectNear => "OBJECT_NEAR",
            Verdict::MlError => "ML_ERROR",
            Verdict::RejectedSuspicious => "REJECTED_SUSPICIOUS",
            Verdict::Accepted => "ACCEPTED",
            Verdict::Standby => "STANDBY",
        }
    }

    /// Verdicts an operator should act on
    pub fn is_alert(&self) -> bool {
        matches!(
            self,
            Verdict::Breached | Verdict::RejectedSuspicious | Verdict::MotionDetected | Verdict::MlError
        )
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Kind of media a capture URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Picture,
    Voice,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Picture => f.pad("picture"),
            MediaKind::Voice => f.pad("voice"),
        }
    }
}

/// Latest photo or audio location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaLink {
    pub url: String,
    pub fetched_at: DateTime<Local>,
}

/// Media fetch-and-classify work produced by the merge step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    pub url: String,
    pub kind: MediaKind,
    /// Incident that was current when the URL arrived
    pub incident_id: u64,
}

/// Outcome column of the prediction audit logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionOutcome {
    Success,
    Error,
}

impl fmt::Display for PredictionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionOutcome::Success => f.pad("Success"),
            PredictionOutcome::Error => f.pad("Error"),
        }
    }
}

/// Audit entry, one per classifier result received
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionLogEntry {
    pub timestamp: String,
    pub label: String,
    pub outcome: PredictionOutcome,
    pub note: String,
}
