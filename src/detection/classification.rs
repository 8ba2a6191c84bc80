// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Verdict classification - ordered rule cascade over a fused incident

use std::collections::HashSet;

use super::{IncidentRecord, Verdict};
use crate::config::VerdictConfig;
use crate::streaming::ProtocolVariant;

/// Derives a [`Verdict`] from an [`IncidentRecord`] snapshot.
///
/// Rules are evaluated top to bottom and the first match wins:
///
/// 1. forced-open marker in the status → `BREACHED`
/// 2. any modality still missing → `PENDING_DATA` for idle states,
///    otherwise the controller status verbatim
/// 3. PIR motion → `MOTION_DETECTED`
/// 4. distance inside the near field → `OBJECT_NEAR`
/// 5. classifier error sentinel → `ML_ERROR`
/// 6. unknown face or rejected voice → `REJECTED_SUSPICIOUS`
/// 7. enrolled face and accepted voice → `ACCEPTED`
/// 8. anything else → `STANDBY`
#[derive(Debug, Clone)]
pub struct VerdictClassifier {
    near_field_cm: f64,
    idle_states: HashSet<String>,
    forced_open_markers: Vec<String>,
    unknown_faces: HashSet<String>,
    enrolled_faces: HashSet<String>,
    voice_accept: String,
    voice_reject: HashSet<String>,
    error_labels: HashSet<String>,
    error_prefix: String,
}

impl VerdictClassifier {
    pub fn new(config: &VerdictConfig, variant: ProtocolVariant) -> Self {
        let set = |items: &[String]| items.iter().cloned().collect::<HashSet<_>>();

        Self {
            near_field_cm: config
                .near_field_cm
                .unwrap_or_else(|| variant.default_near_field_cm()),
            idle_states: set(&config.idle_states),
            forced_open_markers: config
                .forced_open_markers
                .iter()
                .filter(|m| !m.is_empty())
                .cloned()
                .collect(),
            unknown_faces: set(&config.unknown_faces),
            enrolled_faces: set(&config.enrolled_faces),
            voice_accept: config.voice_accept.clone(),
            voice_reject: set(&config.voice_reject),
            error_labels: set(&config.error_labels),
            error_prefix: config.error_prefix.clone(),
        }
    }

    pub fn near_field_cm(&self) -> f64 {
        self.near_field_cm
    }

    /// True for `"Model Error"` and `"Error: ..."` style labels
    pub fn is_error_label(&self, label: &str) -> bool {
        self.error_labels.contains(label)
            || (!self.error_prefix.is_empty() && label.starts_with(&self.error_prefix))
    }

    pub fn classify(&self, record: &IncidentRecord) -> Verdict {
        let status = record.status_raw.as_str();

        if self.forced_open_markers.iter().any(|m| status.contains(m.as_str())) {
            return Verdict::Breached;
        }

        let (Some(distance), Some(motion), Some(face), Some(voice)) = (
            record.distance_cm,
            record.motion_detected,
            record.face_prediction.as_deref(),
            record.voice_prediction.as_deref(),
        ) else {
            return if self.idle_states.contains(status.trim()) {
                Verdict::PendingData
            } else {
                Verdict::Controller(record.status_raw.clone())
            };
        };

        if motion {
            return Verdict::MotionDetected;
        }

        // NaN fails both comparisons
        if distance > 0.0 && distance < self.near_field_cm {
            return Verdict::ObjectNear;
        }

        if self.is_error_label(face) || self.is_error_label(voice) {
            return Verdict::MlError;
        }

        if self.unknown_faces.contains(face) || self.voice_reject.contains(voice) {
            return Verdict::RejectedSuspicious;
        }

        if self.enrolled_faces.contains(face) && voice == self.voice_accept {
            return Verdict::Accepted;
        }

        Verdict::Standby
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> VerdictClassifier {
        VerdictClassifier::new(&VerdictConfig::default(), ProtocolVariant::Consolidated)
    }

    fn record(status: &str, distance: f64, motion: bool, face: &str, voice: &str) -> IncidentRecord {
        let mut r = IncidentRecord::new(1, "2026-01-01 00:00:00".to_string(), status.to_string());
        r.distance_cm = Some(distance);
        r.motion_detected = Some(motion);
        r.face_prediction = Some(face.to_string());
        r.voice_prediction = Some(voice.to_string());
        r
    }

    #[test]
    fn test_idle_status_awaiting_data_is_pending() {
        let r = IncidentRecord::new(1, String::new(), "SAFE".to_string());
        assert_eq!(classifier().classify(&r), Verdict::PendingData);
    }

    #[test]
    fn test_alert_status_passes_through_while_pending() {
        let mut r = IncidentRecord::new(1, String::new(), "ALARM".to_string());
        r.distance_cm = Some(40.0);
        let verdict = classifier().classify(&r);
        assert_eq!(verdict, Verdict::Controller("ALARM".to_string()));
        assert_eq!(verdict.as_str(), "ALARM");
    }

    #[test]
    fn test_forced_open_short_circuits() {
        let c = classifier();
        let pending = IncidentRecord::new(1, String::new(), "forced-open".to_string());
        assert_eq!(c.classify(&pending), Verdict::Breached);

        let full = record("door forced-open!", 3.0, true, "USER_A", "MY_YES");
        assert_eq!(c.classify(&full), Verdict::Breached);
    }

    #[test]
    fn test_near_field_precedes_acceptance() {
        let r = record("SAFE", 3.0, false, "USER_A", "MY_YES");
        assert_eq!(classifier().classify(&r), Verdict::ObjectNear);
    }

    #[test]
    fn test_legacy_threshold_is_wider() {
        let legacy = VerdictClassifier::new(&VerdictConfig::default(), ProtocolVariant::Legacy);
        let r = record("SAFE", 20.0, false, "USER_A", "MY_YES");
        assert_eq!(legacy.classify(&r), Verdict::ObjectNear);
        assert_eq!(classifier().classify(&r), Verdict::Accepted);
    }

    #[test]
    fn test_motion_precedes_distance() {
        let r = record("SAFE", 3.0, true, "USER_A", "MY_YES");
        assert_eq!(classifier().classify(&r), Verdict::MotionDetected);
    }

    #[test]
    fn test_model_errors() {
        let c = classifier();
        assert_eq!(c.classify(&record("SAFE", 40.0, false, "Model Error", "MY_YES")), Verdict::MlError);
        assert_eq!(
            c.classify(&record("SAFE", 40.0, false, "OTHER_FACES", "Error: decoder failed")),
            Verdict::MlError
        );
    }

    #[test]
    fn test_suspicious_and_accepted() {
        let c = classifier();
        assert_eq!(
            c.classify(&record("SAFE", 40.0, false, "OTHER_FACES", "MY_YES")),
            Verdict::RejectedSuspicious
        );
        assert_eq!(
            c.classify(&record("SAFE", 40.0, false, "USER_A", "Not_User")),
            Verdict::RejectedSuspicious
        );
        assert_eq!(c.classify(&record("SAFE", 40.0, false, "USER_A", "MY_YES")), Verdict::Accepted);
    }

    #[test]
    fn test_unrecognized_labels_fall_to_standby() {
        let c = classifier();
        assert_eq!(c.classify(&record("SAFE", 40.0, false, "cat", "meow")), Verdict::Standby);
        assert_eq!(c.classify(&record("SAFE", f64::NAN, false, "USER_A", "maybe")), Verdict::Standby);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let c = classifier();
        let r = record("SAFE", 12.0, false, "USER_B", "MY_YES");
        assert_eq!(c.classify(&r), c.classify(&r));
    }

    #[test]
    fn test_configured_threshold_overrides_variant() {
        let config = VerdictConfig {
            near_field_cm: Some(50.0),
            ..VerdictConfig::default()
        };
        let c = VerdictClassifier::new(&config, ProtocolVariant::Consolidated);
        assert_eq!(c.near_field_cm(), 50.0);
        assert_eq!(c.classify(&record("SAFE", 40.0, false, "USER_A", "MY_YES")), Verdict::ObjectNear);
    }
}
