// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Face and voice classifier adapters

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Label published when the model artifacts could not be used
pub const MODEL_ERROR: &str = "Model Error";

/// Classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    /// Always within `[0, 1]`
    pub confidence: f32,
}

impl Prediction {
    pub fn new(label: &str, confidence: f32) -> Self {
        let confidence = if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) };
        Self {
            label: label.to_string(),
            confidence,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("{0}")]
    Inference(String),
}

/// Face recognition over an encoded image
pub trait ImageClassifier: Send + Sync {
    fn predict_image(&self, bytes: &[u8]) -> Result<Prediction, ClassifierError>;
}

/// Speaker / passphrase recognition over an encoded recording
pub trait AudioClassifier: Send + Sync {
    fn predict_audio(&self, bytes: &[u8]) -> Result<Prediction, ClassifierError>;
}

/// Convert a classifier result into the label published on the bus
pub fn result_label(result: Result<Prediction, ClassifierError>) -> String {
    match result {
        Ok(prediction) => prediction.label,
        Err(ClassifierError::ModelUnavailable(_)) => MODEL_ERROR.to_string(),
        Err(ClassifierError::Inference(message)) => format!("Error: {}", message),
    }
}

/// Stand-in when no model is installed; every prediction reports [`MODEL_ERROR`]
#[derive(Debug, Clone)]
pub struct UnavailableModel {
    name: String,
}

impl UnavailableModel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl ImageClassifier for UnavailableModel {
    fn predict_image(&self, _bytes: &[u8]) -> Result<Prediction, ClassifierError> {
        Err(ClassifierError::ModelUnavailable(self.name.clone()))
    }
}

impl AudioClassifier for UnavailableModel {
    fn predict_audio(&self, _bytes: &[u8]) -> Result<Prediction, ClassifierError> {
        Err(ClassifierError::ModelUnavailable(self.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(Prediction::new("USER_A", 1.7).confidence, 1.0);
        assert_eq!(Prediction::new("USER_A", -0.2).confidence, 0.0);
        assert_eq!(Prediction::new("USER_A", f32::NAN).confidence, 0.0);
    }

    #[test]
    fn test_error_labels() {
        let missing = UnavailableModel::new("face.onnx");
        assert_eq!(result_label(missing.predict_image(b"jpeg")), "Model Error");
        assert_eq!(result_label(missing.predict_audio(b"wav")), "Model Error");
        assert_eq!(
            result_label(Err(ClassifierError::Inference("bad header".to_string()))),
            "Error: bad header"
        );
        assert_eq!(result_label(Ok(Prediction::new("MY_YES", 0.93))), "MY_YES");
    }
}
