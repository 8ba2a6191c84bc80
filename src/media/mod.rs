//! Media module - fetch captured media and run the classifiers on it

mod classifier;

pub use classifier::*;

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::detection::{MediaKind, MediaRequest};
use crate::streaming::Publisher;

/// Fetch failures; none of these publish anything
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("invalid media URL: {0}")]
    InvalidUrl(String),

    #[error("media server answered HTTP {0}")]
    Status(u16),

    #[error("media fetch timed out")]
    Timeout,

    #[error("media fetch failed: {0}")]
    Network(String),

    #[error("cannot build HTTP client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for MediaError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            MediaError::Timeout
        } else {
            MediaError::Network(e.to_string())
        }
    }
}

/// Where captured media bytes come from
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaError>;
}

/// HTTP GET with a bounded timeout; only `200 OK` counts as success
pub struct HttpMediaSource {
    client: reqwest::Client,
}

impl HttpMediaSource {
    pub fn new(timeout: Duration) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MediaError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MediaSource for HttpMediaSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaError> {
        let response = self.client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(MediaError::Status(response.status().as_u16()));
        }
        let bytes = response.bytes().await?;
        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

/// Fetches a capture, classifies it and publishes the label as a synthetic
/// result event
pub struct MediaHandler {
    source: Arc<dyn MediaSource>,
    faces: Arc<dyn ImageClassifier>,
    voices: Arc<dyn AudioClassifier>,
    publisher: Arc<dyn Publisher>,
    face_result_topic: String,
    voice_result_topic: String,
}

impl MediaHandler {
    pub fn new(
        source: Arc<dyn MediaSource>,
        faces: Arc<dyn ImageClassifier>,
        voices: Arc<dyn AudioClassifier>,
        publisher: Arc<dyn Publisher>,
        face_result_topic: &str,
        voice_result_topic: &str,
    ) -> Self {
        Self {
            source,
            faces,
            voices,
            publisher,
            face_result_topic: face_result_topic.to_string(),
            voice_result_topic: voice_result_topic.to_string(),
        }
    }

    /// Returns the published label. Fetch failures publish nothing.
    pub async fn handle(&self, request: &MediaRequest) -> Result<String, MediaError> {
        if !request.url.starts_with("http") {
            return Err(MediaError::InvalidUrl(request.url.clone()));
        }

        let bytes = self.source.fetch(&request.url).await?;
        let label = self.classify(request.kind, bytes).await;

        let topic = match request.kind {
            MediaKind::Picture => &self.face_result_topic,
            MediaKind::Voice => &self.voice_result_topic,
        };
        if let Err(e) = self.publisher.publish(topic, &label) {
            warn!("{}", e);
        }

        info!("{} for incident #{} classified as {:?}", request.kind, request.incident_id, label);
        Ok(label)
    }

    async fn classify(&self, kind: MediaKind, bytes: Vec<u8>) -> String {
        let joined = match kind {
            MediaKind::Picture => {
                let faces = Arc::clone(&self.faces);
                tokio::task::spawn_blocking(move || faces.predict_image(&bytes)).await
            }
            MediaKind::Voice => {
                let voices = Arc::clone(&self.voices);
                tokio::task::spawn_blocking(move || voices.predict_audio(&bytes)).await
            }
        };

        match joined {
            Ok(result) => result_label(result),
            Err(e) => format!("Error: {}", e),
        }
    }
}
