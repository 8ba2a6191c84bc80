//! Console engine - drains the ingress queue, fuses, classifies and renders

use std::sync::Arc;
use chrono::Local;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use super::{ConsoleStats, IngressQueue, OperatorCommand, RefreshScheduler};
use crate::config::Config;
use crate::detection::{FusionEngine, VerdictClassifier};
use crate::media::MediaHandler;
use crate::streaming::{BusError, ProtocolConfig, Publisher};
use crate::ui::{ConsoleSnapshot, NoticeBoard, NoticeLevel, Renderer};

/// Owns all session state: the fusion engine, notices and counters.
///
/// Only the bus receive task runs concurrently with it, and that task
/// touches nothing but the shared [`IngressQueue`].
pub struct Console {
    queue: Arc<IngressQueue>,
    fusion: FusionEngine,
    media: MediaHandler,
    publisher: Arc<dyn Publisher>,
    protocol: ProtocolConfig,
    notices: NoticeBoard,
    stats: ConsoleStats,
    rows_shown: usize,
    media_enabled: bool,
}

impl Console {
    pub fn new(
        config: &Config,
        queue: Arc<IngressQueue>,
        publisher: Arc<dyn Publisher>,
        media: MediaHandler,
    ) -> Self {
        let classifier = VerdictClassifier::new(&config.verdict, config.protocol.variant);
        info!(
            "Fusion engine using {:?} protocol, near field {} cm",
            config.protocol.variant,
            classifier.near_field_cm()
        );

        let stats = ConsoleStats {
            bus_connected: publisher.is_connected(),
            ..ConsoleStats::default()
        };

        Self {
            queue,
            fusion: FusionEngine::new(config.protocol.router(), classifier, config.console.limits()),
            media,
            publisher,
            protocol: config.protocol.clone(),
            notices: NoticeBoard::new(config.media.notice_ttl()),
            stats,
            rows_shown: config.console.rows_shown.max(1),
            media_enabled: config.media.enabled,
        }
    }

    /// One drain-merge-classify cycle. Returns true when the frame needs a redraw.
    ///
    /// Media fetches for URLs seen in this batch run here, so a tick can take
    /// up to the fetch timeout per request.
    pub async fn tick(&mut self) -> bool {
        self.notices.prune();
        let mut changed = self.check_connection();

        let events = self.queue.drain_all();
        self.stats.events_received += events.len() as u64;
        changed |= self.fusion.process_batch(&events);
        self.stats.events_applied = self.fusion.applied_count();
        self.stats.events_dropped = self.fusion.dropped_count();

        let requests = self.fusion.take_media_requests();
        if !self.media_enabled {
            return changed;
        }

        for request in requests {
            self.stats.media_requests += 1;
            if let Err(e) = self.media.handle(&request).await {
                self.stats.fetch_failures += 1;
                warn!("{} for incident #{} not classified: {}", request.kind, request.incident_id, e);
                self.notices.post(
                    NoticeLevel::Warning,
                    format!("Could not fetch {} from {}: {}", request.kind, request.url, e),
                );
                changed = true;
            }
        }

        if !events.is_empty() {
            debug!("Processed {} events, changed: {}", events.len(), changed);
        }
        changed
    }

    /// Post a notice when the broker session drops or comes back
    fn check_connection(&mut self) -> bool {
        let connected = self.publisher.is_connected();
        if connected == self.stats.bus_connected {
            return false;
        }

        self.stats.bus_connected = connected;
        if connected {
            info!("Broker session restored");
            self.notices.post(NoticeLevel::Info, "Broker connection restored");
        } else {
            warn!("Broker session lost");
            self.notices.post(NoticeLevel::Warning, "Broker connection lost, reconnecting...");
        }
        true
    }

    /// Drive the console until shutdown: wait, tick, redraw when due.
    ///
    /// Operator commands arriving on `commands` are published as they come.
    pub async fn run<R: Renderer>(
        &mut self,
        renderer: &mut R,
        mut scheduler: RefreshScheduler,
        mut commands: mpsc::Receiver<OperatorCommand>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        info!("Console running, idle refresh every {:?}", scheduler.idle());
        let queue = Arc::clone(&self.queue);
        let mut redraw = false;

        loop {
            redraw |= self.tick().await;
            if scheduler.should_render(redraw) {
                self.stats.renders += 1;
                if let Err(e) = renderer.render(&self.snapshot()) {
                    warn!("Render failed: {}", e);
                }
            }
            redraw = false;

            tokio::select! {
                _ = scheduler.wait(&queue) => {}
                Some(command) = commands.recv() => {
                    if let Err(e) = self.send_command(command) {
                        warn!("{}", e);
                    }
                    redraw = true;
                }
                _ = shutdown.recv() => {
                    info!("Console shutting down...");
                    break;
                }
            }
        }
    }

    /// Publish an operator command; fire-and-forget
    pub fn send_command(&mut self, command: OperatorCommand) -> Result<(), BusError> {
        let topic = command.topic(&self.protocol);
        let result = self.publisher.publish(topic, command.payload());
        match &result {
            Ok(()) => self.notices.post(NoticeLevel::Info, format!("Sent {} to {}", command, topic)),
            Err(e) => self.notices.post(NoticeLevel::Error, e.to_string()),
        }
        result
    }

    pub fn post_notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.post(level, message);
    }

    pub fn snapshot(&self) -> ConsoleSnapshot {
        let incidents = self.fusion.incidents();
        let skip = incidents.len().saturating_sub(self.rows_shown);

        ConsoleSnapshot {
            taken_at: Local::now(),
            stats: self.stats.clone(),
            incidents: incidents.iter().skip(skip).cloned().collect(),
            photo: self.fusion.photo().cloned(),
            audio: self.fusion.audio().cloned(),
            face_log: self.fusion.face_log().iter().cloned().collect(),
            voice_log: self.fusion.voice_log().iter().cloned().collect(),
            notices: self.notices.active().to_vec(),
        }
    }

    pub fn fusion(&self) -> &FusionEngine {
        &self.fusion
    }

    pub fn stats(&self) -> &ConsoleStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::core::RawEvent;
    use crate::detection::Verdict;
    use crate::media::{
        AudioClassifier, ClassifierError, ImageClassifier, MediaError, MediaSource, Prediction,
    };
    use crate::streaming::LoopbackBus;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Camera;

    #[async_trait]
    impl MediaSource for Camera {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaError> {
            if url.contains("offline") {
                Err(MediaError::Timeout)
            } else {
                Ok(url.as_bytes().to_vec())
            }
        }
    }

    struct Models;

    impl ImageClassifier for Models {
        fn predict_image(&self, _bytes: &[u8]) -> Result<Prediction, ClassifierError> {
            Ok(Prediction::new("USER_A", 0.97))
        }
    }

    impl AudioClassifier for Models {
        fn predict_audio(&self, _bytes: &[u8]) -> Result<Prediction, ClassifierError> {
            Err(ClassifierError::ModelUnavailable("voice.h5".to_string()))
        }
    }

    fn console() -> (Console, Arc<IngressQueue>, ProtocolConfig) {
        let config = Config::default();
        let queue = Arc::new(IngressQueue::new());
        let bus: Arc<dyn Publisher> = Arc::new(LoopbackBus::new(Arc::clone(&queue)));
        let models = Arc::new(Models);
        let media = MediaHandler::new(
            Arc::new(Camera),
            models.clone(),
            models,
            Arc::clone(&bus),
            &config.protocol.face_result_topic,
            &config.protocol.voice_result_topic,
        );
        let protocol = config.protocol.clone();
        (Console::new(&config, Arc::clone(&queue), bus, media), queue, protocol)
    }

    #[tokio::test]
    async fn test_media_results_loop_back_through_queue() {
        let (mut console, queue, p) = console();
        queue.enqueue(RawEvent::new(
            &p.status_topic,
            r#"{"status_val":"SAFE","jarak_val":40,"pir_val":0}"#,
        ));
        queue.enqueue(RawEvent::new(&p.camera_url_topic, "http://cam/1.jpg"));
        queue.enqueue(RawEvent::new(&p.audio_url_topic, "http://mic/1.wav"));

        assert!(console.tick().await);
        let current = console.fusion().current().unwrap();
        assert_eq!(current.face_prediction, None);
        assert_eq!(current.verdict, Verdict::PendingData);
        assert_eq!(queue.len(), 2);

        assert!(console.tick().await);
        let current = console.fusion().current().unwrap();
        assert_eq!(current.face_label(), "USER_A");
        assert_eq!(current.voice_label(), "Model Error");
        assert_eq!(current.verdict, Verdict::MlError);
        assert_eq!(console.stats().media_requests, 2);
        assert_eq!(console.stats().events_received, 5);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_incident_pending() {
        let (mut console, queue, p) = console();
        queue.enqueue(RawEvent::new(&p.status_topic, r#"{"status_val":"SAFE"}"#));
        queue.enqueue(RawEvent::new(&p.camera_url_topic, "http://offline/1.jpg"));

        assert!(console.tick().await);
        assert!(queue.is_empty());
        assert_eq!(console.stats().fetch_failures, 1);

        let snapshot = console.snapshot();
        assert_eq!(snapshot.notices.len(), 1);
        assert!(snapshot.notices[0].message.contains("picture"));
        assert_eq!(snapshot.incidents[0].face_prediction, None);
        assert_eq!(snapshot.photo.unwrap().url, "http://offline/1.jpg");

        assert!(!console.tick().await);
    }

    #[tokio::test]
    async fn test_commands_publish_on_bus() {
        let (mut console, queue, p) = console();
        console.send_command(OperatorCommand::AlarmOff).unwrap();

        let sent = queue.drain_all();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].topic, p.alarm_control_topic);
        assert_eq!(sent[0].payload, "OFF");
        assert_eq!(console.snapshot().notices.len(), 1);
    }

    struct FlakyBus {
        up: AtomicBool,
    }

    impl Publisher for FlakyBus {
        fn publish(&self, _topic: &str, _payload: &str) -> Result<(), BusError> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.up.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn test_connection_changes_are_noticed() {
        let config = Config::default();
        let bus = Arc::new(FlakyBus {
            up: AtomicBool::new(true),
        });
        let models = Arc::new(Models);
        let media = MediaHandler::new(
            Arc::new(Camera),
            models.clone(),
            models,
            bus.clone(),
            &config.protocol.face_result_topic,
            &config.protocol.voice_result_topic,
        );
        let mut console = Console::new(&config, Arc::new(IngressQueue::new()), bus.clone(), media);

        assert!(console.stats().bus_connected);
        assert!(!console.tick().await);
        assert!(console.snapshot().notices.is_empty());

        bus.up.store(false, Ordering::SeqCst);
        assert!(console.tick().await);
        assert!(!console.stats().bus_connected);
        let notices = console.snapshot().notices;
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert!(!console.tick().await);

        bus.up.store(true, Ordering::SeqCst);
        assert!(console.tick().await);
        assert!(console.stats().bus_connected);
        assert!(console.snapshot().notices[1].message.contains("restored"));
    }

    #[tokio::test]
    async fn test_snapshot_shows_latest_rows() {
        let (mut console, queue, p) = console();
        for i in 0..15 {
            queue.enqueue(RawEvent::new(&p.status_topic, &format!(r#"{{"status_val":"S{}"}}"#, i)));
        }
        console.tick().await;

        let snapshot = console.snapshot();
        assert_eq!(snapshot.incidents.len(), 10);
        assert_eq!(snapshot.incidents.last().unwrap().status_raw, "S14");
        assert_eq!(console.fusion().incidents().len(), 15);
    }
}
