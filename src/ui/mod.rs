//! UI module - console snapshots and the text renderer

mod notices;
mod text;

pub use notices::*;
pub use text::TextRenderer;

use chrono::{DateTime, Local};

use crate::core::ConsoleStats;
use crate::detection::{IncidentRecord, MediaLink, PredictionLogEntry};

/// Read-only view of the console state handed to a renderer
#[derive(Debug, Clone)]
pub struct ConsoleSnapshot {
    pub taken_at: DateTime<Local>,
    pub stats: ConsoleStats,
    /// Most recent incidents, oldest first
    pub incidents: Vec<IncidentRecord>,
    pub photo: Option<MediaLink>,
    pub audio: Option<MediaLink>,
    pub face_log: Vec<PredictionLogEntry>,
    pub voice_log: Vec<PredictionLogEntry>,
    pub notices: Vec<Notice>,
}

/// Something that can draw a console frame
pub trait Renderer {
    fn render(&mut self, snapshot: &ConsoleSnapshot) -> std::io::Result<()>;
}
