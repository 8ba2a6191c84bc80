// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Plain-text console frame

use std::io::Write;

use super::{ConsoleSnapshot, NoticeLevel, Renderer};
use crate::detection::PredictionLogEntry;

const LOG_TAIL: usize = 5;

/// Draws snapshots as text frames onto any writer
pub struct TextRenderer<W: Write> {
    writer: W,
    clear_screen: bool,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            clear_screen: false,
        }
    }

    /// Clear the terminal before every frame
    pub fn with_clear_screen(mut self, clear: bool) -> Self {
        self.clear_screen = clear;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_log(&mut self, title: &str, log: &[PredictionLogEntry]) -> std::io::Result<()> {
        writeln!(self.writer, "{}", title)?;
        if log.is_empty() {
            writeln!(self.writer, "  (none)")?;
        }
        let skip = log.len().saturating_sub(LOG_TAIL);
        for entry in &log[skip..] {
            writeln!(
                self.writer,
                "  {}  {:<16} {:<8} {}",
                entry.timestamp, entry.label, entry.outcome, entry.note
            )?;
        }
        Ok(())
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render(&mut self, snapshot: &ConsoleSnapshot) -> std::io::Result<()> {
        if self.clear_screen {
            write!(self.writer, "\x1b[2J\x1b[H")?;
        }

        let stats = &snapshot.stats;
        writeln!(self.writer, "== Brankas monitor  {}", snapshot.taken_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(
            self.writer,
            "bus {} | events {} applied {} dropped {} | media {} failed {}",
            if stats.bus_connected { "up" } else { "down" },
            stats.events_received,
            stats.events_applied,
            stats.events_dropped,
            stats.media_requests,
            stats.fetch_failures
        )?;

        match &snapshot.photo {
            Some(link) => writeln!(self.writer, "photo: {} ({})", link.url, link.fetched_at.format("%H:%M:%S"))?,
            None => writeln!(self.writer, "photo: waiting for capture")?,
        }
        match &snapshot.audio {
            Some(link) => writeln!(self.writer, "audio: {} ({})", link.url, link.fetched_at.format("%H:%M:%S"))?,
            None => writeln!(self.writer, "audio: waiting for recording")?,
        }

        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "{:<5} {:<19} {:<14} {:>8} {:>4} {:<14} {:<14} {}",
            "#", "time", "status", "dist", "pir", "face", "voice", "verdict"
        )?;
        if snapshot.incidents.is_empty() {
            writeln!(self.writer, "  waiting for safe status...")?;
        }
        for record in &snapshot.incidents {
            let distance = record
                .distance_cm
                .map(|d| format!("{:.1}", d))
                .unwrap_or_else(|| "-".to_string());
            let motion = match record.motion_detected {
                Some(true) => "1",
                Some(false) => "0",
                None => "-",
            };
            let marker = if record.verdict.is_alert() { "!" } else { "" };
            writeln!(
                self.writer,
                "{:<5} {:<19} {:<14} {:>8} {:>4} {:<14} {:<14} {}{}",
                record.id,
                record.timestamp,
                record.status_raw,
                distance,
                motion,
                record.face_label(),
                record.voice_label(),
                record.verdict,
                marker
            )?;
        }

        writeln!(self.writer)?;
        self.write_log("face predictions", &snapshot.face_log)?;
        self.write_log("voice predictions", &snapshot.voice_log)?;

        for notice in &snapshot.notices {
            let tag = match notice.level {
                NoticeLevel::Info => "info",
                NoticeLevel::Warning => "warn",
                NoticeLevel::Error => "error",
            };
            writeln!(self.writer, "[{}] {}", tag, notice.message)?;
        }

        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConsoleStats;
    use crate::detection::{IncidentRecord, Verdict};
    use chrono::Local;

    fn snapshot() -> ConsoleSnapshot {
        let mut record = IncidentRecord::new(3, "2026-01-01 10:00:00".to_string(), "SAFE".to_string());
        record.distance_cm = Some(3.0);
        record.motion_detected = Some(false);
        record.verdict = Verdict::Breached;

        ConsoleSnapshot {
            taken_at: Local::now(),
            stats: ConsoleStats::default(),
            incidents: vec![record],
            photo: None,
            audio: None,
            face_log: Vec::new(),
            voice_log: Vec::new(),
            notices: Vec::new(),
        }
    }

    #[test]
    fn test_frame_lists_incidents() {
        let mut renderer = TextRenderer::new(Vec::new());
        renderer.render(&snapshot()).unwrap();

        let frame = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(frame.contains("BREACHED!"));
        assert!(frame.contains("3.0"));
        assert!(frame.contains("PENDING"));
        assert!(frame.contains("photo: waiting for capture"));
        assert!(frame.contains("bus down |"));
        assert!(!frame.starts_with('\x1b'));
    }

    #[test]
    fn test_empty_frame() {
        let mut snap = snapshot();
        snap.incidents.clear();

        let mut renderer = TextRenderer::new(Vec::new()).with_clear_screen(true);
        renderer.render(&snap).unwrap();

        let frame = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(frame.starts_with("\x1b[2J"));
        assert!(frame.contains("waiting for safe status"));
    }
}
