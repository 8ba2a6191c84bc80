// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Operator commands sent to the safe controller

use std::fmt;
use std::str::FromStr;

use crate::streaming::ProtocolConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Take a photo
    Capture,
    /// Record a voice sample
    Record,
    /// Silence the alarm
    AlarmOff,
    /// Reset the controller status
    Reset,
    /// Open the safe
    Open,
}

impl OperatorCommand {
    pub const ALL: [OperatorCommand; 5] = [
        OperatorCommand::Capture,
        OperatorCommand::Record,
        OperatorCommand::AlarmOff,
        OperatorCommand::Reset,
        OperatorCommand::Open,
    ];

    pub fn topic<'a>(&self, protocol: &'a ProtocolConfig) -> &'a str {
        match self {
            OperatorCommand::Capture => &protocol.camera_trigger_topic,
            OperatorCommand::Record => &protocol.mic_trigger_topic,
            OperatorCommand::AlarmOff => &protocol.alarm_control_topic,
            OperatorCommand::Reset => &protocol.status_reset_topic,
            OperatorCommand::Open => &protocol.open_command_topic,
        }
    }

    pub fn payload(&self) -> &'static str {
        match self {
            OperatorCommand::Capture => "capture",
            OperatorCommand::Record => "record",
            OperatorCommand::AlarmOff => "OFF",
            OperatorCommand::Reset => "RESET",
            OperatorCommand::Open => "OPEN",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OperatorCommand::Capture => "capture",
            OperatorCommand::Record => "record",
            OperatorCommand::AlarmOff => "alarm-off",
            OperatorCommand::Reset => "reset",
            OperatorCommand::Open => "open",
        }
    }
}

impl fmt::Display for OperatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for OperatorCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        match wanted.as_str() {
            "photo" | "refresh" => return Ok(OperatorCommand::Capture),
            "mute" | "off" => return Ok(OperatorCommand::AlarmOff),
            _ => {}
        }
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| format!("unknown command '{}'", s.trim()))
    }
}
