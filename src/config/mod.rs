// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Configuration module

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::detection::FusionLimits;
use crate::streaming::{BusConfig, ProtocolConfig};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application name
    pub app_name: String,

    /// Log level
    pub log_level: String,

    /// Run the scripted safe simulator alongside the console
    pub demo_mode: bool,

    /// Broker connection
    pub bus: BusConfig,

    /// Topic layout and payload encoding
    pub protocol: ProtocolConfig,

    /// Verdict rule parameters
    pub verdict: VerdictConfig,

    /// Media fetch configuration
    pub media: MediaConfig,

    /// Console refresh and retention
    pub console: ConsoleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Brankas".to_string(),
            log_level: "info".to_string(),
            demo_mode: false,
            bus: BusConfig::default(),
            protocol: ProtocolConfig::default(),
            verdict: VerdictConfig::default(),
            media: MediaConfig::default(),
            console: ConsoleConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("brankas"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Verdict cascade parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictConfig {
    /// Near-field threshold in cm; the protocol variant's default when unset
    pub near_field_cm: Option<f64>,

    /// Status tokens that mean "nothing is happening"
    pub idle_states: Vec<String>,

    /// Substrings of a status that mean the safe was forced open
    pub forced_open_markers: Vec<String>,

    /// Face classes that are not an enrolled person
    pub unknown_faces: Vec<String>,

    /// Face classes of enrolled people
    pub enrolled_faces: Vec<String>,

    /// Voice class for the accepted passphrase
    pub voice_accept: String,

    /// Voice classes that reject the speaker
    pub voice_reject: Vec<String>,

    /// Exact labels produced by a failing classifier
    pub error_labels: Vec<String>,

    /// Prefix of labels carrying a classifier error message
    pub error_prefix: String,
}

impl Default for VerdictConfig {
    fn default() -> Self {
        Self {
            near_field_cm: None,
            idle_states: vec!["SAFE".to_string(), "STANDBY".to_string(), "LOCKED".to_string()],
            forced_open_markers: vec!["forced-open".to_string(), "Dibuka Paksa".to_string()],
            unknown_faces: vec!["Unknown".to_string(), "OTHER_FACES".to_string()],
            enrolled_faces: vec!["USER_A".to_string(), "USER_B".to_string(), "USER_C".to_string()],
            voice_accept: "MY_YES".to_string(),
            voice_reject: vec!["Not_User".to_string()],
            error_labels: vec!["Model Error".to_string()],
            error_prefix: "Error:".to_string(),
        }
    }
}

/// Media fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Fetch and classify captures when their URL arrives
    pub enabled: bool,

    /// HTTP GET timeout in seconds
    pub fetch_timeout_secs: u64,

    /// How long a failure notice stays on screen
    pub notice_ttl_secs: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fetch_timeout_secs: 5,
            notice_ttl_secs: 10,
        }
    }
}

impl MediaConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.notice_ttl_secs)
    }
}

/// Console refresh and retention
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Redraw interval when no data arrives, in seconds
    pub idle_refresh_secs: u64,

    /// Incident rows kept in memory
    pub max_incidents: usize,

    /// Entries kept per prediction log
    pub max_log_entries: usize,

    /// Incident rows drawn per frame
    pub rows_shown: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            idle_refresh_secs: 5,
            max_incidents: 1000,
            max_log_entries: 1000,
            rows_shown: 10,
        }
    }
}

impl ConsoleConfig {
    pub fn idle_refresh(&self) -> Duration {
        Duration::from_secs(self.idle_refresh_secs.max(1))
    }

    pub fn limits(&self) -> FusionLimits {
        FusionLimits {
            max_incidents: self.max_incidents,
            max_log_entries: self.max_log_entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::ProtocolVariant;

    #[test]
    fn test_default_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.protocol.variant, ProtocolVariant::Consolidated);
        assert_eq!(parsed.media.fetch_timeout_secs, 5);
        assert_eq!(parsed.verdict.idle_states, config.verdict.idle_states);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [protocol]
            variant = "legacy"

            [verdict]
            near_field_cm = 12.5
            "#,
        )
        .unwrap();

        assert_eq!(parsed.protocol.variant, ProtocolVariant::Legacy);
        assert_eq!(parsed.protocol.status_topic, "data/status/kontrol");
        assert_eq!(parsed.verdict.near_field_cm, Some(12.5));
        assert_eq!(parsed.verdict.voice_accept, "MY_YES");
        assert_eq!(parsed.console.idle_refresh(), Duration::from_secs(5));
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = std::env::temp_dir().join(format!("brankas-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.toml");

        let created = Config::load_or_create(&path).unwrap();
        assert!(path.exists());
        let loaded = Config::load_or_create(&path).unwrap();
        assert_eq!(loaded.bus.broker, created.bus.broker);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
