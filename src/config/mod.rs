//! Configuration management module.
//!
//! Handles loading and saving application configuration from a JSON file.

use crate::core::error::{MonitorError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const CONFIG_FILE_NAME: &str = "election_monitor_config.json";
const CACHE_FILE_NAME: &str = "cache.json";

/// One election round as addressed by the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundConfig {
    pub label: String,
    /// Election day as `DDMMYYYY`, the path segment of the round's data.
    pub code: String,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_current_round")]
    pub current_round: RoundConfig,
    #[serde(default = "default_previous_round")]
    pub previous_round: RoundConfig,
    /// Days between the two rounds; previous-round slots are shifted by this.
    #[serde(default = "default_round_offset_days")]
    pub round_offset_days: i64,
    #[serde(default = "default_vote_start")]
    pub vote_start: NaiveDateTime,
    #[serde(default = "default_vote_end")]
    pub vote_end: NaiveDateTime,
    #[serde(default = "default_update_minute")]
    pub update_minute: u32,
    #[serde(default = "default_update_second")]
    pub update_second: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub cache_file: String,
    #[serde(default = "default_true")]
    pub auto_refresh: bool,
    #[serde(default = "default_fallback_countries")]
    pub fallback_countries: Vec<String>,
    #[serde(default)]
    pub last_country: String,
    #[serde(skip)]
    pub config_file: String,
}

fn default_true() -> bool {
    true
}

fn default_api_base_url() -> String {
    "https://prezenta.roaep.ro".to_string()
}

fn default_current_round() -> RoundConfig {
    RoundConfig {
        label: "Tur 2".to_string(),
        code: "18052025".to_string(),
    }
}

fn default_previous_round() -> RoundConfig {
    RoundConfig {
        label: "Tur 1".to_string(),
        code: "04052025".to_string(),
    }
}

fn default_round_offset_days() -> i64 {
    14
}

fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .unwrap_or_default()
}

fn default_vote_start() -> NaiveDateTime {
    at(2025, 5, 15, 22)
}

fn default_vote_end() -> NaiveDateTime {
    at(2025, 5, 18, 21)
}

fn default_update_minute() -> u32 {
    1
}

fn default_update_second() -> u32 {
    1
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_request_timeout_secs() -> u64 {
    20
}

fn default_fallback_countries() -> Vec<String> {
    [
        "REGATUL UNIT AL MARII BRITANII ȘI AL IRLANDEI DE NORD",
        "GERMANIA",
        "FRANȚA",
        "ITALIA",
        "SPANIA",
        "REGATUL ȚĂRILOR DE JOS",
        "REPUBLICA MOLDOVA",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            current_round: default_current_round(),
            previous_round: default_previous_round(),
            round_offset_days: default_round_offset_days(),
            vote_start: default_vote_start(),
            vote_end: default_vote_end(),
            update_minute: default_update_minute(),
            update_second: default_update_second(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            cache_file: String::new(),
            auto_refresh: true,
            fallback_countries: default_fallback_countries(),
            last_country: String::new(),
            config_file: String::new(),
        }
    }
}

impl Config {
    pub fn cache_path(&self) -> PathBuf {
        PathBuf::from(&self.cache_file)
    }
}

/// Check a config for values the monitor cannot work with.
pub fn validate(config: &Config) -> Result<()> {
    let mut issues: Vec<String> = Vec::new();

    if !(config.api_base_url.starts_with("http://") || config.api_base_url.starts_with("https://")) {
        issues.push("api_base_url must be an http(s) URL".into());
    }
    for (name, round) in [
        ("current_round", &config.current_round),
        ("previous_round", &config.previous_round),
    ] {
        if round.code.len() != 8 || !round.code.chars().all(|c| c.is_ascii_digit()) {
            issues.push(format!("{name}.code must be a DDMMYYYY date"));
        }
    }
    if config.round_offset_days <= 0 {
        issues.push("round_offset_days must be > 0".into());
    }
    if config.vote_end <= config.vote_start {
        issues.push("vote_end must be after vote_start".into());
    }
    if config.update_minute >= 60 {
        issues.push("update_minute must be < 60".into());
    }
    if config.update_second >= 60 {
        issues.push("update_second must be < 60".into());
    }
    if config.request_timeout_secs == 0 {
        issues.push("request_timeout_secs must be > 0".into());
    }
    if config.cache_file.trim().is_empty() {
        issues.push("cache_file must not be empty".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(MonitorError::Config(issues.join("; ")))
    }
}

/// Configuration manager for loading/saving config.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config_path: Self::data_directory().join(CONFIG_FILE_NAME),
        }
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Platform config directory, or the working directory if unavailable.
    fn data_directory() -> PathBuf {
        directories::ProjectDirs::from("ro", "electionmonitor", "election-monitor")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn get_config_file_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from file, falling back to defaults.
    pub fn load(&self) -> Config {
        let mut config = self.try_load().unwrap_or_default();

        config.config_file = self.config_path.to_string_lossy().into_owned();

        if config.cache_file.trim().is_empty() {
            let dir = self
                .config_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            config.cache_file = dir.join(CACHE_FILE_NAME).to_string_lossy().into_owned();
        }
        if config.fallback_countries.is_empty() {
            config.fallback_countries = default_fallback_countries();
        }

        config
    }

    fn try_load(&self) -> Option<Config> {
        if !self.config_path.exists() {
            info!(path = %self.config_path.display(), "no config file, using defaults");
            return None;
        }

        let content = fs::read_to_string(&self.config_path).ok()?;
        match serde_json::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(path = %self.config_path.display(), error = %e, "config file unreadable, using defaults");
                None
            }
        }
    }

    /// Save configuration to file.
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(dir) = self.config_path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_path, json)?;
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("election-monitor-{}", uuid::Uuid::new_v4()))
            .join(CONFIG_FILE_NAME)
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.auto_refresh);
        assert_eq!(config.round_offset_days, 14);
        assert_eq!(config.current_round.code, "18052025");
        assert_eq!(config.fallback_countries.len(), 7);
    }

    #[test]
    fn test_partial_file_gets_defaults() {
        let parsed: Config = serde_json::from_str(r#"{ "auto_refresh": false }"#).unwrap();
        assert!(!parsed.auto_refresh);
        assert_eq!(parsed.api_base_url, "https://prezenta.roaep.ro");
        assert_eq!(parsed.vote_start, default_vote_start());
    }

    #[test]
    fn test_load_fills_cache_path_next_to_config() {
        let path = temp_path();
        let manager = ConfigManager::with_path(&path);
        let config = manager.load();
        assert_eq!(
            PathBuf::from(&config.cache_file),
            path.parent().unwrap().join(CACHE_FILE_NAME)
        );
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_save_and_reload() {
        let path = temp_path();
        let manager = ConfigManager::with_path(&path);
        let mut config = manager.load();
        config.last_country = "ITALIA".to_string();
        config.auto_refresh = false;
        manager.save(&config).unwrap();

        let reloaded = manager.load();
        assert_eq!(reloaded.last_country, "ITALIA");
        assert!(!reloaded.auto_refresh);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_validate_collects_issues() {
        let mut config = Config::default();
        config.cache_file = "cache.json".to_string();
        config.api_base_url = "ftp://nope".to_string();
        config.vote_end = config.vote_start;
        config.update_minute = 75;

        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("api_base_url"));
        assert!(err.contains("vote_end"));
        assert!(err.contains("update_minute"));
    }
}
