use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::constants::{
    COMPLETION_RATIO, CONTINUE_WATCHING_RATIO, DEFAULT_GUEST_RECORD_LIMIT,
    DEFAULT_REPORT_INTERVAL_SECS, MAX_REPORT_INTERVAL_SECS, MIN_REPORT_INTERVAL_SECS,
};
use crate::utils::SyncError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Progress API root; when unset every subject is served from local storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_retries")]
    pub max_retries: u32,

    /// Upper bound for one remote operation, retries included
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Maximum guest records kept locally; 0 keeps everything
    #[serde(default = "default_guest_limit")]
    pub guest_record_limit: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,

    #[serde(default = "default_completion_ratio")]
    pub completion_ratio: f64,

    #[serde(default = "default_continue_watching_ratio")]
    pub continue_watching_ratio: f64,
}

impl Config {
    /// Load from the default location, writing defaults when no file exists
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!("No config file found, using defaults");
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let contents = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents).context("Failed to write config file")?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if let Some(base_url) = &self.remote.base_url {
            let parsed = url::Url::parse(base_url)
                .map_err(|e| SyncError::Configuration(format!("invalid remote.base_url: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(SyncError::Configuration(format!(
                    "remote.base_url must be http or https, got {}",
                    parsed.scheme()
                )));
            }
        }

        if self.remote.request_timeout_secs == 0 || self.remote.total_timeout_secs == 0 {
            return Err(SyncError::Configuration(
                "remote timeouts must be at least one second".to_string(),
            ));
        }

        for (name, ratio) in [
            ("playback.completion_ratio", self.playback.completion_ratio),
            (
                "playback.continue_watching_ratio",
                self.playback.continue_watching_ratio,
            ),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(SyncError::Configuration(format!(
                    "{name} must be in (0, 1], got {ratio}"
                )));
            }
        }

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("madifa").join("config.toml"))
    }
}

impl RemoteConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn total_timeout(&self) -> Duration {
        Duration::from_secs(self.total_timeout_secs)
    }
}

impl PlaybackConfig {
    /// Reporting cadence, kept within the 5-10 second window
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(
            self.report_interval_secs
                .clamp(MIN_REPORT_INTERVAL_SECS, MAX_REPORT_INTERVAL_SECS),
        )
    }
}

impl StorageConfig {
    pub fn guest_limit(&self) -> Option<u64> {
        (self.guest_record_limit > 0).then_some(self.guest_record_limit)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: default_timeout(),
            max_retries: default_retries(),
            total_timeout_secs: default_total_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            guest_record_limit: default_guest_limit(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: default_report_interval(),
            completion_ratio: default_completion_ratio(),
            continue_watching_ratio: default_continue_watching_ratio(),
        }
    }
}

fn default_timeout() -> u64 {
    5
}
fn default_retries() -> u32 {
    2
}
fn default_total_timeout() -> u64 {
    8
}
fn default_guest_limit() -> u64 {
    DEFAULT_GUEST_RECORD_LIMIT
}
fn default_report_interval() -> u64 {
    DEFAULT_REPORT_INTERVAL_SECS
}
fn default_completion_ratio() -> f64 {
    COMPLETION_RATIO
}
fn default_continue_watching_ratio() -> f64 {
    CONTINUE_WATCHING_RATIO
}
