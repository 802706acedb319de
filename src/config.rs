//! Runtime settings
//!
//! Settings are read from an optional `settings.json` inside the data
//! directory. Every field has a default, so a missing file (or a partial one)
//! is fine. A couple of environment variables override the file.

use crate::error::{WaterflowError, WaterflowResult};
use crate::storage::write_queue::WriteQueueConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overrides the data directory (and therefore where `settings.json` is read from)
pub const DATA_DIR_ENV: &str = "WATERFLOW_DATA_DIR";

/// Overrides `flushDelayMs`
pub const FLUSH_DELAY_ENV: &str = "WATERFLOW_FLUSH_DELAY_MS";

const APP_DIR_NAME: &str = "Waterflow";

/// Upward-drag recognition thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GestureSettings {
    /// Minimum upward travel from the gesture origin, in pixels
    pub upward_threshold_px: i32,
    /// Vertical travel must be at least this multiple of horizontal travel
    pub vertical_ratio: i32,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            upward_threshold_px: 120,
            vertical_ratio: 2,
        }
    }
}

/// Thresholds used by the global hook before a press becomes a gesture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorSettings {
    /// Distance the pointer must travel (while held) before a gesture starts
    pub drag_threshold_px: i32,
    /// A press that has not started a gesture within this window never will
    pub max_gesture_delay_ms: u64,
    /// Minimum spacing between forwarded move signals
    pub move_throttle_ms: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            drag_threshold_px: 15,
            max_gesture_delay_ms: 300,
            move_throttle_ms: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Directory holding the task log; `None` means the platform default
    pub data_dir: Option<PathBuf>,
    pub flush_delay_ms: u64,
    pub flush_retry_attempts: u32,
    pub flush_retry_backoff_ms: u64,
    pub shutdown_timeout_ms: u64,
    pub gesture: GestureSettings,
    pub monitor: MonitorSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            flush_delay_ms: 400,
            flush_retry_attempts: 2,
            flush_retry_backoff_ms: 50,
            shutdown_timeout_ms: 2_000,
            gesture: GestureSettings::default(),
            monitor: MonitorSettings::default(),
        }
    }
}

impl Settings {
    pub const FILE_NAME: &'static str = "settings.json";

    /// Platform local-data directory plus `Waterflow`
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    }

    /// Load settings from the process environment
    pub fn load() -> WaterflowResult<Self> {
        let lookup = |key: &str| std::env::var(key).ok();
        let dir = lookup(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_data_dir);

        let mut settings = Self::load_from(&dir)?;
        settings.apply_env_overrides(lookup)?;
        if settings.data_dir.is_none() {
            settings.data_dir = Some(dir);
        }
        Ok(settings)
    }

    /// Read `settings.json` from `dir`, falling back to defaults when absent
    pub fn load_from(dir: &Path) -> WaterflowResult<Self> {
        let path = dir.join(Self::FILE_NAME);
        if !path.exists() {
            tracing::debug!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let settings: Settings = serde_json::from_str(&content).map_err(|e| {
            WaterflowError::ConfigurationError(format!("Failed to parse {:?}: {}", path, e))
        })?;
        settings.validate()?;

        tracing::info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Apply `WATERFLOW_*` overrides using the given variable lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> WaterflowResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(DATA_DIR_ENV) {
            self.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(raw) = lookup(FLUSH_DELAY_ENV) {
            self.flush_delay_ms = raw.trim().parse().map_err(|_| {
                WaterflowError::ConfigurationError(format!(
                    "{} must be a whole number of milliseconds, got {:?}",
                    FLUSH_DELAY_ENV, raw
                ))
            })?;
        }

        self.validate()
    }

    fn validate(&self) -> WaterflowResult<()> {
        if self.gesture.upward_threshold_px <= 0 {
            return Err(WaterflowError::ConfigurationError(
                "gesture.upwardThresholdPx must be positive".to_string(),
            ));
        }
        if self.gesture.vertical_ratio < 0 {
            return Err(WaterflowError::ConfigurationError(
                "gesture.verticalRatio cannot be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    pub fn write_queue_config(&self) -> WriteQueueConfig {
        WriteQueueConfig {
            flush_delay: Duration::from_millis(self.flush_delay_ms),
            retry_attempts: self.flush_retry_attempts,
            retry_backoff: Duration::from_millis(self.flush_retry_backoff_ms),
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}
