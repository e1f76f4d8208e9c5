//! Queue Configuration Module
//!
//! Provides configuration structures and TOML parsing for memory-bounded
//! queues.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::queue::error::{QueueError, QueueResult};
use crate::queue::wait_strategy::{WaitStrategy, WakePolicy};

/// Main queue configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Transport capacity (number of elements)
    pub capacity: usize,

    /// Byte quota across all buffered elements
    pub max_size: i64,

    /// Waiters woken per release
    pub wake_policy: WakePolicy,

    /// Producer wait configuration
    pub wait: WaitConfig,

    /// Debug logging configuration
    pub debug: DebugConfig,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 10000,
            max_size: 100 * 1024 * 1024, // 100MB
            wake_policy: WakePolicy::Signal,
            wait: WaitConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl QueueConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> QueueResult<()> {
        if self.max_size < 0 {
            return Err(QueueError::InvalidQuota { max_size: self.max_size });
        }
        self.wait.to_wait_strategy()?;
        let threshold = self.debug.pressure_warning_percent;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(QueueError::invalid_configuration(format!(
                "pressure_warning_percent must be between 0.0 and 100.0 (got {})",
                threshold
            )));
        }
        Ok(())
    }
}

/// Serializable wait strategy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    pub strategy: String,

    /// Sleep between re-checks once spinning is exhausted (spin only)
    pub idle_sleep_us: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            strategy: "monitor".to_string(),
            idle_sleep_us: 0,
        }
    }
}

impl WaitConfig {
    /// Convert to a WaitStrategy
    pub fn to_wait_strategy(&self) -> QueueResult<WaitStrategy> {
        match self.strategy.to_lowercase().as_str() {
            "monitor" => Ok(WaitStrategy::Monitor),
            "spin" => Ok(WaitStrategy::Spin {
                idle_sleep: Duration::from_micros(self.idle_sleep_us),
            }),
            other => Err(QueueError::invalid_configuration(format!(
                "unknown wait strategy '{}'. Valid options: monitor, spin",
                other
            ))),
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log memory pressure crossings
    pub enabled: bool,

    /// Usage percentage above which pushes log a pressure message
    pub pressure_warning_percent: f64,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            pressure_warning_percent: 80.0,
        }
    }
}

/// Queue configuration preset
#[derive(Debug, Clone, Copy)]
pub enum QueuePreset {
    /// Small queue for development/testing
    Development,
    /// Balanced configuration for normal use
    Balanced,
    /// Large queue for high-throughput scenarios
    HighThroughput,
    /// Memory-constrained configuration
    LowMemory,
}

impl QueuePreset {
    /// Get queue configuration for this preset
    pub fn config(self) -> QueueConfig {
        match self {
            QueuePreset::Development => QueueConfig {
                capacity: 1000,
                max_size: 10 * 1024 * 1024, // 10MB
                debug: DebugConfig {
                    enabled: true,
                    ..Default::default()
                },
                ..Default::default()
            },

            QueuePreset::Balanced => QueueConfig::default(),

            QueuePreset::HighThroughput => QueueConfig {
                capacity: 50000,
                max_size: 500 * 1024 * 1024, // 500MB
                ..Default::default()
            },

            QueuePreset::LowMemory => QueueConfig {
                capacity: 5000,
                max_size: 50 * 1024 * 1024, // 50MB
                wake_policy: WakePolicy::Broadcast,
                debug: DebugConfig {
                    enabled: true,
                    pressure_warning_percent: 70.0,
                },
                ..Default::default()
            },
        }
    }
}

/// Load queue configuration from TOML string
pub fn load_queue_config(toml_str: &str) -> Result<QueueConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Save queue configuration to TOML string
pub fn save_queue_config(config: &QueueConfig) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(config)
}

/// Load and validate queue configuration from a TOML file
pub fn load_queue_config_file(path: &Path) -> Result<QueueConfig> {
    debug!("Loading queue configuration from file: {}", path.display());

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read queue config file: {}", path.display()))?;

    let config = load_queue_config(&content)
        .with_context(|| format!("Failed to parse queue config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("Invalid queue config in: {}", path.display()))?;

    Ok(config)
}
