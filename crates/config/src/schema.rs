use osmon_core::{MonError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Nominal tick period (milliseconds).
pub const DEFAULT_INTERVAL_MS: u64 = 2_000;
/// Samples retained per metric.
pub const DEFAULT_CAPACITY: usize = 100;
/// Minimum CPU history before a forecast is attempted.
pub const DEFAULT_MIN_HISTORY: usize = 50;
/// Number of forecast steps.
pub const DEFAULT_HORIZON: usize = 10;

/// Root configuration structure parsed from `osmon.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonConfig {
    /// How and how often metrics are read.
    pub sampling: SamplingConfig,
    /// History retention.
    pub buffer: BufferConfig,
    /// CPU forecast settings.
    pub forecast: ForecastConfig,
}

impl MonConfig {
    /// Reject values that would make the pipeline meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.sampling.interval_ms == 0 {
            return Err(MonError::Config("sampling.interval_ms must be > 0".into()));
        }
        if self.buffer.capacity == 0 {
            return Err(MonError::Config("buffer.capacity must be > 0".into()));
        }
        if self.forecast.horizon == 0 {
            return Err(MonError::Config("forecast.horizon must be > 0".into()));
        }
        if self.forecast.min_history > self.buffer.capacity {
            tracing::warn!(
                "forecast.min_history ({}) exceeds buffer.capacity ({}); forecasts will never run",
                self.forecast.min_history,
                self.buffer.capacity,
            );
        }
        Ok(())
    }
}

/// Sampler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Tick period in milliseconds; also the elapsed time used for rates.
    pub interval_ms: u64,
    /// Mount point whose usage is reported as the disk metric.
    pub disk_mount: String,
}

impl SamplingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            disk_mount:  "/".to_string(),
        }
    }
}

/// Bounded history settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Maximum samples kept per metric; oldest are evicted first.
    pub capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Forecaster settings.  The model order itself is fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Series length below which no forecast is produced.
    pub min_history: usize,
    /// Number of future points to predict.
    pub horizon: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            min_history: DEFAULT_MIN_HISTORY,
            horizon:     DEFAULT_HORIZON,
        }
    }
}
