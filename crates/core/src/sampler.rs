use crate::{units::Bytes, Result};
use chrono::NaiveTime;

/// One raw reading of every OS metric, taken at a single instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawReading {
    /// Wall-clock time the reading was taken.
    pub time: NaiveTime,
    /// Processor utilization (0.0 – 100.0).
    pub cpu_percent: f64,
    /// Bytes sent + received across all interfaces since boot.
    pub network_total: Bytes,
    /// Usage of the monitored filesystem (0.0 – 100.0).
    pub disk_percent: f64,
}

/// Source of raw OS-metric readings.
///
/// The pipeline calls [`Sampler::sample`] exactly once per tick. Any error is
/// treated as a transient read failure for that tick.
pub trait Sampler {
    fn sample(&mut self) -> Result<RawReading>;
}
