use crate::{MonError, Result};
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;

// ── Sample ────────────────────────────────────────────────────────────────────

/// A single observation of one metric.
///
/// Timestamps are whole-second wall-clock labels; sub-second precision is
/// dropped on construction so a sample survives its `"HH:MM:SS"` encoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(with = "time_label")]
    time: NaiveTime,
    value: f64,
}

impl Sample {
    pub fn new(time: NaiveTime, value: f64) -> Self {
        Self {
            time: time.with_nanosecond(0).unwrap_or(time),
            value,
        }
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// The `"HH:MM:SS"` label handed to the presentation layer.
    pub fn label(&self) -> String {
        self.time.format(time_label::FORMAT).to_string()
    }
}

/// Serde adapter for `"HH:MM:SS"` time labels.
pub mod time_label {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M:%S";

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(de::Error::custom)
    }
}

// ── Series ────────────────────────────────────────────────────────────────────

/// Insertion-ordered, bounded history of samples for one metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Series {
    samples: VecDeque<Sample>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new sample, evicting the oldest until at most `capacity` remain.
    pub fn push(&mut self, sample: Sample, capacity: usize) {
        self.samples.push_back(sample);
        self.truncate_front(capacity);
    }

    /// Drop the oldest samples until at most `capacity` remain.
    pub fn truncate_front(&mut self, capacity: usize) {
        let excess = self.samples.len().saturating_sub(capacity);
        self.samples.drain(..excess);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.front()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// The sample values in arrival order.
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(Sample::value).collect()
    }
}

impl FromIterator<Sample> for Series {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

// ── Metric ────────────────────────────────────────────────────────────────────

/// The three tracked metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Processor utilization in percent.
    Cpu,
    /// Cumulative network traffic in megabytes.
    Network,
    /// Filesystem usage in percent.
    Disk,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Cpu, Metric::Network, Metric::Disk];

    /// Key used for this metric in the plain store structure.
    pub fn key(self) -> &'static str {
        match self {
            Metric::Cpu     => "cpu",
            Metric::Network => "network",
            Metric::Disk    => "disk",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ── MetricStore ───────────────────────────────────────────────────────────────

/// History for every metric.
///
/// The store is a plain value: the pipeline takes it in and hands it back on
/// every tick, and its serialized form is what the driver carries between
/// ticks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricStore {
    cpu:     Series,
    network: Series,
    disk:    Series,
}

/// Result of rebuilding a store from a possibly damaged plain structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Restored {
    pub store: MetricStore,
    /// Metrics whose prior series could not be read and were reset to empty.
    pub malformed: Vec<Metric>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn series(&self, metric: Metric) -> &Series {
        match metric {
            Metric::Cpu     => &self.cpu,
            Metric::Network => &self.network,
            Metric::Disk    => &self.disk,
        }
    }

    fn series_mut(&mut self, metric: Metric) -> &mut Series {
        match metric {
            Metric::Cpu     => &mut self.cpu,
            Metric::Network => &mut self.network,
            Metric::Disk    => &mut self.disk,
        }
    }

    /// Append `sample` to `metric`'s series, keeping only the newest
    /// `capacity` entries.
    pub fn append(&mut self, metric: Metric, sample: Sample, capacity: usize) {
        self.series_mut(metric).push(sample, capacity);
    }

    /// Cut every series down to its newest `capacity` entries.
    pub fn truncate(&mut self, capacity: usize) {
        for metric in Metric::ALL {
            let series = self.series_mut(metric);
            if series.len() > capacity {
                tracing::debug!(%metric, len = series.len(), capacity, "trimming oversized series");
                series.truncate_front(capacity);
            }
        }
    }

    /// Encode as the plain `{cpu, network, disk}` structure.
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| MonError::State(format!("encode store: {e}")))
    }

    /// Decode a plain structure, failing if any part of it is malformed.
    pub fn from_value(value: &Value) -> Result<Self> {
        Self::deserialize(value).map_err(|e| MonError::State(format!("decode store: {e}")))
    }

    /// Decode a plain structure metric by metric.
    ///
    /// A missing or `null` entry is an empty series. An entry of the wrong
    /// shape is also reset to empty and reported in [`Restored::malformed`];
    /// the other metrics keep their history.
    pub fn restore(value: &Value) -> Restored {
        let mut restored = Restored::default();

        let map = match value {
            Value::Null => return restored,
            Value::Object(map) => map,
            other => {
                tracing::warn!("prior store is not an object ({other}); starting empty");
                restored.malformed.extend(Metric::ALL);
                return restored;
            }
        };

        for metric in Metric::ALL {
            let Some(raw) = map.get(metric.key()).filter(|v| !v.is_null()) else {
                continue;
            };
            match Series::deserialize(raw) {
                Ok(series) => *restored.store.series_mut(metric) = series,
                Err(e) => {
                    tracing::warn!(%metric, "discarding malformed prior series: {e}");
                    restored.malformed.push(metric);
                }
            }
        }

        restored
    }
}

// ── Forecast ──────────────────────────────────────────────────────────────────

/// Predicted continuation of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Number of future steps predicted.
    pub horizon: usize,
    /// One point per step, labelled at the nominal tick interval.
    pub points: Vec<Sample>,
}

/// Outcome of a forecasting attempt.
///
/// `NoForecast` is a normal steady state (too little history, or a fit that
/// did not produce usable numbers), not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastResult {
    Forecast(Forecast),
    #[default]
    NoForecast,
}

impl ForecastResult {
    pub fn is_forecast(&self) -> bool {
        matches!(self, ForecastResult::Forecast(_))
    }

    /// Forecast points, or an empty slice for `NoForecast`.
    pub fn points(&self) -> &[Sample] {
        match self {
            ForecastResult::Forecast(f) => &f.points,
            ForecastResult::NoForecast  => &[],
        }
    }
}
