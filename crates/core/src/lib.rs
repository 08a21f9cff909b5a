pub mod error;
pub mod sampler;
pub mod state;
pub mod units;

pub use error::{MonError, Result};
pub use sampler::{RawReading, Sampler};
pub use state::{Forecast, ForecastResult, Metric, MetricStore, Restored, Sample, Series};
