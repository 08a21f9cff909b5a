use crate::rate::RateCalculator;
use osmon_config::MonConfig;
use osmon_core::{
    units::MegabytesPerSecond, ForecastResult, Metric, MetricStore, MonError, RawReading, Result,
    Sample, Sampler,
};
use osmon_forecast::Forecaster;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Everything one tick hands to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickOutcome {
    /// Updated history; the caller passes it back in on the next tick.
    pub store: MetricStore,
    /// CPU forecast for this tick.
    pub forecast: ForecastResult,
    /// Network throughput since the previous tick, `None` if sampling failed.
    pub network_rate: Option<MegabytesPerSecond>,
    /// Metrics whose prior history was malformed and restarted empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reset: Vec<Metric>,
}

impl TickOutcome {
    /// Outcome of a tick whose sampling step failed: history is preserved
    /// exactly and no forecast is offered.
    fn unchanged(store: MetricStore) -> Self {
        Self {
            store,
            forecast: ForecastResult::NoForecast,
            network_rate: None,
            reset: Vec::new(),
        }
    }
}

/// Stateless tick handler.
///
/// A `Pipeline` holds only configuration; all history lives in the
/// [`MetricStore`] threaded through [`Pipeline::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    capacity:   usize,
    rate:       RateCalculator,
    forecaster: Forecaster,
}

impl Pipeline {
    pub fn new(capacity: usize, rate: RateCalculator, forecaster: Forecaster) -> Self {
        Self {
            capacity,
            rate,
            forecaster,
        }
    }

    pub fn from_config(config: &MonConfig) -> Self {
        let interval = config.sampling.interval();
        Self::new(
            config.buffer.capacity,
            RateCalculator::new(interval),
            Forecaster::new(config.forecast.min_history, config.forecast.horizon, interval),
        )
    }

    /// Run one tick against a typed store.
    ///
    /// A prior store longer than the configured capacity is first cut to its
    /// newest entries.  If the sampler then fails, or returns values that
    /// cannot be stored, that store is returned with
    /// [`ForecastResult::NoForecast`].
    pub fn tick<S: Sampler + ?Sized>(&self, mut store: MetricStore, sampler: &mut S) -> TickOutcome {
        let span = tracing::debug_span!("tick");
        let _enter = span.enter();

        store.truncate(self.capacity);

        let reading = match sampler.sample().and_then(validate) {
            Ok(reading) => reading,
            Err(e) => {
                warn!("keeping last-known metrics: {e}");
                return TickOutcome::unchanged(store);
            }
        };

        let network = self.rate.observe(store.series(Metric::Network), reading.network_total);

        store.append(Metric::Cpu, Sample::new(reading.time, reading.cpu_percent), self.capacity);
        store.append(Metric::Disk, Sample::new(reading.time, reading.disk_percent), self.capacity);
        store.append(Metric::Network, Sample::new(reading.time, network.total.0), self.capacity);

        debug!(
            cpu = reading.cpu_percent,
            disk = reading.disk_percent,
            network_total = %network.total,
            network_rate = %network.rate,
            "metrics appended"
        );

        let forecast = self.forecaster.forecast(store.series(Metric::Cpu));

        TickOutcome {
            store,
            forecast,
            network_rate: Some(network.rate),
            reset: Vec::new(),
        }
    }

    /// Run one tick against the plain structure a driver carries between
    /// ticks.  Each metric's prior series is decoded independently; a
    /// malformed one restarts empty without affecting the others.
    pub fn tick_value<S: Sampler + ?Sized>(&self, prior: &Value, sampler: &mut S) -> TickOutcome {
        let restored = MetricStore::restore(prior);
        let mut outcome = self.tick(restored.store, sampler);
        outcome.reset = restored.malformed;
        outcome
    }
}

/// Reject readings that would poison the history.
fn validate(reading: RawReading) -> Result<RawReading> {
    if !reading.cpu_percent.is_finite() {
        return Err(MonError::Sampling(format!("CPU reading {}", reading.cpu_percent)));
    }
    if !reading.disk_percent.is_finite() {
        return Err(MonError::Sampling(format!("disk reading {}", reading.disk_percent)));
    }
    Ok(reading)
}
