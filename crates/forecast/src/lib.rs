//! Short-horizon CPU forecasting.
//!
//! [`Forecaster::forecast`] never fails: too little history and any numerical
//! trouble both come back as [`ForecastResult::NoForecast`].

pub mod arima;
mod linalg;

pub use arima::{ArimaModel, ArimaOrder};

use chrono::TimeDelta;
use osmon_core::{Forecast, ForecastResult, Sample, Series};
use std::time::Duration;
use thiserror::Error;

/// Model order used for every forecast: five AR terms on first differences.
pub const FORECAST_ORDER: ArimaOrder = ArimaOrder::new(5, 1, 0);

/// Reasons a model could not be fitted or extrapolated.
#[derive(Debug, Error)]
pub enum FitError {
    #[error("need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("non-finite value in data or solution")]
    NonFinite,

    #[error("normal equations are singular")]
    Singular,

    #[error("no stationary autoregressive fit exists for this series")]
    NonStationary,

    #[error("unsupported model order {0:?}")]
    Unsupported(ArimaOrder),

    #[error("tick interval {0:?} cannot be used for forecast labels")]
    Interval(Duration),
}

/// Fits [`FORECAST_ORDER`] to a series and extrapolates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forecaster {
    /// Series length below which no forecast is attempted.
    pub min_history: usize,
    /// Number of future points to emit.
    pub horizon: usize,
    /// Spacing between consecutive forecast labels.
    pub interval: Duration,
}

impl Forecaster {
    pub fn new(min_history: usize, horizon: usize, interval: Duration) -> Self {
        Self {
            min_history,
            horizon,
            interval,
        }
    }

    /// Forecast the continuation of `series`.
    ///
    /// Observations are indexed by position; gaps between their wall-clock
    /// labels are ignored.
    pub fn forecast(&self, series: &Series) -> ForecastResult {
        if series.len() < self.min_history {
            tracing::debug!(
                len = series.len(),
                min_history = self.min_history,
                "not enough history to forecast"
            );
            return ForecastResult::NoForecast;
        }

        match self.try_forecast(series) {
            Ok(forecast) => ForecastResult::Forecast(forecast),
            Err(e) => {
                tracing::warn!("forecast skipped: {e}");
                ForecastResult::NoForecast
            }
        }
    }

    fn try_forecast(&self, series: &Series) -> Result<Forecast, FitError> {
        let last = series
            .last()
            .ok_or(FitError::InsufficientData { needed: 1, got: 0 })?;
        let step =
            TimeDelta::from_std(self.interval).map_err(|_| FitError::Interval(self.interval))?;

        let model = ArimaModel::fit(FORECAST_ORDER, &series.values())?;
        let values = model.forecast(self.horizon)?;

        let mut time = last.time();
        let points = values
            .into_iter()
            .map(|value| {
                // `NaiveTime + TimeDelta` wraps past midnight.
                time = time + step;
                Sample::new(time, value)
            })
            .collect();

        tracing::debug!(coefficients = ?model.coefficients(), sigma2 = model.sigma2(), "forecast ready");

        Ok(Forecast {
            horizon: self.horizon,
            points,
        })
    }
}
