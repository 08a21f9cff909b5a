//! ARIMA(p, d, 0) with a stationary AR part.
//!
//! The series is differenced `d` times and an AR(p) model without intercept
//! is fitted to the differenced values.  The conditional least-squares
//! estimate is used when its inverse roots all lie within
//! [`STATIONARITY_MARGIN`]; otherwise the fit falls back to Yule-Walker
//! estimates, which are stationary by construction.  Forecasts are
//! integrated back to the original level.  A tiny ridge term (relative to
//! the regressor energy) keeps perfectly collinear lags solvable.

use crate::{linalg, FitError};

/// Relative ridge added to the normal-equation diagonal.
const RIDGE: f64 = 1e-10;

/// Largest inverse-root modulus accepted from the least-squares estimate.
pub const STATIONARITY_MARGIN: f64 = 0.99;

/// `(p, d, q)` model order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArimaOrder {
    /// Autoregressive terms.
    pub p: usize,
    /// Differencing passes.
    pub d: usize,
    /// Moving-average terms; only `0` is supported.
    pub q: usize,
}

impl ArimaOrder {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Shortest input `fit` accepts: `p` lags plus at least `p` regression
    /// rows after differencing.
    pub fn min_observations(&self) -> usize {
        self.d + 2 * self.p.max(1)
    }
}

/// A fitted model, ready to forecast from the end of its training data.
#[derive(Debug, Clone, PartialEq)]
pub struct ArimaModel {
    coefficients: Vec<f64>,
    sigma2:       f64,
    /// Last `p` values of the fully differenced series, oldest first.
    lags:         Vec<f64>,
    /// Last value of the series at each differencing level `0..d`.
    levels:       Vec<f64>,
}

impl ArimaModel {
    /// Fit `order` to `data`, treated as evenly spaced observations.
    pub fn fit(order: ArimaOrder, data: &[f64]) -> Result<Self, FitError> {
        if order.q != 0 {
            return Err(FitError::Unsupported(order));
        }
        if data.len() < order.min_observations() {
            return Err(FitError::InsufficientData {
                needed: order.min_observations(),
                got:    data.len(),
            });
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(FitError::NonFinite);
        }

        let mut levels = Vec::with_capacity(order.d);
        let mut series = data.to_vec();
        for _ in 0..order.d {
            // `series` is never empty here thanks to `min_observations`.
            levels.push(series[series.len() - 1]);
            series = difference(&series);
        }

        let p = order.p;
        let coefficients = if p == 0 { Vec::new() } else { estimate(&series, p)? };
        let sigma2 = residual_variance(&series, &coefficients)?;

        let model = Self {
            coefficients,
            sigma2,
            lags: series[series.len() - p..].to_vec(),
            levels,
        };
        tracing::trace!(coefficients = ?model.coefficients, sigma2 = model.sigma2, "fitted ARIMA");
        Ok(model)
    }

    /// AR coefficients `φ₁ … φₚ` (lag 1 first).
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Residual variance of the fit.
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Predict the next `steps` values of the original series.
    pub fn forecast(&self, steps: usize) -> Result<Vec<f64>, FitError> {
        let mut lags = self.lags.clone();
        let mut levels = self.levels.clone();
        let mut out = Vec::with_capacity(steps);

        for _ in 0..steps {
            let mut next: f64 = self
                .coefficients
                .iter()
                .zip(lags.iter().rev())
                .map(|(phi, w)| phi * w)
                .sum();
            if !lags.is_empty() {
                lags.remove(0);
                lags.push(next);
            }
            for level in levels.iter_mut().rev() {
                *level += next;
                next = *level;
            }
            if !next.is_finite() {
                return Err(FitError::NonFinite);
            }
            out.push(next);
        }

        Ok(out)
    }
}

/// Whether every root of `1 − φ₁z − … − φₚzᵖ` lies strictly outside the
/// unit circle, tested by stepping the coefficients down to partial
/// autocorrelations (all of which must satisfy `|r| < 1`).
pub fn is_stationary(phi: &[f64]) -> bool {
    let mut a = phi.to_vec();
    while let Some(&r) = a.last() {
        if r.is_nan() || r.abs() >= 1.0 {
            return false;
        }
        let k = a.len() - 1;
        let denom = 1.0 - r * r;
        a = (0..k).map(|j| (a[j] + r * a[k - 1 - j]) / denom).collect();
    }
    true
}

fn difference(series: &[f64]) -> Vec<f64> {
    series.windows(2).map(|w| w[1] - w[0]).collect()
}

/// AR(p) coefficients for the differenced series `w`.
fn estimate(w: &[f64], p: usize) -> Result<Vec<f64>, FitError> {
    let phi = least_squares(w, p)?;

    // Inverse roots scale with `λ` when `φⱼ` becomes `φⱼ / λʲ`.
    let mut scale = 1.0;
    let scaled: Vec<f64> = phi
        .iter()
        .map(|c| {
            scale /= STATIONARITY_MARGIN;
            c * scale
        })
        .collect();
    if is_stationary(&scaled) {
        return Ok(phi);
    }

    tracing::debug!(least_squares = ?phi, "least-squares fit is not stationary; using Yule-Walker");
    let phi = yule_walker(w, p)?;
    if is_stationary(&phi) {
        Ok(phi)
    } else {
        Err(FitError::NonStationary)
    }
}

/// Conditional least-squares AR(p) fit without intercept.
fn least_squares(w: &[f64], p: usize) -> Result<Vec<f64>, FitError> {
    // Normal equations  (XᵀX) φ = Xᵀy  with  X[t][j] = w[t - 1 - j].
    let mut xtx = vec![0.0; p * p];
    let mut xty = vec![0.0; p];
    for t in p..w.len() {
        for i in 0..p {
            let xi = w[t - 1 - i];
            xty[i] += xi * w[t];
            for j in 0..p {
                xtx[i * p + j] += xi * w[t - 1 - j];
            }
        }
    }

    let trace: f64 = (0..p).map(|i| xtx[i * p + i]).sum();
    if !trace.is_finite() {
        return Err(FitError::NonFinite);
    }

    // No variation at all: the model degenerates to a pure random walk.
    if trace == 0.0 {
        return Ok(vec![0.0; p]);
    }

    let ridge = RIDGE * trace / p as f64;
    for i in 0..p {
        xtx[i * p + i] += ridge;
    }
    linalg::solve(xtx, xty, p)
}

/// Yule-Walker AR(p) fit via the Levinson-Durbin recursion on the biased,
/// zero-mean autocovariances of `w`.
fn yule_walker(w: &[f64], p: usize) -> Result<Vec<f64>, FitError> {
    let n = w.len() as f64;
    let gamma: Vec<f64> = (0..=p)
        .map(|k| w.iter().zip(&w[k..]).map(|(a, b)| a * b).sum::<f64>() / n)
        .collect();
    if gamma.iter().any(|g| !g.is_finite()) {
        return Err(FitError::NonFinite);
    }
    if gamma[0] == 0.0 {
        return Ok(vec![0.0; p]);
    }

    let mut phi: Vec<f64> = Vec::with_capacity(p);
    let mut variance = gamma[0];
    for k in 1..=p {
        let explained: f64 = phi.iter().enumerate().map(|(j, c)| c * gamma[k - 1 - j]).sum();
        let r = (gamma[k] - explained) / variance;
        if r.is_nan() || r.abs() >= 1.0 {
            return Err(FitError::NonStationary);
        }
        let prev = phi.clone();
        for (j, c) in phi.iter_mut().enumerate() {
            *c -= r * prev[k - 2 - j];
        }
        phi.push(r);
        variance *= 1.0 - r * r;
    }

    Ok(phi)
}

fn residual_variance(w: &[f64], phi: &[f64]) -> Result<f64, FitError> {
    let p = phi.len();
    let rows = w.len() - p;
    if rows == 0 {
        return Ok(0.0);
    }
    let ssr: f64 = (p..w.len())
        .map(|t| {
            let fitted: f64 = phi.iter().enumerate().map(|(j, c)| c * w[t - 1 - j]).sum();
            (w[t] - fitted).powi(2)
        })
        .sum();
    let sigma2 = ssr / rows as f64;
    if sigma2.is_finite() {
        Ok(sigma2)
    } else {
        Err(FitError::NonFinite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER: ArimaOrder = ArimaOrder::new(5, 1, 0);

    /// Deterministic pseudo-random noise in `[-0.5, 0.5)`.
    fn noise(len: usize) -> Vec<f64> {
        let mut state: u64 = 0x2545_F491_4F6C_DD1D;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
            })
            .collect()
    }

    #[test]
    fn constant_series_forecasts_the_constant() {
        let model = ArimaModel::fit(ORDER, &[50.0; 60]).unwrap();
        assert!(model.coefficients().iter().all(|&c| c == 0.0));
        let forecast = model.forecast(10).unwrap();
        assert_eq!(forecast.len(), 10);
        assert!(forecast.iter().all(|v| (v - 50.0).abs() < 1e-9));
    }

    #[test]
    fn linear_trend_keeps_rising_without_a_unit_root() {
        let data: Vec<f64> = (0..60u32).map(f64::from).collect();
        let model = ArimaModel::fit(ORDER, &data).unwrap();
        assert!(is_stationary(model.coefficients()));

        let forecast = model.forecast(10).unwrap();
        assert!(forecast[0] > 59.0);
        assert!(forecast.windows(2).all(|w| w[1] > w[0]), "{forecast:?}");
        for (step, value) in forecast.iter().enumerate() {
            assert!(*value <= 60.0 + step as f64 + 1e-6, "step {step}: {value}");
        }
    }

    #[test]
    fn single_spike_does_not_oscillate_forever() {
        let mut data = vec![50.0; 58];
        data.extend([100.0, 50.0]);
        let model = ArimaModel::fit(ORDER, &data).unwrap();
        assert!(is_stationary(model.coefficients()), "{:?}", model.coefficients());

        let forecast = model.forecast(10).unwrap();
        assert!(forecast.iter().all(|v| (50.0..=100.0).contains(v)), "{forecast:?}");
        assert!((forecast[9] - forecast[8]).abs() < 1.0, "{forecast:?}");
    }

    #[test]
    fn alternating_series_swing_decays() {
        let data: Vec<f64> = (0..60).map(|i| if i % 2 == 0 { 0.0 } else { 100.0 }).collect();
        let model = ArimaModel::fit(ORDER, &data).unwrap();
        assert!(is_stationary(model.coefficients()));

        let forecast = model.forecast(10).unwrap();
        let swings: Vec<f64> = forecast.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
        assert!(swings.windows(2).all(|s| s[1] < s[0]), "{forecast:?}");
    }

    #[test]
    fn stationarity_test_matches_known_cases() {
        assert!(is_stationary(&[]));
        assert!(is_stationary(&[0.5]));
        assert!(is_stationary(&[1.2, -0.5]));
        assert!(!is_stationary(&[1.0]));
        assert!(!is_stationary(&[-1.0]));
        assert!(!is_stationary(&[0.5, 0.5]));
        assert!(!is_stationary(&[0.0, 0.0, 0.0, 0.0, 1.1]));
    }

    #[test]
    fn yule_walker_on_a_single_reversal() {
        // Autocorrelation −½ at lag 1 only: φⱼ = −(6 − j) / 6.
        let mut w = vec![0.0; 57];
        w.extend([50.0, -50.0]);
        let phi = yule_walker(&w, 5).unwrap();
        for (j, c) in phi.iter().enumerate() {
            let expected = -(5.0 - j as f64) / 6.0;
            assert!((c - expected).abs() < 1e-9, "phi[{j}] = {c}");
        }
    }

    #[test]
    fn recovers_ar1_coefficient_on_differences() {
        let e = noise(600);
        let mut level = 0.0;
        let mut prev_diff = 0.0;
        let data: Vec<f64> = e
            .iter()
            .map(|&shock| {
                prev_diff = 0.6 * prev_diff + shock;
                level += prev_diff;
                level
            })
            .collect();

        let model = ArimaModel::fit(ORDER, &data).unwrap();
        let phi = model.coefficients();
        assert!((phi[0] - 0.6).abs() < 0.15, "phi1 = {}", phi[0]);
        assert!(phi[1..].iter().all(|c| c.abs() < 0.15), "phi = {phi:?}");
        assert!(model.sigma2() > 0.0);
    }

    #[test]
    fn fit_is_deterministic() {
        let data: Vec<f64> = noise(100).iter().map(|v| 40.0 + 20.0 * v).collect();
        let a = ArimaModel::fit(ORDER, &data).unwrap();
        let b = ArimaModel::fit(ORDER, &data).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.forecast(10).unwrap(), b.forecast(10).unwrap());
    }

    #[test]
    fn second_order_differencing_keeps_a_parabola_rising() {
        let data: Vec<f64> = (0..40u32).map(|t| f64::from(t * t)).collect();
        let forecast = ArimaModel::fit(ArimaOrder::new(2, 2, 0), &data)
            .unwrap()
            .forecast(3)
            .unwrap();
        assert!((forecast[0] - 1600.0).abs() < 16.0, "{forecast:?}");
        assert!(forecast.windows(2).all(|w| w[1] > w[0]), "{forecast:?}");
    }

    #[test]
    fn short_input_is_rejected() {
        let err = ArimaModel::fit(ORDER, &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, FitError::InsufficientData { needed: 11, got: 3 }));
    }

    #[test]
    fn nan_input_is_rejected() {
        let mut data = vec![10.0; 60];
        data[30] = f64::NAN;
        assert!(matches!(ArimaModel::fit(ORDER, &data), Err(FitError::NonFinite)));
    }

    #[test]
    fn moving_average_terms_are_unsupported() {
        let err = ArimaModel::fit(ArimaOrder::new(5, 1, 1), &[1.0; 60]).unwrap_err();
        assert!(matches!(err, FitError::Unsupported(_)));
    }

    #[test]
    fn extreme_outlier_does_not_panic() {
        let mut data: Vec<f64> = noise(80).iter().map(|v| 30.0 + v).collect();
        data[70] = 1e12;
        if let Ok(model) = ArimaModel::fit(ORDER, &data) {
            let _ = model.forecast(10);
        }
    }
}
