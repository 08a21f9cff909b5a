use osmon_core::{
    units::{Bytes, Megabytes, MegabytesPerSecond},
    Series,
};
use std::time::Duration;

/// What the network series learns from one counter reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkObservation {
    /// Cumulative total to store in the network series.
    pub total: Megabytes,
    /// Throughput since the previous stored total.
    pub rate: MegabytesPerSecond,
}

/// Derives throughput from consecutive cumulative network totals.
///
/// The elapsed time is always the configured tick interval, never a
/// measured delta, so the rate is only as accurate as the tick cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateCalculator {
    interval: Duration,
}

impl RateCalculator {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Convert `counter` to megabytes and compare it with the last total
    /// stored in `network`.  An empty series yields a rate of zero.
    pub fn observe(&self, network: &Series, counter: Bytes) -> NetworkObservation {
        let total = Megabytes::from(counter);
        let rate = match network.last() {
            Some(prev) => total.rate_since(Megabytes(prev.value()), self.interval),
            None => MegabytesPerSecond(0.0),
        };
        NetworkObservation { total, rate }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use osmon_core::{units::BYTES_PER_MEGABYTE, Sample};

    fn mb(n: u64) -> Bytes {
        Bytes(n * BYTES_PER_MEGABYTE as u64)
    }

    fn series_with_total(total_mb: f64) -> Series {
        let t = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        std::iter::once(Sample::new(t, total_mb)).collect()
    }

    #[test]
    fn first_reading_has_zero_rate() {
        let calc = RateCalculator::new(Duration::from_secs(2));
        let obs = calc.observe(&Series::new(), mb(1000));
        assert_eq!(obs.total, Megabytes(1000.0));
        assert_eq!(obs.rate, MegabytesPerSecond(0.0));
    }

    #[test]
    fn ten_megabytes_over_two_seconds_is_five_per_second() {
        let calc = RateCalculator::new(Duration::from_secs(2));
        let obs = calc.observe(&series_with_total(1000.0), mb(1010));
        assert_eq!(obs.total, Megabytes(1010.0));
        assert_eq!(obs.rate, MegabytesPerSecond(5.0));
    }

    #[test]
    fn rate_is_difference_over_interval() {
        let calc = RateCalculator::new(Duration::from_millis(500));
        for (a, b) in [(0u64, 0u64), (3, 7), (100, 164), (42, 42)] {
            let obs = calc.observe(&series_with_total(a as f64), mb(b));
            assert_eq!(obs.rate.0, (b - a) as f64 / 0.5, "a = {a}, b = {b}");
        }
    }

    #[test]
    fn counter_reset_is_zero_rate() {
        let calc = RateCalculator::new(Duration::from_secs(2));
        let obs = calc.observe(&series_with_total(5000.0), mb(12));
        assert_eq!(obs.total, Megabytes(12.0));
        assert_eq!(obs.rate, MegabytesPerSecond(0.0));
    }

    #[test]
    fn only_the_last_stored_total_matters() {
        let calc = RateCalculator::new(Duration::from_secs(2));
        let t = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let series: Series = [1.0, 500.0, 1000.0].into_iter().map(|v| Sample::new(t, v)).collect();
        assert_eq!(calc.observe(&series, mb(1004)).rate, MegabytesPerSecond(2.0));
    }
}
