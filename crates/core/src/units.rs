//! Named units for network counters.
//!
//! Every byte ↔ megabyte conversion in the workspace goes through this
//! module. A megabyte here is binary: `1 MB = 1024 × 1024 bytes`.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Bytes in one (binary) megabyte.
pub const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// A raw cumulative byte counter as reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Bytes(pub u64);

/// A byte quantity expressed in megabytes.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct Megabytes(pub f64);

/// Throughput in megabytes per second.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct MegabytesPerSecond(pub f64);

impl From<Bytes> for Megabytes {
    fn from(bytes: Bytes) -> Self {
        Megabytes(bytes.0 as f64 / BYTES_PER_MEGABYTE)
    }
}

impl Megabytes {
    /// Average throughput needed to move from `earlier` to `self` in `elapsed`.
    ///
    /// A zero `elapsed` or a counter that moved backwards yields zero.
    #[must_use]
    pub fn rate_since(self, earlier: Megabytes, elapsed: Duration) -> MegabytesPerSecond {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 || self.0 < earlier.0 {
            return MegabytesPerSecond(0.0);
        }
        MegabytesPerSecond((self.0 - earlier.0) / secs)
    }
}

impl fmt::Display for Megabytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} MB", self.0)
    }
}

impl fmt::Display for MegabytesPerSecond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} MB/s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_mebibyte_converts_to_one_megabyte() {
        assert_eq!(Megabytes::from(Bytes(1024 * 1024)), Megabytes(1.0));
    }

    #[test]
    fn zero_bytes_is_zero_megabytes() {
        assert_eq!(Megabytes::from(Bytes(0)), Megabytes(0.0));
    }

    #[test]
    fn rate_divides_by_elapsed_seconds() {
        let rate = Megabytes(1010.0).rate_since(Megabytes(1000.0), Duration::from_secs(2));
        assert_eq!(rate, MegabytesPerSecond(5.0));
    }

    #[test]
    fn backwards_counter_is_zero_rate() {
        let rate = Megabytes(10.0).rate_since(Megabytes(20.0), Duration::from_secs(2));
        assert_eq!(rate, MegabytesPerSecond(0.0));
    }

    #[test]
    fn zero_interval_is_zero_rate() {
        let rate = Megabytes(20.0).rate_since(Megabytes(10.0), Duration::ZERO);
        assert_eq!(rate, MegabytesPerSecond(0.0));
    }

    #[test]
    fn display_formats() {
        assert_eq!(Megabytes(12.345).to_string(), "12.3 MB");
        assert_eq!(MegabytesPerSecond(5.0).to_string(), "5.00 MB/s");
    }
}
