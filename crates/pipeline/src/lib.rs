//! The per-tick metric pipeline.
//!
//! [`Pipeline::tick`] is the single synchronous entry point: it takes the
//! previous [`MetricStore`](osmon_core::MetricStore), reads one set of raw
//! metrics, and returns the updated store together with a CPU forecast.
//! Scheduling is left entirely to the caller.

pub mod rate;
pub mod tick;

pub use rate::{NetworkObservation, RateCalculator};
pub use tick::{Pipeline, TickOutcome};
