//! `sysinfo`-backed implementation of the [`Sampler`] trait.

use chrono::{Local, Timelike};
use osmon_core::{units::Bytes, MonError, RawReading, Result, Sampler};
use std::path::PathBuf;
use sysinfo::{Disks, Networks, System};

/// Reads CPU, network and disk metrics from the running host.
///
/// CPU usage is measured between consecutive calls, so the first reading
/// after construction covers the interval since [`SysinfoSampler::new`].
pub struct SysinfoSampler {
    sys:        System,
    networks:   Networks,
    disk_mount: PathBuf,
}

impl SysinfoSampler {
    pub fn new(disk_mount: impl Into<PathBuf>) -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_usage();

        Self {
            sys,
            networks: Networks::new_with_refreshed_list(),
            disk_mount: disk_mount.into(),
        }
    }

    /// Point the disk metric at a different mount.
    pub fn set_disk_mount(&mut self, disk_mount: impl Into<PathBuf>) {
        self.disk_mount = disk_mount.into();
    }
}

impl Sampler for SysinfoSampler {
    fn sample(&mut self) -> Result<RawReading> {
        let now = Local::now().time();
        let time = now.with_nanosecond(0).unwrap_or(now);

        // ── CPU ──────────────────────────────────────────────────────────────
        self.sys.refresh_cpu_usage();
        let cpu_percent = cpu_percent(self.sys.global_cpu_usage())?;

        // ── Network ──────────────────────────────────────────────────────────
        // `total_*` are cumulative since boot, unlike `received()` which is a
        // delta since the last refresh.
        self.networks.refresh(true);
        let network_total = Bytes(
            self.networks
                .iter()
                .map(|(_, d)| d.total_received().saturating_add(d.total_transmitted()))
                .fold(0u64, u64::saturating_add),
        );

        // ── Disk ─────────────────────────────────────────────────────────────
        let disks = Disks::new_with_refreshed_list();
        let (total, available) = disks
            .iter()
            .find(|d| d.mount_point() == self.disk_mount.as_path())
            .map(|d| (d.total_space(), d.available_space()))
            .ok_or_else(|| {
                MonError::Sampling(format!("no disk mounted at '{}'", self.disk_mount.display()))
            })?;
        let disk_percent = disk_percent(total, available)?;

        tracing::trace!(cpu_percent, network_total = network_total.0, disk_percent, "sampled");

        Ok(RawReading {
            time,
            cpu_percent,
            network_total,
            disk_percent,
        })
    }
}

/// Validate a raw CPU usage figure and clamp it into `[0, 100]`.
fn cpu_percent(raw: f32) -> Result<f64> {
    if !raw.is_finite() {
        return Err(MonError::Sampling(format!("CPU usage is not a number: {raw}")));
    }
    Ok(f64::from(raw).clamp(0.0, 100.0))
}

/// Used space as a percentage of the filesystem size.
fn disk_percent(total: u64, available: u64) -> Result<f64> {
    if total == 0 {
        return Err(MonError::Sampling("disk reports zero total space".into()));
    }
    let used = total.saturating_sub(available);
    Ok(used as f64 / total as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_percent_clamps_into_range() {
        assert_eq!(cpu_percent(42.5).unwrap(), 42.5);
        assert_eq!(cpu_percent(100.4).unwrap(), 100.0);
        assert_eq!(cpu_percent(-1.0).unwrap(), 0.0);
    }

    #[test]
    fn cpu_percent_rejects_nan() {
        assert!(matches!(cpu_percent(f32::NAN), Err(MonError::Sampling(_))));
    }

    #[test]
    fn disk_percent_of_half_full_disk() {
        assert_eq!(disk_percent(1_000, 500).unwrap(), 50.0);
    }

    #[test]
    fn disk_percent_tolerates_available_above_total() {
        assert_eq!(disk_percent(1_000, 2_000).unwrap(), 0.0);
    }

    #[test]
    fn disk_percent_rejects_empty_disk() {
        assert!(disk_percent(0, 0).is_err());
    }

    #[test]
    fn missing_mount_is_a_sampling_error() {
        let mut sampler = SysinfoSampler::new("/definitely/not/a/mount/point");
        assert!(matches!(sampler.sample(), Err(MonError::Sampling(_))));
    }
}
