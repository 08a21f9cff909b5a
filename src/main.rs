//! osmon — samples CPU, network and disk usage and forecasts CPU load.
//!
//! Each tick prints one JSON document on stdout:
//! `{"store": {...}, "forecast": {...}, "network_rate": ...}`.
//! Logs go to stderr.
//!
//! Run with:  `RUST_LOG=info osmon`

use anyhow::Result;
use osmon_config::{default_path, load as load_config, ConfigWatcher, MonConfig};
use osmon_pipeline::{Pipeline, TickOutcome};
use osmon_system::SysinfoSampler;
use serde_json::Value;
use std::io::Write;
use std::ops::ControlFlow;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured logging — RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("osmon v{} starting", env!("CARGO_PKG_VERSION"));

    let path = default_path();
    let config = load_config(&path).unwrap_or_else(|e| {
        warn!("{e}; using defaults");
        MonConfig::default()
    });

    let mut config_rx = ConfigWatcher::spawn(&path, config.clone());
    let mut monitor = Monitor::new(config);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let message = tokio::select! {
            _ = monitor.ticker.tick()          => Message::Tick,
            Some(config) = config_rx.recv()    => Message::ConfigReloaded(config),
            _ = &mut ctrl_c                    => Message::Shutdown,
        };

        if monitor.handle(message).is_break() {
            break;
        }
    }

    info!("osmon stopped");
    Ok(())
}

// ── Driver state ──────────────────────────────────────────────────────────────

/// Messages that flow through the driver's event loop.
enum Message {
    /// Interval timer: run one pass of the metric pipeline.
    Tick,
    /// The watcher found a new, valid config on disk.
    ConfigReloaded(MonConfig),
    /// Ctrl-C: stop after the current message.
    Shutdown,
}

/// Owns everything that outlives a single tick.
///
/// The metric history is kept only as the plain JSON structure the pipeline
/// hands back, the same way a remote presentation layer would carry it.
struct Monitor {
    pipeline: Pipeline,
    sampler:  SysinfoSampler,
    ticker:   Interval,
    carried:  Value,
}

impl Monitor {
    fn new(config: MonConfig) -> Self {
        Self {
            pipeline: Pipeline::from_config(&config),
            sampler:  SysinfoSampler::new(&config.sampling.disk_mount),
            ticker:   ticker(&config),
            carried:  Value::Null,
        }
    }

    fn handle(&mut self, message: Message) -> ControlFlow<()> {
        match message {
            Message::Tick => {
                let outcome = self.pipeline.tick_value(&self.carried, &mut self.sampler);
                self.present(&outcome);
                match outcome.store.to_value() {
                    Ok(value) => self.carried = value,
                    Err(e) => warn!("could not carry store to next tick: {e}"),
                }
            }
            Message::ConfigReloaded(config) => self.apply(&config),
            Message::Shutdown => {
                info!("Shutdown requested");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Switch every component to `config`.  The history carried so far is
    /// kept; a smaller capacity trims it on the next tick.
    fn apply(&mut self, config: &MonConfig) {
        info!("Config reloaded");
        self.pipeline = Pipeline::from_config(config);
        self.sampler.set_disk_mount(&config.sampling.disk_mount);
        if self.ticker.period() != config.sampling.interval() {
            info!(interval_ms = config.sampling.interval_ms, "tick interval changed");
            self.ticker = ticker(config);
        }
    }

    /// Hand one tick's result to the presentation layer (stdout, one line).
    fn present(&self, outcome: &TickOutcome) {
        let mut out = std::io::stdout().lock();
        let written = serde_json::to_writer(&mut out, outcome)
            .map_err(std::io::Error::from)
            .and_then(|()| writeln!(out))
            .and_then(|()| out.flush());
        if let Err(e) = written {
            warn!("could not write tick output: {e}");
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn ticker(config: &MonConfig) -> Interval {
    let mut ticker = time::interval(config.sampling.interval());
    // A slow tick pushes the next one back instead of bunching them up.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
