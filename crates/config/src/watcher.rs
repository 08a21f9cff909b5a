use crate::{load, MonConfig};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Watches the config file and delivers each new, valid [`MonConfig`].
///
/// The file's directory is watched rather than the file itself, so a config
/// created after startup, or replaced by an editor's rename-on-save, is still
/// picked up.  Writes that fail to parse or validate are logged and skipped;
/// the driver keeps running on the last good config.
///
/// # Example
/// ```no_run
/// # async fn demo() {
/// use osmon_config::{ConfigWatcher, MonConfig};
///
/// let mut rx = ConfigWatcher::spawn("/home/user/.config/osmon/osmon.toml", MonConfig::default());
/// while let Some(config) = rx.recv().await {
///     println!("now sampling every {} ms", config.sampling.interval_ms);
/// }
/// # }
/// ```
pub struct ConfigWatcher;

impl ConfigWatcher {
    /// Spawn a filesystem watcher for `path`, starting from `current`.
    ///
    /// The receiver yields a config only when it differs from the last one
    /// delivered.  Must be called from within a Tokio runtime.
    pub fn spawn(path: impl AsRef<Path>, current: MonConfig) -> mpsc::Receiver<MonConfig> {
        let (tx, rx) = mpsc::channel(1);
        let reloader = Reloader::new(path.as_ref().to_path_buf(), current);

        tokio::spawn(watch_loop(reloader, tx));

        rx
    }
}

// ── Reload step ───────────────────────────────────────────────────────────────

/// Re-reads the config file and remembers the last config it handed out.
#[derive(Debug)]
struct Reloader {
    path:    PathBuf,
    current: MonConfig,
}

impl Reloader {
    fn new(path: PathBuf, current: MonConfig) -> Self {
        Self { path, current }
    }

    /// The file name events are matched against.
    fn file_name(&self) -> Option<OsString> {
        self.path.file_name().map(ToOwned::to_owned)
    }

    /// Load the file again.  Returns the new config only if it is valid and
    /// different from the one currently in effect.
    fn reload(&mut self) -> Option<MonConfig> {
        match load(&self.path) {
            Ok(config) if config == self.current => None,
            Ok(config) => {
                info!(path = %self.path.display(), "config changed");
                self.current = config.clone();
                Some(config)
            }
            Err(e) => {
                warn!("ignoring config change: {e}");
                None
            }
        }
    }
}

// ── Watch loop ────────────────────────────────────────────────────────────────

async fn watch_loop(mut reloader: Reloader, tx: mpsc::Sender<MonConfig>) {
    use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
    use std::time::Duration;

    let (Some(dir), Some(name)) = (reloader.path.parent(), reloader.file_name()) else {
        info!("Config path '{}' has no directory; live reload disabled", reloader.path.display());
        return;
    };
    let dir = dir.to_path_buf();
    if !dir.is_dir() {
        info!("No config directory at '{}'; live reload disabled", dir.display());
        return;
    }

    let (sync_tx, mut sync_rx) = mpsc::channel::<notify::Result<Event>>(16);

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = sync_tx.blocking_send(res);
        },
        Config::default().with_poll_interval(Duration::from_secs(2)),
    ) {
        Ok(w) => w,
        Err(e) => {
            error!("Failed to create filesystem watcher: {e}");
            return;
        }
    };

    if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
        error!("Failed to watch '{}': {e}", dir.display());
        return;
    }

    info!("Watching config file: {}", reloader.path.display());

    while let Some(event) = sync_rx.recv().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                warn!("Watcher error: {e}");
                continue;
            }
        };

        let touches_config = event.paths.iter().any(|p| p.file_name() == Some(name.as_os_str()));
        if !touches_config || !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            continue;
        }

        if let Some(config) = reloader.reload() {
            if tx.send(config).await.is_err() {
                break; // receiver dropped
            }
        }
    }
}
