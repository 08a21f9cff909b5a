pub mod schema;
pub mod watcher;

pub use schema::{
    BufferConfig, ForecastConfig, MonConfig, SamplingConfig, DEFAULT_CAPACITY, DEFAULT_HORIZON,
    DEFAULT_INTERVAL_MS, DEFAULT_MIN_HISTORY,
};
pub use watcher::ConfigWatcher;

use osmon_core::{MonError, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file.  Returns `MonConfig::default()` if
/// the file doesn't exist so the monitor always has sensible defaults.
pub fn load(path: impl AsRef<Path>) -> Result<MonConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(MonConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| MonError::Config(format!("cannot read '{}': {e}", path.display())))?;

    let config: MonConfig =
        toml::from_str(&raw).map_err(|e| MonError::Config(format!("TOML parse error: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("osmon").join("osmon.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, MonConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[buffer]\ncapacity = 20\n\n[forecast]\nhorizon = 3").unwrap();

        let config = load(file.path()).unwrap();
        assert_eq!(config.buffer.capacity, 20);
        assert_eq!(config.forecast.horizon, 3);
        assert_eq!(config.forecast.min_history, DEFAULT_MIN_HISTORY);
        assert_eq!(config.sampling.interval_ms, DEFAULT_INTERVAL_MS);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sampling]\ninterval_ms = 0").unwrap();
        assert!(matches!(load(file.path()), Err(MonError::Config(_))));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[buffer\ncapacity = ").unwrap();
        assert!(matches!(load(file.path()), Err(MonError::Config(_))));
    }

    #[test]
    fn default_path_ends_with_app_file() {
        assert!(default_path().ends_with("osmon/osmon.toml"));
    }
}
