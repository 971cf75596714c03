//! User configuration from `~/.tidyup/config.yaml` plus environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::tidyup_dir_at;
use crate::error::{io_err, CoreError};

pub const CONFIG_FILE: &str = "config.yaml";
pub const ENV_REMOTE_URL: &str = "TIDYUP_REMOTE_URL";
pub const ENV_POLL_INTERVAL: &str = "TIDYUP_POLL_INTERVAL_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the remote store. `None` runs fully offline.
    pub remote_url: Option<String>,
    pub poll_interval_secs: u64,
    pub reminder_lead_mins: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_url: None,
            poll_interval_secs: 5,
            reminder_lead_mins: 60,
        }
    }
}

impl Config {
    /// Never zero; a zero interval would spin the poll loop.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    /// Capped at one week; a longer lead would always lie in the past.
    pub fn reminder_lead(&self) -> chrono::Duration {
        const WEEK_MINS: u64 = 7 * 24 * 60;
        chrono::Duration::minutes(self.reminder_lead_mins.min(WEEK_MINS) as i64)
    }
}

/// `<home>/.tidyup/config.yaml`, pure.
pub fn config_path_at(home: &Path) -> PathBuf {
    tidyup_dir_at(home).join(CONFIG_FILE)
}

/// Load `config.yaml`; a missing file is the default config.
pub fn load_config_at(home: &Path) -> Result<Config, CoreError> {
    let path = config_path_at(home);
    let contents = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => return Err(io_err(&path, e)),
    };
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| CoreError::Parse { path, source: e })
}

/// File config with process environment overrides applied.
pub fn load_config() -> Result<Config, CoreError> {
    let config = load_config_at(&crate::cache::home()?)?;
    apply_env(config, |name| std::env::var(name).ok())
}

/// Overlay `TIDYUP_*` variables read through `lookup`. Empty values are ignored.
pub fn apply_env(
    mut config: Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config, CoreError> {
    if let Some(url) = lookup(ENV_REMOTE_URL).filter(|v| !v.trim().is_empty()) {
        config.remote_url = Some(url.trim().to_string());
    }
    if let Some(raw) = lookup(ENV_POLL_INTERVAL).filter(|v| !v.trim().is_empty()) {
        config.poll_interval_secs = raw.trim().parse().map_err(|_| CoreError::InvalidEnv {
            name: ENV_POLL_INTERVAL.to_string(),
            value: raw.clone(),
        })?;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn missing_file_is_default() {
        let home = TempDir::new().unwrap();
        assert_eq!(load_config_at(home.path()).unwrap(), Config::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let home = TempDir::new().unwrap();
        std::fs::create_dir_all(tidyup_dir_at(home.path())).unwrap();
        std::fs::write(
            config_path_at(home.path()),
            "remote_url: http://localhost:8000\n",
        )
        .unwrap();
        let config = load_config_at(home.path()).unwrap();
        assert_eq!(config.remote_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.reminder_lead(), chrono::Duration::minutes(60));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let home = TempDir::new().unwrap();
        std::fs::create_dir_all(tidyup_dir_at(home.path())).unwrap();
        std::fs::write(config_path_at(home.path()), "poll_interval_secs: [oops\n").unwrap();
        let err = load_config_at(home.path()).unwrap_err();
        assert!(matches!(err, CoreError::Parse { .. }));
    }

    #[test]
    fn env_overrides_file_values() {
        let config = apply_env(
            Config::default(),
            env(&[(ENV_REMOTE_URL, " http://h:1 "), (ENV_POLL_INTERVAL, "30")]),
        )
        .unwrap();
        assert_eq!(config.remote_url.as_deref(), Some("http://h:1"));
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn invalid_env_is_rejected() {
        let err = apply_env(Config::default(), env(&[(ENV_POLL_INTERVAL, "soon")])).unwrap_err();
        assert!(matches!(err, CoreError::InvalidEnv { .. }));
    }

    #[test]
    fn zero_poll_interval_is_raised_to_one_second() {
        let config = Config {
            poll_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }
}
