//! Startup configuration
//!
//! Read once at startup; tracking toggles made while running are never
//! written back.

use crate::actuator::{AllowList, DEFAULT_ALLOW_LIST};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Time between two focus samples
    pub poll_interval_ms: u64,
    /// Refresh the running application list every N polls
    pub app_list_every: u32,
    /// Names never suspended or resumed
    pub allow_list: Vec<String>,
    /// Names tracked from the start
    pub tracked: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            app_list_every: 4,
            allow_list: DEFAULT_ALLOW_LIST.iter().map(|s| s.to_string()).collect(),
            tracked: Vec::new(),
        }
    }
}

impl Config {
    /// Load from `path`, falling back to defaults if the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default location
    pub fn load_default() -> Result<Self> {
        Self::load(crate::config_path())
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.app_list_every == 0 {
            return Err(ConfigError::Invalid(
                "app_list_every must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn allow(&self) -> AllowList {
        AllowList::new(self.allow_list.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppName;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path().join("config.json")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert!(config.allow().contains(&AppName::from("Terminal")));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "poll_interval_ms": 1000, "tracked": ["Slack"] }"#).unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.tracked, vec!["Slack".to_string()]);
        assert_eq!(config.app_list_every, 4);
    }

    #[test]
    fn test_full_file_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config {
            allow_list: vec!["kitty".to_string()],
            ..Config::default()
        };

        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "poll_interval_ms": 0 }"#).unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }
}
