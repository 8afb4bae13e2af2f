use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Construction-time settings for a [`FileTailer`](crate::FileTailer).
///
/// `poll_interval_ms` is not used by the tailer itself; it's carried here for
/// whatever drives [`FileTailer::update`](crate::FileTailer::update), such as
/// [`TailedLines`](crate::TailedLines).
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct TailConfig {
    /// The file to watch. Must exist when the tailer is constructed.
    pub path: PathBuf,

    /// Number of existing lines to deliver once at startup.
    #[serde(default)]
    pub tail_lines: usize,

    /// How often the driver should poll (in milliseconds).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl TailConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TailConfig {
            path: path.into(),
            tail_lines: 0,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }

    pub fn with_tail_lines(mut self, tail_lines: usize) -> Self {
        self.tail_lines = tail_lines;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    /// Get the poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::Config("path cannot be empty".to_string()));
        }

        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be positive".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config: TailConfig = serde_json::from_str(r#"{"path": "/var/log/nginx/access.log"}"#).unwrap();

        assert_eq!(config, TailConfig::new("/var/log/nginx/access.log"));
        assert_eq!(config.tail_lines, 0);
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_full() {
        let config: TailConfig = serde_json::from_str(
            r#"{"path": "access.log", "tail_lines": 20, "poll_interval_ms": 250}"#,
        )
        .unwrap();

        assert_eq!(
            config,
            TailConfig::new("access.log")
                .with_tail_lines(20)
                .with_poll_interval(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_config_missing_path() {
        assert!(serde_json::from_str::<TailConfig>(r#"{"tail_lines": 3}"#).is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = TailConfig::new("access.log");
        assert!(config.validate().is_ok());

        config.poll_interval_ms = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = TailConfig::new("");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
