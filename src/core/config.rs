// Configuration Management for the Fraud Monitor

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

// ============================================================================
// Configuration Structures
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// WebSocket endpoint of the realtime monitor feed.
    pub endpoint: String,

    // Reconnection settings
    pub max_reconnect_attempts: u32,
    pub reconnect_max_delay_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:8000/ws/realtime-monitor".to_string(),
            max_reconnect_attempts: 5,
            reconnect_max_delay_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub transaction_window_cap: usize,
    pub alert_feed_cap: usize,
    pub notice_window_cap: usize,
    /// Ring the terminal bell on alerts instead of only logging them.
    pub bell_on_alert: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transaction_window_cap: 50,
            alert_feed_cap: 20,
            notice_window_cap: 10,
            bell_on_alert: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl MonitorConfig {
    /// Load configuration from a JSON file, then validate it.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config: MonitorConfig = serde_json::from_str(&contents)?;
        config.validate()?;

        info!(path = %path.as_ref().display(), "Configuration loaded");
        Ok(config)
    }

    /// Validate all settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.endpoint.is_empty() {
            return Err(ConfigError::Validation("feed.endpoint must not be empty".into()));
        }
        if !self.feed.endpoint.starts_with("ws://") && !self.feed.endpoint.starts_with("wss://") {
            return Err(ConfigError::Validation(format!(
                "feed.endpoint must be a ws:// or wss:// URL, got '{}'",
                self.feed.endpoint
            )));
        }
        if self.session.transaction_window_cap == 0 {
            return Err(ConfigError::Validation(
                "session.transaction_window_cap must be at least 1".into(),
            ));
        }
        if self.session.alert_feed_cap == 0 {
            return Err(ConfigError::Validation(
                "session.alert_feed_cap must be at least 1".into(),
            ));
        }
        if self.session.notice_window_cap == 0 {
            return Err(ConfigError::Validation(
                "session.notice_window_cap must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.transaction_window_cap, 50);
        assert_eq!(config.session.alert_feed_cap, 20);
    }

    #[test]
    fn test_validation_rejects_bad_endpoint() {
        let mut config = MonitorConfig::default();
        config.feed.endpoint = "http://example.com".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        config.feed.endpoint = String::new();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validation_rejects_zero_caps() {
        let mut config = MonitorConfig::default();
        config.session.alert_feed_cap = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"feed":{{"endpoint":"wss://monitor.example/ws","max_reconnect_attempts":3,"reconnect_max_delay_secs":30}}}}"#
        )
        .unwrap();

        let config = MonitorConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.feed.endpoint, "wss://monitor.example/ws");
        assert_eq!(config.feed.max_reconnect_attempts, 3);
        // Session section omitted in the file, defaults apply
        assert_eq!(config.session.transaction_window_cap, 50);
    }

    #[test]
    fn test_load_from_file_rejects_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            MonitorConfig::load_from_file(file.path()),
            Err(ConfigError::Json(_))
        ));
    }
}
