use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_ENV_VAR: &str = "QUERYMIND_LOG";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub connect_delay_ms: u64,
    pub connect_success_rate: f64,
    pub generate_delay_ms: u64,
    /// `None` keeps every history entry. A limit below 1 is raised to 1.
    pub history_limit: Option<usize>,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            connect_delay_ms: 1000,
            connect_success_rate: 0.9,
            generate_delay_ms: 1000,
            history_limit: Some(1000),
            log_filter: "querymind_lib=info".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads `config.json` from `dir`. Missing or unreadable files yield defaults.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Self::default();
        }
        let parsed = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str::<Self>(&content).map_err(|e| e.to_string()));
        match parsed {
            Ok(config) => config.normalized(),
            Err(reason) => {
                tracing::warn!(path = %path.display(), %reason, "ignoring unreadable config");
                Self::default()
            }
        }
    }

    pub fn normalized(mut self) -> Self {
        self.connect_success_rate = if self.connect_success_rate.is_nan() {
            Self::default().connect_success_rate
        } else {
            self.connect_success_rate.clamp(0.0, 1.0)
        };
        self.history_limit = self.history_limit.map(|limit| limit.max(1));
        self
    }

    pub fn connect_delay(&self) -> Duration {
        Duration::from_millis(self.connect_delay_ms)
    }

    pub fn generate_delay(&self) -> Duration {
        Duration::from_millis(self.generate_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(AppConfig::load(dir.path()), AppConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{"connectDelayMs": 10, "connectSuccessRate": 4.0, "historyLimit": null}"#,
        )
        .unwrap();

        let config = AppConfig::load(dir.path());
        assert_eq!(config.connect_delay(), Duration::from_millis(10));
        assert_eq!(config.connect_success_rate, 1.0);
        assert_eq!(config.history_limit, None);
        assert_eq!(config.generate_delay_ms, 1000);
    }

    #[test]
    fn zero_history_limit_keeps_the_newest_entry() {
        let config = AppConfig {
            history_limit: Some(0),
            connect_success_rate: f64::NAN,
            ..AppConfig::default()
        }
        .normalized();
        assert_eq!(config.history_limit, Some(1));
        assert_eq!(config.connect_success_rate, 0.9);
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "connectDelayMs = 5").unwrap();
        assert_eq!(AppConfig::load(dir.path()), AppConfig::default());
    }
}
