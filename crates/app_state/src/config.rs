//! Success List configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Success List configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the persisted state files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Days a completed task is kept before the startup sweep drops it
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("success-list")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_retention_days() -> u32 {
    task_store::RETENTION_DAYS as u32
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            retention_days: default_retention_days(),
        }
    }
}

impl Config {
    /// Load configuration from an optional config file and the environment.
    ///
    /// Environment variables take precedence over the file.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let mut config = match Self::find_config_file() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading config file");
                Self::from_toml_str(&std::fs::read_to_string(&path)?)?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a config file body. Missing fields take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply `SUCCESS_LIST_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("SUCCESS_LIST_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }

        if let Some(level) = lookup("SUCCESS_LIST_LOG_LEVEL") {
            self.log_level = level;
        }

        if let Some(days) = lookup("SUCCESS_LIST_RETENTION_DAYS") {
            match days.trim().parse() {
                Ok(days) => self.retention_days = days,
                Err(_) => tracing::warn!(value = %days, "Ignoring invalid SUCCESS_LIST_RETENTION_DAYS"),
            }
        }
    }

    /// Retention period as a duration.
    pub fn retention_period(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.retention_days))
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut locations = vec![PathBuf::from("success-list.toml")];
        if let Some(dir) = dirs::config_dir() {
            locations.push(dir.join("success-list").join("config.toml"));
        }

        locations.into_iter().find(|p| p.exists())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.retention_days, 7);
        assert!(config.data_dir.ends_with("success-list"));
        assert_eq!(config.retention_period(), chrono::Duration::days(7));
    }

    #[test]
    fn test_from_toml_partial() {
        let config = Config::from_toml_str("retention_days = 14\n").unwrap();
        assert_eq!(config.retention_days, 14);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_from_toml_full() {
        let config = Config::from_toml_str(
            r#"
            data_dir = "/var/lib/success-list"
            log_level = "debug"
            retention_days = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/success-list"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.retention_days, 3);
    }

    #[test]
    fn test_from_toml_invalid() {
        let result = Config::from_toml_str("retention_days = \"soon\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SUCCESS_LIST_DATA_DIR", "/tmp/sl"),
            ("SUCCESS_LIST_LOG_LEVEL", "trace"),
            ("SUCCESS_LIST_RETENTION_DAYS", "30"),
        ]);
        let mut config = Config::default();

        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.data_dir, PathBuf::from("/tmp/sl"));
        assert_eq!(config.log_level, "trace");
        assert_eq!(config.retention_days, 30);
    }

    #[test]
    fn test_invalid_retention_override_is_ignored() {
        let mut config = Config::from_toml_str("retention_days = 10").unwrap();

        config.apply_overrides(|key| {
            (key == "SUCCESS_LIST_RETENTION_DAYS").then(|| "-1".to_string())
        });

        assert_eq!(config.retention_days, 10);
    }
}
