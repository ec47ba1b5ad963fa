use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::ConfigError;

pub const TOKEN_ENV: &str = "TELEGRAM_TOKEN";
pub const CHAT_ID_ENV: &str = "TELEGRAM_CHAT_ID";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_interval")]
    pub scan_interval_secs: u64,
    #[serde(default = "default_state_file")]
    pub state_file: String,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_url() -> String {
    "https://app.dataannotation.tech/workers/projects".to_string()
}

fn default_interval() -> u64 {
    300
}

fn default_state_file() -> String {
    "seen_projects.json".to_string()
}

fn default_fetch_timeout() -> u64 {
    20
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: default_url(),
            scan_interval_secs: default_interval(),
            state_file: default_state_file(),
            fetch_timeout_secs: default_fetch_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Invalid("url must not be empty".into()));
        }
        if self.scan_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "scan_interval_secs must be greater than zero".into(),
            ));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "fetch_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.state_file.trim().is_empty() {
            return Err(ConfigError::Invalid("state_file must not be empty".into()));
        }
        Ok(())
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl TelegramConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingEnv(key))
        };
        Ok(Self {
            bot_token: require(TOKEN_ENV)?,
            chat_id: require(CHAT_ID_ENV)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.scan_interval_secs, 300);
        assert_eq!(config.state_file, "seen_projects.json");
        assert_eq!(config.fetch_timeout(), Duration::from_secs(20));
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"url": "http://127.0.0.1:5500/projects.html", "scan_interval_secs": 60}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.url, "http://127.0.0.1:5500/projects.html");
        assert_eq!(config.scan_interval(), Duration::from_secs(60));
        assert_eq!(config.state_file, "seen_projects.json");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"scan_interval_secs": 0}"#).unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn telegram_requires_both_values() {
        let env: HashMap<&str, &str> = [(TOKEN_ENV, "123:abc")].into_iter().collect();
        let err = TelegramConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(CHAT_ID_ENV)));

        let env: HashMap<&str, &str> = [(TOKEN_ENV, "  "), (CHAT_ID_ENV, "42")]
            .into_iter()
            .collect();
        let err = TelegramConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(TOKEN_ENV)));
    }

    #[test]
    fn telegram_debug_redacts_token() {
        let env: HashMap<&str, &str> = [(TOKEN_ENV, "123:secret"), (CHAT_ID_ENV, "42")]
            .into_iter()
            .collect();
        let tg = TelegramConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(tg.chat_id, "42");
        assert!(!format!("{tg:?}").contains("secret"));
    }
}
