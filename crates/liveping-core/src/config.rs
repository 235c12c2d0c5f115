//! Configuration file model and validation.
//!
//! The configuration is a JSON document with three sections:
//!
//! ```json
//! {
//!   "twitch":   { "username": "...", "client_id": "...", "client_secret": "..." },
//!   "bluesky":  { "handle": "...", "app_password": "..." },
//!   "settings": { "check_interval": 60, "post_template": "... {username} ..." }
//! }
//! ```
//!
//! Secrets can be left empty in the file and supplied through
//! `TWITCH_CLIENT_SECRET` / `BLUESKY_APP_PASSWORD` instead.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;

/// Smallest accepted poll interval.
pub const MIN_CHECK_INTERVAL_SECS: u64 = 30;

/// Default number of cycles between health summaries.
pub const DEFAULT_SUMMARY_EVERY: u64 = 10;

/// Message used for manual posts while the channel is offline.
pub const DEFAULT_FALLBACK_TEMPLATE: &str = "🟢 {username} is online! Come hang out: {url}";

/// Default Bluesky PDS.
pub const DEFAULT_BLUESKY_SERVICE: &str = "https://bsky.social";

/// Environment override for the Twitch client secret.
pub const TWITCH_SECRET_ENV: &str = "TWITCH_CLIENT_SECRET";

/// Environment override for the Bluesky app password.
pub const BLUESKY_PASSWORD_ENV: &str = "BLUESKY_APP_PASSWORD";

/// Twitch account being watched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitchSection {
    /// Channel login name.
    pub username: String,
    /// Application client ID.
    pub client_id: String,
    /// Application client secret.
    #[serde(default)]
    pub client_secret: String,
}

/// Bluesky account posts are made from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueskySection {
    /// Account handle, e.g. `user.bsky.social`.
    pub handle: String,
    /// App password.
    #[serde(default)]
    pub app_password: String,
    /// PDS base URL.
    #[serde(default = "default_service")]
    pub service: String,
}

/// Behaviour settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsSection {
    /// Seconds between status polls.
    pub check_interval: u64,
    /// Template for automatic posts.
    pub post_template: String,
    /// Template for manual posts while offline.
    #[serde(default = "default_fallback_template")]
    pub fallback_template: String,
    /// Cycles between health summaries.
    #[serde(default = "default_summary_every")]
    pub summary_every: u64,
}

/// Complete, validated configuration. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub twitch: TwitchSection,
    pub bluesky: BlueskySection,
    pub settings: SettingsSection,
}

fn default_service() -> String {
    DEFAULT_BLUESKY_SERVICE.to_string()
}

fn default_fallback_template() -> String {
    DEFAULT_FALLBACK_TEMPLATE.to_string()
}

fn default_summary_every() -> u64 {
    DEFAULT_SUMMARY_EVERY
}

impl Config {
    /// Load, apply environment overrides and validate.
    ///
    /// # Errors
    /// Returns a `ConfigError` if the file is missing, unreadable, malformed
    /// or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config = serde_json::from_str(&data)?;
        let config = config.with_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        debug!(path = %path.display(), username = %config.twitch.username, "configuration loaded");
        Ok(config)
    }

    /// Parse and validate a JSON document without touching the environment.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace secrets with values from `lookup` when it has them.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(secret) = lookup(TWITCH_SECRET_ENV).filter(|s| !s.is_empty()) {
            self.twitch.client_secret = secret;
        }
        if let Some(password) = lookup(BLUESKY_PASSWORD_ENV).filter(|s| !s.is_empty()) {
            self.bluesky.app_password = password;
        }
        self
    }

    /// Check required fields and value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("twitch", "username", &self.twitch.username),
            ("twitch", "client_id", &self.twitch.client_id),
            ("twitch", "client_secret", &self.twitch.client_secret),
            ("bluesky", "handle", &self.bluesky.handle),
            ("bluesky", "app_password", &self.bluesky.app_password),
            ("settings", "post_template", &self.settings.post_template),
        ];

        for (section, field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField { section, field });
            }
        }

        if self.settings.check_interval < MIN_CHECK_INTERVAL_SECS {
            return Err(ConfigError::IntervalTooShort {
                min: MIN_CHECK_INTERVAL_SECS,
                actual: self.settings.check_interval,
            });
        }

        if !self.settings.post_template.contains("{username}") {
            warn!("post_template doesn't contain {{username}} placeholder");
        }

        Ok(())
    }

    /// Public URL of the watched channel.
    pub fn channel_url(&self) -> String {
        format!("https://twitch.tv/{}", self.twitch.username)
    }

    /// Configuration with placeholder values, as written by `init-config`.
    pub fn example() -> Self {
        Self {
            twitch: TwitchSection {
                username: "your_twitch_username".to_string(),
                client_id: "your_twitch_client_id".to_string(),
                client_secret: "your_twitch_client_secret".to_string(),
            },
            bluesky: BlueskySection {
                handle: "yourhandle.bsky.social".to_string(),
                app_password: "your-app-password".to_string(),
                service: default_service(),
            },
            settings: SettingsSection {
                check_interval: 60,
                post_template: "🔴 I'm now live on Twitch! Come join me: https://twitch.tv/{username}"
                    .to_string(),
                fallback_template: default_fallback_template(),
                summary_every: DEFAULT_SUMMARY_EVERY,
            },
        }
    }

    /// Write the example configuration to `path`.
    ///
    /// # Errors
    /// Refuses to overwrite an existing file.
    pub fn write_example(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }

        let json = serde_json::to_string_pretty(&Self::example())?;
        std::fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_json(interval: u64) -> String {
        format!(
            r#"{{
                "twitch": {{ "username": "testuser", "client_id": "cid", "client_secret": "secret" }},
                "bluesky": {{ "handle": "test.bsky.social", "app_password": "pw" }},
                "settings": {{ "check_interval": {interval}, "post_template": "🔴 live! https://twitch.tv/{{username}}" }}
            }}"#
        )
    }

    #[test]
    fn test_parse_valid_config() {
        let config = Config::from_json_str(&sample_json(60)).unwrap();

        assert_eq!(config.twitch.username, "testuser");
        assert_eq!(config.bluesky.handle, "test.bsky.social");
        assert_eq!(config.bluesky.service, DEFAULT_BLUESKY_SERVICE);
        assert_eq!(config.settings.check_interval, 60);
        assert_eq!(config.settings.summary_every, DEFAULT_SUMMARY_EVERY);
        assert_eq!(config.settings.fallback_template, DEFAULT_FALLBACK_TEMPLATE);
        assert_eq!(config.channel_url(), "https://twitch.tv/testuser");
    }

    #[test]
    fn test_interval_below_minimum_rejected() {
        let err = Config::from_json_str(&sample_json(20)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::IntervalTooShort { min: 30, actual: 20 }
        ));
    }

    #[test]
    fn test_interval_at_minimum_accepted() {
        assert!(Config::from_json_str(&sample_json(30)).is_ok());
    }

    #[test]
    fn test_empty_field_rejected() {
        let json = sample_json(60).replace("\"cid\"", "\"\"");
        let err = Config::from_json_str(&json).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EmptyField {
                section: "twitch",
                field: "client_id"
            }
        ));
    }

    #[test]
    fn test_missing_section_rejected() {
        let err = Config::from_json_str(r#"{ "twitch": {} }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_env_overrides_fill_secrets() {
        let json = sample_json(60)
            .replace("\"secret\"", "\"\"")
            .replace("\"pw\"", "\"\"");
        let config: Config = serde_json::from_str(&json).unwrap();
        assert!(config.validate().is_err());

        let config = config.with_overrides(|key| match key {
            TWITCH_SECRET_ENV => Some("env-secret".to_string()),
            BLUESKY_PASSWORD_ENV => Some("env-pw".to_string()),
            _ => None,
        });
        assert_eq!(config.twitch.client_secret, "env-secret");
        assert_eq!(config.bluesky.app_password, "env-pw");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_json(45).as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.settings.check_interval, 45);
    }

    #[test]
    fn test_write_example_roundtrip_and_no_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.example.json");

        Config::write_example(&path).unwrap();
        let written: Config =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, Config::example());
        assert!(written.validate().is_ok());

        let err = Config::write_example(&path).unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyExists(_)));
    }
}
