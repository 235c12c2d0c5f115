//! Runtime configuration.

use std::time::Duration;

use liveping_core::{Config, DEFAULT_FALLBACK_TEMPLATE, DEFAULT_SUMMARY_EVERY};

/// Runtime-side view of the configuration.
///
/// Built from a validated `Config`; the runtime itself does not re-check
/// ranges, so tests can use short intervals.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Account whose status is polled.
    pub username: String,
    /// Public channel URL, used for previews and the `{url}` placeholder.
    pub channel_url: String,
    /// How long to sleep between polls.
    pub poll_interval: Duration,
    /// Template for automatic and live manual posts.
    pub post_template: String,
    /// Template for manual posts while not live.
    pub fallback_template: String,
    /// Emit a health summary every this many cycles (0 disables).
    pub summary_every: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            channel_url: String::new(),
            poll_interval: Duration::from_secs(60),
            post_template: "🔴 {username} is live! {url}".to_string(),
            fallback_template: DEFAULT_FALLBACK_TEMPLATE.to_string(),
            summary_every: DEFAULT_SUMMARY_EVERY,
        }
    }
}

impl RuntimeConfig {
    /// Creates a config for `username` with default values.
    pub fn new(username: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            channel_url: format!("https://twitch.tv/{}", username),
            username,
            ..Self::default()
        }
    }

    /// Derives the runtime config from a loaded configuration file.
    pub fn from_config(config: &Config) -> Self {
        Self {
            username: config.twitch.username.clone(),
            channel_url: config.channel_url(),
            poll_interval: Duration::from_secs(config.settings.check_interval),
            post_template: config.settings.post_template.clone(),
            fallback_template: config.settings.fallback_template.clone(),
            summary_every: config.settings.summary_every,
        }
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the post template.
    pub fn with_post_template(mut self, template: impl Into<String>) -> Self {
        self.post_template = template.into();
        self
    }

    /// Sets the offline fallback template.
    pub fn with_fallback_template(mut self, template: impl Into<String>) -> Self {
        self.fallback_template = template.into();
        self
    }

    /// Sets the summary cadence.
    pub fn with_summary_every(mut self, cycles: u64) -> Self {
        self.summary_every = cycles;
        self
    }
}
