//! Liveping Core - configuration and collaborator seams.
//!
//! This crate is shared by the runtime, the collaborator crates and the CLI:
//!
//! - **config**: the JSON configuration file, its validation and the example
//!   file written by `liveping init-config`
//! - **paths**: state, log and config directory locations
//! - **traits**: the `StatusSource`, `Publisher` and `PreviewFetcher`
//!   capabilities the runtime drives

pub mod config;
pub mod error;
pub mod paths;
pub mod traits;

pub use config::{
    BlueskySection, Config, SettingsSection, TwitchSection, DEFAULT_FALLBACK_TEMPLATE,
    DEFAULT_SUMMARY_EVERY, MIN_CHECK_INTERVAL_SECS,
};
pub use error::{AdapterError, ConfigError};
pub use paths::{config_dir, ensure_all_dirs, env_file, logs_dir, state_dir};
pub use traits::{PreviewFetcher, Publisher, StatusSource};
