//! Filesystem locations used by Liveping.
//!
//! ```text
//! ~/.liveping/
//! ├── logs/         # liveping.log.YYYY-MM-DD
//! └── config/       # .env.local with secrets
//! ```
//!
//! Each location can be moved with an environment variable:
//! `LIVEPING_STATE_DIR`, `LIVEPING_LOG_DIR` and `LIVEPING_CONFIG_DIR`.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Overrides the base directory.
pub const STATE_DIR_ENV: &str = "LIVEPING_STATE_DIR";

/// Overrides the log directory.
pub const LOG_DIR_ENV: &str = "LIVEPING_LOG_DIR";

/// Overrides the directory holding `.env.local`.
pub const CONFIG_DIR_ENV: &str = "LIVEPING_CONFIG_DIR";

const STATE_DIR_NAME: &str = ".liveping";

/// `var` as a path when set and non-empty.
fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn resolve(var: &str, base: &Path, name: &str) -> PathBuf {
    env_path(var).unwrap_or_else(|| base.join(name))
}

/// Base directory, resolved once per process.
///
/// `LIVEPING_STATE_DIR`, else `~/.liveping`, else `./.liveping` when there
/// is no home directory.
pub fn state_dir() -> PathBuf {
    static STATE_DIR: OnceLock<PathBuf> = OnceLock::new();
    STATE_DIR
        .get_or_init(|| {
            env_path(STATE_DIR_ENV).unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_default()
                    .join(STATE_DIR_NAME)
            })
        })
        .clone()
}

/// Where daily log files go.
pub fn logs_dir() -> PathBuf {
    resolve(LOG_DIR_ENV, &state_dir(), "logs")
}

/// Where user configuration lives.
pub fn config_dir() -> PathBuf {
    resolve(CONFIG_DIR_ENV, &state_dir(), "config")
}

/// The `.env.local` loaded at startup.
pub fn env_file() -> PathBuf {
    config_dir().join(".env.local")
}

/// Create the log and config directories.
pub fn ensure_all_dirs() -> std::io::Result<()> {
    for dir in [logs_dir(), config_dir()] {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}
