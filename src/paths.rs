//! Centralized filesystem paths.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! # Directory Layout
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Data | `~/Library/Application Support/autolearn/` | `~/.local/share/autolearn/` |
//! | Config | `~/Library/Application Support/autolearn/` | `~/.config/autolearn/` |
//!
//! # Environment Overrides
//!
//! - `AUTOLEARN_DATA_DIR` overrides [`data_dir`]
//! - `AUTOLEARN_CONFIG_DIR` overrides [`config_dir`]

use std::path::{Path, PathBuf};

/// Data root: learned records, queue audit, state file, logs.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("AUTOLEARN_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("autolearn"))
        .unwrap_or_else(|| PathBuf::from("/tmp/autolearn-data"))
}

/// Config directory holding `config.toml`.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("AUTOLEARN_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("autolearn"))
        .unwrap_or_else(|| PathBuf::from("/tmp/autolearn-config"))
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Log directory under a data root.
#[must_use]
pub fn logs_dir(data_root: &Path) -> PathBuf {
    data_root.join("logs")
}

/// Result store log under a data root.
#[must_use]
pub fn learned_file(data_root: &Path) -> PathBuf {
    data_root.join("learned.jsonl")
}

/// Queue audit log under a data root.
#[must_use]
pub fn queue_audit_file(data_root: &Path) -> PathBuf {
    data_root.join("queue_audit.jsonl")
}

/// Scheduler status file under a data root.
#[must_use]
pub fn state_file(data_root: &Path) -> PathBuf {
    data_root.join("state.json")
}
