//! Configuration and scenario directory paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/storefront-e2e/`
//! - macOS: `~/Library/Application Support/storefront-e2e/`
//! - Windows: `%APPDATA%\storefront-e2e\`

use std::path::PathBuf;

/// Application name used for platform directories
const APP_NAME: &str = "storefront-e2e";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the directory holding user-authored YAML scenarios
pub fn scenarios_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("scenarios"))
}
