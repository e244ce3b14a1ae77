//! harmonia-player configuration
//!
//! Loaded from a TOML file; every field has a default so a missing or
//! partial file still yields a usable configuration. Command-line
//! arguments override file values.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Player configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root folder scanned for audio files
    pub music_dir: PathBuf,
    /// SQLite database holding favorites and preferences
    pub db_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            music_dir: PathBuf::from("music"),
            db_path: PathBuf::from("harmonia.db"),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
    }
}
