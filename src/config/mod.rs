//! Persistent plugin settings.
//!
//! Settings live in a small JSON document next to the running module. The only
//! recognized key is `ComPort`; everything else is ignored. Loading never fails:
//! a missing or malformed file yields the defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[cfg(windows)]
pub const DEFAULT_PORT: &str = r"\\.\COM1";
#[cfg(not(windows))]
pub const DEFAULT_PORT: &str = "/dev/ttyS0";

pub const CONFIG_EXTENSION: &str = "cfg";

static MODULE_PATH: Lazy<PathBuf> = Lazy::new(|| {
    std::env::current_exe().unwrap_or_else(|_| PathBuf::from(env!("CARGO_PKG_NAME")))
});

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "ComPort")]
    pub com_port: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            com_port: DEFAULT_PORT.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults on any problem.
    pub fn load(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                log::info!("No settings at {} ({}), using defaults", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str(&text) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring malformed settings in {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        fs::write(path, text)?;
        log::debug!("Settings saved to {}", path.display());
        Ok(())
    }
}

/// Settings file path: the module path with a `.cfg` extension.
pub fn default_config_path() -> PathBuf {
    MODULE_PATH.with_extension(CONFIG_EXTENSION)
}

/// Device name derived from the module file name, without extension.
pub fn default_device_name() -> String {
    MODULE_PATH
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(env!("CARGO_PKG_NAME"))
        .to_string()
}
