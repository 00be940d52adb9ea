//! Application configuration constants and user settings.

use crate::error::{Result, SessionError};
use log::{info, warn};
use serde::Deserialize;
use std::path::Path;

/// Supported image file extensions for scanning directories.
pub const SUPPORTED_IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Environment variable naming the settings file.
pub const CONFIG_ENV_VAR: &str = "PICVIEW_CONFIG";

/// Which notify backend drives the watch service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchBackend {
    /// Polls watched paths on an interval. Works on network shares.
    #[default]
    Poll,
    /// Platform notification API (inotify, FSEvents, ReadDirectoryChangesW).
    Native,
}

/// User settings, read once when the session is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Animated pictures start paused.
    pub pause_animations: bool,
    /// Front-ends ask before moving a picture to the trash.
    pub confirm_delete: bool,
    pub watch_debounce_ms: u64,
    pub watch_poll_interval_ms: u64,
    pub watch_backend: WatchBackend,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pause_animations: false,
            confirm_delete: true,
            watch_debounce_ms: 500,
            watch_poll_interval_ms: 2000,
            watch_backend: WatchBackend::Poll,
        }
    }
}

impl Settings {
    /// Parses settings from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(SessionError::from)
    }

    /// Reads settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SessionError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Loads the file named by `PICVIEW_CONFIG`, falling back to defaults.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV_VAR) else {
            return Self::default();
        };

        match Self::load(Path::new(&path)) {
            Ok(settings) => {
                info!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                warn!("Ignoring settings file {:?}: {}", path, e);
                Self::default()
            }
        }
    }
}
