//! Persistent application settings.
//!
//! Stored as pretty JSON at `<config dir>/gestureflow/settings.json`. Missing
//! or unreadable settings fall back to defaults so startup never fails on a
//! bad file; unknown fields are ignored and missing ones take defaults.

use crate::constants::APP_DIR_NAME;
use crate::document::write_atomic;
use crate::error::{SettingsError, SettingsResult};
use crate::gesture::GestureConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SETTINGS_FILE_NAME: &str = "settings.json";

/// Default endpoint of the hand-pose classifier
pub const DEFAULT_LINK_ENDPOINT: &str = "ws://localhost:8000/ws";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
    pub gesture: GestureConfig,
    /// Where the pose classifier listens
    pub link_endpoint: String,
    /// Overrides the local document store directory
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            gesture: GestureConfig::default(),
            link_endpoint: DEFAULT_LINK_ENDPOINT.to_string(),
            data_dir: None,
        }
    }
}

/// Platform location of the settings file.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME))
}

impl Settings {
    pub fn load_from(path: &Path) -> SettingsResult<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Load from `path`, or defaults if the file is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(settings) => settings,
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable settings");
                Self::default()
            }
        }
    }

    /// Load from the platform location.
    pub fn load() -> Self {
        match default_settings_path() {
            Some(path) => Self::load_or_default(&path),
            None => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> SettingsResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())?;
        Ok(())
    }

    pub fn save(&self) -> SettingsResult<()> {
        let path = default_settings_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Document store directory, from the override or the platform data dir.
    pub fn resolved_data_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join(APP_DIR_NAME)))
    }
}
