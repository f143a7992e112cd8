//! User settings persisted in the OS config directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::BackendError;
use crate::model::ViewMode;

const APP_NAME: &str = "KanbanGantt";
const SETTINGS_FILE: &str = "settings.json";
const SCROLL_FILE: &str = "scroll_positions.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub view_mode: ViewMode,
    pub row_height: f32,
    pub header_height: f32,
    /// Board file reopened on startup.
    pub last_board_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::Days,
            row_height: 32.0,
            header_height: 44.0,
            last_board_path: None,
        }
    }
}

impl Settings {
    /// Missing or malformed files give the defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(json) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&json) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed settings");
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), BackendError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load() -> Self {
        Self::load_from(&settings_path())
    }

    pub fn save(&self) -> Result<(), BackendError> {
        self.save_to(&settings_path())
    }
}

pub fn config_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn settings_path() -> PathBuf {
    config_dir().join(SETTINGS_FILE)
}

pub fn scroll_positions_path() -> PathBuf {
    config_dir().join(SCROLL_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("nope.json"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{ "view_mode": "Weeks" }"#).unwrap();
        let settings = Settings::load_from(&path);
        assert_eq!(settings.view_mode, ViewMode::Weeks);
        assert_eq!(settings.row_height, 32.0);
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);
        let settings = Settings {
            view_mode: ViewMode::Months,
            last_board_path: Some(PathBuf::from("/tmp/board.json")),
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }
}
