use std::path::{Path, PathBuf};

use serde::Deserialize;
use tessel_core::undo::DEFAULT_CAPACITY;

/// Editor preferences loaded from `tessel.toml`.
///
/// Every field has a default, so a partial file (or an empty one) is valid.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub undo: UndoSettings,
    pub log: LogSettings,
}

/// The `[undo]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UndoSettings {
    /// Number of undo steps kept.
    pub capacity: usize,
    pub enabled: bool,
    /// Turn history off while the game is playing or a build runs.
    pub disable_during_play: bool,
}

impl Default for UndoSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            enabled: true,
            disable_during_play: true,
        }
    }
}

/// The `[log]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `env_logger` filter used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Parses settings from TOML text.
pub fn parse_settings(content: &str, path: &Path) -> Result<EditorSettings, SettingsError> {
    toml::from_str(content).map_err(|source| SettingsError::Parse {
        path: path.to_owned(),
        source,
    })
}

/// Loads settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<EditorSettings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_owned(),
        source,
    })?;
    parse_settings(&content, path)
}

/// Loads settings, falling back to defaults if the file is missing or broken.
pub fn load_or_default(path: &Path) -> EditorSettings {
    match load_settings(path) {
        Ok(settings) => {
            log::info!(
                "Loaded settings from {} (undo capacity {})",
                path.display(),
                settings.undo.capacity
            );
            settings
        }
        Err(e) => {
            log::warn!("No usable settings file ({e}), using defaults");
            EditorSettings::default()
        }
    }
}
