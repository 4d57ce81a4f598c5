//! Persisted timeline settings.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use boardline_core::{BoardId, FieldId, SortDirection, TimelineSettings};
use thiserror::Error;

const SETTINGS_DIR: &str = ".boardline";
const SETTINGS_FILE: &str = "settings.toml";

/// Errors raised by a [`SettingsStore`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// File system access failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// File or directory that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Stored settings are malformed.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Settings file.
        path: PathBuf,
        /// TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// Settings could not be encoded.
    #[error("failed to encode settings: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Persistence for [`TimelineSettings`].
pub trait SettingsStore: Send + Sync {
    /// Load the stored settings; `Ok(None)` when nothing has been saved yet.
    ///
    /// # Errors
    /// Returns a [`SettingsError`] when stored settings exist but cannot be read.
    fn load(&self) -> Result<Option<TimelineSettings>, SettingsError>;

    /// Replace the stored settings.
    ///
    /// # Errors
    /// Returns a [`SettingsError`] when the settings cannot be written.
    fn save(&self, settings: &TimelineSettings) -> Result<(), SettingsError>;
}

/// Settings kept as TOML in `<dir>/.boardline/settings.toml`.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    /// Store rooted at `workdir`.
    pub fn from_workdir(workdir: impl AsRef<Path>) -> Self {
        Self {
            path: workdir.as_ref().join(SETTINGS_DIR).join(SETTINGS_FILE),
        }
    }

    /// Location of the settings file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<Option<TimelineSettings>, SettingsError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;
        toml::from_str(&contents)
            .map(Some)
            .map_err(|source| SettingsError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    fn save(&self, settings: &TimelineSettings) -> Result<(), SettingsError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|source| SettingsError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let contents = toml::to_string_pretty(settings)?;
        fs::write(&self.path, contents).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Update one option by its persisted key. An empty value clears optional keys.
///
/// # Errors
/// Returns an error for unknown keys or values that do not parse.
pub fn apply_setting(settings: &mut TimelineSettings, key: &str, value: &str) -> Result<()> {
    let value = value.trim();
    let optional = || (!value.is_empty()).then(|| value.to_owned());
    match key {
        "timelineColumn" => settings.timeline_column = optional().map(FieldId::new),
        "colorByColumn" => settings.color_by_column = optional().map(FieldId::new),
        "groupByColumn" => settings.group_by_column = optional().map(FieldId::new),
        "sortByColumn" => settings.sort_by_column = optional(),
        "sortDirection" => {
            settings.sort_direction = value
                .parse::<SortDirection>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("invalid value for {key}"))?;
        }
        "showSubitems" => {
            settings.show_subitems = value
                .parse::<bool>()
                .with_context(|| format!("invalid value for {key}: '{value}'"))?;
        }
        "selectedBoards" => {
            settings.selected_boards = value
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(BoardId::from)
                .collect();
        }
        other => bail!("unknown setting '{other}'"),
    }
    Ok(())
}
