use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::ledger::RecordVariant;
use crate::links::DEFAULT_MATCH_HOST;

pub const DEFAULT_STORAGE_KEY: &str = "pff_esports_session_v1";
pub const DEFAULT_ROSTER_PATH: &str = "players.csv";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse settings '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaggerSettings {
    pub match_host: String,
    pub storage_key: String,
    pub variant: RecordVariant,
    pub roster_path: String,
}

impl Default for TaggerSettings {
    fn default() -> Self {
        Self {
            match_host: DEFAULT_MATCH_HOST.to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            variant: RecordVariant::Events,
            roster_path: DEFAULT_ROSTER_PATH.to_string(),
        }
    }
}

impl TaggerSettings {
    /// A missing file yields defaults; a file that exists must parse.
    pub fn load_from_path(path: &Path) -> Result<Self, SettingsError> {
        let raw_json = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                tracing::debug!(settings_path = %path.display(), "No settings file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let settings = serde_json::from_str::<Self>(&raw_json).map_err(|source| {
            SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;

        tracing::info!(
            settings_path = %path.display(),
            match_host = %settings.match_host,
            variant = ?settings.variant,
            "Loaded tagger settings"
        );
        Ok(settings)
    }
}
