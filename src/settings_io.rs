use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::settings::SimulationSettings;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// `<config dir>/bystander-sim/settings.json`, if the platform has a config dir.
pub fn default_settings_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push("bystander-sim");
    path.push("settings.json");
    Some(path)
}

/// Loads settings from `explicit` if given (errors are fatal), otherwise
/// from the default location if it exists (errors are logged), otherwise
/// falls back to defaults.
pub fn load_settings(explicit: Option<&Path>) -> Result<SimulationSettings, SettingsError> {
    if let Some(path) = explicit {
        return read_settings(path);
    }

    let Some(path) = default_settings_path().filter(|p| p.exists()) else {
        debug!("no settings file found, using defaults");
        return Ok(SimulationSettings::default());
    };

    match read_settings(&path) {
        Ok(settings) => Ok(settings),
        Err(e) => {
            warn!(error = %e, "ignoring unreadable default settings");
            Ok(SimulationSettings::default())
        }
    }
}

pub fn read_settings(path: &Path) -> Result<SimulationSettings, SettingsError> {
    let raw = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&raw).map_err(|source| SettingsError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"seed": 7, "agent": {"model": "local-model"}}"#).unwrap();

        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.num_participants, 12);
        assert_eq!(settings.agent.model, "local-model");
        assert_eq!(settings.agent.timeout_secs, 120);
        assert_eq!(settings.scenario_seconds(), 180..=420);
    }

    #[test]
    fn explicit_garbage_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            load_settings(Some(&path)),
            Err(SettingsError::Json { .. })
        ));
    }
}
