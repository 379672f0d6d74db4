use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to read participant roster {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("participant roster is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("participant roster is empty")]
    Empty,
}

/// A synthetic participant profile. Read by the journey engine, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub nationality: String,
    #[serde(default = "default_residence")]
    pub residence: String,
    #[serde(default = "default_occupation")]
    pub occupation: String,
    #[serde(default)]
    pub personality_traits: Vec<String>,
    #[serde(default)]
    pub professional_interests: Vec<String>,
    /// Free-form preferences (intervention_style, comfort_with_confrontation, ...)
    #[serde(default)]
    pub preferences: BTreeMap<String, String>,
}

fn default_residence() -> String {
    "University Campus".into()
}

fn default_occupation() -> String {
    "University Student".into()
}

impl Participant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age: None,
            nationality: String::new(),
            residence: default_residence(),
            occupation: default_occupation(),
            personality_traits: Vec::new(),
            professional_interests: Vec::new(),
            preferences: BTreeMap::new(),
        }
    }

    pub fn background_summary(&self) -> String {
        format!(
            "{} - {}",
            self.nationality,
            self.professional_interests.join(", ")
        )
    }

    pub fn preference(&self, key: &str) -> Option<&str> {
        self.preferences.get(key).map(String::as_str)
    }

    pub fn intervention_style(&self) -> &str {
        self.preference("intervention_style").unwrap_or("thoughtful")
    }

    pub fn comfort_with_confrontation(&self) -> &str {
        self.preference("comfort_with_confrontation")
            .unwrap_or("moderate")
    }
}

pub fn load_roster(path: &Path) -> Result<Vec<Participant>, RosterError> {
    let raw = fs::read_to_string(path).map_err(|source| RosterError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let roster: Vec<Participant> = serde_json::from_str(&raw)?;
    if roster.is_empty() {
        return Err(RosterError::Empty);
    }

    Ok(roster)
}
