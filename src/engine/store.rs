use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

use crate::model::journey::ResultSet;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write results to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode results: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to move results into place at {path}: {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes the result set to `path` as one atomic replace.
///
/// The JSON goes to a temporary file in the same directory, is synced to
/// disk, then renamed over `path`. A failure at any point leaves whatever
/// was at `path` before untouched.
pub fn save_results(path: &Path, results: &ResultSet) -> Result<(), PersistError> {
    let io_err = |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(io_err)?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, results)?;
        writer.flush().map_err(io_err)?;
    }
    tmp.as_file().sync_all().map_err(io_err)?;

    tmp.persist(path).map_err(|e| PersistError::Replace {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    info!(path = %path.display(), journeys = results.len(), "results saved");
    Ok(())
}

pub fn load_results(path: &Path) -> Result<ResultSet, PersistError> {
    let raw = fs::read_to_string(path).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}
