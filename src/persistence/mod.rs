//! High scores on disk
//!
//! A plain JSON file holding [`HighScores`]. Writes go through a sibling
//! `.tmp` file and a rename so a crash mid-save never leaves a truncated file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::PersistenceError;
use crate::highscores::{HighScoreStore, HighScores};
use crate::sim::ModeVariant;

/// Env var naming the high score file used by the demo binary
pub const SCORES_ENV_VAR: &str = "COIN_DROP_SCORES";

/// [`HighScoreStore`] backed by a JSON file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    scores: HighScores,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let scores = match fs::read_to_string(&path) {
            Ok(text) => {
                serde_json::from_str(&text).map_err(|source| PersistenceError::Corrupt {
                    path: path.clone(),
                    source,
                })?
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => HighScores::new(),
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: path.clone(),
                    source,
                });
            }
        };
        log::debug!("Loaded high scores from {}", path.display());
        Ok(Self { path, scores })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn scores(&self) -> &HighScores {
        &self.scores
    }

    /// Write the current scores to disk
    pub fn flush(&self) -> Result<(), PersistenceError> {
        let text = serde_json::to_string_pretty(&self.scores).map_err(PersistenceError::Encode)?;
        write_atomic(&self.path, text.as_bytes()).map_err(|source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl HighScoreStore for JsonFileStore {
    fn load_high_score(&self, mode: ModeVariant) -> u32 {
        self.scores.load_high_score(mode)
    }

    fn save_high_score(&mut self, mode: ModeVariant, score: u32) {
        self.scores.save_high_score(mode, score);
        // The session keeps going with the in-memory best
        if let Err(err) = self.flush() {
            log::warn!("Failed to save high score: {err}");
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, bytes)?;
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("highscores.json");
    path.with_file_name(format!("{file_name}.tmp"))
}
