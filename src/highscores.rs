//! Best score per mode
//!
//! The engine only needs two calls, expressed by [`HighScoreStore`]. The
//! default [`HighScores`] lives in memory, so best scores reset with the
//! process; `persistence::JsonFileStore` keeps them on disk.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sim::ModeVariant;

/// Where a session reads and records the best score for its mode
pub trait HighScoreStore {
    fn load_high_score(&self, mode: ModeVariant) -> u32;
    fn save_high_score(&mut self, mode: ModeVariant, score: u32);
}

/// In-memory best scores keyed by mode
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct HighScores {
    pub best: BTreeMap<ModeVariant, u32>,
}

impl HighScores {
    pub fn new() -> Self {
        Self {
            best: BTreeMap::new(),
        }
    }

    /// Check if a score would raise the best for its mode
    pub fn qualifies(&self, mode: ModeVariant, score: u32) -> bool {
        score > self.load_high_score(mode)
    }

    /// Record a score; returns the best after recording
    pub fn record(&mut self, mode: ModeVariant, score: u32) -> u32 {
        if self.qualifies(mode, score) {
            self.best.insert(mode, score);
        }
        self.load_high_score(mode)
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }
}

impl HighScoreStore for HighScores {
    fn load_high_score(&self, mode: ModeVariant) -> u32 {
        self.best.get(&mode).copied().unwrap_or(0)
    }

    /// Never lowers a stored best
    fn save_high_score(&mut self, mode: ModeVariant, score: u32) {
        self.record(mode, score);
    }
}
