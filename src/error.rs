//! Error types
//!
//! None of these are fatal: the engine recovers from every [`EngineError`] by
//! skipping the operation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::sim::{ItemId, SessionPhase};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Arena is at its population cap; the spawn cycle is skipped
    #[error("arena is full ({max} items)")]
    CapacityExceeded { max: usize },
    /// Item was already consumed or removed
    #[error("item {0} was already resolved")]
    AlreadyResolved(ItemId),
    #[error("cannot {action} while {from:?}")]
    InvalidStateTransition {
        from: SessionPhase,
        action: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read tuning file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse tuning file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("high score file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("corrupt high score file {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode high scores: {0}")]
    Encode(#[source] serde_json::Error),
}
