//! Data-driven game tuning
//!
//! Every balance number the session uses lives in [`Tuning`]. Defaults come
//! from [`crate::consts`]; a JSON file can override any subset of fields.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SettingsError;

/// Environment variable naming a JSON tuning file
pub const TUNING_ENV_VAR: &str = "COIN_DROP_TUNING";

/// Period/probability pair for one producer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnTuning {
    pub period_ms: u64,
    /// Chance that a firing actually spawns (1.0 = unconditional)
    pub probability: f64,
}

/// One ratcheting value of the difficulty curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratchet {
    pub step_ms: u64,
    pub floor_ms: u64,
}

impl Ratchet {
    /// Apply one step; values at or below the floor are left alone
    pub fn tighten(&self, value: u64) -> u64 {
        if value > self.floor_ms {
            value.saturating_sub(self.step_ms).max(self.floor_ms)
        } else {
            value
        }
    }
}

/// Game balance and engine timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Track ===
    pub item_size: f32,
    pub actor_width: f32,
    pub actor_height: f32,
    pub max_items: usize,

    // === Spawners ===
    pub coin: SpawnTuning,
    pub hazard: SpawnTuning,
    pub magnet: SpawnTuning,
    pub growth: SpawnTuning,
    pub fun: SpawnTuning,
    pub drop_duration_ms: u64,
    pub fun_drop_duration_ms: u64,

    // === Difficulty curve ===
    pub coin_score: u32,
    pub hazard_penalty: u32,
    pub milestone: u32,
    pub coin_ratchet: Ratchet,
    pub hazard_ratchet: Ratchet,
    pub drop_ratchet: Ratchet,

    // === Power-ups ===
    pub magnet_duration_ms: u64,
    pub magnet_range: f32,
    pub magnet_pull_ms: u64,
    pub growth_duration_ms: u64,
    pub growth_factor: f32,

    // === Session ===
    pub classic_lives: u32,
    pub countdown_ms: u64,

    // === Engine ===
    pub tick_interval_ms: u64,
    pub pause_poll_ms: u64,
    /// Emit `ItemMoved` for every live item on every tick
    pub emit_position_ticks: bool,
    /// Fixed RNG seed (tests); `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            item_size: ITEM_SIZE,
            actor_width: ACTOR_WIDTH,
            actor_height: ACTOR_HEIGHT,
            max_items: MAX_ITEMS_ON_SCREEN,

            coin: SpawnTuning {
                period_ms: COIN_PERIOD_MS,
                probability: 1.0,
            },
            hazard: SpawnTuning {
                period_ms: HAZARD_PERIOD_MS,
                probability: 1.0,
            },
            magnet: SpawnTuning {
                period_ms: MAGNET_PERIOD_MS,
                probability: MAGNET_PROBABILITY,
            },
            growth: SpawnTuning {
                period_ms: GROWTH_PERIOD_MS,
                probability: GROWTH_PROBABILITY,
            },
            fun: SpawnTuning {
                period_ms: FUN_PERIOD_MS,
                probability: 1.0,
            },
            drop_duration_ms: DROP_DURATION_MS,
            fun_drop_duration_ms: FUN_DROP_DURATION_MS,

            coin_score: COIN_SCORE,
            hazard_penalty: HAZARD_PENALTY,
            milestone: DIFFICULTY_MILESTONE,
            coin_ratchet: Ratchet {
                step_ms: COIN_PERIOD_STEP_MS,
                floor_ms: COIN_PERIOD_FLOOR_MS,
            },
            hazard_ratchet: Ratchet {
                step_ms: HAZARD_PERIOD_STEP_MS,
                floor_ms: HAZARD_PERIOD_FLOOR_MS,
            },
            drop_ratchet: Ratchet {
                step_ms: DROP_DURATION_STEP_MS,
                floor_ms: DROP_DURATION_FLOOR_MS,
            },

            magnet_duration_ms: MAGNET_DURATION_MS,
            magnet_range: MAGNET_RANGE,
            magnet_pull_ms: MAGNET_PULL_MS,
            growth_duration_ms: GROWTH_DURATION_MS,
            growth_factor: GROWTH_FACTOR,

            classic_lives: CLASSIC_LIVES,
            countdown_ms: COUNTDOWN_MS,

            tick_interval_ms: TICK_INTERVAL_MS,
            pause_poll_ms: PAUSE_POLL_MS,
            emit_position_ticks: true,
            seed: None,
        }
    }
}

impl Tuning {
    /// Load tuning from a JSON file; missing fields keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tuning: Tuning = serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tuning.validate()?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Load from the file named by `COIN_DROP_TUNING`, falling back to defaults
    pub fn from_env() -> Self {
        let Ok(path) = std::env::var(TUNING_ENV_VAR) else {
            return Self::default();
        };
        match Self::load(&path) {
            Ok(tuning) => tuning,
            Err(err) => {
                log::warn!("{err}; using default tuning");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |msg: &str| Err(SettingsError::Invalid(msg.to_string()));

        if self.max_items == 0 {
            return invalid("max_items must be at least 1");
        }
        if self.item_size <= 0.0 || self.actor_width <= 0.0 || self.actor_height <= 0.0 {
            return invalid("sprite sizes must be positive");
        }
        for (name, spawn) in [
            ("coin", self.coin),
            ("hazard", self.hazard),
            ("magnet", self.magnet),
            ("growth", self.growth),
            ("fun", self.fun),
        ] {
            if spawn.period_ms == 0 {
                return Err(SettingsError::Invalid(format!("{name} period must be non-zero")));
            }
            if !(0.0..=1.0).contains(&spawn.probability) {
                return Err(SettingsError::Invalid(format!(
                    "{name} probability must be within [0, 1]"
                )));
            }
        }
        if self.drop_duration_ms == 0 || self.fun_drop_duration_ms == 0 {
            return invalid("drop durations must be non-zero");
        }
        if self.coin_ratchet.floor_ms == 0
            || self.hazard_ratchet.floor_ms == 0
            || self.drop_ratchet.floor_ms == 0
        {
            return invalid("difficulty floors must be non-zero");
        }
        if self.coin.period_ms < self.coin_ratchet.floor_ms
            || self.hazard.period_ms < self.hazard_ratchet.floor_ms
            || self.drop_duration_ms < self.drop_ratchet.floor_ms
        {
            return invalid("starting values must not be below their difficulty floors");
        }
        if self.milestone == 0 {
            return invalid("milestone must be non-zero");
        }
        if self.growth_factor < 1.0 {
            return invalid("growth_factor must be >= 1");
        }
        if self.tick_interval_ms == 0 || self.pause_poll_ms == 0 {
            return invalid("tick and poll intervals must be non-zero");
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms)
    }
}
