//! Coin Drop - session engine for a falling-coin arcade game
//!
//! Core modules:
//! - `sim`: Session simulation (arena, spawners, collisions, effects, lifecycle)
//! - `runtime`: Tokio tasks driving a session (producers, owner loop, events)
//! - `highscores`: Per-mode best scores behind a store trait
//! - `persistence`: Optional JSON file store for high scores
//! - `settings`: Data-driven tuning
//! - `cues`: Sound/visual cue identifiers for the presentation layer

pub mod cues;
pub mod error;
pub mod highscores;
pub mod persistence;
pub mod runtime;
pub mod settings;
pub mod sim;

pub use error::EngineError;
pub use highscores::{HighScoreStore, HighScores};
pub use runtime::{SessionHandle, spawn_session};
pub use settings::Tuning;

/// Game configuration constants (defaults for [`Tuning`])
pub mod consts {
    /// Live items allowed on the track at once
    pub const MAX_ITEMS_ON_SCREEN: usize = 5;

    /// Item sprite size (square)
    pub const ITEM_SIZE: f32 = 100.0;
    /// Actor sprite size
    pub const ACTOR_WIDTH: f32 = 150.0;
    pub const ACTOR_HEIGHT: f32 = 150.0;

    /// Coin spawn period and difficulty ratchet
    pub const COIN_PERIOD_MS: u64 = 1000;
    pub const COIN_PERIOD_STEP_MS: u64 = 100;
    pub const COIN_PERIOD_FLOOR_MS: u64 = 400;

    /// Hazard spawn period and difficulty ratchet
    pub const HAZARD_PERIOD_MS: u64 = 4000;
    pub const HAZARD_PERIOD_STEP_MS: u64 = 200;
    pub const HAZARD_PERIOD_FLOOR_MS: u64 = 1000;

    /// Fall duration shared by coins, hazards and power-ups
    pub const DROP_DURATION_MS: u64 = 3000;
    pub const DROP_DURATION_STEP_MS: u64 = 200;
    pub const DROP_DURATION_FLOOR_MS: u64 = 1000;

    /// Score per coin and the milestone that tightens difficulty
    pub const COIN_SCORE: u32 = 10;
    pub const HAZARD_PENALTY: u32 = 10;
    pub const DIFFICULTY_MILESTONE: u32 = 50;

    /// Magnet power-up
    pub const MAGNET_PERIOD_MS: u64 = 5000;
    pub const MAGNET_PROBABILITY: f64 = 0.3;
    pub const MAGNET_DURATION_MS: u64 = 8000;
    pub const MAGNET_RANGE: f32 = 300.0;
    pub const MAGNET_PULL_MS: u64 = 300;

    /// Growth booster power-up
    pub const GROWTH_PERIOD_MS: u64 = 6000;
    pub const GROWTH_PROBABILITY: f64 = 0.25;
    pub const GROWTH_DURATION_MS: u64 = 6000;
    pub const GROWTH_FACTOR: f32 = 1.5;

    /// Fun-mode cosmetic drops
    pub const FUN_PERIOD_MS: u64 = 2000;
    pub const FUN_DROP_DURATION_MS: u64 = 2900;

    /// Session rules
    pub const CLASSIC_LIVES: u32 = 5;
    pub const COUNTDOWN_MS: u64 = 60_000;

    /// Owner tick (~60 Hz) and the producer poll cadence while paused
    pub const TICK_INTERVAL_MS: u64 = 16;
    pub const PAUSE_POLL_MS: u64 = 100;
}

/// Clamp a horizontal position so a span of `width` stays on a track of `track_width`
#[inline]
pub fn clamp_to_track(x: f32, width: f32, track_width: f32) -> f32 {
    let max = (track_width - width).max(0.0);
    x.clamp(0.0, max)
}
