//! Session state and core simulation types

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use crate::clamp_to_track;
use crate::cues::SoundCue;
use crate::settings::Tuning;

/// Arena-assigned item identifier
pub type ItemId = u32;

/// Fun-mode cosmetic items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunItem {
    HappyCat,
    Nugget,
    SadCat,
    Jiafei,
    Neilong,
}

impl FunItem {
    pub const ALL: [FunItem; 5] = [
        FunItem::HappyCat,
        FunItem::Nugget,
        FunItem::SadCat,
        FunItem::Jiafei,
        FunItem::Neilong,
    ];
}

/// Item families; one spawner and one arena index per family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemFamily {
    Coin,
    Hazard,
    Magnet,
    GrowthBooster,
    Fun,
}

impl ItemFamily {
    pub const ALL: [ItemFamily; 5] = [
        ItemFamily::Coin,
        ItemFamily::Hazard,
        ItemFamily::Magnet,
        ItemFamily::GrowthBooster,
        ItemFamily::Fun,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemFamily::Coin => "coin",
            ItemFamily::Hazard => "hazard",
            ItemFamily::Magnet => "magnet",
            ItemFamily::GrowthBooster => "growth",
            ItemFamily::Fun => "fun",
        }
    }
}

/// Concrete item kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Coin,
    Hazard,
    Magnet,
    GrowthBooster,
    Fun(FunItem),
}

impl ItemKind {
    pub fn family(&self) -> ItemFamily {
        match self {
            ItemKind::Coin => ItemFamily::Coin,
            ItemKind::Hazard => ItemFamily::Hazard,
            ItemKind::Magnet => ItemFamily::Magnet,
            ItemKind::GrowthBooster => ItemFamily::GrowthBooster,
            ItemKind::Fun(_) => ItemFamily::Fun,
        }
    }

    /// Effect dispatched when the actor collects this item
    pub fn effect(&self) -> EffectKind {
        match self {
            ItemKind::Coin => EffectKind::CollectCoin,
            ItemKind::Hazard => EffectKind::HitHazard,
            ItemKind::Magnet => EffectKind::ActivateMagnet,
            ItemKind::GrowthBooster => EffectKind::ActivateGrowth,
            ItemKind::Fun(item) => EffectKind::Cosmetic(*item),
        }
    }
}

/// Collision payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    CollectCoin,
    HitHazard,
    ActivateMagnet,
    ActivateGrowth,
    Cosmetic(FunItem),
}

/// How an item is currently moving
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    /// Linear fall from y=0 to the track bottom
    Falling,
    /// Pulled toward the actor by the magnet; scored on arrival
    Attracted {
        from: Vec2,
        started_at: u64,
        duration_ms: u64,
    },
}

/// A falling item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    pub bounds: Aabb,
    pub fall_duration_ms: u64,
    /// Play time at spawn
    pub spawned_at: u64,
    /// Set once when the item is resolved; never cleared
    pub consumed: bool,
    pub motion: Motion,
}

impl Item {
    /// Fraction of the fall completed at play time `now` (0..=1)
    pub fn fall_progress(&self, now: u64) -> f32 {
        if self.fall_duration_ms == 0 {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.spawned_at);
        (elapsed as f32 / self.fall_duration_ms as f32).min(1.0)
    }

    pub fn fall_complete(&self, now: u64) -> bool {
        now.saturating_sub(self.spawned_at) >= self.fall_duration_ms
    }

    /// Recompute the position for play time `now`. `target` is where attracted
    /// items are heading (the actor centre).
    pub fn advance(&mut self, now: u64, track_height: f32, target: Vec2) {
        match self.motion {
            Motion::Falling => {
                self.bounds.pos.y = track_height * self.fall_progress(now);
            }
            Motion::Attracted {
                from,
                started_at,
                duration_ms,
            } => {
                let t = if duration_ms == 0 {
                    1.0
                } else {
                    (now.saturating_sub(started_at) as f32 / duration_ms as f32).min(1.0)
                };
                let dest = target - self.bounds.size * 0.5;
                self.bounds.pos = from.lerp(dest, t);
            }
        }
    }

    /// Attraction finished at play time `now`
    pub fn arrived(&self, now: u64) -> bool {
        match self.motion {
            Motion::Attracted {
                started_at,
                duration_ms,
                ..
            } => now.saturating_sub(started_at) >= duration_ms,
            Motion::Falling => false,
        }
    }
}

/// Actor look as seen by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActorAppearance {
    #[default]
    Default,
    Magnetized,
}

/// The player-controlled actor, pinned to the bottom of the track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub appearance: ActorAppearance,
}

impl Actor {
    /// Centred on the track bottom
    pub fn new(track_width: f32, track_height: f32, tuning: &Tuning) -> Self {
        let x = clamp_to_track(
            (track_width - tuning.actor_width) * 0.5,
            tuning.actor_width,
            track_width,
        );
        Self {
            x,
            y: (track_height - tuning.actor_height).max(0.0),
            width: tuning.actor_width,
            height: tuning.actor_height,
            appearance: ActorAppearance::Default,
        }
    }

    /// Move toward a target x, clamped to the track. Returns true if the
    /// position changed.
    pub fn move_to(&mut self, target_x: f32, track_width: f32) -> bool {
        if !target_x.is_finite() {
            return false;
        }
        let x = clamp_to_track(target_x, self.width, track_width);
        if x == self.x {
            return false;
        }
        self.x = x;
        true
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.bounds().center()
    }
}

/// Game mode chosen at session start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ModeVariant {
    /// Lives, no clock
    #[default]
    Classic,
    /// Countdown, hazards cost score
    Challenge,
    /// Countdown plus cosmetic drops
    Fun,
}

impl ModeVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeVariant::Classic => "classic",
            ModeVariant::Challenge => "challenge",
            ModeVariant::Fun => "fun",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" => Some(ModeVariant::Classic),
            "challenge" | "time" => Some(ModeVariant::Challenge),
            "fun" => Some(ModeVariant::Fun),
            _ => None,
        }
    }

    pub fn has_lives(&self) -> bool {
        matches!(self, ModeVariant::Classic)
    }

    pub fn has_countdown(&self) -> bool {
        !self.has_lives()
    }
}

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Running,
    Paused,
    /// Terminal
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    LivesExhausted,
    TimeExpired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalReason {
    Collected,
    Escaped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUp {
    Magnet,
    Growth,
}

/// Outcome handed to the presentation layer when a session ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    pub final_score: u32,
    pub highest_score: u32,
    pub mode: ModeVariant,
    pub reason: EndReason,
}

/// Events emitted for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ItemSpawned {
        id: ItemId,
        kind: ItemKind,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fall_duration_ms: u64,
    },
    ItemMoved {
        id: ItemId,
        x: f32,
        y: f32,
    },
    ItemResized {
        id: ItemId,
        width: f32,
        height: f32,
    },
    ItemRemoved {
        id: ItemId,
        reason: RemovalReason,
    },
    EffectTriggered {
        effect: EffectKind,
        cue: SoundCue,
    },
    ScoreChanged {
        score: u32,
    },
    LivesChanged {
        lives: u32,
    },
    TimeRemainingChanged {
        ms: u64,
    },
    PowerUpChanged {
        power_up: PowerUp,
        active: bool,
    },
    ActorMoved {
        x: f32,
    },
    ActorAppearanceChanged {
        appearance: ActorAppearance,
    },
    Paused,
    Resumed,
    SessionEnded(SessionResult),
}

/// Mutable per-session counters. Mutated only through these methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub mode: ModeVariant,
    pub score: u32,
    /// Meaningful in Classic only
    pub lives: u32,
    /// Countdown modes only; refreshed by the tick
    pub remaining_time_ms: Option<u64>,
    /// Size multiplier for hazards (>= 1)
    pub hazard_scale: f32,
    /// Play time at which the magnet window closes
    pub magnet_expires_at: Option<u64>,
    /// Play time at which the growth window closes
    pub growth_expires_at: Option<u64>,
}

impl SessionState {
    pub fn new(mode: ModeVariant, tuning: &Tuning) -> Self {
        Self {
            phase: SessionPhase::Running,
            mode,
            score: 0,
            lives: if mode.has_lives() { tuning.classic_lives } else { 0 },
            remaining_time_ms: mode.has_countdown().then_some(tuning.countdown_ms),
            hazard_scale: 1.0,
            magnet_expires_at: None,
            growth_expires_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    pub fn is_ended(&self) -> bool {
        self.phase == SessionPhase::Ended
    }

    pub fn magnet_active(&self) -> bool {
        self.magnet_expires_at.is_some()
    }

    pub fn growth_active(&self) -> bool {
        self.growth_expires_at.is_some()
    }

    /// Add points. Returns true when the new score lands on a milestone.
    pub fn increase_score(&mut self, amount: u32, milestone: u32) -> bool {
        self.score = self.score.saturating_add(amount);
        amount > 0 && milestone > 0 && self.score % milestone == 0
    }

    /// Subtract points, never below zero
    pub fn decrease_score(&mut self, amount: u32) {
        self.score = self.score.saturating_sub(amount);
    }

    /// Remove one life; returns the lives left
    pub fn lose_life(&mut self) -> u32 {
        self.lives = self.lives.saturating_sub(1);
        self.lives
    }
}
