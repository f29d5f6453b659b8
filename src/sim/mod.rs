//! Session simulation module
//!
//! All gameplay logic lives here. Nothing in this module spawns tasks or reads
//! a clock: callers pass the current time in milliseconds, which keeps every
//! rule testable without a runtime.

pub mod aabb;
pub mod arena;
pub mod collision;
pub mod effects;
pub mod session;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod timer;

pub use aabb::Aabb;
pub use arena::{Arena, ItemDraft};
pub use collision::{arrived_items, attraction_candidates, overlapping_items};
pub use effects::{EffectChanges, apply_effect, tighten_difficulty};
pub use session::{Session, SessionParams, SessionSnapshot, SpawnOutcome};
pub use spawner::{SpawnerConfig, Spawners};
pub use state::{
    Actor, ActorAppearance, EffectKind, EndReason, FunItem, GameEvent, Item, ItemFamily, ItemId,
    ItemKind, ModeVariant, Motion, PowerUp, RemovalReason, SessionPhase, SessionResult,
    SessionState,
};
pub use tick::{TickInput, apply_input, tick};
pub use timer::{Stopwatch, SuspendableTimer};
