//! Session lifecycle: Running / Paused / Ended
//!
//! A [`Session`] owns every piece of mutable game state: the counters, the
//! actor, the arena, the spawner configs and the clocks. All mutation goes
//! through its methods, and every observable change is queued as a
//! [`GameEvent`] for the presentation layer.
//!
//! Times passed in (`now`) are milliseconds on a monotonic clock. Item motion
//! and power-up windows run on *play time*, which stops while paused.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::arena::{Arena, ItemDraft};
use super::effects::{apply_effect, tighten_difficulty};
use super::spawner::{Spawners, roll_chance, roll_kind, roll_spawn_x};
use super::state::{
    Actor, ActorAppearance, EndReason, GameEvent, ItemFamily, ItemId, ModeVariant, PowerUp,
    RemovalReason, SessionPhase, SessionResult, SessionState,
};
use super::timer::{Stopwatch, SuspendableTimer};
use crate::error::EngineError;
use crate::highscores::HighScoreStore;
use crate::settings::Tuning;

/// Session start parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionParams {
    pub mode: ModeVariant,
    pub track_width: f32,
    pub track_height: f32,
}

impl SessionParams {
    /// Non-finite or negative track sizes collapse to 0
    pub fn new(mode: ModeVariant, track_width: f32, track_height: f32) -> Self {
        Self {
            mode,
            track_width: track_extent(track_width),
            track_height: track_extent(track_height),
        }
    }
}

fn track_extent(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// Result of one spawner firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    Spawned(ItemId),
    /// Session paused; the firing is dropped
    Paused,
    Ended,
    /// Family not active in this mode
    Inactive,
    ArenaFull,
    /// Conditional spawner lost its roll
    RollFailed,
}

/// Read-only view for the presentation layer and tests
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub mode: ModeVariant,
    pub score: u32,
    pub lives: u32,
    pub remaining_time_ms: Option<u64>,
    pub live_items: usize,
    pub coin_period_ms: Option<u64>,
    pub hazard_period_ms: Option<u64>,
    pub drop_duration_ms: Option<u64>,
    pub hazard_scale: f32,
    pub magnet_active: bool,
    pub actor_x: f32,
}

pub struct Session {
    pub(crate) state: SessionState,
    pub(crate) actor: Actor,
    pub(crate) arena: Arena,
    pub(crate) spawners: Spawners,
    /// Play time: stops while paused
    pub(crate) clock: Stopwatch,
    pub(crate) countdown: Option<SuspendableTimer>,
    pub(crate) params: SessionParams,
    pub(crate) tuning: Tuning,
    /// Last whole second announced by `TimeRemainingChanged`
    pub(crate) announced_second: Option<u64>,
    rng: Pcg32,
    store: Box<dyn HighScoreStore + Send>,
    events: Vec<GameEvent>,
    result: Option<SessionResult>,
}

impl Session {
    /// Start a session at time `now`
    pub fn new(
        params: SessionParams,
        tuning: Tuning,
        store: Box<dyn HighScoreStore + Send>,
        now: u64,
    ) -> Self {
        let rng = match tuning.seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::seed_from_u64(rand::random()),
        };
        let state = SessionState::new(params.mode, &tuning);
        let countdown = params
            .mode
            .has_countdown()
            .then(|| SuspendableTimer::started(tuning.countdown_ms, now));

        let mut session = Self {
            state,
            actor: Actor::new(params.track_width, params.track_height, &tuning),
            arena: Arena::new(tuning.max_items),
            spawners: Spawners::for_mode(params.mode, &tuning),
            clock: Stopwatch::started(now),
            countdown,
            params,
            tuning,
            announced_second: None,
            rng,
            store,
            events: Vec::new(),
            result: None,
        };

        session.push(GameEvent::ScoreChanged { score: 0 });
        if session.state.mode.has_lives() {
            session.push(GameEvent::LivesChanged {
                lives: session.state.lives,
            });
        }
        if let Some(ms) = session.state.remaining_time_ms {
            session.announced_second = Some(ms / 1000);
            session.push(GameEvent::TimeRemainingChanged { ms });
        }
        session.push(GameEvent::ActorMoved { x: session.actor.x });

        log::info!(
            "Session started: mode={}, track={}x{}",
            params.mode.as_str(),
            params.track_width,
            params.track_height
        );
        session
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn spawners(&self) -> &Spawners {
        &self.spawners
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Set once the session has ended normally
    pub fn result(&self) -> Option<SessionResult> {
        self.result
    }

    /// Play time (paused spans excluded) at monotonic time `now`
    pub fn play_time(&self, now: u64) -> u64 {
        self.clock.elapsed(now)
    }

    /// Take every event queued since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn snapshot(&self, now: u64) -> SessionSnapshot {
        let remaining_time_ms = match (&self.countdown, self.state.is_ended()) {
            (Some(timer), false) => Some(timer.remaining(now)),
            _ => self.state.remaining_time_ms,
        };
        let coin = self.spawners.get(ItemFamily::Coin);
        SessionSnapshot {
            phase: self.state.phase,
            mode: self.state.mode,
            score: self.state.score,
            lives: self.state.lives,
            remaining_time_ms,
            live_items: self.arena.count(),
            coin_period_ms: self.spawners.period_ms(ItemFamily::Coin),
            hazard_period_ms: self.spawners.period_ms(ItemFamily::Hazard),
            drop_duration_ms: coin.map(|c| c.drop_duration_ms),
            hazard_scale: self.state.hazard_scale,
            magnet_active: self.state.magnet_active(),
            actor_x: self.actor.x,
        }
    }

    /// Move the actor toward `x`. Ignored unless running.
    pub fn move_actor(&mut self, x: f32) -> bool {
        if !self.state.is_running() {
            return false;
        }
        if self.actor.move_to(x, self.params.track_width) {
            self.push(GameEvent::ActorMoved { x: self.actor.x });
            true
        } else {
            false
        }
    }

    /// Handle one firing of a family's spawner
    pub fn spawn(&mut self, family: ItemFamily, now: u64) -> SpawnOutcome {
        match self.state.phase {
            SessionPhase::Ended => return SpawnOutcome::Ended,
            SessionPhase::Paused => return SpawnOutcome::Paused,
            SessionPhase::Running => {}
        }
        let Some(config) = self.spawners.get(family).copied().filter(|c| c.active) else {
            return SpawnOutcome::Inactive;
        };
        if self.arena.is_full() {
            log::debug!("Skipping {} spawn: arena full", family.as_str());
            return SpawnOutcome::ArenaFull;
        }
        if !roll_chance(&config, &mut self.rng) {
            return SpawnOutcome::RollFailed;
        }

        let kind = roll_kind(family, &mut self.rng);
        let scale = if family == ItemFamily::Hazard {
            self.state.hazard_scale
        } else {
            1.0
        };
        let size = self.tuning.item_size * scale;
        let x = roll_spawn_x(self.params.track_width, size, &mut self.rng);
        let draft = ItemDraft {
            kind,
            bounds: Aabb::new(x, 0.0, size, size),
            fall_duration_ms: config.drop_duration_ms,
            spawned_at: self.clock.elapsed(now),
        };

        match self.arena.insert(draft) {
            Ok(id) => {
                self.push(GameEvent::ItemSpawned {
                    id,
                    kind,
                    x,
                    y: 0.0,
                    width: size,
                    height: size,
                    fall_duration_ms: config.drop_duration_ms,
                });
                SpawnOutcome::Spawned(id)
            }
            Err(err) => {
                log::debug!("Skipping {} spawn: {err}", family.as_str());
                SpawnOutcome::ArenaFull
            }
        }
    }

    /// Running -> Paused. Idempotent while paused.
    pub fn pause(&mut self, now: u64) -> Result<(), EngineError> {
        match self.state.phase {
            SessionPhase::Running => {
                self.state.phase = SessionPhase::Paused;
                self.clock.suspend(now);
                if let Some(timer) = self.countdown.as_mut() {
                    timer.suspend(now);
                    self.state.remaining_time_ms = Some(timer.remaining(now));
                }
                self.push(GameEvent::Paused);
                log::info!("Session paused");
                Ok(())
            }
            SessionPhase::Paused => Ok(()),
            SessionPhase::Ended => Err(EngineError::InvalidStateTransition {
                from: SessionPhase::Ended,
                action: "pause",
            }),
        }
    }

    /// Paused -> Running. The countdown continues from where it stopped.
    pub fn resume(&mut self, now: u64) -> Result<(), EngineError> {
        match self.state.phase {
            SessionPhase::Paused => {
                self.state.phase = SessionPhase::Running;
                self.clock.resume(now);
                if let Some(timer) = self.countdown.as_mut() {
                    timer.resume(now);
                }
                self.push(GameEvent::Resumed);
                log::info!("Session resumed");
                Ok(())
            }
            from => Err(EngineError::InvalidStateTransition {
                from,
                action: "resume",
            }),
        }
    }

    pub fn toggle_pause(&mut self, now: u64) -> Result<(), EngineError> {
        match self.state.phase {
            SessionPhase::Running => self.pause(now),
            SessionPhase::Paused => self.resume(now),
            SessionPhase::Ended => Err(EngineError::InvalidStateTransition {
                from: SessionPhase::Ended,
                action: "toggle pause",
            }),
        }
    }

    /// Transition to Ended. Only the first call has any effect: it stops the
    /// spawners, settles the high score and emits `SessionEnded`.
    pub fn end_session(&mut self, reason: EndReason) -> Option<SessionResult> {
        if self.state.is_ended() {
            return None;
        }
        self.stop();

        let mode = self.state.mode;
        let score = self.state.score;
        let previous = self.store.load_high_score(mode);
        let highest_score = if score > previous {
            self.store.save_high_score(mode, score);
            score
        } else {
            previous
        };

        let result = SessionResult {
            final_score: score,
            highest_score,
            mode,
            reason,
        };
        self.result = Some(result);
        self.push(GameEvent::SessionEnded(result));
        log::info!(
            "Session ended ({:?}): score={}, best={}",
            reason,
            score,
            highest_score
        );
        Some(result)
    }

    /// Tear the session down without a result (the host went away)
    pub fn teardown(&mut self) {
        if !self.state.is_ended() {
            self.stop();
            log::info!("Session torn down");
        }
    }

    fn stop(&mut self) {
        self.state.phase = SessionPhase::Ended;
        self.spawners.deactivate_all();
        self.state.magnet_expires_at = None;
        self.state.growth_expires_at = None;
        self.arena.clear();
    }

    /// Claim an item and dispatch its effect once. Losing the claim (the item
    /// was already resolved or removed) is a silent no-op.
    pub(crate) fn resolve_item(&mut self, id: ItemId, play_now: u64) {
        if !self.state.is_running() {
            return;
        }
        let item = match self.arena.resolve(id) {
            Ok(item) => item,
            Err(err) => {
                log::debug!("{err}");
                return;
            }
        };
        self.push(GameEvent::ItemRemoved {
            id,
            reason: RemovalReason::Collected,
        });

        let effect = item.kind.effect();
        let (next, changes) = apply_effect(&self.state, effect, play_now, &self.tuning);
        self.state = next;
        self.push(GameEvent::EffectTriggered {
            effect,
            cue: changes.cue,
        });

        if changes.score_changed {
            self.push(GameEvent::ScoreChanged {
                score: self.state.score,
            });
        }
        if changes.lives_changed {
            self.push(GameEvent::LivesChanged {
                lives: self.state.lives,
            });
        }
        if changes.milestone && tighten_difficulty(&mut self.spawners, &self.tuning) {
            log::info!(
                "Difficulty up at {} points: coin period {:?}ms",
                self.state.score,
                self.spawners.period_ms(ItemFamily::Coin)
            );
        }
        if changes.magnet_activated {
            self.push(GameEvent::PowerUpChanged {
                power_up: PowerUp::Magnet,
                active: true,
            });
            self.set_appearance(ActorAppearance::Magnetized);
        }
        if let Some(factor) = changes.growth_factor {
            self.resize_hazards(factor);
            self.push(GameEvent::PowerUpChanged {
                power_up: PowerUp::Growth,
                active: true,
            });
        }
        if let Some(reason) = changes.end {
            self.end_session(reason);
        }
    }

    pub(crate) fn set_appearance(&mut self, appearance: ActorAppearance) {
        if self.actor.appearance != appearance {
            self.actor.appearance = appearance;
            self.push(GameEvent::ActorAppearanceChanged { appearance });
        }
    }

    /// Resize every live hazard by `factor`
    pub(crate) fn resize_hazards(&mut self, factor: f32) {
        for (id, size) in self.arena.scale_family(ItemFamily::Hazard, factor) {
            self.push(GameEvent::ItemResized {
                id,
                width: size.x,
                height: size.y,
            });
        }
    }
}
