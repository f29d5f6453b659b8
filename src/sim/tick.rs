//! Per-frame session advance
//!
//! Order within one tick:
//! 1. Apply input (pause toggle, actor target)
//! 2. Countdown (may end the session)
//! 3. Power-up expiry
//! 4. Motion and escapes
//! 5. Magnet capture, position events
//! 6. Resolution: magnet arrivals, then touch overlaps

use super::collision::{arrived_items, attraction_candidates, overlapping_items};
use super::effects::expire_power_ups;
use super::session::Session;
use super::state::{ActorAppearance, EndReason, GameEvent, Motion, PowerUp, RemovalReason};

/// Input collected from the presentation layer since the last tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Target actor x (touch/drag position)
    pub actor_target: Option<f32>,
    /// Pause toggle
    pub pause: bool,
}

/// Apply input without advancing time
pub fn apply_input(session: &mut Session, input: &TickInput, now: u64) {
    if input.pause {
        if let Err(err) = session.toggle_pause(now) {
            log::debug!("Ignoring pause toggle: {err}");
        }
    }
    if let Some(x) = input.actor_target {
        session.move_actor(x);
    }
}

/// Advance the session to monotonic time `now`
pub fn tick(session: &mut Session, input: &TickInput, now: u64) {
    apply_input(session, input, now);

    // Paused freezes everything; Ended is terminal
    if !session.state.is_running() {
        return;
    }

    if update_countdown(session, now) {
        return;
    }

    let play_now = session.clock.elapsed(now);
    expire(session, play_now);

    let track_height = session.params.track_height;
    let actor_center = session.actor.center();
    for item in session.arena.tick(play_now, track_height, actor_center) {
        session.push(GameEvent::ItemRemoved {
            id: item.id,
            reason: RemovalReason::Escaped,
        });
    }

    if session.state.magnet_active() {
        let range = session.tuning.magnet_range;
        let pull_ms = session.tuning.magnet_pull_ms;
        for id in attraction_candidates(&session.arena, actor_center, range) {
            if let Some(item) = session.arena.get_mut(id) {
                item.motion = Motion::Attracted {
                    from: item.bounds.pos,
                    started_at: play_now,
                    duration_ms: pull_ms,
                };
            }
        }
    }

    if session.tuning.emit_position_ticks {
        let moved: Vec<GameEvent> = session
            .arena
            .iter()
            .map(|item| GameEvent::ItemMoved {
                id: item.id,
                x: item.bounds.pos.x,
                y: item.bounds.pos.y,
            })
            .collect();
        for event in moved {
            session.push(event);
        }
    }

    for id in arrived_items(&session.arena, play_now) {
        if !session.state.is_running() {
            return;
        }
        session.resolve_item(id, play_now);
    }

    let actor_box = session.actor.bounds();
    for id in overlapping_items(&session.arena, &actor_box) {
        if !session.state.is_running() {
            return;
        }
        session.resolve_item(id, play_now);
    }
}

/// Refresh the countdown. Returns true if it ran out and ended the session.
fn update_countdown(session: &mut Session, now: u64) -> bool {
    let Some(remaining) = session.countdown.map(|timer| timer.remaining(now)) else {
        return false;
    };
    session.state.remaining_time_ms = Some(remaining);

    let second = remaining / 1000;
    if session.announced_second != Some(second) {
        session.announced_second = Some(second);
        session.push(GameEvent::TimeRemainingChanged { ms: remaining });
    }

    if remaining == 0 {
        session.end_session(EndReason::TimeExpired);
        return true;
    }
    false
}

fn expire(session: &mut Session, play_now: u64) {
    let expired = expire_power_ups(&mut session.state, play_now, &session.tuning);

    if expired.magnet {
        session.push(GameEvent::PowerUpChanged {
            power_up: PowerUp::Magnet,
            active: false,
        });
        session.set_appearance(ActorAppearance::Default);
        log::debug!("Magnet expired");
    }
    if let Some(shrink) = expired.growth_shrink {
        session.resize_hazards(shrink);
        session.push(GameEvent::PowerUpChanged {
            power_up: PowerUp::Growth,
            active: false,
        });
        log::debug!("Growth booster expired");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ItemFamily;
    use crate::sim::aabb::Aabb;
    use crate::sim::arena::ItemDraft;
    use crate::sim::session::tests::{drop_on_actor, session};
    use crate::sim::state::{ItemKind, ModeVariant, SessionPhase};

    fn idle() -> TickInput {
        TickInput::default()
    }

    #[test]
    fn test_tick_pause_toggle() {
        let mut s = session(ModeVariant::Classic);
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut s, &pause, 100);
        assert_eq!(s.phase(), SessionPhase::Paused);
        tick(&mut s, &pause, 200);
        assert_eq!(s.phase(), SessionPhase::Running);
    }

    #[test]
    fn test_paused_items_do_not_move() {
        let mut s = session(ModeVariant::Classic);
        s.spawn(ItemFamily::Coin, 0);
        tick(&mut s, &idle(), 1000);
        let y = s.arena.iter().next().unwrap().bounds.pos.y;

        s.pause(1000).unwrap();
        tick(&mut s, &idle(), 50_000);
        assert_eq!(s.arena.iter().next().unwrap().bounds.pos.y, y);

        // Play time resumes where it stopped
        s.resume(50_000).unwrap();
        tick(&mut s, &idle(), 50_500);
        let after = s.arena.iter().next().unwrap().bounds.pos.y;
        assert!((after - 1920.0 * 1500.0 / 3000.0).abs() < 0.01);
    }

    #[test]
    fn test_escaped_item_has_no_effect() {
        let mut s = session(ModeVariant::Classic);
        s.move_actor(0.0);
        let id = s
            .arena
            .insert(ItemDraft {
                kind: ItemKind::Hazard,
                bounds: Aabb::new(900.0, 0.0, 100.0, 100.0),
                fall_duration_ms: 1000,
                spawned_at: 0,
            })
            .unwrap();
        s.drain_events();

        tick(&mut s, &idle(), 1000);
        assert!(s.arena.get(id).is_none());
        assert_eq!(s.state.lives, 5);
        assert!(s.drain_events().contains(&GameEvent::ItemRemoved {
            id,
            reason: RemovalReason::Escaped
        }));
    }

    #[test]
    fn test_collision_resolves_coin() {
        let mut s = session(ModeVariant::Classic);
        let id = drop_on_actor(&mut s, ItemKind::Coin);

        // y = 1920 * t / 100_000; pick t so the coin lands inside the actor box
        let actor_y = s.actor.bounds().pos.y;
        let t = ((actor_y + 10.0) / 1920.0 * 100_000.0) as u64;
        tick(&mut s, &idle(), t);

        assert_eq!(s.state.score, 10);
        assert!(s.arena.get(id).is_none());
    }

    #[test]
    fn test_simultaneous_overlaps_resolve_independently() {
        let mut s = session(ModeVariant::Challenge);
        let actor = s.actor.bounds();
        let t = 50_000;
        for offset in [0.0, 40.0] {
            s.arena
                .insert(ItemDraft {
                    kind: ItemKind::Coin,
                    bounds: Aabb::new(actor.pos.x + offset, 0.0, 100.0, 100.0),
                    // Lands at actor.pos.y + 10 at time t
                    fall_duration_ms: (1920.0 * t as f32 / (actor.pos.y + 10.0)) as u64,
                    spawned_at: 0,
                })
                .unwrap();
        }
        tick(&mut s, &idle(), t);
        assert_eq!(s.state.score, 20);
        assert!(s.arena.is_empty());
    }

    #[test]
    fn test_countdown_expiry_ends_session() {
        let mut s = session(ModeVariant::Challenge);
        s.state.score = 40;
        tick(&mut s, &idle(), 59_999);
        assert_eq!(s.phase(), SessionPhase::Running);
        tick(&mut s, &idle(), 60_000);
        assert_eq!(s.phase(), SessionPhase::Ended);
        assert_eq!(s.result().unwrap().reason, EndReason::TimeExpired);
        assert_eq!(s.result().unwrap().final_score, 40);

        // A late hazard or second expiry changes nothing
        tick(&mut s, &idle(), 61_000);
        assert_eq!(s.end_session(EndReason::LivesExhausted), None);
    }

    #[test]
    fn test_time_remaining_announced_per_second() {
        let mut s = session(ModeVariant::Fun);
        s.drain_events();
        for now in (0..=3000).step_by(16) {
            tick(&mut s, &idle(), now);
        }
        let announced: Vec<u64> = s
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::TimeRemainingChanged { ms } => Some(ms / 1000),
                _ => None,
            })
            .collect();
        assert_eq!(announced, vec![59, 58, 57]);
    }

    #[test]
    fn test_magnet_expires_and_restores_actor() {
        let mut s = session(ModeVariant::Classic);
        let magnet = drop_on_actor(&mut s, ItemKind::Magnet);
        s.resolve_item(magnet, 0);
        assert!(s.state.magnet_active());
        assert_eq!(s.actor.appearance, ActorAppearance::Magnetized);

        let duration = s.tuning.magnet_duration_ms;
        tick(&mut s, &idle(), duration - 1);
        assert!(s.state.magnet_active());
        tick(&mut s, &idle(), duration);
        assert!(!s.state.magnet_active());
        assert_eq!(s.actor.appearance, ActorAppearance::Default);
        assert!(s.drain_events().contains(&GameEvent::ActorAppearanceChanged {
            appearance: ActorAppearance::Default
        }));
    }

    #[test]
    fn test_magnet_pulls_nearby_coin() {
        let mut s = session(ModeVariant::Classic);
        let magnet = drop_on_actor(&mut s, ItemKind::Magnet);
        s.resolve_item(magnet, 0);

        let center = s.actor.center();
        let coin = s
            .arena
            .insert(ItemDraft {
                kind: ItemKind::Coin,
                // Just above the actor, inside magnet range, not touching
                bounds: Aabb::new(center.x - 50.0, 0.0, 100.0, 100.0),
                fall_duration_ms: 100_000,
                spawned_at: 0,
            })
            .unwrap();
        // Put the coin ~250px above the actor centre at t=100
        let target_y = center.y - 250.0 - 50.0;
        s.arena.get_mut(coin).unwrap().fall_duration_ms =
            (1920.0 * 100.0 / target_y) as u64;

        tick(&mut s, &idle(), 100);
        assert!(matches!(
            s.arena.get(coin).unwrap().motion,
            Motion::Attracted { .. }
        ));
        assert_eq!(s.state.score, 0);

        let pull = s.tuning.magnet_pull_ms;
        tick(&mut s, &idle(), 100 + pull);
        assert!(s.arena.get(coin).is_none());
        assert_eq!(s.state.score, 10);
    }

    #[test]
    fn test_growth_reverts_on_live_hazards() {
        let mut s = session(ModeVariant::Classic);
        let booster = drop_on_actor(&mut s, ItemKind::GrowthBooster);
        s.resolve_item(booster, 0);

        s.move_actor(0.0);
        let hazard = s
            .arena
            .insert(ItemDraft {
                kind: ItemKind::Hazard,
                bounds: Aabb::new(900.0, 0.0, 150.0, 150.0),
                fall_duration_ms: 100_000,
                spawned_at: 0,
            })
            .unwrap();

        let duration = s.tuning.growth_duration_ms;
        tick(&mut s, &idle(), duration);
        let size = s.arena.get(hazard).unwrap().bounds.size.x;
        assert!((size - 100.0).abs() < 0.001);
        assert_eq!(s.state.hazard_scale, 1.0);
    }
}
