//! Effect dispatch and the difficulty curve
//!
//! [`apply_effect`] is a pure function of the current [`SessionState`]: it
//! returns the next state plus a description of what changed. The session
//! applies the side effects (arena resizes, events, ending the session).

use super::spawner::Spawners;
use super::state::{EffectKind, EndReason, ItemFamily, SessionState};
use crate::cues::SoundCue;
use crate::settings::Tuning;

/// What an effect changed, for the caller to act on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectChanges {
    pub cue: SoundCue,
    pub score_changed: bool,
    pub lives_changed: bool,
    /// Score landed on a difficulty milestone
    pub milestone: bool,
    pub end: Option<EndReason>,
    pub magnet_activated: bool,
    /// Growth window opened with this factor
    pub growth_factor: Option<f32>,
}

impl EffectChanges {
    fn new(effect: EffectKind) -> Self {
        Self {
            cue: SoundCue::for_effect(effect),
            score_changed: false,
            lives_changed: false,
            milestone: false,
            end: None,
            magnet_activated: false,
            growth_factor: None,
        }
    }
}

/// Apply one effect at play time `now`
pub fn apply_effect(
    state: &SessionState,
    effect: EffectKind,
    now: u64,
    tuning: &Tuning,
) -> (SessionState, EffectChanges) {
    let mut next = state.clone();
    let mut changes = EffectChanges::new(effect);

    match effect {
        EffectKind::CollectCoin => {
            changes.milestone = next.increase_score(tuning.coin_score, tuning.milestone);
            changes.score_changed = next.score != state.score;
        }
        EffectKind::HitHazard => {
            if next.mode.has_lives() {
                let left = next.lose_life();
                changes.lives_changed = left != state.lives;
                if left == 0 {
                    changes.end = Some(EndReason::LivesExhausted);
                }
            } else {
                next.decrease_score(tuning.hazard_penalty);
                changes.score_changed = next.score != state.score;
            }
        }
        EffectKind::ActivateMagnet => {
            if !next.magnet_active() {
                next.magnet_expires_at = Some(now + tuning.magnet_duration_ms);
                changes.magnet_activated = true;
            }
        }
        EffectKind::ActivateGrowth => {
            if !next.growth_active() {
                next.hazard_scale *= tuning.growth_factor;
                next.growth_expires_at = Some(now + tuning.growth_duration_ms);
                changes.growth_factor = Some(tuning.growth_factor);
            }
        }
        EffectKind::Cosmetic(_) => {}
    }

    (next, changes)
}

/// Power-up windows that closed at play time `now`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Expired {
    pub magnet: bool,
    /// Hazards shrink by this factor (inverse of the growth factor)
    pub growth_shrink: Option<f32>,
}

/// Close any power-up window whose time has come
pub fn expire_power_ups(state: &mut SessionState, now: u64, tuning: &Tuning) -> Expired {
    let mut expired = Expired::default();

    if state.magnet_expires_at.is_some_and(|at| now >= at) {
        state.magnet_expires_at = None;
        expired.magnet = true;
    }

    if state.growth_expires_at.is_some_and(|at| now >= at) {
        state.growth_expires_at = None;
        state.hazard_scale = (state.hazard_scale / tuning.growth_factor).max(1.0);
        expired.growth_shrink = Some(1.0 / tuning.growth_factor);
    }

    expired
}

/// One step of the difficulty curve. Returns true if anything changed.
pub fn tighten_difficulty(spawners: &mut Spawners, tuning: &Tuning) -> bool {
    let mut changed = false;

    if let Some(coin) = spawners.get_mut(ItemFamily::Coin) {
        let period = tuning.coin_ratchet.tighten(coin.period_ms);
        changed |= period != coin.period_ms;
        coin.period_ms = period;
    }
    if let Some(hazard) = spawners.get_mut(ItemFamily::Hazard) {
        let period = tuning.hazard_ratchet.tighten(hazard.period_ms);
        changed |= period != hazard.period_ms;
        hazard.period_ms = period;
    }
    // Fun drops keep their fixed fall time
    for family in [
        ItemFamily::Coin,
        ItemFamily::Hazard,
        ItemFamily::Magnet,
        ItemFamily::GrowthBooster,
    ] {
        if let Some(config) = spawners.get_mut(family) {
            let drop = tuning.drop_ratchet.tighten(config.drop_duration_ms);
            changed |= drop != config.drop_duration_ms;
            config.drop_duration_ms = drop;
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{FunItem, ModeVariant};
    use proptest::prelude::*;

    fn state(mode: ModeVariant) -> SessionState {
        SessionState::new(mode, &Tuning::default())
    }

    #[test]
    fn test_coin_scores_ten() {
        let tuning = Tuning::default();
        let (next, changes) =
            apply_effect(&state(ModeVariant::Classic), EffectKind::CollectCoin, 0, &tuning);
        assert_eq!(next.score, 10);
        assert!(changes.score_changed);
        assert!(!changes.milestone);
        assert_eq!(changes.cue, SoundCue::CoinCollect);
    }

    #[test]
    fn test_hazard_classic_costs_life() {
        let tuning = Tuning::default();
        let mut current = state(ModeVariant::Classic);
        current.score = 40;
        current.lives = 2;

        let (next, changes) = apply_effect(&current, EffectKind::HitHazard, 0, &tuning);
        assert_eq!(next.lives, 1);
        assert_eq!(next.score, 40);
        assert!(changes.lives_changed);
        assert_eq!(changes.end, None);

        let (last, changes) = apply_effect(&next, EffectKind::HitHazard, 0, &tuning);
        assert_eq!(last.lives, 0);
        assert_eq!(changes.end, Some(EndReason::LivesExhausted));
    }

    #[test]
    fn test_hazard_challenge_costs_score() {
        let tuning = Tuning::default();
        let mut current = state(ModeVariant::Challenge);
        current.score = 5;

        let (next, changes) = apply_effect(&current, EffectKind::HitHazard, 0, &tuning);
        assert_eq!(next.score, 0);
        assert!(changes.score_changed);
        assert_eq!(changes.end, None);

        let (again, changes) = apply_effect(&next, EffectKind::HitHazard, 0, &tuning);
        assert_eq!(again.score, 0);
        assert!(!changes.score_changed);
    }

    #[test]
    fn test_magnet_activation_is_idempotent() {
        let tuning = Tuning::default();
        let (active, changes) = apply_effect(
            &state(ModeVariant::Classic),
            EffectKind::ActivateMagnet,
            1000,
            &tuning,
        );
        assert!(changes.magnet_activated);
        assert_eq!(
            active.magnet_expires_at,
            Some(1000 + tuning.magnet_duration_ms)
        );

        let (again, changes) = apply_effect(&active, EffectKind::ActivateMagnet, 3000, &tuning);
        assert!(!changes.magnet_activated);
        assert_eq!(again.magnet_expires_at, active.magnet_expires_at);
    }

    #[test]
    fn test_growth_window_round_trip() {
        let tuning = Tuning::default();
        let (mut grown, changes) =
            apply_effect(&state(ModeVariant::Classic), EffectKind::ActivateGrowth, 0, &tuning);
        assert_eq!(changes.growth_factor, Some(tuning.growth_factor));
        assert_eq!(grown.hazard_scale, tuning.growth_factor);

        let early = expire_power_ups(&mut grown, tuning.growth_duration_ms - 1, &tuning);
        assert_eq!(early, Expired::default());

        let expired = expire_power_ups(&mut grown, tuning.growth_duration_ms, &tuning);
        assert_eq!(expired.growth_shrink, Some(1.0 / tuning.growth_factor));
        assert_eq!(grown.hazard_scale, 1.0);
        assert!(!grown.growth_active());
    }

    #[test]
    fn test_cosmetic_changes_nothing() {
        let tuning = Tuning::default();
        let current = state(ModeVariant::Fun);
        let (next, changes) =
            apply_effect(&current, EffectKind::Cosmetic(FunItem::SadCat), 0, &tuning);
        assert_eq!(next, current);
        assert_eq!(changes.cue, SoundCue::SadCat);
        assert!(!changes.score_changed && !changes.lives_changed);
    }

    #[test]
    fn test_first_tightening_at_fifty() {
        let tuning = Tuning::default();
        let mut spawners = Spawners::for_mode(ModeVariant::Classic, &tuning);
        let mut current = state(ModeVariant::Classic);

        for coin in 1..=5 {
            let (next, changes) = apply_effect(&current, EffectKind::CollectCoin, 0, &tuning);
            current = next;
            if changes.milestone {
                tighten_difficulty(&mut spawners, &tuning);
            }
            let expected = if coin < 5 { 1000 } else { 900 };
            assert_eq!(spawners.period_ms(ItemFamily::Coin), Some(expected));
        }
        assert_eq!(spawners.period_ms(ItemFamily::Hazard), Some(3800));
        assert_eq!(spawners.get(ItemFamily::Coin).unwrap().drop_duration_ms, 2800);
        // Fun drops are not part of the curve
        assert_eq!(
            spawners.get(ItemFamily::Fun).unwrap().drop_duration_ms,
            tuning.fun_drop_duration_ms
        );
    }

    proptest! {
        #[test]
        fn prop_difficulty_floors_hold(milestones in 0usize..200) {
            let tuning = Tuning::default();
            let mut spawners = Spawners::for_mode(ModeVariant::Challenge, &tuning);
            let mut last_coin = u64::MAX;
            for _ in 0..milestones {
                tighten_difficulty(&mut spawners, &tuning);
                let coin = spawners.get(ItemFamily::Coin).unwrap().period_ms;
                prop_assert!(coin <= last_coin);
                last_coin = coin;
            }
            let coin = spawners.get(ItemFamily::Coin).unwrap();
            let hazard = spawners.get(ItemFamily::Hazard).unwrap();
            prop_assert!(coin.period_ms >= 400);
            prop_assert!(hazard.period_ms >= 1000);
            prop_assert!(coin.drop_duration_ms >= 1000);
            prop_assert!(hazard.drop_duration_ms >= 1000);
        }
    }
}
