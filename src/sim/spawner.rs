//! Per-family spawner configuration and spawn rolls
//!
//! The spawners here are plain data. Timing lives in the runtime: one producer
//! task per active family reads `period_ms` fresh before every wait, so a
//! difficulty change applies from the next cycle on.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{FunItem, ItemFamily, ItemKind, ModeVariant};
use crate::settings::{SpawnTuning, Tuning};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnerConfig {
    pub family: ItemFamily,
    pub period_ms: u64,
    pub drop_duration_ms: u64,
    /// Bernoulli chance per firing (1.0 for unconditional spawners)
    pub probability: f64,
    pub active: bool,
}

impl SpawnerConfig {
    fn new(family: ItemFamily, spawn: SpawnTuning, drop_duration_ms: u64, active: bool) -> Self {
        Self {
            family,
            period_ms: spawn.period_ms,
            drop_duration_ms,
            probability: spawn.probability,
            active,
        }
    }

    pub fn is_conditional(&self) -> bool {
        self.probability < 1.0
    }
}

/// One config per item family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spawners {
    configs: Vec<SpawnerConfig>,
}

impl Spawners {
    /// Spawner set for a mode. The fun spawner only runs in Fun mode.
    pub fn for_mode(mode: ModeVariant, tuning: &Tuning) -> Self {
        let drop = tuning.drop_duration_ms;
        let configs = ItemFamily::ALL
            .iter()
            .map(|family| match family {
                ItemFamily::Coin => SpawnerConfig::new(*family, tuning.coin, drop, true),
                ItemFamily::Hazard => SpawnerConfig::new(*family, tuning.hazard, drop, true),
                ItemFamily::Magnet => SpawnerConfig::new(*family, tuning.magnet, drop, true),
                ItemFamily::GrowthBooster => {
                    SpawnerConfig::new(*family, tuning.growth, drop, true)
                }
                ItemFamily::Fun => SpawnerConfig::new(
                    *family,
                    tuning.fun,
                    tuning.fun_drop_duration_ms,
                    mode == ModeVariant::Fun,
                ),
            })
            .collect();
        Self { configs }
    }

    pub fn get(&self, family: ItemFamily) -> Option<&SpawnerConfig> {
        self.configs.iter().find(|c| c.family == family)
    }

    pub fn get_mut(&mut self, family: ItemFamily) -> Option<&mut SpawnerConfig> {
        self.configs.iter_mut().find(|c| c.family == family)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpawnerConfig> {
        self.configs.iter()
    }

    /// Period for the next cycle, `None` when the family is inactive
    pub fn period_ms(&self, family: ItemFamily) -> Option<u64> {
        self.get(family).filter(|c| c.active).map(|c| c.period_ms)
    }

    /// Stop every spawner permanently (session end)
    pub fn deactivate_all(&mut self) {
        for config in &mut self.configs {
            config.active = false;
        }
    }
}

/// Roll the Bernoulli trial for a firing. Unconditional spawners always pass.
pub fn roll_chance(config: &SpawnerConfig, rng: &mut impl Rng) -> bool {
    if !config.is_conditional() {
        return true;
    }
    rng.random_bool(config.probability.clamp(0.0, 1.0))
}

/// Uniform spawn x in `[0, track_width - item_width]`, 0 when the range is
/// empty or not finite
pub fn roll_spawn_x(track_width: f32, item_width: f32, rng: &mut impl Rng) -> f32 {
    let max = track_width - item_width;
    if max > 0.0 && max.is_finite() {
        rng.random_range(0.0..=max)
    } else {
        0.0
    }
}

/// Concrete kind for a firing of `family`
pub fn roll_kind(family: ItemFamily, rng: &mut impl Rng) -> ItemKind {
    match family {
        ItemFamily::Coin => ItemKind::Coin,
        ItemFamily::Hazard => ItemKind::Hazard,
        ItemFamily::Magnet => ItemKind::Magnet,
        ItemFamily::GrowthBooster => ItemKind::GrowthBooster,
        ItemFamily::Fun => ItemKind::Fun(FunItem::ALL[rng.random_range(0..FunItem::ALL.len())]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_fun_spawner_only_in_fun_mode() {
        let tuning = Tuning::default();
        assert_eq!(
            Spawners::for_mode(ModeVariant::Classic, &tuning).period_ms(ItemFamily::Fun),
            None
        );
        assert_eq!(
            Spawners::for_mode(ModeVariant::Fun, &tuning).period_ms(ItemFamily::Fun),
            Some(tuning.fun.period_ms)
        );
    }

    #[test]
    fn test_initial_periods() {
        let spawners = Spawners::for_mode(ModeVariant::Classic, &Tuning::default());
        assert_eq!(spawners.period_ms(ItemFamily::Coin), Some(1000));
        assert_eq!(spawners.period_ms(ItemFamily::Hazard), Some(4000));
        assert!(spawners.get(ItemFamily::Magnet).unwrap().is_conditional());
        assert!(!spawners.get(ItemFamily::Coin).unwrap().is_conditional());
    }

    #[test]
    fn test_deactivate_all() {
        let mut spawners = Spawners::for_mode(ModeVariant::Fun, &Tuning::default());
        spawners.deactivate_all();
        assert!(ItemFamily::ALL.iter().all(|f| spawners.period_ms(*f).is_none()));
    }

    #[test]
    fn test_zero_probability_never_spawns() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut config = Spawners::for_mode(ModeVariant::Classic, &Tuning::default())
            .get(ItemFamily::Magnet)
            .copied()
            .unwrap();
        config.probability = 0.0;
        assert!((0..1000).all(|_| !roll_chance(&config, &mut rng)));
    }

    #[test]
    fn test_degenerate_track_spawns_at_zero() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(roll_spawn_x(80.0, 100.0, &mut rng), 0.0);
        assert_eq!(roll_spawn_x(100.0, 100.0, &mut rng), 0.0);
        assert_eq!(roll_spawn_x(f32::INFINITY, 100.0, &mut rng), 0.0);
        assert_eq!(roll_spawn_x(1080.0, f32::NAN, &mut rng), 0.0);
    }

    proptest! {
        #[test]
        fn prop_spawn_x_within_track(seed in any::<u64>(), width in 100.0f32..4000.0) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let x = roll_spawn_x(width, 100.0, &mut rng);
            prop_assert!(x >= 0.0 && x <= width - 100.0);
        }
    }
}
