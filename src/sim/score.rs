//! Score values and the combo gauge

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::item::{ItemKind, choose_reward, random_air_position};
use crate::config::{GameConfig, ScoreConfig};

/// Extra points for the `combo`-th consecutive hit of a flight
pub fn combo_bonus(combo: u32, config: &ScoreConfig) -> u64 {
    let linear = u64::from(combo.saturating_sub(1)) * config.combo_linear_bonus;
    let tier = config
        .combo_tier_bonus
        .iter()
        .filter(|(min_combo, _)| combo >= *min_combo)
        .map(|&(_, bonus)| bonus)
        .max()
        .unwrap_or(0);
    linear + tier
}

/// Points for defeating a regular enemy with the bird
pub fn enemy_defeat_points(combo: u32, config: &ScoreConfig) -> u64 {
    config.enemy_points + combo_bonus(combo, config)
}

/// Points for hitting the boss's open weak point
pub fn weak_point_points(combo: u32, config: &ScoreConfig) -> u64 {
    config.boss_weak_point_points + combo_bonus(combo, config)
}

/// Bonus for the blocks still standing when the game is won
pub fn tower_bonus(blocks: usize, config: &ScoreConfig) -> u64 {
    blocks as u64 * config.tower_bonus_per_block
}

/// Reward item waiting for the gauge-full flourish to finish
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingItem {
    pub kind: ItemKind,
    pub pos: Vec2,
    pub spawn_at: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComboGauge {
    pub value: u32,
    /// When the gauge last filled, for the HUD flash
    pub filled_at: Option<u64>,
}

/// Pick the reward for a full gauge and where it will appear
///
/// The item waits for the gauge flash and a short delay before spawning.
pub fn schedule_reward(config: &GameConfig, now: u64, rng: &mut impl Rng) -> Option<PendingItem> {
    let kind = choose_reward(config, rng)?;
    let pos = random_air_position(config, rng);
    log::info!("Combo gauge full; {kind:?} on its way");
    Some(PendingItem {
        kind,
        pos,
        spawn_at: now + config.gauge.flash_ms + config.gauge.item_spawn_delay_ms,
    })
}

impl ComboGauge {
    /// Charge the gauge for a scored hit; returns true when it fills
    ///
    /// The gauge empties on fill and any overflow is discarded.
    pub fn charge(&mut self, combo: u32, config: &GameConfig, now: u64) -> bool {
        let g = &config.gauge;
        self.value += g.increase_base + g.increase_per_combo * combo;
        if self.value < g.max {
            return false;
        }
        self.value = 0;
        self.filled_at = Some(now);
        true
    }

    pub fn ratio(&self, config: &GameConfig) -> f32 {
        if config.gauge.max == 0 {
            return 0.0;
        }
        (self.value as f32 / config.gauge.max as f32).min(1.0)
    }

    pub fn is_flashing(&self, config: &GameConfig, now: u64) -> bool {
        self.filled_at
            .is_some_and(|t| now.saturating_sub(t) < config.gauge.flash_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_combo_bonus_tiers() {
        let config = ScoreConfig::default();
        assert_eq!(combo_bonus(0, &config), 0);
        assert_eq!(combo_bonus(1, &config), 0);
        assert_eq!(combo_bonus(2, &config), 20);
        assert_eq!(combo_bonus(5, &config), 80 + 50);
        assert_eq!(combo_bonus(10, &config), 180 + 100);
        assert_eq!(combo_bonus(25, &config), 480 + 300);
    }

    #[test]
    fn test_point_values() {
        let config = ScoreConfig::default();
        assert_eq!(enemy_defeat_points(1, &config), 100);
        assert_eq!(enemy_defeat_points(3, &config), 140);
        assert_eq!(weak_point_points(1, &config), 250);
        assert_eq!(tower_bonus(4, &config), 400);
    }

    #[test]
    fn test_gauge_fills_once() {
        let config = GameConfig::default();
        let mut gauge = ComboGauge::default();

        let mut fills = 0;
        let mut now = 0;
        // 25 + 15 * 5 = 100 per hit
        for _ in 0..10 {
            now += 100;
            if gauge.charge(5, &config, now) {
                fills += 1;
            }
        }
        assert_eq!(fills, 1);
        assert_eq!(gauge.value, 0);
        assert_eq!(gauge.filled_at, Some(1000));
        assert!(gauge.is_flashing(&config, 1500));
        assert!(!gauge.is_flashing(&config, 1750));
    }

    #[test]
    fn test_overflow_is_discarded() {
        let config = GameConfig::default();
        let mut gauge = ComboGauge { value: 990, filled_at: None };
        assert!(gauge.charge(20, &config, 5));
        assert_eq!(gauge.value, 0);
    }

    #[test]
    fn test_reward_waits_for_flash() {
        let config = GameConfig::default();
        let mut rng = Pcg32::seed_from_u64(12);
        let item = schedule_reward(&config, 1000, &mut rng).unwrap();
        assert_eq!(item.spawn_at, 1000 + 750 + 500);
        assert!((300.0..=1180.0).contains(&item.pos.x));
        assert!((200.0..=500.0).contains(&item.pos.y));
    }

    #[test]
    fn test_no_reward_without_odds() {
        let mut config = GameConfig::default();
        config.items.heart_chance = 0.0;
        config.items.speed_up_chance = 0.0;
        config.items.size_up_chance = 0.0;
        let mut rng = Pcg32::seed_from_u64(12);
        assert!(schedule_reward(&config, 0, &mut rng).is_none());
    }

    #[test]
    fn test_gauge_ratio_caps_at_one() {
        let config = GameConfig::default();
        let mut gauge = ComboGauge::default();
        assert_eq!(gauge.ratio(&config), 0.0);
        gauge.value = 500;
        assert!((gauge.ratio(&config) - 0.5).abs() < 1e-6);
        gauge.value = 5000;
        assert_eq!(gauge.ratio(&config), 1.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn bonus_never_decreases_with_combo(combo in 0u32..200) {
                let config = ScoreConfig::default();
                prop_assert!(combo_bonus(combo + 1, &config) >= combo_bonus(combo, &config));
            }
        }
    }
}
