//! Stage table and progression
//!
//! The table is static configuration keyed by stage number starting at 1.
//! `StageManager` only tracks which entry is current.

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};

/// Regular enemy varieties that can be rolled from a stage's weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyType {
    Ground,
    Flying,
    Jumping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossType {
    GiantSquare,
}

/// Per-stage scaling applied to regular enemy stats
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatMultiplier {
    pub hp: f32,
    pub speed: f32,
    pub attack: f32,
}

impl Default for StatMultiplier {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl StatMultiplier {
    pub fn uniform(m: f32) -> Self {
        Self {
            hp: m,
            speed: m,
            attack: m,
        }
    }
}

/// Heart spawn timing: `base_ms` ± uniform `random_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartSpawn {
    pub base_ms: u64,
    pub random_ms: u64,
}

impl Default for HeartSpawn {
    fn default() -> Self {
        Self {
            base_ms: 10_000,
            random_ms: 2_000,
        }
    }
}

impl HeartSpawn {
    /// Delay until the next heart, never negative
    pub fn next_delay(&self, rng: &mut impl Rng) -> u64 {
        let r = self.random_ms as f64;
        let offset = if self.random_ms > 0 {
            rng.random_range(-r..=r)
        } else {
            0.0
        };
        (self.base_ms as f64 + offset).max(0.0) as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearCondition {
    /// The boss was spawned and is gone
    DefeatBoss,
    /// Defeat this many regular enemies
    DefeatEnemies(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageSettings {
    pub name: String,
    pub boss_name: Option<String>,
    pub clear_enemies_count: u32,
    pub enemy_spawn_interval_ms: u64,
    pub enemy_weights: BTreeMap<EnemyType, u32>,
    pub stat_multiplier: StatMultiplier,
    pub heart_spawn: HeartSpawn,
    pub is_boss_stage: bool,
    pub boss_type: Option<BossType>,
    pub rearrange_clouds: bool,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            boss_name: None,
            clear_enemies_count: 5,
            enemy_spawn_interval_ms: 5000,
            enemy_weights: BTreeMap::new(),
            stat_multiplier: StatMultiplier::default(),
            heart_spawn: HeartSpawn::default(),
            is_boss_stage: false,
            boss_type: None,
            rearrange_clouds: true,
        }
    }
}

impl StageSettings {
    pub fn clear_condition(&self) -> ClearCondition {
        if self.is_boss_stage {
            ClearCondition::DefeatBoss
        } else {
            ClearCondition::DefeatEnemies(self.clear_enemies_count)
        }
    }

    /// Roll a regular enemy type; `None` when no type has weight
    pub fn choose_enemy_type(&self, rng: &mut impl Rng) -> Option<EnemyType> {
        let entries: Vec<(EnemyType, u32)> = self
            .enemy_weights
            .iter()
            .map(|(&kind, &weight)| (kind, weight))
            .collect();
        let dist = WeightedIndex::new(entries.iter().map(|&(_, w)| w)).ok()?;
        Some(entries[dist.sample(rng)].0)
    }
}

fn weights(pairs: &[(EnemyType, u32)]) -> BTreeMap<EnemyType, u32> {
    pairs.iter().copied().collect()
}

/// All stages, keyed from 1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageTable(BTreeMap<u32, StageSettings>);

impl StageTable {
    pub fn new(stages: BTreeMap<u32, StageSettings>) -> Self {
        Self(stages)
    }

    pub fn get(&self, stage: u32) -> Option<&StageSettings> {
        self.0.get(&stage)
    }

    pub fn contains(&self, stage: u32) -> bool {
        self.0.contains_key(&stage)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for StageTable {
    fn default() -> Self {
        use EnemyType::*;

        let mut stages = BTreeMap::new();
        stages.insert(1, StageSettings {
            name: "Peaceful Hill".into(),
            clear_enemies_count: 5,
            enemy_spawn_interval_ms: 5000,
            enemy_weights: weights(&[(Ground, 80), (Flying, 20)]),
            heart_spawn: HeartSpawn { base_ms: 10_000, random_ms: 2_000 },
            ..Default::default()
        });
        stages.insert(2, StageSettings {
            name: "Wind Valley".into(),
            clear_enemies_count: 10,
            enemy_spawn_interval_ms: 4500,
            enemy_weights: weights(&[(Ground, 50), (Flying, 50), (Jumping, 0)]),
            stat_multiplier: StatMultiplier::uniform(1.2),
            heart_spawn: HeartSpawn { base_ms: 15_000, random_ms: 2_000 },
            ..Default::default()
        });
        stages.insert(3, StageSettings {
            name: "Giant's Bed".into(),
            boss_name: Some("3 EYED ANGEL".into()),
            clear_enemies_count: 1,
            enemy_spawn_interval_ms: 6000,
            enemy_weights: weights(&[(Ground, 60), (Flying, 40)]),
            heart_spawn: HeartSpawn { base_ms: 20_000, random_ms: 2_000 },
            is_boss_stage: true,
            boss_type: Some(BossType::GiantSquare),
            ..Default::default()
        });
        stages.insert(4, StageSettings {
            name: "Storm Ridge".into(),
            clear_enemies_count: 10,
            enemy_spawn_interval_ms: 4000,
            enemy_weights: weights(&[(Ground, 30), (Flying, 40), (Jumping, 30)]),
            stat_multiplier: StatMultiplier::uniform(1.2),
            heart_spawn: HeartSpawn { base_ms: 10_000, random_ms: 5_000 },
            ..Default::default()
        });
        stages.insert(5, StageSettings {
            name: "Sky Stair".into(),
            clear_enemies_count: 20,
            enemy_spawn_interval_ms: 3500,
            enemy_weights: weights(&[(Ground, 20), (Flying, 30), (Jumping, 50)]),
            stat_multiplier: StatMultiplier::uniform(1.2),
            heart_spawn: HeartSpawn { base_ms: 15_000, random_ms: 5_000 },
            ..Default::default()
        });
        stages.insert(6, StageSettings {
            name: "Giant's Bed".into(),
            boss_name: Some("3 EYED ANGEL2".into()),
            clear_enemies_count: 1,
            enemy_spawn_interval_ms: 4000,
            enemy_weights: weights(&[(Ground, 30), (Flying, 30), (Jumping, 40)]),
            stat_multiplier: StatMultiplier::uniform(1.2),
            heart_spawn: HeartSpawn { base_ms: 20_000, random_ms: 2_000 },
            is_boss_stage: true,
            boss_type: Some(BossType::GiantSquare),
            ..Default::default()
        });
        Self(stages)
    }
}

/// Rejected stage request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    UnknownStage(u32),
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageError::UnknownStage(n) => write!(f, "stage {n} does not exist"),
        }
    }
}

impl std::error::Error for StageError {}

/// Tracks the current stage number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageManager {
    pub current_stage: u32,
}

impl Default for StageManager {
    fn default() -> Self {
        Self { current_stage: 1 }
    }
}

impl StageManager {
    pub fn current_settings<'a>(&self, table: &'a StageTable) -> Option<&'a StageSettings> {
        table.get(self.current_stage)
    }

    /// Move to the next stage; false when the current one is the last
    pub fn advance_stage(&mut self, table: &StageTable) -> bool {
        let next = self.current_stage + 1;
        if table.contains(next) {
            self.current_stage = next;
            log::info!("Stage advanced to {next}");
            true
        } else {
            log::info!("Stage {} was the final stage", self.current_stage);
            false
        }
    }

    pub fn reset_stages(&mut self) {
        self.current_stage = 1;
    }

    pub fn jump_to(&mut self, stage: u32, table: &StageTable) -> Result<(), StageError> {
        if !table.contains(stage) {
            return Err(StageError::UnknownStage(stage));
        }
        self.current_stage = stage;
        Ok(())
    }
}
