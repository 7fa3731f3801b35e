//! Events raised during a tick for audio and UI collaborators

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::item::ItemKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// The bird scored a hit; `combo` counts hits this flight
    ComboHit { combo: u32 },
    /// The bird struck an enemy without defeating it
    EnemyHit,
    EnemyDeath,
    TowerDamage,
    HeartCollect,
    SpeedUpCollect,
    SizeUpCollect,
    ItemSpawn { kind: ItemKind },
    GaugeMax,
    StageStart { stage: u32 },
    StageClear { stage: u32 },
    GameOver,
    GameWon,
    /// Floating score number at a world position
    ScorePopup { pos: Vec2, points: u64 },
    ComboPopup { pos: Vec2, combo: u32 },
    /// The bird left the slingshot
    Launch,
    /// A pull too short to launch was released
    LaunchCancelled,
    /// The bird returned to the slingshot
    BirdReset,
}

impl GameEvent {
    /// Event for picking up an item of `kind`
    pub fn collect(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Heart => GameEvent::HeartCollect,
            ItemKind::SpeedUp => GameEvent::SpeedUpCollect,
            ItemKind::SizeUp => GameEvent::SizeUpCollect,
        }
    }
}
