//! Pickups: hearts, speed-ups and size-ups
//!
//! Items sit on a cloud (tracked by id, so a cloud can disappear under
//! them) or hover in the air. They pop in with an overshooting scale
//! animation and can only be collected once it has finished.

use glam::Vec2;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};

use super::cloud::Cloud;
use crate::config::GameConfig;
use crate::wrap_angle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Repairs one tower block
    Heart,
    /// Doubles the bird's current velocity
    SpeedUp,
    /// Swells the bird to maximum size for a while
    SizeUp,
}

impl ItemKind {
    pub fn size(self, config: &GameConfig) -> f32 {
        match self {
            ItemKind::Heart => config.items.heart_size,
            ItemKind::SpeedUp => config.items.speed_up_size,
            ItemKind::SizeUp => config.items.size_up_size,
        }
    }
}

/// Pick a gauge reward using the configured odds
pub fn choose_reward(config: &GameConfig, rng: &mut impl Rng) -> Option<ItemKind> {
    let table = [
        (ItemKind::Heart, config.items.heart_chance),
        (ItemKind::SpeedUp, config.items.speed_up_chance),
        (ItemKind::SizeUp, config.items.size_up_chance),
    ];
    let dist = WeightedIndex::new(table.iter().map(|(_, w)| w.max(0.0))).ok()?;
    Some(table[dist.sample(rng)].0)
}

/// Random point in the open-air item zone
pub fn random_air_position(config: &GameConfig, rng: &mut impl Rng) -> Vec2 {
    let i = &config.items;
    Vec2::new(
        rng.random_range(i.air_spawn_x_min..=i.air_spawn_x_max.max(i.air_spawn_x_min)),
        rng.random_range(i.air_spawn_y_min..=i.air_spawn_y_max.max(i.air_spawn_y_min)),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemPhase {
    Spawning,
    Idle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Anchor {
    /// Rides on a cloud; `y_offset` is relative to the cloud centre
    Cloud { cloud_id: u32, y_offset: f32 },
    /// Floats around a fixed point
    Air { base_pos: Vec2, float_timer: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: u32,
    pub kind: ItemKind,
    /// Drawn position: `home` plus the size-up bob
    pub pos: Vec2,
    /// Where the anchor holds the item
    pub home: Vec2,
    pub size: f32,
    pub phase: ItemPhase,
    pub spawn_start: u64,
    /// Spawn-animation scale; 1.0 once idle
    pub scale: f32,
    pub anchor: Anchor,
    /// Speed-up star rotation (radians)
    pub spin_angle: f32,
    /// Size-up arrow bob
    pub bob_offset: f32,
    bob_dir: f32,
}

impl Item {
    fn with_anchor(id: u32, kind: ItemKind, pos: Vec2, anchor: Anchor, config: &GameConfig, now: u64) -> Self {
        Self {
            id,
            kind,
            pos,
            home: pos,
            size: kind.size(config),
            phase: ItemPhase::Spawning,
            spawn_start: now,
            scale: 0.0,
            anchor,
            spin_angle: 0.0,
            bob_offset: 0.0,
            bob_dir: 1.0,
        }
    }

    /// Place an item just above a cloud's silhouette
    pub fn on_cloud(id: u32, kind: ItemKind, cloud: &Cloud, config: &GameConfig, now: u64) -> Self {
        let y_offset = cloud.original_top_y() + config.items.y_offset - cloud.original_center_y;
        let pos = Vec2::new(cloud.center.x, cloud.center.y + y_offset * cloud.scale);
        let anchor = Anchor::Cloud {
            cloud_id: cloud.id,
            y_offset,
        };
        Self::with_anchor(id, kind, pos, anchor, config, now)
    }

    pub fn in_air(
        id: u32,
        kind: ItemKind,
        pos: Vec2,
        config: &GameConfig,
        now: u64,
        rng: &mut impl Rng,
    ) -> Self {
        let anchor = Anchor::Air {
            base_pos: pos,
            float_timer: rng.random_range(0.0..std::f32::consts::TAU),
        };
        Self::with_anchor(id, kind, pos, anchor, config, now)
    }

    pub fn update(&mut self, clouds: &[Cloud], config: &GameConfig, now: u64) {
        if self.phase == ItemPhase::Spawning {
            self.update_spawn_animation(config, now);
        }

        match &mut self.anchor {
            Anchor::Cloud { cloud_id, y_offset } => {
                // A vanished cloud leaves the item where it was
                if let Some(cloud) = clouds.iter().find(|c| c.id == *cloud_id) {
                    self.home = Vec2::new(cloud.center.x, cloud.center.y + *y_offset * cloud.scale);
                }
            }
            Anchor::Air { base_pos, float_timer } => {
                if self.phase == ItemPhase::Idle {
                    *float_timer += config.cloud.float_speed;
                    self.home.y = base_pos.y + float_timer.sin() * config.cloud.float_amplitude;
                }
            }
        }

        match self.kind {
            ItemKind::SpeedUp => {
                self.spin_angle = wrap_angle(self.spin_angle + 1.0_f32.to_radians());
            }
            ItemKind::SizeUp => {
                self.bob_offset += self.bob_dir * 0.1;
                if self.bob_offset.abs() > 3.0 {
                    self.bob_dir = -self.bob_dir;
                }
            }
            ItemKind::Heart => {}
        }
        self.pos = self.home + Vec2::new(0.0, self.bob_offset);
    }

    fn update_spawn_animation(&mut self, config: &GameConfig, now: u64) {
        let elapsed = now.saturating_sub(self.spawn_start) as f32;
        let duration = config.items.spawn_animation_ms as f32;
        if elapsed >= duration {
            self.scale = 1.0;
            self.phase = ItemPhase::Idle;
            return;
        }

        let half = duration / 2.0;
        let max = config.items.spawn_animation_max_scale;
        self.scale = if elapsed < half {
            elapsed / half * max
        } else {
            max - (elapsed - half) / half * (max - 1.0)
        };
    }

    /// Pickup test; only idle items can be collected
    pub fn collide_with_bird(&self, pos: Vec2, radius: f32) -> bool {
        self.phase == ItemPhase::Idle && self.pos.distance(pos) < self.size * self.scale / 2.0 + radius
    }
}
