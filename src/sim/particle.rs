//! Cosmetic particles (no gameplay effect)

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::config::BurstConfig;

/// Colour palettes for particle bursts (0xRRGGBB)
pub mod palette {
    pub const HEART: &[u32] = &[0xff0000, 0xffc0cb, 0xffffff];
    pub const TOWER: &[u32] = &[0xffffff, 0xc8c8c8, 0x969696];
    pub const ENEMY: &[u32] = &[0xff0000, 0xffa500, 0xffff00];
    pub const WEAK_POINT: &[u32] = &[0xffff00, 0xffffff, 0xffa500];
    pub const BOSS_BODY: &[u32] = &[0x808080, 0xa9a9a9, 0xffffff];
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Frames left
    pub lifetime: u32,
    pub max_lifetime: u32,
    pub gravity: f32,
    pub start_size: f32,
    pub end_size: f32,
    pub color: u32,
}

impl Particle {
    pub fn new(pos: Vec2, burst: &BurstConfig, colors: &[u32], rng: &mut impl Rng) -> Self {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let speed = if burst.max_speed > burst.min_speed {
            rng.random_range(burst.min_speed..burst.max_speed)
        } else {
            burst.min_speed
        };
        Self {
            pos,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed,
            lifetime: burst.lifetime,
            max_lifetime: burst.lifetime,
            gravity: burst.gravity,
            start_size: burst.start_size,
            end_size: burst.end_size,
            color: colors.choose(rng).copied().unwrap_or(0xffffff),
        }
    }

    pub fn update(&mut self) {
        self.lifetime = self.lifetime.saturating_sub(1);
        self.vel.y += self.gravity;
        self.pos += self.vel;
    }

    pub fn is_alive(&self) -> bool {
        self.lifetime > 0
    }

    /// Size interpolated from start to end over the lifetime
    pub fn size(&self) -> f32 {
        if self.max_lifetime == 0 {
            return self.end_size;
        }
        let t = self.lifetime as f32 / self.max_lifetime as f32;
        self.start_size * t + self.end_size * (1.0 - t)
    }
}

/// Emit a full burst at `pos`
pub fn burst(pos: Vec2, config: &BurstConfig, colors: &[u32], rng: &mut impl Rng) -> Vec<Particle> {
    (0..config.count)
        .map(|_| Particle::new(pos, config, colors, rng))
        .collect()
}
