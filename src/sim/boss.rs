//! Giant boss with rotating weak points
//!
//! The boss body cannot be damaged. Exactly one of its weak points is open
//! at a time; hitting it shrinks the boss (which makes it faster), damages
//! it and moves the opening elsewhere.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::enemy::{Enemy, EnemyKind};
use super::geom::Rect;
use crate::config::GameConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeakPoint {
    /// Offset from the boss centre at full scale
    pub relative_pos: Vec2,
    pub size: f32,
    pub rect: Rect,
    pub center: Vec2,
}

impl WeakPoint {
    fn new(relative_pos: Vec2, size: f32) -> Self {
        Self {
            relative_pos,
            size,
            rect: Rect::new(0.0, 0.0, size, size),
            center: Vec2::ZERO,
        }
    }

    fn follow(&mut self, boss_center: Vec2, scale: f32) {
        self.center = boss_center + self.relative_pos * scale;
        self.rect = Rect::from_center(self.center, self.size, self.size);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossState {
    /// Top, front and back
    pub weak_points: Vec<WeakPoint>,
    /// Index of the open weak point
    pub active: usize,
    /// Shrinks with every weak-point hit, never below the configured floor
    pub persistent_scale: f32,
    pub base_speed: f32,
    pub last_switch: u64,
    pub halo_timer: f32,
}

impl BossState {
    fn new(config: &GameConfig, now: u64, rng: &mut impl Rng) -> Self {
        let b = &config.boss;
        let offset = b.size / 2.0 - b.weak_point_inset;
        let weak_points: Vec<WeakPoint> = [
            Vec2::new(0.0, -offset),
            Vec2::new(-offset, 0.0),
            Vec2::new(offset, 0.0),
        ]
        .into_iter()
        .map(|rel| WeakPoint::new(rel, b.weak_point_size))
        .collect();
        let active = rng.random_range(0..weak_points.len());
        Self {
            weak_points,
            active,
            persistent_scale: 1.0,
            base_speed: b.base_speed,
            last_switch: now,
            halo_timer: 0.0,
        }
    }

    pub fn active_weak_point(&self) -> Option<&WeakPoint> {
        self.weak_points.get(self.active)
    }

    /// Open a different weak point chosen at random
    fn switch_weak_point(&mut self, now: u64, rng: &mut impl Rng) {
        let count = self.weak_points.len();
        if count > 1 {
            let mut next = rng.random_range(0..count - 1);
            if next >= self.active {
                next += 1;
            }
            self.active = next;
        }
        self.last_switch = now;
    }
}

impl Enemy {
    /// Spawn the boss at the right edge, standing on the ground
    pub fn boss(id: u32, config: &GameConfig, now: u64, rng: &mut impl Rng) -> Self {
        let b = &config.boss;
        let pos = Vec2::new(
            config.arena.screen_width - b.size + config.enemy.spawn_offset_x,
            config.arena.ground_y - b.size,
        );
        let state = BossState::new(config, now, rng);
        let mut boss = Enemy::from_parts(id, EnemyKind::Boss(state), pos, b.size, b.max_hp, b.base_speed, b.attack_power);
        boss.layout_boss(config.arena.ground_y);
        log::info!("Boss #{id} has appeared");
        boss
    }

    /// Damage through the open weak point; returns true when the boss dies
    pub fn hit_weak_point(&mut self, amount: f32, config: &GameConfig, now: u64) -> bool {
        if !self.is_alive() {
            return false;
        }
        let EnemyKind::Boss(state) = &mut self.kind else {
            return false;
        };

        let b = &config.boss;
        state.persistent_scale = (state.persistent_scale - b.scale_reduction_on_hit).max(b.min_scale);
        self.hp -= amount;
        log::debug!(
            "Boss weak point hit for {amount:.1} (hp {:.1}, scale {:.2})",
            self.hp,
            state.persistent_scale
        );
        if self.hp <= 0.0 {
            self.hp = 0.0;
            self.destroy(now);
            return true;
        }
        false
    }

    pub fn force_switch_weak_point(&mut self, now: u64, rng: &mut impl Rng) {
        if let EnemyKind::Boss(state) = &mut self.kind {
            state.switch_weak_point(now, rng);
        }
    }

    pub(super) fn update_boss(&mut self, ground_top: f32, config: &GameConfig, now: u64, rng: &mut impl Rng) {
        let alive = self.is_alive();
        let EnemyKind::Boss(state) = &mut self.kind else {
            return;
        };

        let b = &config.boss;
        state.halo_timer += b.halo_float_speed;
        self.speed = state.base_speed * (1.0 + (1.0 - state.persistent_scale) * b.speed_scale_multiplier);
        if alive && now.saturating_sub(state.last_switch) > b.weak_point_switch_ms {
            log::debug!("Boss weak point moved after timeout");
            state.switch_weak_point(now, rng);
        }
        self.layout_boss(ground_top);
    }

    /// Size the body from both scales and rest it on the ground
    fn layout_boss(&mut self, ground_top: f32) {
        let EnemyKind::Boss(state) = &mut self.kind else {
            return;
        };
        let edge = self.size * state.persistent_scale * self.flinch_scale;
        self.rect = Rect::new(self.pos.x, ground_top - edge, edge, edge);
        self.pos.y = self.rect.y;

        let center = self.rect.center();
        for wp in &mut state.weak_points {
            wp.follow(center, state.persistent_scale);
        }
    }
}
