//! Enemy family
//!
//! Every enemy shares one body (`Enemy`) and carries its behaviour in
//! `EnemyKind`. Ground walkers, jumpers and the boss keep `pos` at the
//! top-left of their unscaled body; flyers keep it at their centre.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::boss::BossState;
use super::geom::Rect;
use super::ground::Ground;
use super::stage::{EnemyType, StatMultiplier};
use super::tower::Tower;
use crate::config::GameConfig;
use crate::{normalize_angle, wrap_angle};

/// Knocked-back enemies move with their velocity instead of walking
const KNOCKBACK_THRESHOLD_SQ: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Life {
    Alive,
    /// Playing the death effect; no longer collidable
    Dying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlyMode {
    Patroling,
    Attacking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpMode {
    OnGround,
    Jumping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EnemyKind {
    Ground,
    Flying {
        mode: FlyMode,
        /// Heading in radians, y up (π faces left)
        angle: f32,
        /// Distance past the tower centre at which the dive starts
        trigger_distance: f32,
        target_y_offset: f32,
    },
    Jumping {
        mode: JumpMode,
        cooldown_ms: u64,
        last_jump: u64,
    },
    Boss(BossState),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    /// Collision rect, scaled by the flinch animation
    pub rect: Rect,
    /// Unscaled edge length
    pub size: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub attack_power: f32,
    /// Pixels per frame
    pub speed: f32,
    /// Knockback velocity
    pub velocity: Vec2,
    pub life: Life,
    pub flinch_start: Option<u64>,
    pub flinch_scale: f32,
    pub death_start: Option<u64>,
    pub death_effect_radius: f32,
}

impl Enemy {
    fn with_stats(id: u32, kind: EnemyKind, pos: Vec2, size: f32, hp: f32, speed: f32, attack_power: f32) -> Self {
        let mut enemy = Self {
            id,
            kind,
            pos,
            rect: Rect::new(pos.x, pos.y, size, size),
            size,
            hp,
            max_hp: hp,
            attack_power,
            speed,
            velocity: Vec2::ZERO,
            life: Life::Alive,
            flinch_start: None,
            flinch_scale: 1.0,
            death_start: None,
            death_effect_radius: 0.0,
        };
        enemy.refresh_rect();
        enemy
    }

    /// Spawn a regular enemy at the right edge with stage-scaled stats
    pub fn spawn(
        id: u32,
        enemy_type: EnemyType,
        m: &StatMultiplier,
        config: &GameConfig,
        now: u64,
        rng: &mut impl Rng,
    ) -> Self {
        let w = config.arena.screen_width;
        let ground_y = config.arena.ground_y;
        let enemy = match enemy_type {
            EnemyType::Ground => {
                let e = &config.enemy;
                let size = rng.random_range(e.min_size..=e.max_size);
                Self::with_stats(
                    id,
                    EnemyKind::Ground,
                    Vec2::new(w - size + e.spawn_offset_x, ground_y - size),
                    size,
                    size * e.hp_multiplier * m.hp,
                    (e.speed_base / size).max(e.min_speed) * m.speed,
                    size * e.attack_multiplier * m.attack,
                )
            }
            EnemyType::Flying => {
                let f = &config.flying;
                let size = rng.random_range(f.min_size..=f.max_size);
                let y = rng.random_range(f.min_y..=f.max_y);
                let kind = EnemyKind::Flying {
                    mode: FlyMode::Patroling,
                    angle: std::f32::consts::PI,
                    trigger_distance: rng.random_range(f.attack_range_min..=f.attack_range_max),
                    target_y_offset: 0.0,
                };
                Self::with_stats(
                    id,
                    kind,
                    Vec2::new(w + f.max_size / 2.0, y),
                    size,
                    size * f.hp_multiplier * m.hp,
                    (f.speed_base / size).max(f.min_speed) * m.speed,
                    size * f.attack_multiplier * m.attack,
                )
            }
            EnemyType::Jumping => {
                let j = &config.jumping;
                let size = rng.random_range(j.min_size..=j.max_size);
                let kind = EnemyKind::Jumping {
                    mode: JumpMode::OnGround,
                    cooldown_ms: rng.random_range(j.cooldown_min_ms..=j.cooldown_max_ms.max(j.cooldown_min_ms)),
                    last_jump: now,
                };
                Self::with_stats(
                    id,
                    kind,
                    Vec2::new(w - size + config.enemy.spawn_offset_x, ground_y - size),
                    size,
                    size * j.hp_multiplier * m.hp,
                    j.speed_base / size * m.speed,
                    size * j.attack_multiplier * m.attack,
                )
            }
        };
        log::info!("Spawned {:?} enemy #{} (size {:.0})", enemy_type, id, enemy.size);
        enemy
    }

    pub(super) fn from_parts(id: u32, kind: EnemyKind, pos: Vec2, size: f32, hp: f32, speed: f32, attack_power: f32) -> Self {
        Self::with_stats(id, kind, pos, size, hp, speed, attack_power)
    }

    pub fn is_alive(&self) -> bool {
        self.life == Life::Alive
    }

    pub fn is_boss(&self) -> bool {
        matches!(self.kind, EnemyKind::Boss(_))
    }

    /// Regular type, `None` for the boss
    pub fn enemy_type(&self) -> Option<EnemyType> {
        match self.kind {
            EnemyKind::Ground => Some(EnemyType::Ground),
            EnemyKind::Flying { .. } => Some(EnemyType::Flying),
            EnemyKind::Jumping { .. } => Some(EnemyType::Jumping),
            EnemyKind::Boss(_) => None,
        }
    }

    pub fn boss_state(&self) -> Option<&BossState> {
        match &self.kind {
            EnemyKind::Boss(boss) => Some(boss),
            _ => None,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }

    /// Moving under knockback rather than under its own power
    pub fn is_knocked_back(&self) -> bool {
        self.velocity.length_squared() > KNOCKBACK_THRESHOLD_SQ
    }

    pub fn is_off_screen_left(&self) -> bool {
        self.rect.right() <= 0.0
    }

    pub fn start_animation(&mut self, now: u64) {
        if self.is_alive() && self.flinch_start.is_none() {
            self.flinch_start = Some(now);
        }
    }

    /// Returns true when this damage defeats the enemy
    ///
    /// The boss body shrugs off direct damage; it can only be hurt
    /// through [`Enemy::hit_weak_point`].
    pub fn take_damage(&mut self, amount: f32, now: u64) -> bool {
        if !self.is_alive() {
            return false;
        }
        if self.is_boss() {
            return false;
        }

        self.hp -= amount;
        log::debug!("Enemy #{} took {amount:.1} damage ({:.1}/{:.1})", self.id, self.hp, self.max_hp);
        if self.hp <= 0.0 {
            self.hp = 0.0;
            self.destroy(now);
            return true;
        }
        false
    }

    pub fn destroy(&mut self, now: u64) {
        if self.life == Life::Dying {
            return;
        }
        self.life = Life::Dying;
        self.death_start = Some(now);
        self.flinch_start = None;
        self.flinch_scale = 1.0;
    }

    /// Death effect has completed
    pub fn is_finished(&self, config: &GameConfig, now: u64) -> bool {
        match (self.life, self.death_start) {
            (Life::Dying, Some(start)) => now.saturating_sub(start) >= config.enemy.death_ms,
            _ => false,
        }
    }

    pub fn knockback(&mut self, direction: Vec2, force: f32) {
        self.velocity += direction * force;
    }

    pub fn update(&mut self, tower: &Tower, ground: &Ground, config: &GameConfig, now: u64, rng: &mut impl Rng) {
        match self.life {
            Life::Alive => self.update_flinch(config, now),
            Life::Dying => self.update_death(config, now),
        }
        let ground_top = ground.rect.top();

        match self.kind {
            EnemyKind::Ground => self.update_walker(ground_top, config),
            EnemyKind::Flying { .. } => {
                if self.is_alive() {
                    self.update_flying(tower, config, rng);
                }
            }
            EnemyKind::Jumping { .. } => {
                if self.is_alive() {
                    self.update_jumping(ground_top, config, now, rng);
                }
            }
            EnemyKind::Boss(_) => {
                self.update_walker(ground_top, config);
                self.update_boss(ground_top, config, now, rng);
                return;
            }
        }
        self.refresh_rect();
    }

    fn update_flinch(&mut self, config: &GameConfig, now: u64) {
        let Some(start) = self.flinch_start else {
            return;
        };
        let e = &config.enemy;
        let elapsed = now.saturating_sub(start);
        if elapsed >= e.animation_ms {
            self.flinch_start = None;
            self.flinch_scale = 1.0;
        } else {
            let progress = elapsed as f32 / e.animation_ms as f32;
            self.flinch_scale = e.animation_min_scale + (1.0 - e.animation_min_scale) * progress;
        }
    }

    fn update_death(&mut self, config: &GameConfig, now: u64) {
        let Some(start) = self.death_start else {
            return;
        };
        let e = &config.enemy;
        let progress = (now.saturating_sub(start) as f32 / e.death_ms.max(1) as f32).min(1.0);
        self.death_effect_radius = self.size / 2.0 * e.death_radius_multiplier * progress;
    }

    /// Height of the body resting on the ground
    fn body_height(&self) -> f32 {
        match &self.kind {
            EnemyKind::Boss(boss) => self.size * boss.persistent_scale * self.flinch_scale,
            _ => self.size,
        }
    }

    /// Walk left, or tumble under knockback with ground bounces
    ///
    /// Knockback physics keeps running while dying.
    fn update_walker(&mut self, ground_top: f32, config: &GameConfig) {
        let e = &config.enemy;
        let height = self.body_height();
        if self.is_knocked_back() {
            self.velocity.y += config.physics.gravity;
            self.pos += self.velocity;
            self.velocity *= e.friction;

            if self.pos.y + height > ground_top {
                self.pos.y = ground_top - height;
                self.velocity.y *= -e.ground_bounciness;
                self.velocity.x *= e.ground_friction;
                if self.velocity.y.abs() < 1.0 {
                    self.velocity.y = 0.0;
                }
            }
        } else if self.is_alive() {
            self.velocity = Vec2::ZERO;
            self.pos.x -= self.speed;
        }

        // Follow the ground while it squashes
        if !self.is_knocked_back() && self.is_alive() {
            self.pos.y = ground_top - height;
        }
    }

    fn update_jumping(&mut self, ground_top: f32, config: &GameConfig, now: u64, rng: &mut impl Rng) {
        let j = &config.jumping;
        let EnemyKind::Jumping { mode, cooldown_ms, last_jump } = &mut self.kind else {
            return;
        };

        let resting = self.velocity.length_squared() < KNOCKBACK_THRESHOLD_SQ;
        if *mode == JumpMode::OnGround && resting && now.saturating_sub(*last_jump) > *cooldown_ms {
            let (strong, weak) = (
                j.max_jump_force.min(j.min_jump_force),
                j.max_jump_force.max(j.min_jump_force),
            );
            *mode = JumpMode::Jumping;
            self.velocity = Vec2::new(-self.speed, rng.random_range(strong..=weak));
            *last_jump = now;
            *cooldown_ms = rng.random_range(j.cooldown_min_ms..=j.cooldown_max_ms.max(j.cooldown_min_ms));
        }

        if *mode == JumpMode::Jumping || self.velocity.length_squared() > KNOCKBACK_THRESHOLD_SQ {
            self.velocity.y += config.physics.gravity;
            self.pos += self.velocity;
            if *mode != JumpMode::Jumping {
                self.velocity *= config.enemy.friction;
            }

            // Only a falling jumper can land
            if self.pos.y + self.size >= ground_top && self.velocity.y > 0.0 {
                self.pos.y = ground_top - self.size;
                self.velocity = Vec2::ZERO;
                *mode = JumpMode::OnGround;
            }
        }

        if *mode == JumpMode::OnGround && self.velocity.length_squared() < KNOCKBACK_THRESHOLD_SQ {
            self.pos.y = ground_top - self.size;
        }
    }

    fn update_flying(&mut self, tower: &Tower, config: &GameConfig, rng: &mut impl Rng) {
        let f = &config.flying;
        let EnemyKind::Flying { mode, angle, trigger_distance, target_y_offset } = &mut self.kind else {
            return;
        };

        match *mode {
            FlyMode::Patroling => {
                self.pos.x -= self.speed;
                if !tower.is_destroyed() && self.pos.x <= tower.center_x(config) + *trigger_distance {
                    *mode = FlyMode::Attacking;
                    *target_y_offset = rng.random_range(f.target_y_min..=f.target_y_max);
                    log::debug!("Flyer #{} diving (trigger {:.0})", self.id, trigger_distance);
                }
            }
            FlyMode::Attacking => {
                // Keep the last heading once there is nothing left to hit
                if !tower.is_destroyed() {
                    let target = Vec2::new(
                        tower.center_x(config),
                        tower.top_y() + config.tower.block_height / 2.0 + *target_y_offset,
                    );
                    let to_target = target - self.pos;
                    if to_target.length_squared() > 0.0 {
                        let target_angle = (-to_target.y).atan2(to_target.x);
                        let diff = normalize_angle(target_angle - *angle);
                        *angle = if diff.abs() < f.rotation_speed {
                            target_angle
                        } else {
                            *angle + f.rotation_speed.copysign(diff)
                        };
                        *angle = wrap_angle(*angle);
                    }
                }
                self.pos += Vec2::new(angle.cos(), -angle.sin()) * self.speed;
            }
        }

        if self.velocity.length_squared() > KNOCKBACK_THRESHOLD_SQ {
            self.pos += self.velocity;
            self.velocity *= config.enemy.friction;
        }
    }

    /// Rebuild the collision rect from `pos`, size and flinch scale
    pub(super) fn refresh_rect(&mut self) {
        let edge = self.size * self.flinch_scale;
        self.rect = match &self.kind {
            EnemyKind::Flying { .. } => Rect::from_center(self.pos, edge, edge),
            // Squash towards the feet, centred horizontally
            _ => Rect::new(
                self.pos.x + (self.size - edge) / 2.0,
                self.pos.y + self.size - edge,
                edge,
                edge,
            ),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn world() -> (Tower, Ground, GameConfig, Pcg32) {
        let config = GameConfig::default();
        let tower = Tower::new(
            config.tower_base_x(),
            config.arena.ground_y,
            config.initial_tower_top_y(),
            &config,
        );
        let ground = Ground::new(&config);
        (tower, ground, config, Pcg32::seed_from_u64(17))
    }

    fn spawn(kind: EnemyType, config: &GameConfig, rng: &mut Pcg32) -> Enemy {
        Enemy::spawn(1, kind, &StatMultiplier::default(), config, 0, rng)
    }

    #[test]
    fn test_ground_stats_follow_size() {
        let (_, _, config, mut rng) = world();
        let e = spawn(EnemyType::Ground, &config, &mut rng);
        assert!((40.0..=120.0).contains(&e.size));
        assert!((e.hp - e.size * 2.0).abs() < 1e-3);
        assert!((e.attack_power - e.size * 1.5).abs() < 1e-3);
        assert!((e.speed - (40.0 / e.size).max(0.1)).abs() < 1e-6);
        assert!((e.rect.bottom() - 650.0).abs() < 1e-3);
        assert!((e.pos.x - (1280.0 - e.size + 20.0)).abs() < 1e-3);
    }

    #[test]
    fn test_stat_multiplier_scales_stats() {
        let (_, _, config, _) = world();
        let m = StatMultiplier::uniform(1.2);
        let mut a = Pcg32::seed_from_u64(3);
        let mut b = Pcg32::seed_from_u64(3);
        let base = Enemy::spawn(1, EnemyType::Ground, &StatMultiplier::default(), &config, 0, &mut a);
        let strong = Enemy::spawn(1, EnemyType::Ground, &m, &config, 0, &mut b);
        assert!((strong.hp - base.hp * 1.2).abs() < 1e-3);
        assert!((strong.speed - base.speed * 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_ground_enemy_walks_left() {
        let (tower, ground, config, mut rng) = world();
        let mut e = spawn(EnemyType::Ground, &config, &mut rng);
        let x = e.pos.x;
        e.update(&tower, &ground, &config, 16, &mut rng);
        assert!((e.pos.x - (x - e.speed)).abs() < 1e-4);
        assert!((e.rect.bottom() - 650.0).abs() < 1e-3);
    }

    #[test]
    fn test_knockback_bounces_and_settles() {
        let (tower, ground, config, mut rng) = world();
        let mut e = spawn(EnemyType::Ground, &config, &mut rng);
        e.knockback(Vec2::new(1.0, -1.0).normalize(), 20.0);
        assert!(e.is_knocked_back());
        e.update(&tower, &ground, &config, 16, &mut rng);
        assert!(e.rect.bottom() < 650.0);
        for i in 0..300 {
            e.update(&tower, &ground, &config, 32 + i, &mut rng);
            assert!(e.pos.y + e.size <= 650.0 + 1e-3);
        }
        assert!(!e.is_knocked_back());
        assert!((e.rect.bottom() - 650.0).abs() < 1e-3);
    }

    #[test]
    fn test_flinch_shrinks_then_recovers() {
        let (tower, ground, config, mut rng) = world();
        let mut e = spawn(EnemyType::Ground, &config, &mut rng);
        e.start_animation(100);
        e.update(&tower, &ground, &config, 100, &mut rng);
        assert!((e.flinch_scale - 0.7).abs() < 1e-5);
        assert!((e.rect.w - e.size * 0.7).abs() < 1e-3);
        assert!((e.rect.bottom() - 650.0).abs() < 1e-3);
        e.update(&tower, &ground, &config, 400, &mut rng);
        assert_eq!(e.flinch_scale, 1.0);
        assert!(e.flinch_start.is_none());
    }

    #[test]
    fn test_take_damage_and_death_effect() {
        let (tower, ground, config, mut rng) = world();
        let mut e = spawn(EnemyType::Ground, &config, &mut rng);
        assert!(!e.take_damage(1.0, 0));
        assert!(e.take_damage(10_000.0, 50));
        assert_eq!(e.hp, 0.0);
        assert_eq!(e.life, Life::Dying);
        assert!(!e.take_damage(10.0, 60));
        e.start_animation(60);
        assert!(e.flinch_start.is_none());

        e.update(&tower, &ground, &config, 150, &mut rng);
        let max = e.size / 2.0 * 1.5;
        assert!((e.death_effect_radius - max * 0.5).abs() < 1e-3);
        assert!(!e.is_finished(&config, 249));
        assert!(e.is_finished(&config, 250));
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let (_, _, config, mut rng) = world();
        let mut e = spawn(EnemyType::Ground, &config, &mut rng);
        e.destroy(100);
        e.destroy(500);
        assert_eq!(e.death_start, Some(100));
    }

    #[test]
    fn test_flyer_patrols_then_dives_at_tower() {
        let (tower, ground, config, mut rng) = world();
        let mut e = spawn(EnemyType::Flying, &config, &mut rng);
        assert!((e.pos.x - 1330.0).abs() < 1e-3);
        assert!((e.hp - e.size * 1.5).abs() < 1e-3);

        let mut now = 0;
        while matches!(e.kind, EnemyKind::Flying { mode: FlyMode::Patroling, .. }) {
            now += 16;
            e.update(&tower, &ground, &config, now, &mut rng);
            assert!(now < 10_000_000, "flyer never dived");
        }
        let EnemyKind::Flying { trigger_distance, target_y_offset, .. } = e.kind else {
            unreachable!()
        };
        assert!(e.pos.x <= tower.center_x(&config) + trigger_distance);
        assert!((-80.0..=120.0).contains(&target_y_offset));

        let target = Vec2::new(tower.center_x(&config), tower.top_y() + 20.0 + target_y_offset);
        let before = e.pos.distance(target);
        for _ in 0..200 {
            now += 16;
            e.update(&tower, &ground, &config, now, &mut rng);
        }
        assert!(e.pos.distance(target) < before);
    }

    #[test]
    fn test_flyer_turn_rate_is_limited() {
        let (tower, ground, config, mut rng) = world();
        let mut e = spawn(EnemyType::Flying, &config, &mut rng);
        e.pos = Vec2::new(600.0, 100.0);
        e.kind = EnemyKind::Flying {
            mode: FlyMode::Attacking,
            angle: 0.0,
            trigger_distance: 0.0,
            target_y_offset: 0.0,
        };
        e.update(&tower, &ground, &config, 16, &mut rng);
        let EnemyKind::Flying { angle, .. } = e.kind else {
            unreachable!()
        };
        let turned = normalize_angle(angle).abs();
        assert!((turned - 3.0_f32.to_radians()).abs() < 1e-5);
    }

    #[test]
    fn test_flyer_flies_straight_without_tower() {
        let (mut tower, ground, config, mut rng) = world();
        tower.blocks.clear();
        let mut e = spawn(EnemyType::Flying, &config, &mut rng);
        e.kind = EnemyKind::Flying {
            mode: FlyMode::Attacking,
            angle: std::f32::consts::PI,
            trigger_distance: 0.0,
            target_y_offset: 0.0,
        };
        let y = e.pos.y;
        e.update(&tower, &ground, &config, 16, &mut rng);
        assert!((e.pos.y - y).abs() < 1e-4);
    }

    #[test]
    fn test_jumper_waits_jumps_and_lands() {
        let (tower, ground, config, mut rng) = world();
        let mut e = spawn(EnemyType::Jumping, &config, &mut rng);
        let EnemyKind::Jumping { cooldown_ms, .. } = e.kind else {
            unreachable!()
        };
        assert!((1000..=3000).contains(&cooldown_ms));
        assert!((e.hp - e.size * 3.0).abs() < 1e-3);

        let x = e.pos.x;
        e.update(&tower, &ground, &config, cooldown_ms, &mut rng);
        assert_eq!(e.pos.x, x);

        e.update(&tower, &ground, &config, cooldown_ms + 1, &mut rng);
        assert!(matches!(e.kind, EnemyKind::Jumping { mode: JumpMode::Jumping, .. }));
        assert!(e.rect.bottom() < 650.0);

        let mut now = cooldown_ms + 1;
        for _ in 0..200 {
            now += 1;
            e.update(&tower, &ground, &config, now, &mut rng);
            if matches!(e.kind, EnemyKind::Jumping { mode: JumpMode::OnGround, .. }) {
                break;
            }
        }
        assert!(matches!(e.kind, EnemyKind::Jumping { mode: JumpMode::OnGround, .. }));
        assert!(e.pos.x < x);
        assert!((e.rect.bottom() - 650.0).abs() < 1e-3);
        assert_eq!(e.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_off_screen_left() {
        let (_, _, config, mut rng) = world();
        let mut e = spawn(EnemyType::Ground, &config, &mut rng);
        e.pos.x = -e.size;
        e.refresh_rect();
        assert!(e.is_off_screen_left());
    }
}
