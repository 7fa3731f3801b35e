//! The projectile ("bird")
//!
//! A circular body launched from the slingshot. Its radius drives both
//! durability and hitting power, and grows with every successful contact.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionResult, circle_circle_collision, circle_rect_collision, bounce_velocity};
use super::geom::Rect;
use crate::config::GameConfig;
use crate::wrap_angle;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bird {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Where the bird returns on reset (tracks the slingshot)
    pub start_pos: Vec2,
    pub radius: f32,
    pub original_radius: f32,
    /// Radius to restore when a size boost expires
    pub radius_before_boost: f32,
    /// Rotation in radians, [0, 2π)
    pub angle: f32,
    /// Radians per frame; negative is clockwise on screen
    pub angular_velocity: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub attack_power: f32,
    /// Hits landed during the current flight
    pub combo_count: u32,
    pub is_flying: bool,
    pub launched_upwards: bool,
    pub launch_time: Option<u64>,
    pub last_power_up_time: Option<u64>,
    pub low_velocity_start_time: Option<u64>,
    pub size_boost_end_time: Option<u64>,
}

impl Bird {
    pub fn new(start_pos: Vec2, config: &GameConfig) -> Self {
        let radius = config.bird.default_radius;
        let mut bird = Self {
            pos: start_pos,
            vel: Vec2::ZERO,
            start_pos,
            radius,
            original_radius: radius,
            radius_before_boost: radius,
            angle: 0.0,
            angular_velocity: 0.0,
            hp: 0.0,
            max_hp: 0.0,
            attack_power: 0.0,
            combo_count: 0,
            is_flying: false,
            launched_upwards: false,
            launch_time: None,
            last_power_up_time: None,
            low_velocity_start_time: None,
            size_boost_end_time: None,
        };
        bird.refresh_stats(config);
        bird
    }

    /// Recompute HP and attack from the radius, restoring full HP
    fn refresh_stats(&mut self, config: &GameConfig) {
        self.max_hp = self.radius * config.bird.hp_per_radius;
        self.hp = self.max_hp;
        self.attack_power = self.radius * config.bird.attack_per_radius;
    }

    pub fn hp_ratio(&self) -> f32 {
        if self.max_hp > 0.0 { self.hp / self.max_hp } else { 1.0 }
    }

    /// Whether the bird is resting on (or within a pixel of) the ground
    pub fn is_on_ground(&self, ground_y: f32) -> bool {
        self.pos.y + self.radius >= ground_y - 1.0
    }

    /// Milliseconds since launch, if in flight
    pub fn time_since_launch(&self, now: u64) -> Option<u64> {
        self.launch_time.map(|t| now.saturating_sub(t))
    }

    pub fn launch(&mut self, launch_vector: Vec2, config: &GameConfig, now: u64) {
        self.is_flying = true;
        self.vel = launch_vector * config.physics.launch_power_multiplier;
        self.launch_time = Some(now);
        self.launched_upwards = self.vel.y < 0.0;
        self.combo_count = 0;
        self.low_velocity_start_time = None;
    }

    /// Advance one frame of flight
    pub fn update(&mut self, config: &GameConfig, now: u64) {
        if !self.is_flying {
            return;
        }

        self.vel.y += config.physics.gravity;
        self.pos += self.vel;

        if let Some(end) = self.size_boost_end_time {
            if now > end {
                log::debug!("Size boost expired");
                self.radius = self.radius_before_boost;
                self.size_boost_end_time = None;
                self.refresh_stats(config);
            }
        }

        if self.is_on_ground(config.arena.ground_y) && self.vel.x.abs() > 0.1 {
            // Rolling without slipping: moving right spins clockwise
            self.angular_velocity = -self.vel.x / self.radius;
        } else {
            self.angular_velocity *= config.bird.angular_friction;
        }
        self.angle = wrap_angle(self.angle + self.angular_velocity);
    }

    /// Apply spin transfer, separation and reflection for a resolved contact
    fn resolve_contact(&mut self, contact: &CollisionResult, bounciness: f32, config: &GameConfig) -> bool {
        let normal = contact.normal;
        if self.vel.dot(normal) > 0.0 {
            return false;
        }

        let tangent = Vec2::new(-normal.y, normal.x);
        let tangential_speed = self.vel.dot(tangent);
        self.angular_velocity -= tangential_speed * config.bird.collision_spin_factor;

        self.pos += normal * contact.penetration;
        self.vel = bounce_velocity(self.vel, normal, bounciness);
        true
    }

    /// Bounce off a circle (cloud puff); returns true when a bounce was applied
    pub fn bounce_off_circle(
        &mut self,
        center: Vec2,
        radius: f32,
        bounciness: f32,
        config: &GameConfig,
    ) -> bool {
        let contact = circle_circle_collision(self.pos, self.radius, center, radius);
        contact.hit && self.resolve_contact(&contact, bounciness, config)
    }

    /// Bounce off a rectangle; returns true when a bounce was applied
    pub fn bounce_off_rect(&mut self, rect: &Rect, bounciness: f32, config: &GameConfig) -> bool {
        let contact = circle_rect_collision(self.pos, self.radius, rect);
        contact.hit && self.resolve_contact(&contact, bounciness, config)
    }

    /// Grow after a successful contact, keeping the HP ratio
    ///
    /// Returns false while the cooldown from the previous power-up is running.
    pub fn power_up(&mut self, config: &GameConfig, now: u64) -> bool {
        if let Some(last) = self.last_power_up_time {
            if now.saturating_sub(last) <= config.bird.power_up_cooldown_ms {
                return false;
            }
        }

        let ratio = self.hp_ratio();
        self.radius = (self.radius * config.bird.power_up_scale).min(config.bird.max_radius);
        self.max_hp = self.radius * config.bird.hp_per_radius;
        self.hp = self.max_hp * ratio;
        self.attack_power = self.radius * config.bird.attack_per_radius;
        self.last_power_up_time = Some(now);
        log::debug!("Power up: radius {:.1}", self.radius);
        true
    }

    pub fn apply_speed_boost(&mut self, config: &GameConfig) {
        self.vel *= config.bird.speed_boost_multiplier;
    }

    /// Swell to the maximum radius for a while; stacking extends the timer
    pub fn apply_size_boost(&mut self, config: &GameConfig, now: u64) {
        let duration = config.bird.size_boost_duration_ms;
        match self.size_boost_end_time {
            Some(end) => {
                self.size_boost_end_time = Some(end + duration);
            }
            None => {
                self.radius_before_boost = self.radius;
                self.radius = config.bird.max_radius;
                self.refresh_stats(config);
                self.size_boost_end_time = Some(now + duration);
            }
        }
    }

    /// Returns true when this damage defeats the bird
    pub fn take_damage(&mut self, amount: f32) -> bool {
        self.hp -= amount;
        log::debug!("Bird took {amount:.1} damage ({:.1}/{:.1})", self.hp, self.max_hp);
        self.hp <= 0.0
    }

    pub fn increment_combo(&mut self) -> u32 {
        self.combo_count += 1;
        self.combo_count
    }

    /// Return to the slingshot with original size and stats
    pub fn reset(&mut self, new_start: Option<Vec2>, config: &GameConfig) {
        if let Some(start) = new_start {
            self.start_pos = start;
        }
        self.pos = self.start_pos;
        self.vel = Vec2::ZERO;
        self.is_flying = false;
        self.radius = self.original_radius;
        self.radius_before_boost = self.original_radius;
        self.refresh_stats(config);
        self.launch_time = None;
        self.last_power_up_time = None;
        self.low_velocity_start_time = None;
        self.launched_upwards = false;
        self.combo_count = 0;
        self.size_boost_end_time = None;
        self.angle = 0.0;
        self.angular_velocity = 0.0;
    }

    /// Snap back to the slingshot without touching size or HP
    pub fn cancel_launch(&mut self) {
        self.pos = self.start_pos;
        self.vel = Vec2::ZERO;
        self.is_flying = false;
        self.angle = 0.0;
        self.angular_velocity = 0.0;
    }
}

/// Limit a pulled-back position to `max_distance` from the slingshot
pub fn clamp_pull(slingshot: Vec2, pulled: Vec2, max_distance: f32) -> Vec2 {
    let offset = pulled - slingshot;
    let dist = offset.length();
    if dist > max_distance && dist > 0.0 {
        slingshot + offset / dist * max_distance
    } else {
        pulled
    }
}

/// Sample the flight path a launch would take, for the aiming guide
///
/// Runs the same per-frame integration as [`Bird::update`] and records
/// every `gap`-th position.
pub fn predict_trajectory(
    start: Vec2,
    launch_vector: Vec2,
    gravity: f32,
    power: f32,
    points: usize,
    gap: usize,
) -> Vec<Vec2> {
    let gap = gap.max(1);
    let mut vel = launch_vector * power;
    let mut pos = start;
    let mut out = Vec::with_capacity(points);
    for step in 1..=points * gap {
        vel.y += gravity;
        pos += vel;
        if step % gap == 0 {
            out.push(pos);
        }
    }
    out
}
