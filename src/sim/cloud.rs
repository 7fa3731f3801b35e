//! Clouds: clusters of circular puffs the bird can bounce on
//!
//! Layout generation is a bounded random search. When the attempt budget
//! runs out it keeps whatever it placed and reports the shortfall.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::EntityIds;
use crate::config::GameConfig;

/// One puff relative to its cloud's centre, before animation scaling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PuffShape {
    pub offset: Vec2,
    pub radius: f32,
}

/// A puff in world space, as used for drawing and collision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Puff {
    pub center: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cloud {
    pub id: u32,
    pub center: Vec2,
    /// Rest height the float animation oscillates around
    pub original_center_y: f32,
    pub shapes: Vec<PuffShape>,
    pub puffs: Vec<Puff>,
    pub animation_start: Option<u64>,
    pub scale: f32,
    pub float_timer: f32,
}

impl Cloud {
    pub fn new(id: u32, center: Vec2, num_puffs: u32, rng: &mut impl Rng) -> Self {
        let shapes = (0..num_puffs)
            .map(|_| PuffShape {
                offset: Vec2::new(
                    rng.random_range(-40..=40) as f32,
                    rng.random_range(-20..=20) as f32,
                ),
                radius: rng.random_range(25..=40) as f32,
            })
            .collect();
        let mut cloud = Self {
            id,
            center,
            original_center_y: center.y,
            shapes,
            puffs: Vec::new(),
            animation_start: None,
            scale: 1.0,
            float_timer: rng.random_range(0.0..std::f32::consts::TAU),
        };
        cloud.rebuild_puffs();
        cloud
    }

    fn rebuild_puffs(&mut self) {
        let center = self.center;
        let scale = self.scale;
        self.puffs.clear();
        self.puffs.extend(self.shapes.iter().map(|s| Puff {
            center: center + s.offset * scale,
            radius: s.radius * scale,
        }));
    }

    /// Top of the unscaled silhouette at the rest height
    pub fn original_top_y(&self) -> f32 {
        self.shapes
            .iter()
            .map(|s| self.original_center_y + s.offset.y - s.radius)
            .reduce(f32::min)
            .unwrap_or(self.original_center_y)
    }

    pub fn start_animation(&mut self, now: u64) {
        if self.animation_start.is_none() {
            self.animation_start = Some(now);
        }
    }

    pub fn update(&mut self, config: &GameConfig, now: u64) {
        let c = &config.cloud;
        self.float_timer += c.float_speed;
        self.center.y = self.original_center_y + self.float_timer.sin() * c.float_amplitude;

        if let Some(start) = self.animation_start {
            let elapsed = now.saturating_sub(start);
            if elapsed >= c.animation_ms {
                self.animation_start = None;
                self.scale = 1.0;
            } else {
                let progress = elapsed as f32 / c.animation_ms as f32;
                self.scale = c.animation_min_scale + (1.0 - c.animation_min_scale) * progress;
            }
        }
        self.rebuild_puffs();
    }

    /// First puff overlapping a circle at `pos`
    pub fn collide_with_bird(&self, pos: Vec2, radius: f32) -> Option<Puff> {
        self.puffs
            .iter()
            .find(|p| pos.distance(p.center) < radius + p.radius)
            .copied()
    }
}

/// Result of a layout search
#[derive(Debug, Clone)]
pub struct CloudLayout {
    pub clouds: Vec<Cloud>,
    /// How many clouds the search aimed for
    pub target: usize,
    pub attempts: u32,
}

impl CloudLayout {
    pub fn is_complete(&self) -> bool {
        self.clouds.len() >= self.target
    }
}

/// Scatter clouds across the sky, away from each other and the slingshot
pub fn create_cloud_layout(
    slingshot_x: f32,
    tower_top_y: f32,
    config: &GameConfig,
    ids: &mut EntityIds,
    rng: &mut impl Rng,
) -> CloudLayout {
    let c = &config.cloud;
    let target = rng.random_range(c.min_count..=c.max_count.max(c.min_count));
    let slingshot = Vec2::new(slingshot_x, tower_top_y);
    let x_max = (config.arena.screen_width - c.spawn_padding_x).max(c.spawn_padding_x);
    let y_max = c.spawn_y_max.max(c.spawn_y_min);

    let mut clouds: Vec<Cloud> = Vec::with_capacity(target);
    let mut attempts = 0;
    while clouds.len() < target && attempts < c.max_layout_attempts {
        attempts += 1;
        let pos = Vec2::new(
            rng.random_range(c.spawn_padding_x..=x_max),
            rng.random_range(c.spawn_y_min..=y_max),
        );

        let crowded = clouds.iter().any(|other| {
            (pos.x - other.center.x).abs() < c.min_distance_x
                && (pos.y - other.original_center_y).abs() < c.min_distance_y
        });
        if crowded || pos.distance(slingshot) < c.min_distance_from_tower {
            continue;
        }

        let puffs = rng.random_range(c.min_puffs..=c.max_puffs.max(c.min_puffs));
        clouds.push(Cloud::new(ids.next_id(), pos, puffs, rng));
    }

    if clouds.len() < c.min_count {
        log::warn!(
            "Cloud layout placed {} of {} clouds after {} attempts",
            clouds.len(),
            target,
            attempts
        );
    }

    CloudLayout {
        clouds,
        target,
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_layout_respects_spacing() {
        let config = GameConfig::default();
        for seed in 0..20 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut ids = EntityIds::default();
            let layout = create_cloud_layout(180.0, 530.0, &config, &mut ids, &mut rng);
            assert!(layout.attempts <= config.cloud.max_layout_attempts);
            assert!(layout.clouds.len() <= layout.target);
            for (i, a) in layout.clouds.iter().enumerate() {
                assert!(a.center.distance(Vec2::new(180.0, 530.0)) >= 300.0);
                assert!((3..=7).contains(&a.shapes.len()));
                for b in &layout.clouds[i + 1..] {
                    let dx = (a.center.x - b.center.x).abs();
                    let dy = (a.center.y - b.center.y).abs();
                    assert!(dx >= 250.0 || dy >= 200.0);
                    assert_ne!(a.id, b.id);
                }
            }
        }
    }

    #[test]
    fn test_layout_gives_up_after_attempt_budget() {
        let mut config = GameConfig::default();
        config.cloud.min_distance_x = 10_000.0;
        config.cloud.min_distance_y = 10_000.0;
        let mut rng = Pcg32::seed_from_u64(7);
        let mut ids = EntityIds::default();
        let layout = create_cloud_layout(180.0, 530.0, &config, &mut ids, &mut rng);
        assert_eq!(layout.attempts, config.cloud.max_layout_attempts);
        assert!(layout.clouds.len() <= 1);
        assert!(!layout.is_complete());
    }

    #[test]
    fn test_collide_with_bird_returns_puff() {
        let mut rng = Pcg32::seed_from_u64(1);
        let cloud = Cloud::new(1, Vec2::new(600.0, 300.0), 3, &mut rng);
        let puff = cloud.puffs[0];
        let hit = cloud.collide_with_bird(puff.center + Vec2::new(0.0, -puff.radius - 10.0), 20.0);
        assert!(hit.is_some());
        assert!(cloud.collide_with_bird(Vec2::new(0.0, 0.0), 20.0).is_none());
    }

    #[test]
    fn test_float_and_squash() {
        let config = GameConfig::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut cloud = Cloud::new(1, Vec2::new(600.0, 300.0), 4, &mut rng);
        cloud.start_animation(0);
        cloud.update(&config, 300);
        assert!((cloud.scale - 0.9).abs() < 1e-5);
        assert!((cloud.center.y - 300.0).abs() <= 4.0 + 1e-4);
        let shape = cloud.shapes[0];
        assert!((cloud.puffs[0].radius - shape.radius * 0.9).abs() < 1e-4);

        cloud.update(&config, 600);
        assert_eq!(cloud.scale, 1.0);
        assert!(cloud.animation_start.is_none());
    }

    #[test]
    fn test_original_top_y_uses_highest_puff() {
        let mut rng = Pcg32::seed_from_u64(5);
        let cloud = Cloud::new(1, Vec2::new(600.0, 300.0), 5, &mut rng);
        let expected = cloud
            .shapes
            .iter()
            .map(|s| 300.0 + s.offset.y - s.radius)
            .fold(f32::INFINITY, f32::min);
        assert_eq!(cloud.original_top_y(), expected);
    }
}
