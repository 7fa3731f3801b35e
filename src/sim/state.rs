//! Game state and the host-facing snapshots
//!
//! Everything a frame needs lives in `GameState`. The simulation clock is the
//! host's millisecond counter passed to every tick; a new state assumes that
//! counter started at zero.

use std::sync::Arc;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bird::Bird;
use super::cloud::{Cloud, create_cloud_layout};
use super::enemy::Enemy;
use super::events::GameEvent;
use super::ground::Ground;
use super::item::Item;
use super::particle::{Particle, burst};
use super::score::{ComboGauge, PendingItem};
use super::stage::{StageManager, StageSettings};
use super::tower::Tower;
use crate::config::{BurstConfig, GameConfig};

/// Allocates entity ids, starting at 1
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityIds {
    last: u32,
}

impl EntityIds {
    pub fn next_id(&mut self) -> u32 {
        self.last += 1;
        self.last
    }
}

/// Stage-level state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageState {
    Playing,
    /// Stage cleared; waiting before the next one starts
    Clearing,
    GameOver,
    GameWon,
}

impl StageState {
    pub fn is_finished(self) -> bool {
        matches!(self, StageState::GameOver | StageState::GameWon)
    }
}

/// Everything a HUD needs for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub stage: u32,
    pub stage_name: String,
    pub boss_name: Option<String>,
    pub stage_state: StageState,
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub gauge_ratio: f32,
    pub gauge_flashing: bool,
    pub bird_hp_ratio: f32,
    pub tower_blocks: usize,
    pub enemies_defeated: u32,
    /// `None` on boss stages
    pub enemies_to_clear: Option<u32>,
    pub boss_hp_ratio: Option<f32>,
    pub is_bird_callable: bool,
    /// Aiming guide while the bird is held back
    pub trajectory: Vec<Vec2>,
}

/// Result of a finished run, for the end screen and records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub score: u64,
    pub max_combo: u32,
    /// Blocks standing at the end
    pub tower_height: usize,
    pub won: bool,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    pub config: Arc<GameConfig>,
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub ids: EntityIds,
    pub stage_state: StageState,
    pub stage_manager: StageManager,
    pub bird: Bird,
    /// The bird is being held back at the slingshot
    pub dragging: bool,
    pub slingshot: Vec2,
    pub tower: Tower,
    pub ground: Ground,
    pub clouds: Vec<Cloud>,
    pub enemies: Vec<Enemy>,
    pub items: Vec<Item>,
    /// Cosmetic only
    pub particles: Vec<Particle>,
    pub enemies_defeated_count: u32,
    pub boss_spawned: bool,
    pub score: u64,
    pub max_combo: u32,
    pub combo_gauge: ComboGauge,
    pub pending_items: Vec<PendingItem>,
    pub tower_bonus_score: u64,
    pub final_block_count: usize,
    pub next_enemy_spawn: u64,
    pub next_heart_spawn: u64,
    pub stage_clear_time: Option<u64>,
    pub is_bird_callable: bool,
    /// Last time the bird was seen at rest, for the recall timeout
    pub bird_last_active_time: u64,
    events: Vec<GameEvent>,
}

impl GameState {
    /// New game with the shipped configuration
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, Arc::new(GameConfig::default()))
    }

    pub fn with_config(seed: u64, config: Arc<GameConfig>) -> Self {
        let rng = Pcg32::seed_from_u64(seed);
        let mut state = Self::fresh(seed, config, rng, EntityIds::default());
        state.start_run(0);
        state
    }

    fn fresh(seed: u64, config: Arc<GameConfig>, rng: Pcg32, ids: EntityIds) -> Self {
        let tower = Tower::new(
            config.tower_base_x(),
            config.arena.ground_y,
            config.initial_tower_top_y(),
            &config,
        );
        let slingshot = Vec2::new(config.bird.slingshot_x, tower.top_y() + config.bird.slingshot_offset_y);
        Self {
            seed,
            rng,
            ids,
            stage_state: StageState::Playing,
            stage_manager: StageManager::default(),
            bird: Bird::new(slingshot, &config),
            dragging: false,
            slingshot,
            ground: Ground::new(&config),
            tower,
            clouds: Vec::new(),
            enemies: Vec::new(),
            items: Vec::new(),
            particles: Vec::new(),
            enemies_defeated_count: 0,
            boss_spawned: false,
            score: 0,
            max_combo: 0,
            combo_gauge: ComboGauge::default(),
            pending_items: Vec::new(),
            tower_bonus_score: 0,
            final_block_count: 0,
            next_enemy_spawn: 0,
            next_heart_spawn: 0,
            stage_clear_time: None,
            is_bird_callable: false,
            bird_last_active_time: 0,
            events: Vec::new(),
            config,
        }
    }

    fn start_run(&mut self, now: u64) {
        self.regenerate_clouds();
        self.reset_level_state(now);
        self.bird_last_active_time = now;
        self.push_event(GameEvent::StageStart {
            stage: self.stage_manager.current_stage,
        });
        log::info!("Run started (seed {})", self.seed);
    }

    /// Throw everything away and start again from stage 1
    ///
    /// The random stream carries on so restarts differ from each other.
    pub fn restart(&mut self, now: u64) {
        let rng = self.rng.clone();
        let ids = std::mem::take(&mut self.ids);
        *self = Self::fresh(self.seed, Arc::clone(&self.config), rng, ids);
        self.start_run(now);
    }

    pub fn next_entity_id(&mut self) -> u32 {
        self.ids.next_id()
    }

    pub fn current_settings(&self) -> Option<&StageSettings> {
        self.stage_manager.current_settings(&self.config.stages)
    }

    pub fn current_boss(&self) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.is_boss())
    }

    /// Reset counters and spawn timers for the current stage
    pub fn reset_level_state(&mut self, now: u64) {
        self.stage_state = StageState::Playing;
        self.enemies_defeated_count = 0;
        self.boss_spawned = false;
        self.stage_clear_time = None;
        self.next_enemy_spawn = now + self.config.enemy.first_spawn_delay_ms;
        self.schedule_next_heart(now);
    }

    pub(crate) fn schedule_next_heart(&mut self, now: u64) {
        let spawn = self.current_settings().map(|s| s.heart_spawn).unwrap_or_default();
        self.next_heart_spawn = now + spawn.next_delay(&mut self.rng);
    }

    pub fn regenerate_clouds(&mut self) {
        let layout = create_cloud_layout(
            self.slingshot.x,
            self.tower.top_y(),
            &self.config,
            &mut self.ids,
            &mut self.rng,
        );
        log::debug!("Placed {} clouds in {} attempts", layout.clouds.len(), layout.attempts);
        self.clouds = layout.clouds;
    }

    /// Return the bird to the slingshot
    pub fn reset_bird(&mut self) {
        self.bird.reset(Some(self.slingshot), &self.config);
        self.dragging = false;
        self.push_event(GameEvent::BirdReset);
    }

    pub fn add_score(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }

    pub fn spawn_particles(&mut self, pos: Vec2, config: &BurstConfig, colors: &[u32]) {
        let new = burst(pos, config, colors, &mut self.rng);
        self.particles.extend(new);
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn hud(&self, now: u64) -> HudSnapshot {
        let settings = self.current_settings();
        let trajectory = if self.dragging {
            let cfg = &self.config;
            super::bird::predict_trajectory(
                self.bird.pos,
                self.slingshot - self.bird.pos,
                cfg.physics.gravity,
                cfg.physics.launch_power_multiplier,
                cfg.bird.trajectory_points,
                cfg.bird.trajectory_point_gap,
            )
        } else {
            Vec::new()
        };

        HudSnapshot {
            stage: self.stage_manager.current_stage,
            stage_name: settings.map(|s| s.name.clone()).unwrap_or_default(),
            boss_name: settings.and_then(|s| s.boss_name.clone()),
            stage_state: self.stage_state,
            score: self.score,
            combo: self.bird.combo_count,
            max_combo: self.max_combo,
            gauge_ratio: self.combo_gauge.ratio(&self.config),
            gauge_flashing: self.combo_gauge.is_flashing(&self.config, now),
            bird_hp_ratio: self.bird.hp_ratio(),
            tower_blocks: self.tower.block_count(),
            enemies_defeated: self.enemies_defeated_count,
            enemies_to_clear: settings
                .filter(|s| !s.is_boss_stage)
                .map(|s| s.clear_enemies_count),
            boss_hp_ratio: self
                .current_boss()
                .filter(|b| b.max_hp > 0.0)
                .map(|b| b.hp / b.max_hp),
            is_bird_callable: self.is_bird_callable,
            trajectory,
        }
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            score: self.score,
            max_combo: self.max_combo,
            tower_height: if self.stage_state.is_finished() {
                self.final_block_count
            } else {
                self.tower.block_count()
            },
            won: self.stage_state == StageState::GameWon,
        }
    }
}
