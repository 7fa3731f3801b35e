//! Game configuration
//!
//! One immutable `GameConfig` is built at start-up and shared (behind an
//! `Arc`) with every simulation component. `Default` carries the shipped
//! balance; a JSON file may override any subset of it.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sim::stage::StageTable;

/// Errors produced while loading a configuration file
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read
    Io(std::io::Error),
    /// The file was read but is not valid configuration JSON
    Parse(serde_json::Error),
    /// The stage table has no stage 1
    EmptyStageTable,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config: {e}"),
            ConfigError::Parse(e) => write!(f, "failed to parse config: {e}"),
            ConfigError::EmptyStageTable => write!(f, "stage table must contain stage 1"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::EmptyStageTable => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Playfield dimensions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub screen_width: f32,
    pub screen_height: f32,
    /// Top edge of the ground plane
    pub ground_y: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            screen_width: 1280.0,
            screen_height: 720.0,
            ground_y: 650.0,
        }
    }
}

/// Global physics constants (per-frame units)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub launch_power_multiplier: f32,
    /// Horizontal damping when the bird bounces on the ground
    pub ground_friction: f32,
    /// Vertical restitution when the bird bounces on the ground
    pub ground_bounciness: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.5,
            launch_power_multiplier: 0.3,
            ground_friction: 0.99,
            ground_bounciness: 0.5,
        }
    }
}

/// Projectile tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BirdConfig {
    pub default_radius: f32,
    pub max_radius: f32,
    pub power_up_scale: f32,
    pub hp_per_radius: f32,
    pub attack_per_radius: f32,
    pub power_up_cooldown_ms: u64,
    pub reset_min_velocity_sq: f32,
    pub stuck_reset_ms: u64,
    pub call_timeout_ms: u64,
    /// Per-frame decay of spin while airborne
    pub angular_friction: f32,
    /// Radians of spin per unit of tangential impact speed
    pub collision_spin_factor: f32,
    pub speed_boost_multiplier: f32,
    pub size_boost_duration_ms: u64,
    pub ground_safe_ms: u64,
    pub tower_safe_ms: u64,
    pub cloud_safe_ms: u64,
    pub max_pull_distance: f32,
    pub min_pull_to_launch: f32,
    pub slingshot_x: f32,
    /// Offset of the slingshot above the tower top (negative is up)
    pub slingshot_offset_y: f32,
    pub trajectory_points: usize,
    pub trajectory_point_gap: usize,
}

impl Default for BirdConfig {
    fn default() -> Self {
        Self {
            default_radius: 20.0,
            max_radius: 60.0,
            power_up_scale: 1.25,
            hp_per_radius: 10.0,
            attack_per_radius: 7.5,
            power_up_cooldown_ms: 500,
            reset_min_velocity_sq: 2.0,
            stuck_reset_ms: 500,
            call_timeout_ms: 2000,
            angular_friction: 0.98,
            collision_spin_factor: 0.1_f32.to_radians(),
            speed_boost_multiplier: 2.0,
            size_boost_duration_ms: 5000,
            ground_safe_ms: 500,
            tower_safe_ms: 500,
            cloud_safe_ms: 150,
            max_pull_distance: 100.0,
            min_pull_to_launch: 20.0,
            slingshot_x: 180.0,
            slingshot_offset_y: -20.0,
            trajectory_points: 10,
            trajectory_point_gap: 5,
        }
    }
}

/// Screen-edge walls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WallConfig {
    pub side_wall_bounce: bool,
    pub bounciness: f32,
    pub damage: f32,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            side_wall_bounce: true,
            bounciness: 0.8,
            damage: 100.0,
        }
    }
}

/// Tower and block tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerConfig {
    pub block_width: f32,
    pub block_height: f32,
    pub initial_blocks: u32,
    pub block_hp: f32,
    pub block_death_ms: u64,
    pub block_death_radius_multiplier: f32,
    pub hit_animation_ms: u64,
    pub hit_animation_min_scale: f32,
    /// Damage the tower deals back to an enemy on contact
    pub contact_damage: f32,
    pub knockback_force: f32,
    pub boss_contact_knockback_force: f32,
    /// Restitution of the bird off tower blocks
    pub bounciness: f32,
}

impl Default for TowerConfig {
    fn default() -> Self {
        Self {
            block_width: 40.0,
            block_height: 40.0,
            initial_blocks: 3,
            block_hp: 200.0,
            block_death_ms: 200,
            block_death_radius_multiplier: 2.0,
            hit_animation_ms: 300,
            hit_animation_min_scale: 0.75,
            contact_damage: 40.0,
            knockback_force: 20.0,
            boss_contact_knockback_force: 30.0,
            bounciness: 1.2,
        }
    }
}

/// Ground squash animation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub animation_ms: u64,
    pub animation_min_scale: f32,
    /// Minimum downward speed of the bird that squashes the ground
    pub animation_min_velocity_y: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            animation_ms: 80,
            animation_min_scale: 0.95,
            animation_min_velocity_y: 5.0,
        }
    }
}

/// Cloud shape, animation and layout generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    pub bounciness: f32,
    pub animation_ms: u64,
    pub animation_min_scale: f32,
    pub min_count: usize,
    pub max_count: usize,
    pub min_distance_x: f32,
    pub min_distance_y: f32,
    pub spawn_padding_x: f32,
    pub spawn_y_min: f32,
    pub spawn_y_max: f32,
    pub min_distance_from_tower: f32,
    pub max_layout_attempts: u32,
    pub min_puffs: u32,
    pub max_puffs: u32,
    pub float_speed: f32,
    pub float_amplitude: f32,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            bounciness: 1.05,
            animation_ms: 600,
            animation_min_scale: 0.8,
            min_count: 5,
            max_count: 7,
            min_distance_x: 250.0,
            min_distance_y: 200.0,
            spawn_padding_x: 100.0,
            spawn_y_min: 150.0,
            spawn_y_max: 450.0,
            min_distance_from_tower: 300.0,
            max_layout_attempts: 50,
            min_puffs: 3,
            max_puffs: 7,
            float_speed: 0.01,
            float_amplitude: 4.0,
        }
    }
}

/// Shared enemy tuning and the ground walker's stats
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub default_spawn_interval_ms: u64,
    pub first_spawn_delay_ms: u64,
    pub spawn_offset_x: f32,
    pub min_size: f32,
    pub max_size: f32,
    pub hp_multiplier: f32,
    pub speed_base: f32,
    pub min_speed: f32,
    pub attack_multiplier: f32,
    /// Restitution of the bird off an enemy
    pub bounciness: f32,
    pub knockback_force: f32,
    pub knockback_attack_power_scale: f32,
    pub friction: f32,
    pub ground_bounciness: f32,
    pub ground_friction: f32,
    pub animation_ms: u64,
    pub animation_min_scale: f32,
    pub death_ms: u64,
    pub death_radius_multiplier: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            default_spawn_interval_ms: 5000,
            first_spawn_delay_ms: 500,
            spawn_offset_x: 20.0,
            min_size: 40.0,
            max_size: 120.0,
            hp_multiplier: 2.0,
            speed_base: 40.0,
            min_speed: 0.1,
            attack_multiplier: 1.5,
            bounciness: 0.75,
            knockback_force: 1.0,
            knockback_attack_power_scale: 0.1,
            friction: 0.9,
            ground_bounciness: 0.4,
            ground_friction: 0.75,
            animation_ms: 300,
            animation_min_scale: 0.7,
            death_ms: 200,
            death_radius_multiplier: 1.5,
        }
    }
}

/// Flying enemy tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyingConfig {
    pub min_y: f32,
    pub max_y: f32,
    pub attack_range_min: f32,
    pub attack_range_max: f32,
    pub target_y_min: f32,
    pub target_y_max: f32,
    /// Max heading change per frame (radians)
    pub rotation_speed: f32,
    pub min_size: f32,
    pub max_size: f32,
    pub hp_multiplier: f32,
    pub speed_base: f32,
    pub min_speed: f32,
    pub attack_multiplier: f32,
}

impl Default for FlyingConfig {
    fn default() -> Self {
        Self {
            min_y: 50.0,
            max_y: 450.0,
            attack_range_min: -150.0,
            attack_range_max: 450.0,
            target_y_min: -80.0,
            target_y_max: 120.0,
            rotation_speed: 3.0_f32.to_radians(),
            min_size: 40.0,
            max_size: 100.0,
            hp_multiplier: 1.5,
            speed_base: 30.0,
            min_speed: 0.1,
            attack_multiplier: 1.5,
        }
    }
}

/// Jumping enemy tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpingConfig {
    pub min_size: f32,
    pub max_size: f32,
    /// Weakest jump impulse (negative is up)
    pub min_jump_force: f32,
    /// Strongest jump impulse (negative is up)
    pub max_jump_force: f32,
    pub cooldown_min_ms: u64,
    pub cooldown_max_ms: u64,
    pub hp_multiplier: f32,
    pub attack_multiplier: f32,
    pub speed_base: f32,
}

impl Default for JumpingConfig {
    fn default() -> Self {
        Self {
            min_size: 40.0,
            max_size: 120.0,
            min_jump_force: -10.0,
            max_jump_force: -20.0,
            cooldown_min_ms: 1000,
            cooldown_max_ms: 3000,
            hp_multiplier: 3.0,
            attack_multiplier: 1.5,
            speed_base: 80.0,
        }
    }
}

/// Boss tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    pub size: f32,
    pub max_hp: f32,
    pub base_speed: f32,
    pub speed_scale_multiplier: f32,
    pub attack_power: f32,
    pub weak_point_size: f32,
    /// How far weak points sit inside the boss edge
    pub weak_point_inset: f32,
    pub weak_point_switch_ms: u64,
    pub knockback_force: f32,
    pub scale_reduction_on_hit: f32,
    pub min_scale: f32,
    /// Restitution of the bird off the boss body
    pub body_bounciness: f32,
    pub halo_float_speed: f32,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            size: 300.0,
            max_hp: 500.0,
            base_speed: 0.1,
            speed_scale_multiplier: 5.0,
            attack_power: 300.0,
            weak_point_size: 60.0,
            weak_point_inset: 5.0,
            weak_point_switch_ms: 8000,
            knockback_force: 20.0,
            scale_reduction_on_hit: 0.1,
            min_scale: 0.2,
            body_bounciness: 1.1,
            halo_float_speed: 0.05,
        }
    }
}

/// Item sizes, spawn animation and reward odds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemConfig {
    /// Offset above the top of the parent cloud (negative is up)
    pub y_offset: f32,
    pub heart_size: f32,
    pub speed_up_size: f32,
    pub size_up_size: f32,
    pub spawn_animation_ms: u64,
    pub spawn_animation_max_scale: f32,
    pub heart_chance: f32,
    pub speed_up_chance: f32,
    pub size_up_chance: f32,
    pub air_spawn_x_min: f32,
    pub air_spawn_x_max: f32,
    pub air_spawn_y_min: f32,
    pub air_spawn_y_max: f32,
}

impl Default for ItemConfig {
    fn default() -> Self {
        Self {
            y_offset: -15.0,
            heart_size: 40.0,
            speed_up_size: 40.0,
            size_up_size: 40.0,
            spawn_animation_ms: 750,
            spawn_animation_max_scale: 2.5,
            heart_chance: 0.5,
            speed_up_chance: 0.3,
            size_up_chance: 0.2,
            air_spawn_x_min: 300.0,
            air_spawn_x_max: 1180.0,
            air_spawn_y_min: 200.0,
            air_spawn_y_max: 500.0,
        }
    }
}

/// Score values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    pub enemy_points: u64,
    pub boss_weak_point_points: u64,
    pub combo_linear_bonus: u64,
    /// (minimum combo, bonus) pairs; the highest tier reached applies
    pub combo_tier_bonus: Vec<(u32, u64)>,
    pub tower_bonus_per_block: u64,
    /// Smallest combo worth a popup
    pub combo_min_to_show: u32,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            enemy_points: 100,
            boss_weak_point_points: 250,
            combo_linear_bonus: 20,
            combo_tier_bonus: vec![(5, 50), (10, 100), (20, 300)],
            tower_bonus_per_block: 100,
            combo_min_to_show: 2,
        }
    }
}

/// Combo gauge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GaugeConfig {
    pub max: u32,
    pub increase_base: u32,
    pub increase_per_combo: u32,
    pub flash_ms: u64,
    pub item_spawn_delay_ms: u64,
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self {
            max: 1000,
            increase_base: 25,
            increase_per_combo: 15,
            flash_ms: 750,
            item_spawn_delay_ms: 500,
        }
    }
}

/// Burst parameters for one kind of cosmetic particle effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurstConfig {
    pub count: usize,
    /// Lifetime in frames
    pub lifetime: u32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub gravity: f32,
    pub start_size: f32,
    pub end_size: f32,
}

/// Particle bursts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub heart_collect: BurstConfig,
    pub hit: BurstConfig,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            heart_collect: BurstConfig {
                count: 25,
                lifetime: 40,
                min_speed: 1.0,
                max_speed: 4.0,
                gravity: 0.1,
                start_size: 7.0,
                end_size: 0.0,
            },
            hit: BurstConfig {
                count: 10,
                lifetime: 20,
                min_speed: 1.5,
                max_speed: 5.0,
                gravity: 0.0,
                start_size: 5.0,
                end_size: 0.0,
            },
        }
    }
}

/// Stage flow timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageFlowConfig {
    pub clear_wait_ms: u64,
}

impl Default for StageFlowConfig {
    fn default() -> Self {
        Self {
            clear_wait_ms: 2500,
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub arena: ArenaConfig,
    pub physics: PhysicsConfig,
    pub bird: BirdConfig,
    pub walls: WallConfig,
    pub tower: TowerConfig,
    pub ground: GroundConfig,
    pub cloud: CloudConfig,
    pub enemy: EnemyConfig,
    pub flying: FlyingConfig,
    pub jumping: JumpingConfig,
    pub boss: BossConfig,
    pub items: ItemConfig,
    pub score: ScoreConfig,
    pub gauge: GaugeConfig,
    pub particles: ParticleConfig,
    pub stage: StageFlowConfig,
    pub stages: StageTable,
}

impl GameConfig {
    /// Parse a configuration from JSON; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load a configuration file, falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("{e}; using default config");
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.stages.get(1).is_none() {
            return Err(ConfigError::EmptyStageTable);
        }
        Ok(())
    }

    /// Y coordinate of the initial tower top
    pub fn initial_tower_top_y(&self) -> f32 {
        self.arena.ground_y - self.tower.initial_blocks as f32 * self.tower.block_height
    }

    /// Left edge of the tower column, centred under the slingshot
    pub fn tower_base_x(&self) -> f32 {
        self.bird.slingshot_x - self.tower.block_width / 2.0
    }

    /// Horizontal centre of the tower column
    pub fn tower_center_x(&self) -> f32 {
        self.tower_base_x() + self.tower.block_width / 2.0
    }
}
