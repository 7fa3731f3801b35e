//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Host millisecond clock passed in, per-frame integration
//! - Seeded RNG only
//! - Stable iteration order (entities in spawn order)
//! - No rendering or platform dependencies

pub mod bird;
pub mod boss;
pub mod cloud;
pub mod collision;
pub mod enemy;
pub mod events;
pub mod geom;
pub mod ground;
pub mod item;
pub mod particle;
pub mod score;
pub mod stage;
pub mod state;
pub mod tick;
pub mod tower;

pub use bird::{Bird, clamp_pull, predict_trajectory};
pub use boss::{BossState, WeakPoint};
pub use cloud::{Cloud, CloudLayout, create_cloud_layout};
pub use collision::{CollisionResult, circle_circle_collision, circle_rect_collision, bounce_velocity};
pub use enemy::{Enemy, EnemyKind, Life};
pub use events::GameEvent;
pub use geom::Rect;
pub use ground::Ground;
pub use item::{Item, ItemKind};
pub use particle::Particle;
pub use score::{ComboGauge, PendingItem};
pub use stage::{EnemyType, StageError, StageManager, StageSettings, StageTable};
pub use state::{GameState, GameSummary, HudSnapshot, StageState};
pub use tick::{TickInput, autopilot, jump_to_stage, tick};
pub use tower::{Block, Tower};
