//! The defended tower: a single column of destructible blocks
//!
//! Blocks die in two steps (Alive → Dying → Destroyed). Removing a destroyed
//! block drops every block above it, and falling blocks settle on the ground
//! or on the first settled block whose vertical midpoint they pass.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geom::Rect;
use crate::config::GameConfig;

/// Lifecycle of a block; transitions only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockState {
    Alive,
    /// Playing the death effect; no longer collidable
    Dying,
    /// Ready for removal
    Destroyed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Current collision rect (scaled by the hit animation)
    pub rect: Rect,
    /// Unscaled rect at the last resting position
    pub home: Rect,
    pub hp: f32,
    pub max_hp: f32,
    pub state: BlockState,
    pub falling: bool,
    pub velocity_y: f32,
    pub hit_animation_start: Option<u64>,
    pub scale: f32,
    pub death_start: Option<u64>,
    pub death_effect_radius: f32,
    pub center_on_death: Vec2,
}

impl Block {
    pub fn new(x: f32, y: f32, w: f32, h: f32, hp: f32) -> Self {
        let rect = Rect::new(x, y, w, h);
        Self {
            rect,
            home: rect,
            hp,
            max_hp: hp,
            state: BlockState::Alive,
            falling: false,
            velocity_y: 0.0,
            hit_animation_start: None,
            scale: 1.0,
            death_start: None,
            death_effect_radius: 0.0,
            center_on_death: rect.center(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state == BlockState::Alive
    }

    pub fn is_finished(&self) -> bool {
        self.state == BlockState::Destroyed
    }

    /// Start the hit pulse; ignored while one is already playing
    pub fn start_animation(&mut self, now: u64) {
        if self.hit_animation_start.is_none() && self.is_alive() {
            self.hit_animation_start = Some(now);
        }
    }

    /// Advance falling, hit pulse and death effect by one frame
    ///
    /// `blocks_below` are the blocks earlier in the tower's list.
    pub fn update(&mut self, blocks_below: &[Block], ground_y: f32, config: &GameConfig, now: u64) {
        match self.state {
            BlockState::Alive => {
                if self.falling {
                    self.fall(blocks_below, ground_y, config.physics.gravity);
                }
                self.update_hit_animation(config, now);
            }
            BlockState::Dying => {
                let start = self.death_start.unwrap_or(now);
                let elapsed = now.saturating_sub(start);
                let duration = config.tower.block_death_ms;
                if elapsed >= duration {
                    self.state = BlockState::Destroyed;
                } else {
                    let progress = elapsed as f32 / duration as f32;
                    let max_radius = self.home.w / 2.0 * config.tower.block_death_radius_multiplier;
                    self.death_effect_radius = max_radius * progress;
                }
            }
            BlockState::Destroyed => {}
        }
    }

    fn fall(&mut self, blocks_below: &[Block], ground_y: f32, gravity: f32) {
        self.velocity_y += gravity;
        self.rect.y += self.velocity_y;

        if self.rect.bottom() >= ground_y {
            self.rect.set_bottom(ground_y);
            self.stop_falling();
            return;
        }

        for other in blocks_below {
            if !other.falling
                && self.rect.intersects(&other.rect)
                && self.rect.bottom() > other.rect.center_y()
            {
                self.rect.set_bottom(other.rect.top());
                self.stop_falling();
                break;
            }
        }
    }

    fn update_hit_animation(&mut self, config: &GameConfig, now: u64) {
        let Some(start) = self.hit_animation_start else {
            return;
        };
        let elapsed = now.saturating_sub(start);
        let duration = config.tower.hit_animation_ms;
        if elapsed >= duration {
            self.hit_animation_start = None;
            self.scale = 1.0;
        } else {
            let min = config.tower.hit_animation_min_scale;
            self.scale = min + (1.0 - min) * (elapsed as f32 / duration as f32);
        }
        self.rect.resize_centered(self.home.w * self.scale, self.home.h * self.scale);
    }

    /// Returns true when this damage destroys the block
    pub fn take_damage(&mut self, amount: f32, now: u64) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.hp -= amount;
        if self.hp <= 0.0 {
            self.hp = 0.0;
            self.destroy(now);
            return true;
        }
        false
    }

    pub fn destroy(&mut self, now: u64) {
        if self.is_alive() {
            self.state = BlockState::Dying;
            self.death_start = Some(now);
            self.center_on_death = self.rect.center();
        }
    }

    /// Returns true if the block was resting and is now falling
    pub fn start_falling(&mut self) -> bool {
        if self.falling || !self.is_alive() {
            return false;
        }
        self.falling = true;
        self.home.x = self.rect.x;
        self.home.y = self.rect.y;
        true
    }

    pub fn stop_falling(&mut self) {
        self.falling = false;
        self.velocity_y = 0.0;
        self.home.x = self.rect.x;
        self.home.y = self.rect.y;
    }
}

/// What changed during one [`Tower::update`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TowerUpdate {
    /// Destroyed blocks removed from the list
    pub removed: usize,
    /// Blocks that began falling because something below them was removed
    pub started_falling: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tower {
    /// Bottom-first
    pub blocks: Vec<Block>,
    /// Left edge of the column
    pub base_x: f32,
    pub ground_y: f32,
    pub original_num_blocks: usize,
}

impl Tower {
    /// Stack blocks from `ground_y` up to `top_y`
    pub fn new(base_x: f32, ground_y: f32, top_y: f32, config: &GameConfig) -> Self {
        let w = config.tower.block_width;
        let h = config.tower.block_height;
        let count = ((ground_y - top_y) / h).max(0.0) as usize;
        let blocks = (0..count)
            .map(|i| Block::new(base_x, ground_y - (i as f32 + 1.0) * h, w, h, config.tower.block_hp))
            .collect();
        Self {
            blocks,
            base_x,
            ground_y,
            original_num_blocks: count,
        }
    }

    pub fn update(&mut self, config: &GameConfig, now: u64) -> TowerUpdate {
        for i in 0..self.blocks.len() {
            let (below, rest) = self.blocks.split_at_mut(i);
            rest[0].update(below, self.ground_y, config, now);
        }

        let mut result = TowerUpdate::default();
        for i in (0..self.blocks.len()).rev() {
            if self.blocks[i].is_finished() {
                self.blocks.remove(i);
                result.removed += 1;
                for block in &mut self.blocks[i..] {
                    if block.start_falling() {
                        result.started_falling += 1;
                    }
                }
            }
        }
        result
    }

    /// Highest block top, or the ground when nothing is left
    pub fn top_y(&self) -> f32 {
        self.blocks
            .iter()
            .map(|b| b.rect.top())
            .reduce(f32::min)
            .unwrap_or(self.ground_y)
    }

    pub fn center_x(&self, config: &GameConfig) -> f32 {
        self.base_x + config.tower.block_width / 2.0
    }

    pub fn is_destroyed(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Add a fresh block on top of the column
    pub fn repair_one_block(&mut self, config: &GameConfig) -> bool {
        let h = config.tower.block_height;
        let top = self.top_y() - h;
        self.blocks.push(Block::new(self.base_x, top, config.tower.block_width, h, config.tower.block_hp));
        self.blocks.sort_by(|a, b| b.rect.y.total_cmp(&a.rect.y));
        log::info!("Tower repaired: {} blocks", self.blocks.len());
        true
    }
}
