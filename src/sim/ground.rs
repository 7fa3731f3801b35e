//! Ground plane with a squash pulse on hard landings

use serde::{Deserialize, Serialize};

use super::geom::Rect;
use crate::config::GameConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ground {
    pub rect: Rect,
    pub home: Rect,
    pub animation_start: Option<u64>,
    /// Vertical squash, 1.0 at rest
    pub scale_y: f32,
}

impl Ground {
    pub fn new(config: &GameConfig) -> Self {
        let a = &config.arena;
        let rect = Rect::new(0.0, a.ground_y, a.screen_width, a.screen_height - a.ground_y);
        Self {
            rect,
            home: rect,
            animation_start: None,
            scale_y: 1.0,
        }
    }

    pub fn start_animation(&mut self, now: u64) {
        if self.animation_start.is_none() {
            self.animation_start = Some(now);
        }
    }

    pub fn update(&mut self, config: &GameConfig, now: u64) {
        let Some(start) = self.animation_start else {
            return;
        };

        let elapsed = now.saturating_sub(start);
        let duration = config.ground.animation_ms;
        if elapsed >= duration {
            self.animation_start = None;
            self.scale_y = 1.0;
            self.rect = self.home;
        } else {
            let progress = elapsed as f32 / duration as f32;
            let eased = 1.0 - (1.0 - progress).powi(2);
            let min = config.ground.animation_min_scale;
            self.scale_y = min + (1.0 - min) * eased;
            self.rect.h = self.home.h * self.scale_y;
            // Bottom stays pinned to the screen edge
            self.rect.set_bottom(self.home.bottom());
        }
    }
}
