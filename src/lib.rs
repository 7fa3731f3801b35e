//! Babel Tower - A slingshot tower-defense arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, stages, scoring)
//! - `config`: Data-driven game balance
//! - `audio`: Sound cue mapping for the event stream
//! - `records`: Best-run records for end-screen comparison

pub mod audio;
pub mod config;
pub mod records;
pub mod sim;

pub use config::{ConfigError, GameConfig};
pub use records::Records;

use glam::Vec2;

/// Frame timing constants
pub mod consts {
    /// Frames per second the per-frame integration is tuned for
    pub const FPS: u32 = 60;
    /// Nominal frame length in milliseconds
    pub const FRAME_MS: u64 = 1000 / FPS as u64;
}

/// Normalize `v`, or return `fallback` when `v` has no usable direction
#[inline]
pub fn safe_normalize(v: Vec2, fallback: Vec2) -> Vec2 {
    let len_sq = v.length_squared();
    if len_sq > f32::EPSILON {
        v / len_sq.sqrt()
    } else {
        fallback
    }
}

/// Wrap an angle into [0, 2π)
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    angle.rem_euclid(std::f32::consts::TAU)
}

/// Wrap an angle difference into [-π, π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    (angle + PI).rem_euclid(TAU) - PI
}
