//! Collision detection for circles against circles and rectangles
//!
//! The projectile is the only circle that bounces; everything it hits is a
//! cloud puff (circle) or an axis-aligned rectangle (blocks, enemies, weak
//! points). Detection returns a contact normal pointing from the collider
//! toward the circle centre, plus the depth needed to separate them.

use glam::Vec2;

use super::geom::Rect;
use crate::safe_normalize;

/// Direction used when a contact has no usable normal (straight up)
pub const FALLBACK_NORMAL: Vec2 = Vec2::new(0.0, -1.0);

/// Below this distance the closest point is treated as coincident with the centre
const COINCIDENT_EPSILON: f32 = 0.01;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact point on the collider surface
    pub point: Vec2,
    /// Unit normal pointing from the collider toward the circle centre
    pub normal: Vec2,
    /// Distance the circle must move along `normal` to stop overlapping
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check a circle against another circle
pub fn circle_circle_collision(
    pos: Vec2,
    radius: f32,
    other_center: Vec2,
    other_radius: f32,
) -> CollisionResult {
    let offset = pos - other_center;
    let dist = offset.length();
    if dist >= radius + other_radius {
        return CollisionResult::miss();
    }

    let normal = safe_normalize(offset, FALLBACK_NORMAL);
    CollisionResult {
        hit: true,
        point: other_center + normal * other_radius,
        normal,
        penetration: radius + other_radius - dist,
    }
}

/// Check a circle against an axis-aligned rectangle
///
/// The normal comes from the closest point on the rectangle. When the circle
/// centre sits on or inside the rectangle the normal falls back to the
/// rectangle-centre-to-circle direction, and the penetration is the distance
/// along it that leaves the whole circle clear of the rectangle.
pub fn circle_rect_collision(pos: Vec2, radius: f32, rect: &Rect) -> CollisionResult {
    let closest = rect.closest_point(pos);
    let dist = pos.distance(closest);
    if dist >= radius {
        return CollisionResult::miss();
    }

    if dist > COINCIDENT_EPSILON {
        return CollisionResult {
            hit: true,
            point: closest,
            normal: (pos - closest) / dist,
            penetration: radius - dist,
        };
    }

    let normal = safe_normalize(pos - rect.center(), FALLBACK_NORMAL);
    let inflated = Rect::new(
        rect.x - radius,
        rect.y - radius,
        rect.w + 2.0 * radius,
        rect.h + 2.0 * radius,
    );
    CollisionResult {
        hit: true,
        point: pos + normal * exit_distance(rect, pos, normal),
        normal,
        penetration: exit_distance(&inflated, pos, normal),
    }
}

/// Distance from `p` (inside `rect`) to its boundary travelling along `dir`
fn exit_distance(rect: &Rect, p: Vec2, dir: Vec2) -> f32 {
    let tx = if dir.x > f32::EPSILON {
        (rect.right() - p.x) / dir.x
    } else if dir.x < -f32::EPSILON {
        (rect.left() - p.x) / dir.x
    } else {
        f32::INFINITY
    };
    let ty = if dir.y > f32::EPSILON {
        (rect.bottom() - p.y) / dir.y
    } else if dir.y < -f32::EPSILON {
        (rect.top() - p.y) / dir.y
    } else {
        f32::INFINITY
    };
    let t = tx.min(ty);
    if t.is_finite() { t.max(0.0) } else { 0.0 }
}

/// Reflect velocity off a surface
///
/// Velocity after bouncing off a surface with outward `normal`
///
/// The component along the normal flips; the whole result is then damped
/// by `restitution`.
#[inline]
pub fn bounce_velocity(velocity: Vec2, normal: Vec2, restitution: f32) -> Vec2 {
    let into_surface = velocity.dot(normal);
    (velocity - normal * (into_surface * 2.0)) * restitution
}
