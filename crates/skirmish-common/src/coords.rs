//! Planar geometry on the arena floor.
//!
//! All combat math happens on the horizontal plane; height is a rendering
//! concern. Positions and directions are `glam::Vec2`.

pub use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Distances below this are treated as "already there".
pub const EPSILON: f32 = 1e-4;

/// Distance between two points on the floor.
#[must_use]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Unit vector from `from` towards `to`, or zero if they coincide.
#[must_use]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    let delta = to - from;
    if delta.length_squared() < EPSILON * EPSILON {
        Vec2::ZERO
    } else {
        delta.normalize()
    }
}

/// Moves `from` towards `to` by at most `max_delta`, never overshooting.
#[must_use]
pub fn move_towards(from: Vec2, to: Vec2, max_delta: f32) -> Vec2 {
    let delta = to - from;
    let dist = delta.length();
    if dist <= max_delta || dist < EPSILON {
        to
    } else {
        from + delta / dist * max_delta
    }
}

/// Rotates a facing vector part of the way towards `desired`.
///
/// `t` is the blend factor in `[0, 1]`; 1.0 snaps straight to `desired`.
#[must_use]
pub fn turn_towards(facing: Vec2, desired: Vec2, t: f32) -> Vec2 {
    if desired.length_squared() < EPSILON * EPSILON {
        return facing;
    }
    let desired = desired.normalize();
    let blended = facing.lerp(desired, t.clamp(0.0, 1.0));
    let turned = blended.normalize_or_zero();
    if turned == Vec2::ZERO {
        desired
    } else {
        turned
    }
}

/// A circle on the floor: entity bodies and obstacles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Centre point.
    pub center: Vec2,
    /// Radius.
    pub radius: f32,
}

impl Circle {
    /// Creates a circle.
    #[must_use]
    pub const fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Checks whether a point lies inside or on the circle.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        self.center.distance_squared(point) <= self.radius * self.radius
    }

    /// Checks whether two circles overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let reach = self.radius + other.radius;
        self.center.distance_squared(other.center) <= reach * reach
    }

    /// Distance along a ray to the first contact with this circle.
    ///
    /// `dir` must be normalized. Returns `None` when the ray misses or the
    /// contact lies beyond `max_distance`. A ray starting inside the circle
    /// hits at distance 0.
    #[must_use]
    pub fn ray_hit(&self, origin: Vec2, dir: Vec2, max_distance: f32) -> Option<f32> {
        let m = origin - self.center;
        let b = m.dot(dir);
        let c = m.length_squared() - self.radius * self.radius;
        if c > 0.0 && b > 0.0 {
            return None;
        }
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let t = (-b - discriminant.sqrt()).max(0.0);
        (t <= max_distance).then_some(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_move_towards_does_not_overshoot() {
        let from = Vec2::new(0.0, 0.0);
        let to = Vec2::new(1.0, 0.0);
        assert_eq!(move_towards(from, to, 5.0), to);

        let step = move_towards(from, Vec2::new(10.0, 0.0), 2.0);
        assert!((step.x - 2.0).abs() < 1e-6);
        assert!(step.y.abs() < 1e-6);
    }

    #[test]
    fn test_direction_to_same_point_is_zero() {
        let p = Vec2::new(2.0, 2.0);
        assert_eq!(direction_to(p, p), Vec2::ZERO);
    }

    #[test]
    fn test_ray_hit_front_circle() {
        let circle = Circle::new(Vec2::new(5.0, 0.0), 1.0);
        let hit = circle.ray_hit(Vec2::ZERO, Vec2::X, 10.0);
        assert!(hit.is_some_and(|t| (t - 4.0).abs() < 1e-5));
    }

    #[test]
    fn test_ray_misses_behind_and_out_of_range() {
        let circle = Circle::new(Vec2::new(-5.0, 0.0), 1.0);
        assert!(circle.ray_hit(Vec2::ZERO, Vec2::X, 10.0).is_none());

        let far = Circle::new(Vec2::new(50.0, 0.0), 1.0);
        assert!(far.ray_hit(Vec2::ZERO, Vec2::X, 10.0).is_none());
    }

    #[test]
    fn test_ray_from_inside_hits_at_zero() {
        let circle = Circle::new(Vec2::ZERO, 2.0);
        assert_eq!(circle.ray_hit(Vec2::new(0.5, 0.0), Vec2::X, 1.0), Some(0.0));
    }

    #[test]
    fn test_turn_towards_full_blend_snaps() {
        let turned = turn_towards(Vec2::X, Vec2::new(0.0, 3.0), 1.0);
        assert!((turned - Vec2::Y).length() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_move_towards_bounded_step(
            fx in -100.0f32..100.0, fy in -100.0f32..100.0,
            tx in -100.0f32..100.0, ty in -100.0f32..100.0,
            step in 0.0f32..50.0,
        ) {
            let from = Vec2::new(fx, fy);
            let to = Vec2::new(tx, ty);
            let moved = move_towards(from, to, step);
            prop_assert!(from.distance(moved) <= step.max(EPSILON) + 1e-3);
            prop_assert!(moved.distance(to) <= from.distance(to) + 1e-3);
        }

        #[test]
        fn prop_ray_hit_lands_on_circle(
            cx in -20.0f32..20.0, cy in -20.0f32..20.0,
            radius in 0.1f32..5.0,
            angle in 0.0f32..std::f32::consts::TAU,
        ) {
            let circle = Circle::new(Vec2::new(cx, cy), radius);
            let origin = Vec2::new(30.0, 30.0);
            let dir = Vec2::new(angle.cos(), angle.sin());
            if let Some(t) = circle.ray_hit(origin, dir, 100.0) {
                prop_assert!(t <= 100.0);
                let point = origin + dir * t;
                prop_assert!((point.distance(circle.center) - radius).abs() < 1e-2);
            }
        }
    }
}
