/*!
Math aliases and small vector helpers shared by the gravity, controller and
floating-body modules.

This module intentionally contains no per-step logic. Every helper here is
NaN-free for degenerate input: projections and normalizations that would
divide by a near-zero length return the zero vector instead.
*/

use nalgebra as na;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Vec2 = na::Vector2<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// Lengths at or below this are treated as zero when normalizing.
pub const NORMALIZE_EPS: f32 = 1.0e-6;

/// World up used before any gravity field has been sampled.
#[inline]
pub fn world_up() -> Vec3 {
    Vec3::y()
}

/// Remove the component of `v` along the unit normal `n`.
#[inline]
pub fn project_on_plane(v: &Vec3, n: &Vec3) -> Vec3 {
    v - n * v.dot(n)
}

/// Project `direction` onto the plane with unit normal `n` and normalize.
///
/// Returns the zero vector when `direction` is (nearly) parallel to `n`.
#[inline]
pub fn project_direction_on_plane(direction: &Vec3, n: &Vec3) -> Vec3 {
    normalize_or_zero(&project_on_plane(direction, n))
}

#[inline]
pub fn normalize_or_zero(v: &Vec3) -> Vec3 {
    v.try_normalize(NORMALIZE_EPS).unwrap_or_else(Vec3::zeros)
}

/// Step `current` toward `target` by at most `max_delta`, never overshooting.
#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + delta.signum() * max_delta
    }
}

#[inline]
pub fn is_finite_vec(v: &Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}
