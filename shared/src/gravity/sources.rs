use super::GravitySource;
use crate::{
    constants::GRAVITY_MPS2,
    types::{Iso, NORMALIZE_EPS, Vec3},
};

/// Constant field everywhere.
#[derive(Clone, Copy, Debug)]
pub struct UniformGravity {
    pub gravity: Vec3,
}

impl UniformGravity {
    pub fn new(gravity: Vec3) -> Self {
        Self { gravity }
    }

    /// Earth-like gravity pointing down world -Y.
    pub fn earth() -> Self {
        Self::new(Vec3::new(0.0, -GRAVITY_MPS2, 0.0))
    }
}

impl GravitySource for UniformGravity {
    fn gravity_at(&self, _position: &Vec3) -> Vec3 {
        self.gravity
    }
}

/// Pulls toward an infinite plane along `-up`.
///
/// Full strength at or below the plane; above it the strength falls off linearly to zero at
/// `range`. A `range` of zero disables the falloff.
#[derive(Clone, Copy, Debug)]
pub struct PlaneGravity {
    pub origin: Vec3,
    /// Unit plane normal.
    pub up: Vec3,
    /// Magnitude (m/s^2).
    pub gravity: f32,
    pub range: f32,
}

impl GravitySource for PlaneGravity {
    fn gravity_at(&self, position: &Vec3) -> Vec3 {
        let distance = self.up.dot(&(position - self.origin));
        let mut g = -self.gravity;
        if self.range > 0.0 {
            if distance > self.range {
                return Vec3::zeros();
            }
            if distance > 0.0 {
                g *= 1.0 - distance / self.range;
            }
        }
        self.up * g
    }
}

/// Attracts toward `center`.
///
/// Full strength within `outer_radius`, linear falloff to zero at `outer_falloff_radius`.
#[derive(Clone, Copy, Debug)]
pub struct PointGravity {
    pub center: Vec3,
    /// Magnitude (m/s^2).
    pub gravity: f32,
    pub outer_radius: f32,
    pub outer_falloff_radius: f32,
}

impl PointGravity {
    pub fn new(center: Vec3, gravity: f32, outer_radius: f32, outer_falloff_radius: f32) -> Self {
        let outer_radius = outer_radius.max(0.0);
        Self {
            center,
            gravity,
            outer_radius,
            outer_falloff_radius: outer_falloff_radius.max(outer_radius),
        }
    }
}

impl GravitySource for PointGravity {
    fn gravity_at(&self, position: &Vec3) -> Vec3 {
        let to_center = self.center - position;
        let distance = to_center.norm();
        if distance <= NORMALIZE_EPS || distance > self.outer_falloff_radius {
            return Vec3::zeros();
        }
        let mut g = self.gravity / distance;
        if distance > self.outer_radius {
            let span = self.outer_falloff_radius - self.outer_radius;
            if span > NORMALIZE_EPS {
                g *= 1.0 - (distance - self.outer_radius) / span;
            }
        }
        to_center * g
    }
}

/// Uniform field confined to an oriented box; zero outside.
#[derive(Clone, Copy, Debug)]
pub struct BoxGravity {
    pub pose: Iso,
    pub half_extents: Vec3,
    /// Field in the box's local frame.
    pub gravity: Vec3,
}

impl GravitySource for BoxGravity {
    fn gravity_at(&self, position: &Vec3) -> Vec3 {
        let local = self.pose.inverse_transform_point(&(*position).into());
        let inside = local
            .coords
            .iter()
            .zip(self.half_extents.iter())
            .all(|(p, h)| p.abs() <= *h);
        if inside {
            self.pose.rotation * self.gravity
        } else {
            Vec3::zeros()
        }
    }
}

/// Uniform field confined to a ball; zero outside.
#[derive(Clone, Copy, Debug)]
pub struct SphereVolumeGravity {
    pub center: Vec3,
    pub radius: f32,
    pub gravity: Vec3,
}

impl GravitySource for SphereVolumeGravity {
    fn gravity_at(&self, position: &Vec3) -> Vec3 {
        if (position - self.center).norm_squared() <= self.radius * self.radius {
            self.gravity
        } else {
            Vec3::zeros()
        }
    }
}
