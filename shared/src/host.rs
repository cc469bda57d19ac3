//! Engine seam for the walker core.
//!
//! The controller and floating bodies never talk to a physics engine directly. A host supplies
//! a [`PhysicsBody`] for the simulated sphere, a [`GroundProbe`] for the snap ray and the
//! per-manifold contact lists as [`ContactPoint`] slices. See `rapier_world` for the Rapier host.

use crate::{
    layers::{LayerMask, SurfaceTag},
    types::Vec3,
};

/// A single collision contact as seen from the simulated body.
#[derive(Clone, Copy, Debug)]
pub struct ContactPoint {
    /// World-space unit normal pointing from the touched surface toward the body.
    pub normal: Vec3,
    pub surface: SurfaceTag,
}

impl ContactPoint {
    pub fn new(normal: Vec3, surface: SurfaceTag) -> Self {
        Self { normal, surface }
    }
}

/// First surface hit by a probe ray.
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    /// World-space unit surface normal at the hit point.
    pub normal: Vec3,
    /// Distance along the ray (meters).
    pub distance: f32,
    pub surface: SurfaceTag,
}

/// Dynamic body the host integrates. Velocity is read at step start and written at step end.
pub trait PhysicsBody {
    fn velocity(&self) -> Vec3;

    fn set_velocity(&mut self, velocity: Vec3);

    fn position(&self) -> Vec3;

    /// Apply `acceleration` (m/s^2) for the coming host step, independent of mass.
    fn add_acceleration(&mut self, acceleration: Vec3);

    /// Engine-reported sleep state.
    fn is_sleeping(&self) -> bool {
        false
    }

    /// Turn off engine-native gravity so only the aggregated field applies.
    fn disable_native_gravity(&mut self) {}
}

/// Synchronous scene query used by ground snapping.
pub trait GroundProbe {
    fn raycast(
        &self,
        origin: &Vec3,
        direction: &Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit>;
}

/// A probe that never hits anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoGround;

impl GroundProbe for NoGround {
    fn raycast(&self, _: &Vec3, _: &Vec3, _: f32, _: LayerMask) -> Option<RayHit> {
        None
    }
}
