//! Conversions between the simulation's nalgebra types and Bevy's glam types.

use bevy::{
    math::{Quat, Vec3},
    transform::components::Transform,
};
use gravity_walker::{InputFrame, types as sim};
use nalgebra as na;

pub fn to_bevy(v: &sim::Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub fn to_sim(v: Vec3) -> sim::Vec3 {
    sim::Vec3::new(v.x, v.y, v.z)
}

pub fn quat_to_bevy(q: &sim::Quat) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

/// Input frame whose right/forward axes follow the camera.
///
/// The frame's +Z is the camera's forward, so its +Y points down to keep it a proper rotation.
pub fn camera_input_frame(camera: &Transform) -> InputFrame {
    let right = to_sim(*camera.right());
    let down = to_sim(*camera.down());
    let forward = to_sim(*camera.forward());
    let basis = na::Rotation3::from_basis_unchecked(&[right, down, forward]);
    InputFrame::from_rotation(na::UnitQuaternion::from_rotation_matrix(&basis))
}
