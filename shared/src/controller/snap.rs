use super::{contact::ContactAccumulator, settings::ControllerSettings};
use crate::{
    host::GroundProbe,
    types::{Vec3, normalize_or_zero},
};

/// Inputs of one ground-snap attempt.
#[derive(Clone, Copy, Debug)]
pub struct SnapQuery {
    pub position: Vec3,
    pub up_axis: Vec3,
    pub steps_since_last_grounded: u32,
    pub steps_since_last_jump: u32,
}

/// Re-establish ground contact after losing it for a single step.
///
/// - Only eligible when grounded at most one step ago, more than two steps after a jump, and
///   while no faster than the max snap speed.
/// - Casts at most one ray along `-up` and requires a hit walkable under the accumulator's
///   slope limits for that surface.
/// - On success the contact becomes the hit normal and velocity is bent onto the new plane
///   keeping its speed.
///
/// Returns the new ground normal.
pub fn snap_to_ground(
    query: SnapQuery,
    settings: &ControllerSettings,
    contacts: &mut ContactAccumulator,
    velocity: &mut Vec3,
    probe: &dyn GroundProbe,
) -> Option<Vec3> {
    if query.steps_since_last_grounded > 1 || query.steps_since_last_jump <= 2 {
        return None;
    }
    let speed = velocity.norm();
    if speed > settings.max_snap_speed {
        return None;
    }

    let hit = probe.raycast(
        &query.position,
        &-query.up_axis,
        settings.snap_probe_distance,
        settings.probe_mask,
    )?;
    if query.up_axis.dot(&hit.normal) < contacts.limits().min_dot(hit.surface) {
        return None;
    }

    contacts.set_ground(hit.normal);
    let dot = velocity.dot(&hit.normal);
    if dot > 0.0 {
        *velocity = normalize_or_zero(&(*velocity - hit.normal * dot)) * speed;
    }
    log::trace!("Snapped to ground, normal {:?}", hit.normal);
    Some(hit.normal)
}
