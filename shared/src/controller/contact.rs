use super::settings::SlopeLimits;
use crate::{constants::STEEP_DOT_FLOOR, host::ContactPoint, types::Vec3};

/// Ground/steep contact sums collected for one simulation step.
///
/// Created by [`CharacterController::begin_contacts`](super::CharacterController::begin_contacts)
/// with the controller's current up axis, fed once per contact manifold, and consumed by the
/// step. Contacts are classified against the up axis at creation; the step refreshes the axis
/// from the local field before the steep-wedge check. Evaluating is purely additive, so a manifold reported through several callbacks
/// simply accumulates.
#[derive(Clone, Copy, Debug)]
pub struct ContactAccumulator {
    up_axis: Vec3,
    limits: SlopeLimits,
    pub(crate) ground_count: u32,
    pub(crate) steep_count: u32,
    /// Sum of ground normals; unit length only once the step has normalized it.
    pub(crate) contact_normal: Vec3,
    pub(crate) steep_normal: Vec3,
}

impl ContactAccumulator {
    pub fn new(up_axis: Vec3, limits: SlopeLimits) -> Self {
        Self {
            up_axis,
            limits,
            ground_count: 0,
            steep_count: 0,
            contact_normal: Vec3::zeros(),
            steep_normal: Vec3::zeros(),
        }
    }

    /// Classify every contact of one manifold against the up axis.
    pub fn evaluate(&mut self, contacts: &[ContactPoint]) {
        for contact in contacts {
            self.evaluate_one(contact);
        }
    }

    pub fn evaluate_one(&mut self, contact: &ContactPoint) {
        let up_dot = self.up_axis.dot(&contact.normal);
        if up_dot >= self.limits.min_dot(contact.surface) {
            self.ground_count += 1;
            self.contact_normal += contact.normal;
        } else if up_dot > STEEP_DOT_FLOOR {
            self.steep_count += 1;
            self.steep_normal += contact.normal;
        }
    }

    /// Promote a wedge of steep contacts to ground when their average is walkable.
    pub(crate) fn check_steep_contacts(&mut self) -> bool {
        if self.steep_count > 1 {
            self.steep_normal = crate::types::normalize_or_zero(&self.steep_normal);
            if self.up_axis.dot(&self.steep_normal) >= self.limits.min_ground_dot {
                self.ground_count = 1;
                self.contact_normal = self.steep_normal;
                return true;
            }
        }
        false
    }

    pub(crate) fn refresh_up_axis(&mut self, up_axis: Vec3) {
        self.up_axis = up_axis;
    }

    pub(crate) fn set_ground(&mut self, normal: Vec3) {
        self.ground_count = 1;
        self.contact_normal = normal;
    }

    pub fn on_ground(&self) -> bool {
        self.ground_count > 0
    }

    pub fn on_steep(&self) -> bool {
        self.steep_count > 0
    }

    pub fn ground_contact_count(&self) -> u32 {
        self.ground_count
    }

    pub fn steep_contact_count(&self) -> u32 {
        self.steep_count
    }

    pub fn contact_normal(&self) -> Vec3 {
        self.contact_normal
    }

    pub fn steep_normal(&self) -> Vec3 {
        self.steep_normal
    }

    pub fn up_axis(&self) -> Vec3 {
        self.up_axis
    }

    pub fn limits(&self) -> &SlopeLimits {
        &self.limits
    }
}
