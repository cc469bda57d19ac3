/*!
Gravity root module.

Gravity is the sum of every active source's contribution at a world position.
The "up" direction everything else uses (slope classification, jump direction,
the movement basis) is the opposite of that sum, so it can point anywhere.

- sources:  field shapes (uniform, plane, point attractor, bounded box/sphere)
- registry: the aggregator a simulation context owns and controllers query
*/

pub mod registry;
pub mod sources;

pub use registry::{GravityRegistry, SharedGravityRegistry};
pub use sources::{BoxGravity, PlaneGravity, PointGravity, SphereVolumeGravity, UniformGravity};

use crate::types::{NORMALIZE_EPS, Vec3};

/// Anything that produces a gravity acceleration (m/s^2) at a world position.
///
/// Sources are stateless from the aggregator's point of view; new field shapes are
/// added as new implementations.
pub trait GravitySource: Send + Sync {
    fn gravity_at(&self, position: &Vec3) -> Vec3;
}

/// Read side of the aggregator, as consumed by controllers and floating bodies.
pub trait GravityField {
    fn gravity_at(&self, position: &Vec3) -> Vec3;

    /// Summed gravity plus the derived up axis, computed with a single summation.
    ///
    /// The up axis is `None` when the summed field is (nearly) zero.
    fn gravity_and_up_at(&self, position: &Vec3) -> (Vec3, Option<Vec3>) {
        let gravity = self.gravity_at(position);
        (gravity, up_axis_from(&gravity))
    }

    fn up_axis_at(&self, position: &Vec3) -> Option<Vec3> {
        self.gravity_and_up_at(position).1
    }
}

/// Stable caller-chosen identity of a registered source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u32);

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gravity source #{}", self.0)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GravityError {
    #[error("duplicate registration of {0}")]
    DuplicateSource(SourceId),
    #[error("unregistration of unknown {0}")]
    UnknownSource(SourceId),
}

/// `-normalize(gravity)`, or `None` for a zero field.
#[inline]
pub fn up_axis_from(gravity: &Vec3) -> Option<Vec3> {
    gravity.try_normalize(NORMALIZE_EPS).map(|g| -g)
}
