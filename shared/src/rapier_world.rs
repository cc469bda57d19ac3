//! Rapier host for the walker core.
//!
//! This module owns a dynamic Rapier scene and adapts it to the `host` seam:
//! - [`RapierBody`] exposes a rigid body as a [`PhysicsBody`].
//! - [`RapierProbe`] answers snap rays against the scene.
//! - [`collect_contacts`] feeds a body's narrow-phase manifolds into a [`ContactAccumulator`].
//!
//! Engine gravity is zero. Every body falls along the aggregated field, either through a
//! [`CharacterController`](crate::controller::CharacterController) or a
//! [`FloatingBody`](crate::floating::FloatingBody).
//!
//! Conventions
//! - Collider membership bits are the surface's layers; snap rays filter on them and stairs
//!   detection reads them back from the touched collider.
//! - Static geometry is inserted sorted by `id` so the same inputs build identical sets.

// Re-export Rapier so downstream crates can use Rapier macros/types
// without needing to depend on `rapier3d` directly.
pub use rapier3d;

use rapier3d::na::{Point3, Translation3, UnitQuaternion};
use rapier3d::prelude::*;

use crate::{
    controller::{CharacterController, ContactAccumulator, ControllerError, StepOutcome},
    floating::{FloatOutcome, FloatingBody},
    gravity::GravityField,
    host::{ContactPoint, GroundProbe, PhysicsBody, RayHit},
    layers::{LayerBits, LayerMask, SurfaceTag},
    types::Vec3,
};

/// Contact points farther apart than this are speculative and not reported.
const CONTACT_DISTANCE_EPS: f32 = 0.01;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SceneError {
    #[error("no rigid body for handle {0:?}")]
    UnknownBody(RigidBodyHandle),
    #[error(transparent)]
    Controller(#[from] ControllerError),
}

/// Canonical definition of an immutable world collider.
///
/// Conventions
/// - Units are meters.
/// - Rotation is a unit quaternion.
/// - For planes, we use a pose-derived normal: `normal = rotation * +Y`,
///   and compute `dist = dot(normal, translation) + offset_along_normal`.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Stable unique identifier used to ensure deterministic insertion order.
    pub id: u32,
    /// World-space translation.
    pub translation: Vector<f32>,
    /// World-space rotation (unit quaternion).
    pub rotation: UnitQuaternion<f32>,
    /// Collider shape parameters.
    pub shape: ColliderShapeDef,
    /// Surface layers; also the collider's membership bits.
    pub layers: LayerBits,
}

/// Supported static collider shapes.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite plane (half-space).
    ///
    /// The plane normal is derived from the pose as `rotation * +Y`.
    Plane {
        /// Offset along the plane normal (meters).
        offset_along_normal: f32,
    },

    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vector<f32> },

    /// Sphere/ball (meters).
    Sphere { radius: f32 },

    /// Y-aligned cylinder (meters).
    CylinderY { radius: f32, half_height: f32 },

    /// Rounded cuboid (meters).
    RoundCuboid {
        half_extents: Vector<f32>,
        border_radius: f32,
    },
}

/// Build a Rapier collider from a `WorldStaticDef`.
///
/// Non-plane shapes are placed at the def's pose; planes bake the pose into the
/// half-space normal and offset.
pub fn collider_from_def(def: &WorldStaticDef) -> Collider {
    let iso = Isometry::from_parts(Translation3::from(def.translation), def.rotation);
    let builder = match &def.shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => {
            // n ⋅ x = dist, with dist = n ⋅ t + offset.
            let n = def.rotation * Vector::y();
            let dist = n.dot(&def.translation) + *offset_along_normal;
            let unit_n = UnitVector::new_normalize(n);
            ColliderBuilder::new(SharedShape::new(HalfSpace::new(unit_n)))
                .translation(unit_n.into_inner() * dist)
        }

        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z).position(iso)
        }

        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius).position(iso),

        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(*half_height, *radius).position(iso),

        ColliderShapeDef::RoundCuboid {
            half_extents,
            border_radius,
        } => ColliderBuilder::round_cuboid(
            half_extents.x,
            half_extents.y,
            half_extents.z,
            *border_radius,
        )
        .position(iso),
    };
    builder.collision_groups(groups_for(def.layers)).build()
}

/// Interaction groups whose memberships are `layers`, colliding with everything.
fn groups_for(layers: LayerBits) -> InteractionGroups {
    let mut groups = InteractionGroups::all();
    groups.memberships = Group::from_bits_truncate(layers);
    groups
}

fn surface_of(collider: &Collider) -> SurfaceTag {
    SurfaceTag::new(collider.collision_groups().memberships.bits())
}

/// A Rapier rigid body seen through the engine seam.
pub struct RapierBody<'a> {
    body: &'a mut RigidBody,
}

impl<'a> RapierBody<'a> {
    pub fn new(body: &'a mut RigidBody) -> Self {
        Self { body }
    }
}

impl PhysicsBody for RapierBody<'_> {
    fn velocity(&self) -> Vec3 {
        *self.body.linvel()
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.body.set_linvel(velocity, true);
    }

    fn position(&self) -> Vec3 {
        *self.body.translation()
    }

    fn add_acceleration(&mut self, acceleration: Vec3) {
        let mass = self.body.mass();
        self.body.add_force(acceleration * mass, true);
    }

    fn is_sleeping(&self) -> bool {
        self.body.is_sleeping()
    }

    fn disable_native_gravity(&mut self) {
        self.body.set_gravity_scale(0.0, true);
    }
}

/// Body state copied out of the scene so the scene stays borrowable for snap rays.
struct BodySnapshot {
    velocity: Vec3,
    position: Vec3,
    acceleration: Vec3,
    sleeping: bool,
}

impl PhysicsBody for BodySnapshot {
    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn add_acceleration(&mut self, acceleration: Vec3) {
        self.acceleration += acceleration;
    }

    fn is_sleeping(&self) -> bool {
        self.sleeping
    }
}

/// Snap-ray probe over a [`PhysicsScene`], ignoring the probing body itself.
pub struct RapierProbe<'a> {
    scene: &'a PhysicsScene,
    exclude: Option<RigidBodyHandle>,
}

impl GroundProbe for RapierProbe<'_> {
    fn raycast(
        &self,
        origin: &Vec3,
        direction: &Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit> {
        let in_mask = |_: ColliderHandle, co: &Collider| {
            mask.intersects(co.collision_groups().memberships.bits())
        };
        let mut filter = QueryFilter::default().predicate(&in_mask);
        if let Some(body) = self.exclude {
            filter = filter.exclude_rigid_body(body);
        }

        let query_pipeline = self.scene.query_pipeline(filter);
        let ray = Ray::new(Point3::from(*origin), *direction);
        let (handle, hit) = query_pipeline.cast_ray_and_get_normal(&ray, max_distance.max(0.0), true)?;
        let surface = self
            .scene
            .colliders
            .get(handle)
            .map(surface_of)
            .unwrap_or_default();
        Some(RayHit {
            normal: hit.normal,
            distance: hit.time_of_impact,
            surface,
        })
    }
}

/// Feed every touching manifold of `collider` into `contacts`.
///
/// Normals are oriented from the touched surface toward `collider`. Each manifold is
/// evaluated as its own batch; returns how many manifolds were reported.
pub fn collect_contacts(
    narrow_phase: &NarrowPhase,
    colliders: &ColliderSet,
    collider: ColliderHandle,
    contacts: &mut ContactAccumulator,
) -> usize {
    let mut manifolds = 0;
    let mut batch = Vec::new();
    for pair in narrow_phase.contact_pairs_with(collider) {
        if !pair.has_any_active_contact {
            continue;
        }
        let (other, flip) = if pair.collider1 == collider {
            (pair.collider2, true)
        } else {
            (pair.collider1, false)
        };
        let Some(other) = colliders.get(other) else {
            continue;
        };
        if other.is_sensor() {
            continue;
        }
        let surface = surface_of(other);

        for manifold in &pair.manifolds {
            let normal = if flip {
                -manifold.data.normal
            } else {
                manifold.data.normal
            };
            batch.clear();
            batch.extend(
                manifold
                    .points
                    .iter()
                    .filter(|point| point.dist <= CONTACT_DISTANCE_EPS)
                    .map(|_| ContactPoint::new(normal, surface)),
            );
            if !batch.is_empty() {
                contacts.evaluate(&batch);
                manifolds += 1;
            }
        }
    }
    manifolds
}

/// A dynamic Rapier world with zero engine gravity.
pub struct PhysicsScene {
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub broad_phase: BroadPhaseBvh,
    pub narrow_phase: NarrowPhase,
    pub integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
}

impl PhysicsScene {
    pub fn new(dt: f32) -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            integration_parameters: IntegrationParameters {
                dt,
                ..IntegrationParameters::default()
            },
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
        }
    }

    /// Insert static colliders in `id` order.
    pub fn insert_statics(&mut self, mut defs: Vec<WorldStaticDef>) -> Vec<ColliderHandle> {
        defs.sort_by_key(|d| d.id);
        defs.iter().map(|def| self.insert_static(def)).collect()
    }

    pub fn insert_static(&mut self, def: &WorldStaticDef) -> ColliderHandle {
        self.colliders.insert(collider_from_def(def))
    }

    /// Insert a dynamic ball; CCD is on since the controlled sphere can move fast.
    pub fn insert_sphere(
        &mut self,
        position: Vec3,
        radius: f32,
        layers: LayerBits,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let body = RigidBodyBuilder::dynamic()
            .translation(position)
            .ccd_enabled(true)
            .build();
        self.insert_dynamic(body, ColliderBuilder::ball(radius), layers)
    }

    pub fn insert_cuboid(
        &mut self,
        position: Vec3,
        half_extents: Vec3,
        layers: LayerBits,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let body = RigidBodyBuilder::dynamic().translation(position).build();
        self.insert_dynamic(
            body,
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z),
            layers,
        )
    }

    fn insert_dynamic(
        &mut self,
        body: RigidBody,
        collider: ColliderBuilder,
        layers: LayerBits,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let body_handle = self.bodies.insert(body);
        let collider = collider.collision_groups(groups_for(layers)).build();
        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.bodies);
        (body_handle, collider_handle)
    }

    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<RapierBody<'_>> {
        self.bodies.get_mut(handle).map(RapierBody::new)
    }

    pub fn translation(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.bodies.get(handle).map(|body| *body.translation())
    }

    pub fn rotation(&self, handle: RigidBodyHandle) -> Option<UnitQuaternion<f32>> {
        self.bodies.get(handle).map(|body| *body.rotation())
    }

    pub fn probe(&self, exclude: Option<RigidBodyHandle>) -> RapierProbe<'_> {
        RapierProbe {
            scene: self,
            exclude,
        }
    }

    /// [`collect_contacts`] against this scene's narrow phase.
    pub fn collect_contacts(&self, collider: ColliderHandle, contacts: &mut ContactAccumulator) -> usize {
        collect_contacts(&self.narrow_phase, &self.colliders, collider, contacts)
    }

    /// Run one controller step against the body behind `body`/`collider`.
    ///
    /// Contacts come from the last engine step; the snap ray ignores the body itself. The new
    /// velocity is written back only when the step succeeds.
    pub fn step_controller(
        &mut self,
        controller: &mut CharacterController,
        body: RigidBodyHandle,
        collider: ColliderHandle,
        field: &dyn GravityField,
    ) -> Result<StepOutcome, SceneError> {
        let rb = self.bodies.get(body).ok_or(SceneError::UnknownBody(body))?;
        let mut snapshot = BodySnapshot {
            velocity: *rb.linvel(),
            position: *rb.translation(),
            acceleration: Vec3::zeros(),
            sleeping: rb.is_sleeping(),
        };

        let mut contacts = controller.begin_contacts();
        self.collect_contacts(collider, &mut contacts);
        let dt = self.integration_parameters.dt;
        let outcome = controller.step(contacts, &mut snapshot, field, &self.probe(Some(body)), dt)?;

        let mut rb = self
            .body_mut(body)
            .ok_or(SceneError::UnknownBody(body))?;
        rb.set_velocity(snapshot.velocity);
        if snapshot.acceleration != Vec3::zeros() {
            rb.add_acceleration(snapshot.acceleration);
        }
        Ok(outcome)
    }

    /// Apply the aggregated field to a floating body for the coming engine step.
    pub fn step_floating(
        &mut self,
        floating: &mut FloatingBody,
        body: RigidBodyHandle,
        field: &dyn GravityField,
    ) -> Result<FloatOutcome, SceneError> {
        let dt = self.integration_parameters.dt;
        let mut rb = self
            .body_mut(body)
            .ok_or(SceneError::UnknownBody(body))?;
        Ok(floating.step(&mut rb, field, dt))
    }

    /// Borrowed `QueryPipeline` view over the current scene.
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    /// Advance the engine one step. Forces added during the step are cleared afterwards.
    pub fn step(&mut self) {
        let gravity = Vector::zeros();
        self.pipeline.step(
            &gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            &(),
            &(),
        );
        for (_, body) in self.bodies.iter_mut() {
            if body.is_dynamic() {
                body.reset_forces(false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ground(layers: LayerBits) -> WorldStaticDef {
        WorldStaticDef {
            id: 1,
            translation: Vector::zeros(),
            rotation: UnitQuaternion::identity(),
            shape: ColliderShapeDef::Cuboid {
                half_extents: vector![20.0, 0.5, 20.0],
            },
            layers,
        }
    }

    #[test]
    fn collider_memberships_carry_surface_layers() {
        let collider = collider_from_def(&ground(0b100));
        assert_eq!(surface_of(&collider), SurfaceTag::new(0b100));
    }

    #[test]
    fn tilted_plane_bakes_pose_into_half_space() {
        let def = WorldStaticDef {
            id: 2,
            translation: vector![0.0, 2.0, 0.0],
            rotation: UnitQuaternion::from_axis_angle(&Vector::z_axis(), 0.3),
            shape: ColliderShapeDef::Plane {
                offset_along_normal: 0.0,
            },
            layers: 1,
        };
        let collider = collider_from_def(&def);
        let normal = def.rotation * Vector::y();
        let expected = normal * normal.dot(&def.translation);
        assert!((collider.translation() - expected).norm() < 1.0e-5);
    }

    #[test]
    fn probe_filters_by_layer_and_skips_self() {
        let mut scene = PhysicsScene::new(1.0 / 50.0);
        scene.insert_statics(vec![ground(0b01)]);
        let (body, _) = scene.insert_sphere(vector![0.0, 1.0, 0.0], 0.5, 0b10);
        scene.step();

        let probe = scene.probe(Some(body));
        let hit = probe
            .raycast(&vector![0.0, 1.0, 0.0], &vector![0.0, -1.0, 0.0], 2.0, LayerMask::all())
            .unwrap();
        assert!((hit.normal - Vector::y()).norm() < 1.0e-4);
        assert!((hit.distance - 0.5).abs() < 1.0e-3);
        assert_eq!(hit.surface, SurfaceTag::new(0b01));

        let masked = probe.raycast(
            &vector![0.0, 1.0, 0.0],
            &vector![0.0, -1.0, 0.0],
            2.0,
            LayerMask::new(0b10),
        );
        assert!(masked.is_none());
    }

    #[test]
    fn forces_do_not_persist_across_steps() {
        let mut scene = PhysicsScene::new(1.0 / 50.0);
        let (body, _) = scene.insert_cuboid(vector![0.0, 10.0, 0.0], vector![0.5, 0.5, 0.5], 1);
        if let Some(mut handle) = scene.body_mut(body) {
            handle.add_acceleration(vector![0.0, -10.0, 0.0]);
        }
        scene.step();
        let after_push = scene.bodies[body].linvel().y;
        assert!(after_push < 0.0);

        scene.step();
        assert!((scene.bodies[body].linvel().y - after_push).abs() < 1.0e-5);
    }
}
