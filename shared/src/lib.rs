pub mod constants;
pub mod controller;
pub mod floating;
pub mod gravity;
pub mod host;
pub mod layers;
pub mod rapier_world;
pub mod types;

pub use constants::{FIXED_DT, GRAVITY_MPS2, SETTLE_DURATION_S, SETTLE_SPEED_SQ, STEEP_DOT_FLOOR};
pub use controller::{
    CharacterController, ContactAccumulator, ControllerError, ControllerSettings, InputFrame,
    JumpKind, SlopeLimits, StepOutcome,
};
pub use floating::{FloatOutcome, FloatingBody};
pub use gravity::{
    GravityError, GravityField, GravityRegistry, GravitySource, SharedGravityRegistry, SourceId,
};
pub use host::{ContactPoint, GroundProbe, NoGround, PhysicsBody, RayHit};
pub use layers::{Layer, LayerBits, LayerMask, SurfaceTag};
pub use rapier_world::{
    ColliderShapeDef, PhysicsScene, SceneError, WorldStaticDef, collider_from_def,
};
pub use types::{Quat, Vec2, Vec3};
