use super::{
    contact::ContactAccumulator,
    jump::{JumpContext, JumpKind, JumpSettings, try_jump},
    settings::{ControllerSettings, SlopeLimits},
    snap::{SnapQuery, snap_to_ground},
    velocity::{InputFrame, VelocityControl, adjust_velocity},
};
use crate::{
    gravity::GravityField,
    host::{GroundProbe, PhysicsBody},
    types::{Vec2, Vec3, is_finite_vec, normalize_or_zero, world_up},
};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ControllerError {
    #[error("step produced a non-finite velocity {0:?}; controller halted")]
    NonFiniteVelocity(Vec3),
    #[error("controller is halted after an earlier failed step")]
    Faulted,
    #[error("invalid step duration {0}")]
    InvalidStep(f32),
}

/// Per-step presentation data; has no effect on the simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutcome {
    pub grounded: bool,
    pub on_steep: bool,
    pub snapped: bool,
    pub jump: Option<JumpKind>,
    pub velocity: Vec3,
    pub up_axis: Vec3,
}

/// Rolling-sphere controller driven through velocity writes on a host rigid body.
///
/// Per fixed step the host:
/// 1. calls [`begin_contacts`](Self::begin_contacts) and feeds every contact manifold into the
///    returned accumulator,
/// 2. calls [`step`](Self::step) with that accumulator.
///
/// Input is set once per render frame through [`set_input`](Self::set_input).
#[derive(Clone, Debug)]
pub struct CharacterController {
    settings: ControllerSettings,
    limits: SlopeLimits,
    input_frame: InputFrame,

    velocity: Vec3,
    desired_velocity: Vec3,
    desired_jump: bool,
    up_axis: Vec3,
    right_axis: Vec3,
    forward_axis: Vec3,

    jump_phase: u32,
    steps_since_last_grounded: u32,
    steps_since_last_jump: u32,
    faulted: bool,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self::new(ControllerSettings::default())
    }
}

impl CharacterController {
    pub fn new(settings: ControllerSettings) -> Self {
        let settings = settings.sanitized();
        Self {
            settings,
            limits: settings.slope_limits(),
            input_frame: InputFrame::world(),
            velocity: Vec3::zeros(),
            desired_velocity: Vec3::zeros(),
            desired_jump: false,
            up_axis: world_up(),
            right_axis: Vec3::x(),
            forward_axis: Vec3::z(),
            jump_phase: 0,
            steps_since_last_grounded: 0,
            steps_since_last_jump: 0,
            faulted: false,
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Replace the tunables; slope cosines are recomputed once here.
    pub fn set_settings(&mut self, settings: ControllerSettings) {
        self.settings = settings.sanitized();
        self.limits = self.settings.slope_limits();
    }

    pub fn set_input_frame(&mut self, frame: InputFrame) {
        self.input_frame = frame;
    }

    /// Record player intent for the next step.
    ///
    /// `input` is clamped to unit length (x = right, y = forward). Jump presses latch until
    /// a step consumes them.
    pub fn set_input(&mut self, input: Vec2, jump: bool) {
        let input = if input.norm_squared() > 1.0 {
            input.normalize()
        } else {
            input
        };
        let input = if input.iter().all(|c| c.is_finite()) {
            input
        } else {
            Vec2::zeros()
        };
        self.desired_velocity = Vec3::new(input.x, 0.0, input.y) * self.settings.max_speed;
        self.desired_jump |= jump;
    }

    /// Empty accumulator for this step's contacts, classified against the current up axis.
    pub fn begin_contacts(&self) -> ContactAccumulator {
        ContactAccumulator::new(self.up_axis, self.limits)
    }

    /// Advance one fixed simulation step.
    ///
    /// Reads the body velocity, resolves grounding (contacts, then snap, then steep wedge),
    /// applies horizontal control, the pending jump, and gravity, then writes the velocity
    /// back. A non-finite result is never written; the controller halts instead.
    pub fn step(
        &mut self,
        mut contacts: ContactAccumulator,
        body: &mut dyn PhysicsBody,
        field: &dyn GravityField,
        probe: &dyn GroundProbe,
        dt: f32,
    ) -> Result<StepOutcome, ControllerError> {
        if self.faulted {
            return Err(ControllerError::Faulted);
        }
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ControllerError::InvalidStep(dt));
        }

        self.steps_since_last_grounded = self.steps_since_last_grounded.saturating_add(1);
        self.steps_since_last_jump = self.steps_since_last_jump.saturating_add(1);
        self.velocity = body.velocity();

        let position = body.position();
        let (gravity, up_axis) = field.gravity_and_up_at(&position);
        match up_axis {
            Some(up) => self.up_axis = up,
            None => log::debug!("Zero gravity at {position:?}; keeping up axis {:?}", self.up_axis),
        }
        (self.right_axis, self.forward_axis) = self.input_frame.axes(&self.up_axis);
        contacts.refresh_up_axis(self.up_axis);

        let snapped = self.update_state(&mut contacts, position, probe);
        let grounded = contacts.on_ground();

        let acceleration = if grounded {
            self.settings.max_acceleration
        } else {
            self.settings.max_air_acceleration
        };
        self.velocity = adjust_velocity(
            &self.velocity,
            &VelocityControl {
                right_axis: self.right_axis,
                forward_axis: self.forward_axis,
                contact_normal: contacts.contact_normal,
                desired_velocity: self.desired_velocity,
                max_speed_change: acceleration * dt,
            },
        );

        let mut jump = None;
        if self.desired_jump {
            self.desired_jump = false;
            jump = try_jump(
                &JumpContext {
                    on_ground: grounded,
                    on_steep: contacts.on_steep(),
                    contact_normal: contacts.contact_normal,
                    steep_normal: contacts.steep_normal,
                    up_axis: self.up_axis,
                    gravity_magnitude: gravity.norm(),
                },
                &JumpSettings {
                    jump_height: self.settings.jump_height,
                    max_air_jumps: self.settings.max_air_jumps,
                    perpendicular_to_ground: self.settings.jump_perpendicular_to_ground,
                },
                &mut self.jump_phase,
                &mut self.velocity,
            );
            if jump.is_some() {
                self.steps_since_last_jump = 0;
            }
        }

        self.velocity += gravity * dt;

        if !is_finite_vec(&self.velocity) {
            self.faulted = true;
            log::error!("Non-finite velocity {:?}; halting controller", self.velocity);
            return Err(ControllerError::NonFiniteVelocity(self.velocity));
        }
        body.set_velocity(self.velocity);

        Ok(StepOutcome {
            grounded,
            on_steep: contacts.on_steep(),
            snapped,
            jump,
            velocity: self.velocity,
            up_axis: self.up_axis,
        })
    }

    /// Grounding decision for this step. Returns whether the ground came from a snap.
    fn update_state(
        &mut self,
        contacts: &mut ContactAccumulator,
        position: Vec3,
        probe: &dyn GroundProbe,
    ) -> bool {
        let mut snapped = false;
        let mut grounded = contacts.on_ground();
        if !grounded {
            snapped = self.snap_to_ground(contacts, position, probe);
            grounded = snapped || contacts.check_steep_contacts();
        }

        if grounded {
            self.steps_since_last_grounded = 0;
            if self.steps_since_last_jump > 1 {
                self.jump_phase = 0;
            }
            if contacts.ground_count > 1 {
                contacts.contact_normal = normalize_or_zero(&contacts.contact_normal);
            }
        } else {
            contacts.contact_normal = self.up_axis;
        }
        snapped
    }

    fn snap_to_ground(
        &mut self,
        contacts: &mut ContactAccumulator,
        position: Vec3,
        probe: &dyn GroundProbe,
    ) -> bool {
        snap_to_ground(
            SnapQuery {
                position,
                up_axis: self.up_axis,
                steps_since_last_grounded: self.steps_since_last_grounded,
                steps_since_last_jump: self.steps_since_last_jump,
            },
            &self.settings,
            contacts,
            &mut self.velocity,
            probe,
        )
        .is_some()
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn desired_velocity(&self) -> Vec3 {
        self.desired_velocity
    }

    pub fn up_axis(&self) -> Vec3 {
        self.up_axis
    }

    pub fn jump_phase(&self) -> u32 {
        self.jump_phase
    }

    pub fn steps_since_last_grounded(&self) -> u32 {
        self.steps_since_last_grounded
    }

    pub fn steps_since_last_jump(&self) -> u32 {
        self.steps_since_last_jump
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::{
        constants::GRAVITY_MPS2,
        gravity::{GravityRegistry, SourceId, UniformGravity},
        host::{ContactPoint, NoGround, RayHit},
        layers::{LayerMask, SurfaceTag},
    };
    use std::sync::Arc;

    const DT: f32 = 0.02;

    #[derive(Default)]
    struct TestBody {
        position: Vec3,
        velocity: Vec3,
        writes: u32,
    }

    impl PhysicsBody for TestBody {
        fn velocity(&self) -> Vec3 {
            self.velocity
        }
        fn set_velocity(&mut self, velocity: Vec3) {
            self.velocity = velocity;
            self.writes += 1;
        }
        fn position(&self) -> Vec3 {
            self.position
        }
        fn add_acceleration(&mut self, _acceleration: Vec3) {}
    }

    struct FlatGround {
        calls: Cell<u32>,
    }

    impl GroundProbe for FlatGround {
        fn raycast(&self, _: &Vec3, _: &Vec3, _: f32, _: LayerMask) -> Option<RayHit> {
            self.calls.set(self.calls.get() + 1);
            Some(RayHit {
                normal: Vec3::y(),
                distance: 0.5,
                surface: SurfaceTag::new(1),
            })
        }
    }

    fn earth() -> GravityRegistry {
        let mut registry = GravityRegistry::new();
        registry
            .register(SourceId(0), Arc::new(UniformGravity::earth()))
            .unwrap();
        registry
    }

    fn floor() -> [ContactPoint; 1] {
        [ContactPoint::new(Vec3::y(), SurfaceTag::new(1))]
    }

    fn grounded_step(
        controller: &mut CharacterController,
        body: &mut TestBody,
        field: &GravityRegistry,
    ) -> StepOutcome {
        let mut contacts = controller.begin_contacts();
        contacts.evaluate(&floor());
        controller.step(contacts, body, field, &NoGround, DT).unwrap()
    }

    fn airborne_step(
        controller: &mut CharacterController,
        body: &mut TestBody,
        field: &GravityRegistry,
        probe: &dyn GroundProbe,
    ) -> StepOutcome {
        let contacts = controller.begin_contacts();
        controller.step(contacts, body, field, probe, DT).unwrap()
    }

    #[test]
    fn resting_sphere_accelerates_toward_desired_velocity() {
        let field = earth();
        let mut controller = CharacterController::new(ControllerSettings {
            max_speed: 5.0,
            max_acceleration: 10.0,
            ..ControllerSettings::default()
        });
        let mut body = TestBody::default();
        controller.set_input(Vec2::new(1.0, 0.0), false);

        let outcome = grounded_step(&mut controller, &mut body, &field);
        assert!(outcome.grounded);
        assert!((body.velocity.x - 0.2).abs() < 1.0e-5);
        assert!(body.velocity.z.abs() < 1.0e-6);
        // Gravity is integrated after control.
        assert!((body.velocity.y + GRAVITY_MPS2 * DT).abs() < 1.0e-5);
        assert_eq!(body.writes, 1);
    }

    #[test]
    fn grounded_jump_launches_along_contact_normal() {
        let field = earth();
        let mut controller = CharacterController::new(ControllerSettings {
            jump_height: 2.0,
            jump_perpendicular_to_ground: true,
            ..ControllerSettings::default()
        });
        let mut body = TestBody::default();
        controller.set_input(Vec2::zeros(), true);

        let outcome = grounded_step(&mut controller, &mut body, &field);
        assert_eq!(outcome.jump, Some(JumpKind::Ground));
        let expected = (2.0f32 * GRAVITY_MPS2 * 2.0).sqrt() - GRAVITY_MPS2 * DT;
        assert!((body.velocity.y - expected).abs() < 1.0e-3);
        assert_eq!(controller.steps_since_last_jump(), 0);
        assert_eq!(controller.jump_phase(), 1);
    }

    #[test]
    fn jump_request_latches_until_consumed() {
        let field = earth();
        let mut controller = CharacterController::default();
        let mut body = TestBody::default();
        controller.set_input(Vec2::zeros(), true);
        controller.set_input(Vec2::zeros(), false);

        let outcome = grounded_step(&mut controller, &mut body, &field);
        assert_eq!(outcome.jump, Some(JumpKind::Ground));
        let outcome = grounded_step(&mut controller, &mut body, &field);
        assert_eq!(outcome.jump, None);
    }

    #[test]
    fn second_air_jump_is_dropped_with_budget_of_one() {
        let field = earth();
        let mut controller = CharacterController::new(ControllerSettings {
            max_air_jumps: 1,
            ..ControllerSettings::default()
        });
        let mut body = TestBody::default();
        controller.set_input(Vec2::zeros(), true);
        grounded_step(&mut controller, &mut body, &field);

        controller.set_input(Vec2::zeros(), true);
        let first = airborne_step(&mut controller, &mut body, &field, &NoGround);
        assert_eq!(first.jump, Some(JumpKind::Air));

        let before = body.velocity;
        controller.set_input(Vec2::zeros(), true);
        let second = airborne_step(&mut controller, &mut body, &field, &NoGround);
        assert_eq!(second.jump, None);
        // Only gravity changed the velocity.
        assert!((body.velocity - (before + Vec3::new(0.0, -GRAVITY_MPS2 * DT, 0.0))).norm() < 1.0e-5);
    }

    #[test]
    fn snap_happens_one_step_after_losing_contact() {
        let field = earth();
        let mut controller = CharacterController::default();
        let mut body = TestBody::default();
        // Build up the post-jump window first.
        for _ in 0..3 {
            grounded_step(&mut controller, &mut body, &field);
        }
        body.velocity = Vec3::new(3.0, 0.5, 0.0);

        let probe = FlatGround { calls: Cell::new(0) };
        let outcome = airborne_step(&mut controller, &mut body, &field, &probe);
        assert!(outcome.snapped);
        assert!(outcome.grounded);
        assert_eq!(probe.calls.get(), 1);
        assert_eq!(controller.steps_since_last_grounded(), 0);
    }

    #[test]
    fn no_snap_after_a_real_fall() {
        let field = earth();
        let mut controller = CharacterController::default();
        let mut body = TestBody::default();
        for _ in 0..3 {
            grounded_step(&mut controller, &mut body, &field);
        }
        // One airborne step without ground below, then ground appears.
        airborne_step(&mut controller, &mut body, &field, &NoGround);
        assert_eq!(controller.steps_since_last_grounded(), 1);

        let probe = FlatGround { calls: Cell::new(0) };
        let outcome = airborne_step(&mut controller, &mut body, &field, &probe);
        assert!(!outcome.snapped);
        assert!(!outcome.grounded);
        assert_eq!(probe.calls.get(), 0);
    }

    #[test]
    fn up_axis_follows_the_local_field() {
        let mut field = GravityRegistry::new();
        field
            .register(SourceId(1), Arc::new(UniformGravity::new(Vec3::new(-9.81, 0.0, 0.0))))
            .unwrap();
        let mut controller = CharacterController::default();
        let mut body = TestBody::default();
        airborne_step(&mut controller, &mut body, &field, &NoGround);
        assert!((controller.up_axis() - Vec3::x()).norm() < 1.0e-6);

        // Now a wall facing +X is the floor.
        let mut contacts = controller.begin_contacts();
        contacts.evaluate(&[ContactPoint::new(Vec3::x(), SurfaceTag::new(1))]);
        let outcome = controller
            .step(contacts, &mut body, &field, &NoGround, DT)
            .unwrap();
        assert!(outcome.grounded);
    }

    #[test]
    fn zero_field_keeps_previous_up_axis() {
        let mut field = earth();
        let mut controller = CharacterController::default();
        let mut body = TestBody::default();
        grounded_step(&mut controller, &mut body, &field);

        field
            .register(SourceId(1), Arc::new(UniformGravity::new(Vec3::new(0.0, 9.81, 0.0))))
            .unwrap();
        let outcome = airborne_step(&mut controller, &mut body, &field, &NoGround);
        assert_eq!(outcome.up_axis, Vec3::y());
        assert!(is_finite_vec(&body.velocity));
    }

    #[test]
    fn non_finite_velocity_halts_the_controller() {
        let field = earth();
        let mut controller = CharacterController::default();
        let mut body = TestBody {
            velocity: Vec3::new(f32::NAN, 0.0, 0.0),
            ..TestBody::default()
        };
        let contacts = controller.begin_contacts();
        let err = controller
            .step(contacts, &mut body, &field, &NoGround, DT)
            .unwrap_err();
        assert!(matches!(err, ControllerError::NonFiniteVelocity(_)));
        assert_eq!(body.writes, 0);

        let contacts = controller.begin_contacts();
        assert_eq!(
            controller.step(contacts, &mut body, &field, &NoGround, DT),
            Err(ControllerError::Faulted)
        );
    }

    #[test]
    fn invalid_step_duration_is_rejected() {
        let field = earth();
        let mut controller = CharacterController::default();
        let mut body = TestBody::default();
        let contacts = controller.begin_contacts();
        assert_eq!(
            controller.step(contacts, &mut body, &field, &NoGround, 0.0),
            Err(ControllerError::InvalidStep(0.0))
        );
        assert!(!controller.is_faulted());
    }

    #[test]
    fn oversized_input_is_clamped_to_max_speed() {
        let mut controller = CharacterController::new(ControllerSettings {
            max_speed: 4.0,
            ..ControllerSettings::default()
        });
        controller.set_input(Vec2::new(3.0, 4.0), false);
        assert!((controller.desired_velocity().norm() - 4.0).abs() < 1.0e-5);
        assert_eq!(controller.desired_velocity().y, 0.0);
    }

    #[test]
    fn jump_phase_resets_only_once_the_jump_is_two_steps_old() {
        let field = earth();
        let mut controller = CharacterController::default();
        let mut body = TestBody::default();
        controller.set_input(Vec2::zeros(), true);
        grounded_step(&mut controller, &mut body, &field);
        assert_eq!(controller.jump_phase(), 1);

        // Still touching the ground on the step right after launch.
        grounded_step(&mut controller, &mut body, &field);
        assert_eq!(controller.steps_since_last_jump(), 1);
        assert_eq!(controller.jump_phase(), 1);

        grounded_step(&mut controller, &mut body, &field);
        assert_eq!(controller.jump_phase(), 0);
    }

    #[test]
    fn walkable_steep_wedge_grounds_through_step() {
        let field = earth();
        let mut controller = CharacterController::default();
        let mut body = TestBody::default();
        controller.set_input(Vec2::zeros(), true);
        grounded_step(&mut controller, &mut body, &field);
        airborne_step(&mut controller, &mut body, &field, &NoGround);
        assert_eq!(controller.jump_phase(), 1);
        assert_eq!(controller.steps_since_last_grounded(), 1);

        // Two 60 degree walls leaning toward each other.
        let mut contacts = controller.begin_contacts();
        contacts.evaluate(&[
            ContactPoint::new(Vec3::new(0.866_025_4, 0.5, 0.0), SurfaceTag::new(1)),
            ContactPoint::new(Vec3::new(-0.866_025_4, 0.5, 0.0), SurfaceTag::new(1)),
        ]);
        let outcome = controller
            .step(contacts, &mut body, &field, &NoGround, DT)
            .unwrap();
        assert!(outcome.grounded);
        assert!(!outcome.snapped);
        assert_eq!(controller.jump_phase(), 0);
        assert_eq!(controller.steps_since_last_grounded(), 0);
    }

    #[test]
    fn wall_jump_pushes_away_and_refreshes_air_jumps() {
        let field = earth();
        let mut controller = CharacterController::new(ControllerSettings {
            max_air_jumps: 2,
            jump_height: 2.0,
            jump_perpendicular_to_ground: true,
            ..ControllerSettings::default()
        });
        let mut body = TestBody::default();
        controller.set_input(Vec2::zeros(), true);
        grounded_step(&mut controller, &mut body, &field);
        controller.set_input(Vec2::zeros(), true);
        let air = airborne_step(&mut controller, &mut body, &field, &NoGround);
        assert_eq!(air.jump, Some(JumpKind::Air));
        assert_eq!(controller.jump_phase(), 2);

        body.velocity = Vec3::zeros();
        controller.set_input(Vec2::zeros(), true);
        let mut contacts = controller.begin_contacts();
        contacts.evaluate(&[ContactPoint::new(Vec3::x(), SurfaceTag::new(1))]);
        let outcome = controller
            .step(contacts, &mut body, &field, &NoGround, DT)
            .unwrap();
        assert!(!outcome.grounded);
        assert!(outcome.on_steep);
        assert_eq!(outcome.jump, Some(JumpKind::Steep));
        assert_eq!(controller.jump_phase(), 1);

        let launch = body.velocity + Vec3::new(0.0, GRAVITY_MPS2 * DT, 0.0);
        let expected = (Vec3::x() + Vec3::y()).normalize() * (2.0f32 * GRAVITY_MPS2 * 2.0).sqrt();
        assert!((launch - expected).norm() < 1.0e-3);
    }

    #[test]
    fn steep_wedge_is_judged_against_the_refreshed_up_axis() {
        // The previous step ran under +Y; this step the field points along -X.
        let mut field = GravityRegistry::new();
        field
            .register(SourceId(1), Arc::new(UniformGravity::new(Vec3::new(-9.81, 0.0, 0.0))))
            .unwrap();
        let mut controller = CharacterController::default();
        let mut body = TestBody::default();
        let mut contacts = controller.begin_contacts();
        assert_eq!(contacts.up_axis(), Vec3::y());
        // Steep against both axes, but their average is walkable against +X only.
        contacts.evaluate(&[
            ContactPoint::new(Vec3::new(1.0, 0.2, 0.5).normalize(), SurfaceTag::new(1)),
            ContactPoint::new(Vec3::new(1.0, 0.2, -0.5).normalize(), SurfaceTag::new(1)),
        ]);
        assert_eq!(contacts.steep_contact_count(), 2);

        let outcome = controller
            .step(contacts, &mut body, &field, &NoGround, DT)
            .unwrap();
        assert!((outcome.up_axis - Vec3::x()).norm() < 1.0e-6);
        assert!(outcome.grounded);
    }
}
