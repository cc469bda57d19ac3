//! Rigid bodies that fall along the aggregated gravity field instead of engine gravity.

use crate::{
    constants::{SETTLE_DURATION_S, SETTLE_SPEED_SQ},
    gravity::GravityField,
    host::PhysicsBody,
};

/// What a floating body did this step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloatOutcome {
    /// Gravity was applied as an acceleration.
    Applied,
    /// The engine reports the body asleep; nothing applied.
    Sleeping,
    /// At rest long enough that gravity is withheld so the engine can put it to sleep.
    Settled,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FloatingBody {
    /// Withhold gravity once the body has been at rest for `SETTLE_DURATION_S`.
    pub float_to_sleep: bool,
    settle_delay: f32,
}

impl FloatingBody {
    /// Turns off native gravity on `body`; the field is applied by [`step`](Self::step) from
    /// then on.
    pub fn new(body: &mut dyn PhysicsBody, float_to_sleep: bool) -> Self {
        body.disable_native_gravity();
        Self {
            float_to_sleep,
            settle_delay: 0.0,
        }
    }

    pub fn step(
        &mut self,
        body: &mut dyn PhysicsBody,
        field: &dyn GravityField,
        dt: f32,
    ) -> FloatOutcome {
        if self.float_to_sleep {
            if body.is_sleeping() {
                self.settle_delay = 0.0;
                return FloatOutcome::Sleeping;
            }
            if body.velocity().norm_squared() < SETTLE_SPEED_SQ {
                self.settle_delay += dt;
                if self.settle_delay >= SETTLE_DURATION_S {
                    return FloatOutcome::Settled;
                }
            } else {
                self.settle_delay = 0.0;
            }
        }
        body.add_acceleration(field.gravity_at(&body.position()));
        FloatOutcome::Applied
    }

    /// Seconds spent at rest, for presentation.
    pub fn settle_delay(&self) -> f32 {
        self.settle_delay
    }

    /// Rest time as a `0..=1` fraction of the settle duration.
    pub fn settled_fraction(&self) -> f32 {
        (self.settle_delay / SETTLE_DURATION_S).clamp(0.0, 1.0)
    }
}
