use crate::types::{Vec3, normalize_or_zero, world_up};

/// Which surface a jump was taken from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JumpKind {
    Ground,
    /// Off a steep surface while airborne; refreshes the air-jump budget.
    Steep,
    Air,
}

/// Contact situation at the moment a jump is requested.
#[derive(Clone, Copy, Debug)]
pub struct JumpContext {
    pub on_ground: bool,
    pub on_steep: bool,
    /// Ground normal when grounded, the up axis otherwise.
    pub contact_normal: Vec3,
    pub steep_normal: Vec3,
    pub up_axis: Vec3,
    /// Local gravity magnitude (m/s^2).
    pub gravity_magnitude: f32,
}

/// Jump tunables.
#[derive(Clone, Copy, Debug)]
pub struct JumpSettings {
    pub jump_height: f32,
    pub max_air_jumps: u32,
    pub perpendicular_to_ground: bool,
}

/// Launch speed that reaches `height` against gravity of `gravity_magnitude`.
#[inline]
pub fn jump_speed(gravity_magnitude: f32, height: f32) -> f32 {
    (2.0 * gravity_magnitude.max(0.0) * height.max(0.0)).sqrt()
}

/// Attempt a jump, updating `velocity` and the jump phase.
///
/// Ineligible requests are dropped without touching anything. The caller resets its
/// steps-since-jump counter when this returns `Some`.
pub fn try_jump(
    ctx: &JumpContext,
    settings: &JumpSettings,
    jump_phase: &mut u32,
    velocity: &mut Vec3,
) -> Option<JumpKind> {
    let (kind, mut direction) = if ctx.on_ground {
        (JumpKind::Ground, ctx.contact_normal)
    } else if ctx.on_steep {
        *jump_phase = 0;
        (JumpKind::Steep, ctx.steep_normal)
    } else if settings.max_air_jumps > 0 && *jump_phase <= settings.max_air_jumps {
        // Walking off a ledge spends the ground jump.
        if *jump_phase == 0 {
            *jump_phase = 1;
        }
        (JumpKind::Air, ctx.contact_normal)
    } else {
        return None;
    };

    *jump_phase += 1;
    let mut speed = jump_speed(ctx.gravity_magnitude, settings.jump_height);

    if settings.perpendicular_to_ground {
        direction = normalize_or_zero(&(direction + ctx.up_axis));
        let aligned = velocity.dot(&direction);
        if aligned > 0.0 {
            speed = (speed - aligned).max(0.0);
        }
        *velocity += direction * speed;
    } else {
        let up = world_up();
        let vertical = velocity.dot(&up);
        if vertical > 0.0 {
            speed = (speed - vertical).max(0.0);
        }
        *velocity += up * speed;
    }
    log::trace!("{kind:?} jump, phase {}", *jump_phase);
    Some(kind)
}
