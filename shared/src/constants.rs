/// Gravity magnitude in meters per second squared (positive value).
///
/// Used by the default uniform source; controllers always read the aggregated field instead.
pub const GRAVITY_MPS2: f32 = 9.81;

/// Fixed simulation step the demo host runs at (seconds).
pub const FIXED_DT: f32 = 1.0 / 50.0;

/// Contacts whose `dot(up, normal)` is at or below this are overhangs/ceilings and are ignored.
///
/// Slightly below zero so near-vertical walls still count as steep despite float noise.
pub const STEEP_DOT_FLOOR: f32 = -0.01;

/// Squared speed (m^2/s^2) under which a floating body counts as at rest.
pub const SETTLE_SPEED_SQ: f32 = 1.0e-4;

/// Seconds a floating body must stay at rest before it stops applying gravity.
pub const SETTLE_DURATION_S: f32 = 1.0;
