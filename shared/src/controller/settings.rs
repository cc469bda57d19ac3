/*!
Character controller settings and derived thresholds.

These constants centralize the tunables of the rolling-sphere controller. They are
the defaults of [`ControllerSettings`]; hosts override them per instance (the demo
client loads them from a RON file).

Notes
- Distances are in meters, time in seconds, angles in degrees (converted to cosines once).
- `sanitized()` clamps every field into its supported range so a bad config file
  never produces NaN thresholds.
*/

use crate::layers::{LayerMask, SurfaceTag};

/// Top speed the player input maps to (m/s).
pub const DEFAULT_MAX_SPEED: f32 = 10.0;

/// Horizontal speed change per second while grounded (m/s^2).
pub const DEFAULT_MAX_ACCELERATION: f32 = 10.0;

/// Horizontal speed change per second while airborne (m/s^2).
pub const DEFAULT_MAX_AIR_ACCELERATION: f32 = 1.0;

/// Apex height of a jump under the local field (meters).
pub const DEFAULT_JUMP_HEIGHT: f32 = 2.0;

/// Extra jumps allowed before touching ground again.
pub const DEFAULT_MAX_AIR_JUMPS: u32 = 1;

/// Steepest walkable slope (degrees).
pub const DEFAULT_MAX_GROUND_ANGLE_DEG: f32 = 25.0;

/// Steepest walkable slope on surfaces tagged as stairs (degrees).
pub const DEFAULT_MAX_STAIRS_ANGLE_DEG: f32 = 50.0;

/// Above this speed the controller never snaps back to the ground (m/s).
pub const DEFAULT_MAX_SNAP_SPEED: f32 = 100.0;

/// Length of the downward snap ray (meters).
pub const DEFAULT_SNAP_PROBE_DISTANCE: f32 = 1.0;

const MAX_SPEED_RANGE: f32 = 100.0;
const MAX_JUMP_HEIGHT: f32 = 10.0;
const MAX_AIR_JUMPS: u32 = 5;
const MAX_ANGLE_DEG: f32 = 90.0;

/// Per-instance tunables of a [`CharacterController`](super::CharacterController).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ControllerSettings {
    pub max_speed: f32,
    pub max_acceleration: f32,
    pub max_air_acceleration: f32,
    pub jump_height: f32,
    pub max_air_jumps: u32,
    pub max_ground_angle_deg: f32,
    pub max_stairs_angle_deg: f32,
    pub max_snap_speed: f32,
    pub snap_probe_distance: f32,
    /// Jump along the (up-blended) contact normal instead of straight up.
    pub jump_perpendicular_to_ground: bool,
    /// Layers the snap ray can hit.
    pub probe_mask: LayerMask,
    /// Layers that use the stairs slope limit.
    pub stairs_mask: LayerMask,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            max_speed: DEFAULT_MAX_SPEED,
            max_acceleration: DEFAULT_MAX_ACCELERATION,
            max_air_acceleration: DEFAULT_MAX_AIR_ACCELERATION,
            jump_height: DEFAULT_JUMP_HEIGHT,
            max_air_jumps: DEFAULT_MAX_AIR_JUMPS,
            max_ground_angle_deg: DEFAULT_MAX_GROUND_ANGLE_DEG,
            max_stairs_angle_deg: DEFAULT_MAX_STAIRS_ANGLE_DEG,
            max_snap_speed: DEFAULT_MAX_SNAP_SPEED,
            snap_probe_distance: DEFAULT_SNAP_PROBE_DISTANCE,
            jump_perpendicular_to_ground: true,
            probe_mask: LayerMask::all(),
            stairs_mask: LayerMask::none(),
        }
    }
}

impl ControllerSettings {
    /// Clamp every field into its supported range. Non-finite values fall back to defaults.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let clamp = |v: f32, fallback: f32, lo: f32, hi: f32| {
            if v.is_finite() {
                v.clamp(lo, hi)
            } else {
                log::warn!("Non-finite controller setting replaced by default {fallback}");
                fallback
            }
        };
        let sanitized = Self {
            max_speed: clamp(self.max_speed, d.max_speed, 0.0, MAX_SPEED_RANGE),
            max_acceleration: clamp(self.max_acceleration, d.max_acceleration, 0.0, MAX_SPEED_RANGE),
            max_air_acceleration: clamp(
                self.max_air_acceleration,
                d.max_air_acceleration,
                0.0,
                MAX_SPEED_RANGE,
            ),
            jump_height: clamp(self.jump_height, d.jump_height, 0.0, MAX_JUMP_HEIGHT),
            max_air_jumps: self.max_air_jumps.min(MAX_AIR_JUMPS),
            max_ground_angle_deg: clamp(
                self.max_ground_angle_deg,
                d.max_ground_angle_deg,
                0.0,
                MAX_ANGLE_DEG,
            ),
            max_stairs_angle_deg: clamp(
                self.max_stairs_angle_deg,
                d.max_stairs_angle_deg,
                0.0,
                MAX_ANGLE_DEG,
            ),
            max_snap_speed: clamp(self.max_snap_speed, d.max_snap_speed, 0.0, MAX_SPEED_RANGE),
            snap_probe_distance: clamp(
                self.snap_probe_distance,
                d.snap_probe_distance,
                0.0,
                f32::MAX,
            ),
            ..self
        };
        if sanitized != self {
            log::warn!("Controller settings clamped into supported ranges: {sanitized:?}");
        }
        sanitized
    }

    pub fn slope_limits(&self) -> SlopeLimits {
        SlopeLimits::new(
            self.max_ground_angle_deg,
            self.max_stairs_angle_deg,
            self.stairs_mask,
        )
    }
}

/// Ground-angle thresholds expressed as minimum `dot(up, normal)` values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlopeLimits {
    pub min_ground_dot: f32,
    pub min_stairs_dot: f32,
    pub stairs_mask: LayerMask,
}

impl SlopeLimits {
    pub fn new(max_ground_angle_deg: f32, max_stairs_angle_deg: f32, stairs_mask: LayerMask) -> Self {
        Self {
            min_ground_dot: max_ground_angle_deg.to_radians().cos(),
            min_stairs_dot: max_stairs_angle_deg.to_radians().cos(),
            stairs_mask,
        }
    }

    /// Minimum `dot(up, normal)` for `surface` to count as ground.
    #[inline]
    pub fn min_dot(&self, surface: SurfaceTag) -> f32 {
        if surface.is_in(self.stairs_mask) {
            self.min_stairs_dot
        } else {
            self.min_ground_dot
        }
    }
}

impl Default for SlopeLimits {
    fn default() -> Self {
        ControllerSettings::default().slope_limits()
    }
}
