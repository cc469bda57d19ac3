use crate::types::{Quat, Vec3, move_towards, project_direction_on_plane};

/// Reference frame the 2-D input is expressed in (typically the camera).
///
/// Without a rotation the world X/Z axes are used. Either way the axes are flattened onto
/// the plane perpendicular to the current up axis.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputFrame {
    pub rotation: Option<Quat>,
}

impl InputFrame {
    pub fn world() -> Self {
        Self { rotation: None }
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation: Some(rotation),
        }
    }

    /// `(right, forward)` projected onto the up plane.
    ///
    /// Forward is the frame's +Z, matching the desired velocity layout `(x, 0, z)`.
    pub fn axes(&self, up_axis: &Vec3) -> (Vec3, Vec3) {
        let (right, forward) = match self.rotation {
            Some(rotation) => (rotation * Vec3::x(), rotation * Vec3::z()),
            None => (Vec3::x(), Vec3::z()),
        };
        (
            project_direction_on_plane(&right, up_axis),
            project_direction_on_plane(&forward, up_axis),
        )
    }
}

/// Inputs of the horizontal control step.
#[derive(Clone, Copy, Debug)]
pub struct VelocityControl {
    pub right_axis: Vec3,
    pub forward_axis: Vec3,
    pub contact_normal: Vec3,
    /// `x` along right, `z` along forward; `y` is ignored.
    pub desired_velocity: Vec3,
    /// Max speed change this step (acceleration * dt).
    pub max_speed_change: f32,
}

/// Move the contact-plane components of `velocity` toward the desired velocity.
///
/// Each basis component is clamped independently; the component along the contact normal is
/// left untouched. A basis axis parallel to the contact normal degenerates to zero and
/// contributes nothing.
pub fn adjust_velocity(velocity: &Vec3, control: &VelocityControl) -> Vec3 {
    let x_axis = project_direction_on_plane(&control.right_axis, &control.contact_normal);
    let z_axis = project_direction_on_plane(&control.forward_axis, &control.contact_normal);

    let current_x = velocity.dot(&x_axis);
    let current_z = velocity.dot(&z_axis);

    let new_x = move_towards(current_x, control.desired_velocity.x, control.max_speed_change);
    let new_z = move_towards(current_z, control.desired_velocity.z, control.max_speed_change);

    velocity + x_axis * (new_x - current_x) + z_axis * (new_z - current_z)
}
