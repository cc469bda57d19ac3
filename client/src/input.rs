use bevy::prelude::*;
use leafwing_input_manager::prelude::*;

#[derive(Reflect, Actionlike, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputAction {
    /// x = right, y = forward, relative to the camera.
    #[actionlike(DualAxis)]
    Move,
    Jump,
    Respawn,
}

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(InputManagerPlugin::<InputAction>::default());

    app.register_type::<InputAction>();

    let mut input_map = InputMap::<InputAction>::default();
    input_map.insert_dual_axis(InputAction::Move, VirtualDPad::wasd());
    input_map.insert_dual_axis(InputAction::Move, VirtualDPad::arrow_keys());
    input_map.insert_dual_axis(InputAction::Move, GamepadStick::LEFT);
    input_map.insert(InputAction::Jump, KeyCode::Space);
    input_map.insert(InputAction::Jump, GamepadButton::South);
    input_map.insert(InputAction::Respawn, KeyCode::KeyR);
    app.insert_resource(input_map);
    app.insert_resource(ActionState::<InputAction>::default());
}
