use bevy::prelude::*;
use gravity_walker::{
    CharacterController, Layer, StepOutcome,
    rapier_world::rapier3d::prelude::{ColliderHandle, RigidBodyHandle},
    types as sim,
};
use leafwing_input_manager::prelude::ActionState;

use crate::{
    convert::{camera_input_frame, to_bevy},
    input::InputAction,
    settings::WalkerSettings,
    world::{self, Gravity, Physics, SceneLayer, SimBody, SimSet},
};

const PLAYER_RADIUS: f32 = 0.5;
const SPAWN_POINT: sim::Vec3 = sim::Vec3::new(0.0, 2.0, 0.0);

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_player.after(world::setup));
    app.add_systems(Update, (read_input, respawn, paint_player));
    app.add_systems(FixedUpdate, step_player.in_set(SimSet::Bodies));
}

#[derive(Component)]
pub struct Player {
    pub collider: ColliderHandle,
}

/// Controller state plus the last step's result for presentation.
#[derive(Component)]
pub struct Walker {
    pub controller: CharacterController,
    pub last: Option<StepOutcome>,
}

impl Walker {
    /// Up axis of the last step, world +Y before the first one.
    pub fn up_axis(&self) -> Vec3 {
        self.last
            .map(|outcome| to_bevy(&outcome.up_axis))
            .unwrap_or(Vec3::Y)
    }
}

#[derive(Resource)]
struct PlayerMaterials {
    grounded: Handle<StandardMaterial>,
    steep: Handle<StandardMaterial>,
    airborne: Handle<StandardMaterial>,
    halted: Handle<StandardMaterial>,
}

fn spawn_player(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut physics: ResMut<Physics>,
    settings: Res<WalkerSettings>,
) {
    let (body, collider) =
        physics
            .0
            .insert_sphere(SPAWN_POINT, PLAYER_RADIUS, SceneLayer::Character.mask());

    let palette = PlayerMaterials {
        grounded: materials.add(Color::srgb(0.2, 0.8, 0.3)),
        steep: materials.add(Color::srgb(0.9, 0.7, 0.2)),
        airborne: materials.add(Color::srgb(0.3, 0.5, 0.9)),
        halted: materials.add(Color::srgb(0.9, 0.1, 0.1)),
    };

    commands.spawn((
        Player { collider },
        Walker {
            controller: CharacterController::new(settings.0),
            last: None,
        },
        SimBody(body),
        Mesh3d(meshes.add(Sphere::new(PLAYER_RADIUS))),
        MeshMaterial3d(palette.airborne.clone()),
        Transform::from_translation(to_bevy(&SPAWN_POINT)),
    ));
    commands.insert_resource(palette);
}

fn read_input(
    actions: Res<ActionState<InputAction>>,
    camera: Single<&Transform, With<Camera3d>>,
    mut walker: Single<&mut Walker>,
) {
    let axis = actions.axis_pair(&InputAction::Move);
    let jump = actions.just_pressed(&InputAction::Jump);
    walker.controller.set_input_frame(camera_input_frame(&camera));
    walker
        .controller
        .set_input(sim::Vec2::new(axis.x, axis.y), jump);
}

fn step_player(
    mut physics: ResMut<Physics>,
    gravity: Res<Gravity>,
    mut players: Query<(&Player, &SimBody, &mut Walker)>,
) {
    for (player, body, mut walker) in &mut players {
        if walker.controller.is_faulted() {
            continue;
        }
        let walker = &mut *walker;
        match physics
            .0
            .step_controller(&mut walker.controller, body.0, player.collider, &gravity.0)
        {
            Ok(outcome) => walker.last = Some(outcome),
            Err(err) => error!("Player step failed: {err}"),
        }
    }
}

fn respawn(
    actions: Res<ActionState<InputAction>>,
    mut physics: ResMut<Physics>,
    settings: Res<WalkerSettings>,
    mut players: Query<(&SimBody, &mut Walker)>,
) {
    if !actions.just_pressed(&InputAction::Respawn) {
        return;
    }
    for (body, mut walker) in &mut players {
        let Some(rb) = physics.0.bodies.get_mut(body.0) else {
            continue;
        };
        rb.set_translation(SPAWN_POINT, true);
        rb.set_linvel(sim::Vec3::zeros(), true);
        rb.set_angvel(sim::Vec3::zeros(), true);
        *walker = Walker {
            controller: CharacterController::new(settings.0),
            last: None,
        };
        info!("Player respawned");
    }
}

fn paint_player(
    palette: Res<PlayerMaterials>,
    mut players: Query<(&Walker, &mut MeshMaterial3d<StandardMaterial>)>,
) {
    for (walker, mut material) in &mut players {
        let wanted = if walker.controller.is_faulted() {
            &palette.halted
        } else {
            match walker.last {
                Some(outcome) if outcome.grounded => &palette.grounded,
                Some(outcome) if outcome.on_steep => &palette.steep,
                _ => &palette.airborne,
            }
        };
        if material.0 != *wanted {
            material.0 = wanted.clone();
        }
    }
}
