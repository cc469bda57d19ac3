use std::sync::Arc;

use bevy::prelude::*;
use gravity_walker::{
    FIXED_DT, GRAVITY_MPS2, Layer, PhysicsScene, SharedGravityRegistry, SourceId, WorldStaticDef,
    gravity::{BoxGravity, GravitySource},
    rapier_world::{
        ColliderShapeDef,
        rapier3d::{na::UnitQuaternion, prelude::RigidBodyHandle},
    },
    types as sim,
};

use crate::convert::{quat_to_bevy, to_bevy};

gravity_walker::define_layers!(SceneLayer, u32, {
    Ground,
    Stairs,
    Character,
    Prop,
});

#[derive(Resource)]
pub struct Physics(pub PhysicsScene);

#[derive(Resource, Clone, Default)]
pub struct Gravity(pub SharedGravityRegistry);

/// Links a render entity to its simulated rigid body.
#[derive(Component, Clone, Copy)]
pub struct SimBody(pub RigidBodyHandle);

/// Fixed-step ordering: bodies write velocities/forces, then the engine integrates.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    Bodies,
    Engine,
}

pub(super) fn plugin(app: &mut App) {
    app.insert_resource(Physics(PhysicsScene::new(FIXED_DT)));
    app.init_resource::<Gravity>();
    app.configure_sets(FixedUpdate, (SimSet::Bodies, SimSet::Engine).chain());

    app.add_systems(Startup, setup);
    app.add_systems(FixedUpdate, step_engine.in_set(SimSet::Engine));
    app.add_systems(Update, sync_transforms);
}

/// Floor zone with ordinary downward gravity.
const FLOOR_ZONE_CENTER: sim::Vec3 = sim::Vec3::new(0.0, 12.0, 0.0);
const FLOOR_ZONE_HALF: sim::Vec3 = sim::Vec3::new(20.0, 14.0, 20.0);

/// Strip next to the climbing wall where gravity pulls toward the wall.
const WALL_ZONE_CENTER: sim::Vec3 = sim::Vec3::new(22.0, 12.0, 0.0);
const WALL_ZONE_HALF: sim::Vec3 = sim::Vec3::new(2.0, 14.0, 20.0);

fn gravity_zones() -> Vec<(SourceId, Arc<dyn GravitySource>)> {
    let zone = |center: sim::Vec3, half_extents, gravity| -> Arc<dyn GravitySource> {
        Arc::new(BoxGravity {
            pose: sim::Iso::from_parts(center.into(), UnitQuaternion::identity()),
            half_extents,
            gravity,
        })
    };
    vec![
        (
            SourceId(1),
            zone(
                FLOOR_ZONE_CENTER,
                FLOOR_ZONE_HALF,
                sim::Vec3::new(0.0, -GRAVITY_MPS2, 0.0),
            ),
        ),
        (
            SourceId(2),
            zone(
                WALL_ZONE_CENTER,
                WALL_ZONE_HALF,
                sim::Vec3::new(GRAVITY_MPS2, 0.0, 0.0),
            ),
        ),
    ]
}

fn static_defs() -> Vec<WorldStaticDef> {
    let ground = SceneLayer::Ground.mask();
    let stairs = SceneLayer::Stairs.mask();
    let cuboid = |id, translation: sim::Vec3, rotation, half_extents: sim::Vec3, layers| {
        WorldStaticDef {
            id,
            translation,
            rotation,
            shape: ColliderShapeDef::Cuboid { half_extents },
            layers,
        }
    };
    let tilt = |deg: f32| UnitQuaternion::from_axis_angle(&sim::Vec3::z_axis(), deg.to_radians());

    vec![
        // Floor, top face at y = 0.
        cuboid(1, sim::Vec3::new(0.0, -0.5, 0.0), UnitQuaternion::identity(), sim::Vec3::new(25.0, 0.5, 20.0), ground),
        // Climbing wall facing -X.
        cuboid(2, sim::Vec3::new(25.0, 12.0, 0.0), UnitQuaternion::identity(), sim::Vec3::new(1.0, 12.5, 20.0), ground),
        // Walkable 20 degree ramp.
        cuboid(3, sim::Vec3::new(-8.0, 0.5, -8.0), tilt(20.0), sim::Vec3::new(4.0, 0.5, 2.0), ground),
        // 40 degree ramp: too steep as ground, walkable as stairs.
        cuboid(4, sim::Vec3::new(-8.0, 1.0, 0.0), tilt(40.0), sim::Vec3::new(4.0, 0.5, 2.0), stairs),
        // Same incline on the ground layer.
        cuboid(5, sim::Vec3::new(-8.0, 1.0, 8.0), tilt(40.0), sim::Vec3::new(4.0, 0.5, 2.0), ground),
        // Two steep walls forming a walkable wedge.
        cuboid(6, sim::Vec3::new(8.0, 1.5, 8.0), tilt(-60.0), sim::Vec3::new(3.0, 0.25, 2.0), ground),
        cuboid(7, sim::Vec3::new(11.0, 1.5, 8.0), tilt(60.0), sim::Vec3::new(3.0, 0.25, 2.0), ground),
    ]
}

pub(crate) fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut physics: ResMut<Physics>,
    gravity: Res<Gravity>,
) {
    info!("World setup");

    for (id, source) in gravity_zones() {
        if let Err(err) = gravity.0.register(id, source) {
            error!("Gravity zone rejected: {err}");
        }
    }

    let ground_material = materials.add(StandardMaterial {
        base_color: Color::linear_rgb(0.2, 0.3, 0.25),
        perceptual_roughness: 1.0,
        metallic: 0.0,
        ..default()
    });
    let stairs_material = materials.add(Color::srgb_u8(124, 144, 255));

    let defs = static_defs();
    physics.0.insert_statics(defs.clone());
    for def in &defs {
        let ColliderShapeDef::Cuboid { half_extents } = def.shape else {
            continue;
        };
        let material = if def.layers & SceneLayer::Stairs.mask() != 0 {
            stairs_material.clone()
        } else {
            ground_material.clone()
        };
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::from_size(to_bevy(&(half_extents * 2.0))))),
            MeshMaterial3d(material),
            Transform::from_translation(to_bevy(&def.translation))
                .with_rotation(quat_to_bevy(&def.rotation)),
        ));
    }

    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 8.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn step_engine(mut physics: ResMut<Physics>) {
    physics.0.step();
}

fn sync_transforms(physics: Res<Physics>, mut bodies: Query<(&SimBody, &mut Transform)>) {
    for (body, mut transform) in &mut bodies {
        let (Some(translation), Some(rotation)) =
            (physics.0.translation(body.0), physics.0.rotation(body.0))
        else {
            continue;
        };
        transform.translation = to_bevy(&translation);
        transform.rotation = quat_to_bevy(&rotation);
    }
}
