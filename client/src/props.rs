//! Floating crates: dynamic boxes that fall along the gravity zones.

use bevy::{color::Mix, prelude::*};
use gravity_walker::{FloatingBody, Layer, types as sim};

use crate::{
    convert::to_bevy,
    world::{self, Gravity, Physics, SceneLayer, SimBody, SimSet},
};

const CRATE_HALF_EXTENT: f32 = 0.4;
const AWAKE_COLOR: Color = Color::srgb(0.85, 0.55, 0.3);
const SETTLED_COLOR: Color = Color::srgb(0.35, 0.3, 0.3);

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_crates.after(world::setup));
    app.add_systems(FixedUpdate, step_crates.in_set(SimSet::Bodies));
    app.add_systems(Update, fade_crates);
}

#[derive(Component)]
struct Prop {
    floating: FloatingBody,
}

fn spawn_crates(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut physics: ResMut<Physics>,
) {
    let mesh = meshes.add(Cuboid::from_length(CRATE_HALF_EXTENT * 2.0));
    let spots = [
        sim::Vec3::new(3.0, 4.0, -3.0),
        sim::Vec3::new(4.0, 6.0, -3.5),
        sim::Vec3::new(-3.0, 5.0, 4.0),
        // Drops into the wall zone and lands on the climbing wall.
        sim::Vec3::new(21.0, 3.0, 2.0),
    ];

    for spot in spots {
        let (body, _) = physics.0.insert_cuboid(
            spot,
            sim::Vec3::repeat(CRATE_HALF_EXTENT),
            SceneLayer::Prop.mask(),
        );
        let Some(mut rb) = physics.0.body_mut(body) else {
            continue;
        };
        let floating = FloatingBody::new(&mut rb, true);

        commands.spawn((
            Prop { floating },
            SimBody(body),
            Mesh3d(mesh.clone()),
            MeshMaterial3d(materials.add(AWAKE_COLOR)),
            Transform::from_translation(to_bevy(&spot)),
        ));
    }
}

fn step_crates(
    mut physics: ResMut<Physics>,
    gravity: Res<Gravity>,
    mut props: Query<(&SimBody, &mut Prop)>,
) {
    for (body, mut prop) in &mut props {
        if let Err(err) = physics.0.step_floating(&mut prop.floating, body.0, &gravity.0) {
            warn!("Crate step skipped: {err}");
        }
    }
}

fn fade_crates(
    mut materials: ResMut<Assets<StandardMaterial>>,
    props: Query<(&Prop, &MeshMaterial3d<StandardMaterial>)>,
) {
    for (prop, material) in &props {
        let Some(material) = materials.get_mut(&material.0) else {
            continue;
        };
        material.base_color = AWAKE_COLOR.mix(&SETTLED_COLOR, prop.floating.settled_fraction());
    }
}
