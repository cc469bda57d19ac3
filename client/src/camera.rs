use crate::player::{Player, Walker};
use bevy::{camera::Exposure, prelude::*};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, add_camera);
    app.add_systems(PostUpdate, follow_player);
}

/// Camera offset from the player: up along the local up axis, back along world +Z.
const CAMERA_HEIGHT: f32 = 6.0;
const CAMERA_DISTANCE: f32 = 12.0;
const CAMERA_DECAY_RATE: f32 = 6.0;

fn add_camera(mut commands: Commands) {
    commands.spawn((
        Exposure { ev100: 9.7 },
        bevy::core_pipeline::tonemapping::Tonemapping::AcesFitted,
        Camera3d::default(),
        Transform::from_xyz(0.0, CAMERA_HEIGHT, CAMERA_DISTANCE).looking_at(Vec3::ZERO, Vec3::Y),
        DistanceFog {
            color: Color::srgba(0.35, 0.48, 0.66, 1.0),
            directional_light_color: Color::srgba(1.0, 0.95, 0.85, 0.5),
            directional_light_exponent: 30.0,
            falloff: FogFalloff::from_visibility_colors(
                200.0, // Fog distance
                Color::srgb(0.35, 0.5, 0.66),
                Color::srgb(0.8, 0.8, 0.7),
            ),
        },
    ));
}

fn follow_player(
    mut camera_query: Query<&mut Transform, With<Camera3d>>,
    player: Single<(&Transform, &Walker), (With<Player>, Without<Camera3d>)>,
    time: Res<Time>,
) {
    let Ok(mut cam_tf) = camera_query.single_mut() else {
        return;
    };
    let (player_tf, walker) = *player;
    let up = walker.up_axis();
    let back = Vec3::Z.reject_from(up).normalize_or(Vec3::X.reject_from(up).normalize());

    let target = player_tf.translation + up * CAMERA_HEIGHT + back * CAMERA_DISTANCE;
    cam_tf
        .translation
        .smooth_nudge(&target, CAMERA_DECAY_RATE, time.delta_secs());
    cam_tf.look_at(player_tf.translation, up);
}
