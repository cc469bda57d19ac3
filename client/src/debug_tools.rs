//! Debug tooling for native dev builds.
//!
//! This plugin is compiled/used only when the caller gates it behind `dev_native`
//! (`#[cfg(feature = "dev_native")] mod debug_tools;` in `main.rs`).

use bevy::diagnostic::{
    EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin,
};
use bevy::prelude::*;

use crate::{
    convert::to_bevy,
    player::{Player, Walker},
};

const UP_ARROW_LENGTH: f32 = 1.5;

/// Add debug tooling (intended for `dev_native` builds only).
pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        FrameTimeDiagnosticsPlugin::default(),
        EntityCountDiagnosticsPlugin::default(),
        LogDiagnosticsPlugin::default(),
    ));

    app.add_systems(Update, draw_walker_axes);
}

/// Up axis in white, current velocity in yellow.
fn draw_walker_axes(mut gizmos: Gizmos, players: Query<(&Transform, &Walker), With<Player>>) {
    for (transform, walker) in &players {
        let origin = transform.translation;
        gizmos.arrow(origin, origin + walker.up_axis() * UP_ARROW_LENGTH, Color::WHITE);
        if let Some(outcome) = walker.last {
            gizmos.arrow(origin, origin + to_bevy(&outcome.velocity) * 0.25, Color::srgb(1.0, 0.9, 0.1));
        }
    }
}
