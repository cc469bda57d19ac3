use std::path::Path;

use bevy::prelude::*;
use gravity_walker::ControllerSettings;

/// Controller tunables file, relative to the working directory.
const SETTINGS_PATH: &str = "assets/controller.ron";

#[derive(Resource, Debug, Clone, Copy)]
pub struct WalkerSettings(pub ControllerSettings);

pub(super) fn plugin(app: &mut App) {
    app.insert_resource(WalkerSettings(load_settings(Path::new(SETTINGS_PATH))));
}

/// Read controller settings from a RON file, falling back to defaults.
fn load_settings(path: &Path) -> ControllerSettings {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            info!("No controller settings at {} ({err}); using defaults", path.display());
            return ControllerSettings::default();
        }
    };
    match parse_settings(&text) {
        Ok(settings) => settings,
        Err(err) => {
            warn!("Invalid controller settings in {}: {err}", path.display());
            ControllerSettings::default()
        }
    }
}

fn parse_settings(text: &str) -> Result<ControllerSettings, ron::error::SpannedError> {
    ron::from_str::<ControllerSettings>(text).map(ControllerSettings::sanitized)
}
