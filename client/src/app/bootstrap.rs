use bevy::prelude::App;

use crate::composition::client_runtime::configure_client_app;
use crate::settings::{self, GameSettings};

pub fn run_client_app() {
    let settings = startup_settings();
    let mut app = App::new();
    configure_client_app(&mut app, &settings);
    app.run();
}

/// Loads settings and writes the defaults out on first launch. Runs before
/// the log plugin exists.
fn startup_settings() -> GameSettings {
    let settings = settings::load_settings_or_default();
    if let Err(error) = settings::ensure_settings_file_exists(&settings) {
        eprintln!("Could not create '{}': {error}", settings::SETTINGS_FILE_PATH);
    }
    settings
}
