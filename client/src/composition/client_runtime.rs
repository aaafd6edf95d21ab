use bevy::prelude::*;
use bevy::state::app::AppExtStates;
use bevy_egui::EguiPlugin;

use crate::AppState;
use crate::app::plugins::{build_bevy_plugins, create_winit_settings, sky_clear_color};
use crate::scene_runtime::registration::{
    register_explore_runtime, register_locomotion_clip_loading,
};
use crate::settings::{GameSettings, SettingsPlugin, SettingsResource};
use crate::ui::HudPlugin;
use crate::world::WorldPlugin;

pub fn configure_client_app(app: &mut App, settings: &GameSettings) {
    app.insert_resource(SettingsResource::new(settings.clone()))
        .add_plugins(build_bevy_plugins(settings))
        .insert_resource(create_winit_settings(settings))
        .insert_resource(sky_clear_color())
        .add_plugins(EguiPlugin::default())
        .init_state::<AppState>()
        .add_plugins(WorldPlugin)
        .add_plugins(SettingsPlugin)
        .add_plugins(HudPlugin);

    register_explore_runtime(app);
    register_locomotion_clip_loading(app);
}
