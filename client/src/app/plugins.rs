use bevy::app::PluginGroupBuilder;
use bevy::asset::AssetPlugin;
use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use bevy::render::pipelined_rendering::PipelinedRenderingPlugin;
use bevy::window::WindowResolution;
use bevy::winit::WinitSettings;

use crate::settings::{GameSettings, present_mode_for};

const LOG_FILTER: &str = "wgpu=error,naga=warn,bevy_gltf=warn,forest_client=info";

/// Sky tint behind the forest canopy.
const SKY_COLOR: Color = Color::srgb(0.62, 0.74, 0.82);

pub fn build_bevy_plugins(settings: &GameSettings) -> PluginGroupBuilder {
    DefaultPlugins
        .set(WindowPlugin {
            primary_window: Some(primary_window(settings)),
            ..Default::default()
        })
        .set(AssetPlugin {
            file_path: concat!(env!("CARGO_MANIFEST_DIR"), "/../assets").into(),
            ..Default::default()
        })
        .set(LogPlugin {
            level: Level::INFO,
            filter: LOG_FILTER.into(),
            ..Default::default()
        })
        .disable::<PipelinedRenderingPlugin>()
}

pub fn create_winit_settings(settings: &GameSettings) -> WinitSettings {
    let focused_mode = settings.graphics.fps_limit.to_update_mode();
    WinitSettings {
        focused_mode,
        unfocused_mode: focused_mode,
    }
}

pub fn sky_clear_color() -> ClearColor {
    ClearColor(SKY_COLOR)
}

fn primary_window(settings: &GameSettings) -> Window {
    let graphics = &settings.graphics;
    Window {
        title: "Forest Explorer".into(),
        resolution: WindowResolution::new(graphics.resolution.width, graphics.resolution.height),
        resizable: true,
        mode: graphics.window_mode.to_bevy(),
        present_mode: present_mode_for(graphics),
        ..Default::default()
    }
}
