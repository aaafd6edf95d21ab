use crate::AppState;
use crate::character::{
    AvatarAnimationBank, advance_character_control, bind_avatar_animation_player,
    drive_avatar_animation_transitions, initialize_locomotion_clips, register_loaded_clips,
};
use crate::input::{
    InputGate, InputSnapshot, capture_movement_input, open_gate_after_loading,
    toggle_run_mode_on_shift,
};
use crate::scene_runtime::camera::{control_orbit_camera, look_at_orbit_target};
use crate::scene_runtime::obstacle_sync::{
    MeshSurfaceCache, collect_scene_obstacles, forget_changed_mesh_surfaces,
};
use crate::scene_runtime::obstacles::ObstacleSet;
use crate::scene_runtime::pipeline::ExplorePipelineSet;
use bevy::ecs::message::Messages;
use bevy::prelude::*;
use bevy::state::prelude::{OnEnter, in_state};

/// Per-frame exploration systems: obstacle sync, input, character control,
/// animation and camera.
pub fn register_explore_runtime(app: &mut App) {
    app.init_resource::<ObstacleSet>()
        .init_resource::<InputSnapshot>()
        .init_resource::<InputGate>()
        .init_resource::<AvatarAnimationBank>()
        .init_resource::<MeshSurfaceCache>()
        .configure_sets(
            Update,
            (
                ExplorePipelineSet::AssetLoad,
                ExplorePipelineSet::ObstacleSync,
                ExplorePipelineSet::Input,
                ExplorePipelineSet::Control,
                ExplorePipelineSet::Animation,
                ExplorePipelineSet::Camera,
                ExplorePipelineSet::UiSync,
            )
                .chain(),
        )
        .add_systems(
            Update,
            (register_loaded_clips, bind_avatar_animation_player)
                .chain()
                .in_set(ExplorePipelineSet::AssetLoad),
        )
        .add_systems(
            Update,
            (
                forget_changed_mesh_surfaces
                    .run_if(resource_exists::<Messages<AssetEvent<Mesh>>>),
                collect_scene_obstacles,
            )
                .chain()
                .in_set(ExplorePipelineSet::ObstacleSync),
        )
        .add_systems(
            Update,
            (capture_movement_input, toggle_run_mode_on_shift).in_set(ExplorePipelineSet::Input),
        )
        .add_systems(
            Update,
            advance_character_control
                .in_set(ExplorePipelineSet::Control)
                .run_if(in_state(AppState::Exploring)),
        )
        .add_systems(
            Update,
            drive_avatar_animation_transitions.in_set(ExplorePipelineSet::Animation),
        )
        .add_systems(
            Update,
            (control_orbit_camera, look_at_orbit_target)
                .chain()
                .in_set(ExplorePipelineSet::Camera),
        )
        .add_systems(OnEnter(AppState::Exploring), open_gate_after_loading);
}

/// Request the locomotion clips. Needs the asset and animation plugins.
pub fn register_locomotion_clip_loading(app: &mut App) {
    app.add_systems(Startup, initialize_locomotion_clips);
}
