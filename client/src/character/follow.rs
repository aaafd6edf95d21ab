use super::config::ControllerConfig;
use crate::scene_runtime::camera::OrbitCamera;
use bevy::prelude::*;

/// Trail the camera behind an accepted avatar move.
pub fn follow_avatar(
    camera: &mut Transform,
    orbit: &mut OrbitCamera,
    move_x: f32,
    move_z: f32,
    avatar_position: Vec3,
    config: &ControllerConfig,
) {
    camera.translation.x += move_x;
    camera.translation.z = config
        .camera_corridor
        .clamp(camera.translation.z + move_z);
    orbit.target = avatar_position + Vec3::Y * config.tuning.camera_eye_offset;
}
