use crate::input::{ControlKey, InputSnapshot};
use bevy::prelude::*;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Yaw offset from the camera's forward direction for the held keys.
///
/// Opposite keys cancel each other (`a`+`d`, `w`+`s`). When every held key is
/// cancelled the avatar keeps going forward.
pub fn direction_offset(input: &InputSnapshot) -> f32 {
    let axis = |positive: ControlKey, negative: ControlKey| {
        i8::from(input.is_pressed(positive)) - i8::from(input.is_pressed(negative))
    };
    let forward = axis(ControlKey::W, ControlKey::S);
    let left = axis(ControlKey::A, ControlKey::D);

    match (forward, left) {
        (1, 1) => FRAC_PI_4,
        (1, -1) => -FRAC_PI_4,
        (0, 1) => FRAC_PI_2,
        (0, -1) => -FRAC_PI_2,
        (-1, 1) => 3.0 * FRAC_PI_4,
        (-1, -1) => -3.0 * FRAC_PI_4,
        (-1, 0) => PI,
        _ => 0.0,
    }
}

/// Yaw of the camera as seen from the avatar.
pub fn camera_yaw(camera: Vec3, avatar: Vec3) -> f32 {
    (camera.x - avatar.x).atan2(camera.z - avatar.z)
}

/// Rotation that faces the avatar away from the camera, turned by `offset`.
pub fn facing_rotation(camera_yaw: f32, offset: f32) -> Quat {
    Quat::from_rotation_y(camera_yaw + offset + PI)
}

/// Horizontal displacement for one frame.
///
/// Returns zero when the camera looks straight up or down.
pub fn movement_vector(camera_forward: Vec3, offset: f32, velocity: f32, delta_secs: f32) -> Vec3 {
    let flat = Vec3::new(camera_forward.x, 0.0, camera_forward.z).normalize_or_zero();
    Quat::from_rotation_y(offset) * flat * velocity * delta_secs
}
