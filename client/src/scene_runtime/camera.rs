use crate::input::InputGate;
use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use std::f32::consts::FRAC_PI_2;

const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.05;

/// Camera that orbits a pivot point. The pivot is driven by the character
/// controller; the user orbits with the right mouse button and zooms with the
/// wheel.
#[derive(Component, Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    /// Radians per pixel of mouse drag.
    pub orbit_sensitivity: f32,
    /// World units per wheel line.
    pub zoom_sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            orbit_sensitivity: 0.005,
            zoom_sensitivity: 1.0,
            min_distance: 2.0,
            max_distance: 40.0,
        }
    }
}

impl OrbitCamera {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }
}

/// Rotate a pivot-to-camera offset by yaw and pitch deltas, keeping its length.
pub fn orbit_offset(offset: Vec3, yaw_delta: f32, pitch_delta: f32) -> Vec3 {
    let distance = offset.length();
    if distance <= f32::EPSILON {
        return offset;
    }

    let yaw = offset.x.atan2(offset.z) + yaw_delta;
    let pitch = ((offset.y / distance).clamp(-1.0, 1.0).asin() + pitch_delta)
        .clamp(-PITCH_LIMIT, PITCH_LIMIT);

    Vec3::new(
        distance * pitch.cos() * yaw.sin(),
        distance * pitch.sin(),
        distance * pitch.cos() * yaw.cos(),
    )
}

/// Move the camera toward (positive `amount`) or away from the pivot.
pub fn zoom_offset(offset: Vec3, amount: f32, min_distance: f32, max_distance: f32) -> Vec3 {
    let Some(direction) = offset.try_normalize() else {
        return offset;
    };
    direction * (offset.length() - amount).clamp(min_distance, max_distance)
}

pub fn control_orbit_camera(
    gate: Res<InputGate>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mut cameras: Query<(&mut Transform, &OrbitCamera)>,
) {
    if !gate.is_open() {
        // Drain while gated so drags made over an overlay are not replayed.
        for _ in mouse_motion.read() {}
        for _ in mouse_wheel.read() {}
        return;
    }

    let mut drag = Vec2::ZERO;
    for motion in mouse_motion.read() {
        drag += motion.delta;
    }
    if !mouse_buttons.pressed(MouseButton::Right) {
        drag = Vec2::ZERO;
    }

    let mut zoom_units = 0.0;
    for wheel in mouse_wheel.read() {
        let unit_scale = match wheel.unit {
            MouseScrollUnit::Line => 1.0,
            MouseScrollUnit::Pixel => 0.03,
        };
        zoom_units += wheel.y * unit_scale;
    }

    if drag == Vec2::ZERO && zoom_units == 0.0 {
        return;
    }

    for (mut transform, orbit) in &mut cameras {
        let mut offset = transform.translation - orbit.target;
        if drag != Vec2::ZERO {
            offset = orbit_offset(
                offset,
                -drag.x * orbit.orbit_sensitivity,
                drag.y * orbit.orbit_sensitivity,
            );
        }
        if zoom_units != 0.0 {
            offset = zoom_offset(
                offset,
                zoom_units * orbit.zoom_sensitivity,
                orbit.min_distance,
                orbit.max_distance,
            );
        }
        transform.translation = orbit.target + offset;
    }
}

pub fn look_at_orbit_target(mut cameras: Query<(&mut Transform, &OrbitCamera)>) {
    for (mut transform, orbit) in &mut cameras {
        if transform.translation.distance_squared(orbit.target) > f32::EPSILON {
            transform.look_at(orbit.target, Vec3::Y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbit_keeps_distance() {
        let offset = Vec3::new(0.0, 2.0, 5.0);
        let rotated = orbit_offset(offset, 0.7, 0.2);
        assert!((rotated.length() - offset.length()).abs() < 1e-4);
        assert!(rotated.x > 0.0);
    }

    #[test]
    fn orbit_pitch_is_limited() {
        let rotated = orbit_offset(Vec3::new(0.0, 0.0, 5.0), 0.0, 10.0);
        assert!(rotated.y < 5.0);
        assert!((rotated.y / 5.0).clamp(-1.0, 1.0).asin() <= PITCH_LIMIT + 1e-4);
    }

    #[test]
    fn zoom_clamps_distance() {
        let offset = Vec3::new(0.0, 0.0, 10.0);
        assert!((zoom_offset(offset, 3.0, 2.0, 40.0).z - 7.0).abs() < 1e-5);
        assert!((zoom_offset(offset, 50.0, 2.0, 40.0).z - 2.0).abs() < 1e-5);
        assert!((zoom_offset(offset, -50.0, 2.0, 40.0).z - 40.0).abs() < 1e-5);
        assert_eq!(zoom_offset(Vec3::ZERO, 1.0, 2.0, 40.0), Vec3::ZERO);
    }
}
