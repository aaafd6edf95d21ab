use super::animation::AvatarAnimationBank;
use super::controller::{CharacterController, ControlContext};
use super::types::PlayerAvatar;
use crate::input::InputSnapshot;
use crate::scene_runtime::camera::OrbitCamera;
use crate::scene_runtime::obstacles::ObstacleSet;
use bevy::prelude::*;

/// Run the character controller for this frame.
pub fn advance_character_control(
    time: Res<Time>,
    input: Res<InputSnapshot>,
    obstacles: Res<ObstacleSet>,
    mut clips: ResMut<AvatarAnimationBank>,
    mut avatars: Query<(Entity, &mut Transform, &mut CharacterController), With<PlayerAvatar>>,
    mut cameras: Query<(&mut Transform, &mut OrbitCamera), Without<PlayerAvatar>>,
) {
    let Ok((mut camera, mut orbit)) = cameras.single_mut() else {
        return;
    };
    let dt = time.delta_secs();

    for (entity, mut transform, mut controller) in &mut avatars {
        controller.set_avatar_obstacle(Some(entity.into()));
        controller.update(
            dt,
            &input,
            ControlContext {
                avatar: Some(&mut *transform),
                camera: &mut *camera,
                orbit: &mut *orbit,
                obstacles: &*obstacles,
                clips: &mut *clips,
            },
        );
    }
}
