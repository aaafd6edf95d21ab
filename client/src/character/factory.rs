use super::controller::CharacterController;
use super::types::PlayerAvatar;
use crate::scene_runtime::obstacle_sync::SceneObstacle;
use bevy::prelude::*;
use common::WorldAsset;

pub struct AvatarFactory;

impl AvatarFactory {
    pub fn spawn(
        commands: &mut Commands,
        asset_server: &AssetServer,
        position: Vec3,
        scale: f32,
        controller: CharacterController,
    ) -> Entity {
        let scene: Handle<Scene> =
            asset_server.load(GltfAssetLabel::Scene(0).from_asset(WorldAsset::Avatar.asset_path()));

        let avatar = commands
            .spawn((
                SceneRoot(scene),
                Transform::from_translation(position).with_scale(Vec3::splat(scale)),
                Visibility::default(),
                PlayerAvatar,
                SceneObstacle::prop(),
                controller,
            ))
            .id();

        info!("Avatar spawned at {position}");
        avatar
    }
}
