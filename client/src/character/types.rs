use bevy::prelude::*;

/// Marker for the player-controlled avatar root.
#[derive(Component)]
pub struct PlayerAvatar;

/// Marker for animation players already bound to the avatar animation graph.
#[derive(Component)]
pub struct AvatarAnimationBound;
