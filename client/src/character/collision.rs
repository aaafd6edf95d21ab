use super::config::CharacterTuning;
use crate::scene_runtime::obstacles::{ObstacleId, ObstacleQuery, RayFilter};
use bevy::math::{Dir3, Ray3d, Vec3};

/// Horizontal ray directions, cast from half the character height.
pub const COLLISION_DIRECTIONS: [Dir3; 4] = [Dir3::X, Dir3::NEG_X, Dir3::Z, Dir3::NEG_Z];

/// Whether an avatar standing at `position` is too close to a tall obstacle.
///
/// Only the nearest hit along each ray is considered. An absent avatar
/// never collides.
pub fn check_collision<Q: ObstacleQuery + ?Sized>(
    obstacles: &Q,
    position: Option<Vec3>,
    tuning: &CharacterTuning,
    exclude: Option<ObstacleId>,
) -> bool {
    let Some(position) = position else {
        return false;
    };

    let origin = position + Vec3::Y * (tuning.character_height * 0.5);
    let filter = RayFilter::excluding(exclude).within(tuning.collision_distance);
    let blocking_height = tuning.blocking_height();

    COLLISION_DIRECTIONS.iter().any(|direction| {
        obstacles
            .nearest_hit(Ray3d::new(origin, *direction), &filter)
            .is_some_and(|hit| {
                hit.distance < tuning.collision_distance && hit.part_height > blocking_height
            })
    })
}
