use super::config::CharacterTuning;
use crate::scene_runtime::obstacles::{ObstacleId, ObstacleQuery, RayFilter};
use bevy::math::{Dir3, Ray3d, Vec3};

/// Height of the walkable surface under `position`, never below the
/// configured minimum.
pub fn resolve_ground_height<Q: ObstacleQuery + ?Sized>(
    obstacles: &Q,
    position: Vec3,
    tuning: &CharacterTuning,
    exclude: Option<ObstacleId>,
) -> f32 {
    let origin = position + Vec3::Y * tuning.ground_ray_height;
    obstacles
        .nearest_hit(Ray3d::new(origin, Dir3::NEG_Y), &RayFilter::excluding(exclude))
        .map_or(tuning.min_height, |hit| hit.point.y.max(tuning.min_height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_runtime::obstacles::{
        Bounds, Obstacle, ObstacleCategory, ObstacleNode, ObstacleSet,
    };

    fn ground_slab(top: f32) -> ObstacleSet {
        let mut set = ObstacleSet::new();
        set.insert(Obstacle {
            id: ObstacleId(1),
            category: ObstacleCategory::Terrain,
            root: ObstacleNode::cuboid(Bounds::new(
                Vec3::new(-10.0, top - 1.0, -10.0),
                Vec3::new(10.0, top, 10.0),
            )),
        });
        set
    }

    #[test]
    fn snaps_to_surface_below() {
        let tuning = CharacterTuning::default();
        let height = resolve_ground_height(&ground_slab(0.5), Vec3::ZERO, &tuning, None);
        assert!((height - 0.5).abs() < 1e-4);
    }

    #[test]
    fn climbs_surface_within_ray_height() {
        let tuning = CharacterTuning::default();
        let height = resolve_ground_height(&ground_slab(1.5), Vec3::ZERO, &tuning, None);
        assert!((height - 1.5).abs() < 1e-4);
    }

    #[test]
    fn surface_below_minimum_is_clamped() {
        let tuning = CharacterTuning {
            min_height: 0.25,
            ..Default::default()
        };
        let height =
            resolve_ground_height(&ground_slab(-3.0), Vec3::new(0.0, 1.0, 0.0), &tuning, None);
        assert_eq!(height, 0.25);
    }

    #[test]
    fn no_ground_falls_back_to_minimum() {
        let tuning = CharacterTuning::default();
        let height = resolve_ground_height(&ObstacleSet::new(), Vec3::new(0.0, 7.0, 0.0), &tuning, None);
        assert_eq!(height, tuning.min_height);
    }
}
