use crate::scene_runtime::obstacles::{
    MeshSurface, Obstacle, ObstacleCategory, ObstacleId, ObstacleNode, ObstacleSet,
    PlacedSurface, Triangle,
};
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use std::collections::HashMap;

/// Marks a top-level world object whose meshes take part in ray queries.
#[derive(Component, Clone, Copy, Debug)]
pub struct SceneObstacle {
    pub category: ObstacleCategory,
}

impl SceneObstacle {
    pub fn prop() -> Self {
        Self {
            category: ObstacleCategory::Prop,
        }
    }

    pub fn terrain() -> Self {
        Self {
            category: ObstacleCategory::Terrain,
        }
    }
}

/// Triangle soups extracted from mesh assets, keyed by asset. `None` marks a
/// loaded mesh with nothing to hit (lines, points, no positions).
#[derive(Resource, Default)]
pub struct MeshSurfaceCache {
    surfaces: HashMap<AssetId<Mesh>, Option<MeshSurface>>,
}

impl MeshSurfaceCache {
    pub fn surface(&mut self, id: AssetId<Mesh>, meshes: &Assets<Mesh>) -> Option<MeshSurface> {
        if let Some(cached) = self.surfaces.get(&id) {
            return cached.clone();
        }
        // Not loaded yet: try again next frame.
        let mesh = meshes.get(id)?;
        let surface = mesh_surface(mesh);
        self.surfaces.insert(id, surface.clone());
        surface
    }

    pub fn forget(&mut self, id: AssetId<Mesh>) {
        self.surfaces.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

/// Local-space triangles of a triangle-list mesh.
pub fn mesh_surface(mesh: &Mesh) -> Option<MeshSurface> {
    if mesh.primitive_topology() != PrimitiveTopology::TriangleList {
        return None;
    }
    let positions = mesh.attribute(Mesh::ATTRIBUTE_POSITION)?.as_float3()?;
    let vertex = |index: usize| positions.get(index).copied().map(Vec3::from_array);

    let triangles = match mesh.indices() {
        Some(indices) => triangles_from_indices(indices, vertex),
        None => positions
            .chunks_exact(3)
            .map(|corners| {
                Triangle::new(
                    Vec3::from_array(corners[0]),
                    Vec3::from_array(corners[1]),
                    Vec3::from_array(corners[2]),
                )
            })
            .collect(),
    };
    MeshSurface::from_triangles(triangles)
}

fn triangles_from_indices(
    indices: &Indices,
    vertex: impl Fn(usize) -> Option<Vec3>,
) -> Vec<Triangle> {
    let indices: Vec<usize> = indices.iter().collect();
    indices
        .chunks_exact(3)
        .filter_map(|corners| {
            Some(Triangle::new(
                vertex(corners[0])?,
                vertex(corners[1])?,
                vertex(corners[2])?,
            ))
        })
        .collect()
}

/// Drop cached triangles of meshes that changed or went away.
pub fn forget_changed_mesh_surfaces(
    mut events: MessageReader<AssetEvent<Mesh>>,
    mut cache: ResMut<MeshSurfaceCache>,
) {
    for event in events.read() {
        match event {
            AssetEvent::Modified { id } | AssetEvent::Removed { id } | AssetEvent::Unused { id } => {
                cache.forget(*id);
            }
            _ => {}
        }
    }
}

/// Rebuild the obstacle set from the live scene hierarchy.
///
/// Runs every frame: scene roots spawn their meshes asynchronously and objects
/// move, so only the per-asset triangles are kept between frames.
pub fn collect_scene_obstacles(
    mut obstacles: ResMut<ObstacleSet>,
    mut cache: ResMut<MeshSurfaceCache>,
    meshes: Option<Res<Assets<Mesh>>>,
    roots: Query<(Entity, &SceneObstacle)>,
    children_query: Query<&'static Children>,
    placed_meshes: Query<(&'static Mesh3d, &'static GlobalTransform)>,
) {
    obstacles.clear();
    let Some(meshes) = meshes else {
        return;
    };

    let mut scene = SceneMeshes {
        cache: &mut cache,
        meshes: &meshes,
        children_query: &children_query,
        placed_meshes: &placed_meshes,
    };
    for (entity, marker) in &roots {
        obstacles.insert(Obstacle {
            id: ObstacleId::from(entity),
            category: marker.category,
            root: scene.node(entity),
        });
    }
}

struct SceneMeshes<'a, 'w, 's> {
    cache: &'a mut MeshSurfaceCache,
    meshes: &'a Assets<Mesh>,
    children_query: &'a Query<'w, 's, &'static Children>,
    placed_meshes: &'a Query<'w, 's, (&'static Mesh3d, &'static GlobalTransform)>,
}

impl SceneMeshes<'_, '_, '_> {
    fn node(&mut self, entity: Entity) -> ObstacleNode {
        let surface = self
            .placed_meshes
            .get(entity)
            .ok()
            .and_then(|(mesh, transform)| {
                let surface = self.cache.surface(mesh.id(), self.meshes)?;
                Some(PlacedSurface::new(surface, transform.affine()))
            });

        let child_entities: Vec<Entity> = self
            .children_query
            .get(entity)
            .map(|children| children.iter().collect())
            .unwrap_or_default();

        ObstacleNode {
            surface,
            children: child_entities
                .into_iter()
                .map(|child| self.node(child))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_runtime::obstacles::{ObstacleQuery, RayFilter};
    use bevy::asset::AssetPlugin;
    use bevy::math::{Dir3, Ray3d};

    fn sync_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Mesh>()
            .init_resource::<ObstacleSet>()
            .init_resource::<MeshSurfaceCache>()
            .add_systems(
                Update,
                (forget_changed_mesh_surfaces, collect_scene_obstacles).chain(),
            );
        app
    }

    fn add_mesh(app: &mut App, mesh: impl Into<Mesh>) -> Handle<Mesh> {
        app.world_mut().resource_mut::<Assets<Mesh>>().add(mesh.into())
    }

    #[test]
    fn extracts_indexed_cuboid_triangles() {
        let surface = mesh_surface(&Mesh::from(Cuboid::new(2.0, 4.0, 2.0))).unwrap();
        assert_eq!(surface.triangle_count(), 12);
        assert_eq!(surface.local_bounds().height(), 4.0);
    }

    #[test]
    fn line_meshes_have_no_surface() {
        let lines = Mesh::new(PrimitiveTopology::LineList, Default::default())
            .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, vec![[0.0_f32; 3], [1.0; 3]]);
        assert!(mesh_surface(&lines).is_none());
    }

    #[test]
    fn collects_nested_meshes_under_tagged_roots() {
        let mut app = sync_app();
        let trunk = add_mesh(&mut app, Cuboid::new(1.0, 6.0, 1.0));

        let mesh = app
            .world_mut()
            .spawn((
                Mesh3d(trunk.clone()),
                GlobalTransform::from(Transform::from_xyz(3.0, 3.0, 0.0)),
            ))
            .id();
        let root = app.world_mut().spawn(SceneObstacle::prop()).id();
        app.world_mut().entity_mut(root).add_child(mesh);
        // Untagged meshes are not part of the set.
        app.world_mut().spawn((
            Mesh3d(trunk),
            GlobalTransform::from(Transform::from_xyz(1.0, 0.0, 0.0)),
        ));

        app.update();

        let set = app.world().resource::<ObstacleSet>();
        assert_eq!(set.len(), 1);
        let hit = set
            .nearest_hit(Ray3d::new(Vec3::new(0.0, 1.0, 0.0), Dir3::X), &RayFilter::default())
            .unwrap();
        assert_eq!(hit.obstacle, ObstacleId::from(root));
        assert!((hit.distance - 2.5).abs() < 1e-4);
        assert!((hit.part_height - 6.0).abs() < 1e-4);
    }

    #[test]
    fn scaled_slope_mesh_is_hit_on_its_surface() {
        let mut app = sync_app();
        // Unit ramp from y = 0 at x = -0.5 to y = 0.15 at x = 0.5, scaled by 10.
        let ramp = Mesh::new(PrimitiveTopology::TriangleList, Default::default())
            .with_inserted_attribute(
                Mesh::ATTRIBUTE_POSITION,
                vec![
                    [-0.5_f32, 0.0, -0.5],
                    [0.5, 0.15, -0.5],
                    [0.5, 0.15, 0.5],
                    [-0.5, 0.0, 0.5],
                ],
            )
            .with_inserted_indices(Indices::U32(vec![0, 1, 2, 0, 2, 3]));
        let ramp = add_mesh(&mut app, ramp);
        app.world_mut().spawn((
            SceneObstacle::terrain(),
            Mesh3d(ramp),
            GlobalTransform::from(Transform::from_scale(Vec3::splat(10.0))),
        ));

        app.update();

        let set = app.world().resource::<ObstacleSet>();
        let hit = set
            .nearest_hit(Ray3d::new(Vec3::new(-4.0, 2.0, 0.0), Dir3::NEG_Y), &RayFilter::default())
            .unwrap();
        assert!((hit.point.y - 0.15).abs() < 1e-4);
    }

    #[test]
    fn modified_mesh_is_re_read() {
        let mut app = sync_app();
        let handle = add_mesh(&mut app, Cuboid::new(1.0, 1.0, 1.0));
        app.world_mut()
            .spawn((SceneObstacle::prop(), Mesh3d(handle.clone()), GlobalTransform::IDENTITY));
        app.update();
        assert_eq!(app.world().resource::<MeshSurfaceCache>().len(), 1);

        if let Some(mut mesh) = app.world_mut().resource_mut::<Assets<Mesh>>().get_mut(&handle) {
            *mesh = Mesh::from(Cuboid::new(1.0, 8.0, 1.0));
        }
        app.update();
        app.update();

        let set = app.world().resource::<ObstacleSet>();
        let bounds = set.iter().next().and_then(|o| o.root.subtree_bounds()).unwrap();
        assert!((bounds.height() - 8.0).abs() < 1e-4);
    }
}
