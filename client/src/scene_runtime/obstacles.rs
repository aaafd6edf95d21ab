use bevy::math::{Affine3A, Ray3d, Vec3};
use bevy::prelude::{Entity, Resource};
use std::sync::Arc;

/// Axis-aligned world-space bounds of a scene part.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Smallest bounds enclosing every point, `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (min, max) = (self.min, self.max);
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            )
        })
    }

    /// Bounds of these bounds after an affine transform.
    pub fn transformed(&self, affine: &Affine3A) -> Bounds {
        let [first, rest @ ..] = self.corners().map(|c| affine.transform_point3(c));
        rest.into_iter()
            .fold(Bounds::new(first, first), |acc, p| Bounds {
                min: acc.min.min(p),
                max: acc.max.max(p),
            })
    }

    /// Distances along `ray` where it enters and leaves the box. A ray that
    /// starts inside enters at 0.
    pub fn ray_span(&self, ray: &Ray3d) -> Option<(f32, f32)> {
        const EPSILON: f32 = 1e-8;

        let dir = *ray.direction;
        let inv = |d: f32| {
            if d.abs() < EPSILON {
                1.0 / EPSILON.copysign(d)
            } else {
                1.0 / d
            }
        };
        let inv_dir = Vec3::new(inv(dir.x), inv(dir.y), inv(dir.z));

        let t_min = (self.min - ray.origin) * inv_dir;
        let t_max = (self.max - ray.origin) * inv_dir;

        let t_near = t_min.min(t_max).max_element();
        let t_far = t_min.max(t_max).min_element();

        if t_near > t_far || t_far < 0.0 {
            return None;
        }
        Some((t_near.max(0.0), t_far))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    /// Ray parameter of the hit, Möller-Trumbore. Both faces count.
    ///
    /// `dir` need not be unit length; the result is in multiples of it.
    pub fn ray_parameter(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        const EPSILON: f32 = 1e-7;

        let edge1 = self.b - self.a;
        let edge2 = self.c - self.a;
        let h = dir.cross(edge2);
        let det = edge1.dot(h);
        if det.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / det;
        let s = origin - self.a;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * dir.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        (t >= 0.0).then_some(t)
    }
}

/// Triangles of one mesh asset in its local space. Cheap to clone.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshSurface {
    triangles: Arc<[Triangle]>,
    local_bounds: Bounds,
}

impl MeshSurface {
    /// `None` when there are no triangles.
    pub fn from_triangles(triangles: Vec<Triangle>) -> Option<Self> {
        let local_bounds =
            Bounds::from_points(triangles.iter().flat_map(|t| [t.a, t.b, t.c]))?;
        Some(Self {
            triangles: triangles.into(),
            local_bounds,
        })
    }

    /// Closed box, two triangles per face.
    pub fn cuboid(bounds: Bounds) -> Self {
        const FACES: [[usize; 4]; 6] = [
            [0, 2, 6, 4],
            [1, 3, 7, 5],
            [0, 1, 5, 4],
            [2, 3, 7, 6],
            [0, 1, 3, 2],
            [4, 5, 7, 6],
        ];
        let corners = bounds.corners();
        let triangles: Vec<Triangle> = FACES
            .iter()
            .flat_map(|[a, b, c, d]| {
                [
                    Triangle::new(corners[*a], corners[*b], corners[*c]),
                    Triangle::new(corners[*a], corners[*c], corners[*d]),
                ]
            })
            .collect();
        Self {
            triangles: triangles.into(),
            local_bounds: bounds,
        }
    }

    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.triangles.iter().copied()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn local_bounds(&self) -> Bounds {
        self.local_bounds
    }
}

/// A mesh surface placed in the world.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedSurface {
    surface: MeshSurface,
    to_world: Affine3A,
    bounds: Bounds,
}

impl PlacedSurface {
    pub fn new(surface: MeshSurface, to_world: Affine3A) -> Self {
        let bounds = surface.local_bounds.transformed(&to_world);
        Self {
            surface,
            to_world,
            bounds,
        }
    }

    /// World-space bounds.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Distance to the nearest triangle along `ray`, up to `max_distance`.
    ///
    /// The bounds reject rays first; triangles are tested in local space,
    /// where the mapped ray keeps the world ray's parameter.
    pub fn ray_distance(&self, ray: &Ray3d, max_distance: f32) -> Option<f32> {
        let (entry, _) = self.bounds.ray_span(ray)?;
        if entry > max_distance {
            return None;
        }

        let to_local = self.to_world.inverse();
        let origin = to_local.transform_point3(ray.origin);
        let dir = to_local.transform_vector3(*ray.direction);
        self.surface
            .triangles
            .iter()
            .filter_map(|triangle| triangle.ray_parameter(origin, dir))
            .filter(|t| *t <= max_distance)
            .min_by(f32::total_cmp)
    }
}

/// Stable identifier of a top-level obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObstacleId(pub u64);

impl From<Entity> for ObstacleId {
    fn from(entity: Entity) -> Self {
        Self(entity.to_bits())
    }
}

/// What kind of world object an obstacle is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObstacleCategory {
    /// Trees, rocks, creatures and the avatar itself.
    Prop,
    /// Walkable ground.
    Terrain,
    /// Light gizmos and other editor-only helpers. Never hit by rays.
    Helper,
}

impl ObstacleCategory {
    pub fn is_collidable(self) -> bool {
        !matches!(self, Self::Helper)
    }
}

/// One node of an obstacle's part tree. Group nodes carry no surface of
/// their own; mesh nodes do.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObstacleNode {
    pub surface: Option<PlacedSurface>,
    pub children: Vec<ObstacleNode>,
}

impl ObstacleNode {
    pub fn mesh(surface: PlacedSurface) -> Self {
        Self {
            surface: Some(surface),
            children: Vec::new(),
        }
    }

    /// Solid box already in world space.
    pub fn cuboid(bounds: Bounds) -> Self {
        Self::mesh(PlacedSurface::new(
            MeshSurface::cuboid(bounds),
            Affine3A::IDENTITY,
        ))
    }

    pub fn group(children: Vec<ObstacleNode>) -> Self {
        Self {
            surface: None,
            children,
        }
    }

    /// Bounds of this node and all of its descendants.
    pub fn subtree_bounds(&self) -> Option<Bounds> {
        let own = self.surface.as_ref().map(PlacedSurface::bounds);
        self.children
            .iter()
            .filter_map(ObstacleNode::subtree_bounds)
            .fold(own, |acc, child| match acc {
                Some(acc) => Some(acc.union(&child)),
                None => Some(child),
            })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub category: ObstacleCategory,
    pub root: ObstacleNode,
}

/// A single ray intersection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    pub point: Vec3,
    pub obstacle: ObstacleId,
    /// Bounding height of the part that was hit, including its descendants.
    pub part_height: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RayFilter {
    pub exclude: Option<ObstacleId>,
    pub max_distance: Option<f32>,
}

impl RayFilter {
    pub fn excluding(id: Option<ObstacleId>) -> Self {
        Self {
            exclude: id,
            max_distance: None,
        }
    }

    /// Ignore hits farther than `distance`.
    pub fn within(self, distance: f32) -> Self {
        Self {
            max_distance: Some(distance),
            ..self
        }
    }

    fn reach(&self) -> f32 {
        self.max_distance.unwrap_or(f32::INFINITY)
    }
}

/// Ray intersection queries against the static world geometry.
pub trait ObstacleQuery {
    /// All hits along `ray`, nearest first.
    fn cast_ray(&self, ray: Ray3d, filter: &RayFilter) -> Vec<RayHit>;

    fn nearest_hit(&self, ray: Ray3d, filter: &RayFilter) -> Option<RayHit> {
        self.cast_ray(ray, filter).into_iter().next()
    }
}

/// Flat list of the world's top-level obstacles, rebuilt every frame.
#[derive(Resource, Clone, Debug, Default)]
pub struct ObstacleSet {
    obstacles: Vec<Obstacle>,
}

impl ObstacleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an obstacle, replacing any previous one with the same id.
    pub fn insert(&mut self, obstacle: Obstacle) {
        self.remove(obstacle.id);
        self.obstacles.push(obstacle);
    }

    pub fn remove(&mut self, id: ObstacleId) -> Option<Obstacle> {
        let index = self.obstacles.iter().position(|o| o.id == id)?;
        Some(self.obstacles.swap_remove(index))
    }

    pub fn clear(&mut self) {
        self.obstacles.clear();
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter()
    }
}

impl ObstacleQuery for ObstacleSet {
    fn cast_ray(&self, ray: Ray3d, filter: &RayFilter) -> Vec<RayHit> {
        let mut hits = Vec::new();
        for obstacle in &self.obstacles {
            if !obstacle.category.is_collidable() || filter.exclude == Some(obstacle.id) {
                continue;
            }
            collect_node_hits(&obstacle.root, obstacle.id, &ray, filter.reach(), &mut hits);
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

fn collect_node_hits(
    node: &ObstacleNode,
    id: ObstacleId,
    ray: &Ray3d,
    reach: f32,
    out: &mut Vec<RayHit>,
) {
    if let Some(surface) = &node.surface {
        if let Some(distance) = surface.ray_distance(ray, reach) {
            let part_height = node
                .subtree_bounds()
                .map_or_else(|| surface.bounds().height(), |b| b.height());
            out.push(RayHit {
                distance,
                point: ray.get_point(distance),
                obstacle: id,
                part_height,
            });
        }
    }

    for child in &node.children {
        collect_node_hits(child, id, ray, reach, out);
    }
}
