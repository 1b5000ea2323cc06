//! Spatial collaborator boundary.
//!
//! The combat core consumes two things from physics: a ray-cast service and
//! the per-tick stream of colliding entity pairs. Both are exposed here
//! behind [`SpatialQuery`] and [`CollisionEvents`]. The default backend is a
//! brute-force sphere index rebuilt from [`Collider`] components every tick;
//! a host with a real physics engine can fill the same resources instead.

use bevy::prelude::*;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CollisionLayers: u32 {
        const WALL = 1 << 0;
        const OBSTACLE = 1 << 1;
        const PLAYER = 1 << 2;
        const ENEMY = 1 << 3;
        const RAYCAST = 1 << 4;
        const PROJECTILE = 1 << 5;
    }
}

impl CollisionLayers {
    /// What observation rays are allowed to hit.
    pub fn sensor_mask() -> Self {
        Self::ENEMY | Self::OBSTACLE | Self::WALL | Self::PLAYER
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub radius: f32,
    pub layer: CollisionLayers,
}

impl Collider {
    pub fn new(radius: f32, layer: CollisionLayers) -> Self {
        Self { radius, layer }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCast {
    pub origin: Vec3,
    pub target: Vec3,
    pub filter: CollisionLayers,
    /// Entity the ray must not report, usually the caster.
    pub ignore: Option<Entity>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: Entity,
    pub position: Vec3,
}

pub trait SpatialQuery {
    /// Closest hit on the segment `origin..target`, if any.
    fn cast_ray(&self, ray: &RayCast) -> Option<RayHit>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SphereEntry {
    entity: Entity,
    center: Vec3,
    radius: f32,
    layer: CollisionLayers,
}

/// Read-only snapshot of every collider, taken once per refresh.
#[derive(Resource, Debug, Clone, Default)]
pub struct SpatialIndex {
    entries: Vec<SphereEntry>,
}

impl SpatialIndex {
    pub fn from_colliders<'a>(
        colliders: impl IntoIterator<Item = (Entity, Vec3, &'a Collider)>,
    ) -> Self {
        let mut entries: Vec<SphereEntry> = colliders
            .into_iter()
            .map(|(entity, center, collider)| SphereEntry {
                entity,
                center,
                radius: collider.radius,
                layer: collider.layer,
            })
            .collect();
        entries.sort_unstable_by_key(|entry| entry.entity);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every overlapping pair, ordered by entity. Scenery never collides with scenery.
    pub fn contacts(&self) -> Vec<(Entity, Entity)> {
        let static_layers = CollisionLayers::OBSTACLE | CollisionLayers::WALL;
        let mut pairs = Vec::new();
        for (index, a) in self.entries.iter().enumerate() {
            for b in self.entries.iter().skip(index + 1) {
                if static_layers.intersects(a.layer) && static_layers.intersects(b.layer) {
                    continue;
                }
                let reach = a.radius + b.radius;
                if a.center.distance_squared(b.center) <= reach * reach {
                    pairs.push((a.entity, b.entity));
                }
            }
        }
        pairs
    }
}

impl SpatialQuery for SpatialIndex {
    fn cast_ray(&self, ray: &RayCast) -> Option<RayHit> {
        let segment = ray.target - ray.origin;
        let length = segment.length();
        if length <= f32::EPSILON {
            return None;
        }
        let direction = segment / length;

        let mut best: Option<(f32, Entity)> = None;
        for entry in &self.entries {
            if Some(entry.entity) == ray.ignore || !ray.filter.intersects(entry.layer) {
                continue;
            }
            let Some(distance) = ray_sphere_entry(ray.origin, direction, entry.center, entry.radius)
            else {
                continue;
            };
            if distance > length {
                continue;
            }
            if best.map_or(true, |(closest, _)| distance < closest) {
                best = Some((distance, entry.entity));
            }
        }

        best.map(|(distance, entity)| RayHit {
            entity,
            position: ray.origin + direction * distance,
        })
    }
}

/// Distance along a unit ray to the first sphere surface.
///
/// Spheres containing the origin are not hit, so a ship inside scenery still
/// senses what lies beyond it.
fn ray_sphere_entry(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let offset = origin - center;
    let c = offset.length_squared() - radius * radius;
    if c <= 0.0 {
        return None;
    }
    let b = offset.dot(direction);
    if b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    Some(-b - discriminant.sqrt())
}

/// Entity pairs in contact this tick, in the order physics reported them.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct CollisionEvents {
    pub pairs: Vec<(Entity, Entity)>,
}

pub fn refresh_spatial_index(
    mut index: ResMut<SpatialIndex>,
    colliders: Query<(Entity, &Transform, &Collider)>,
) {
    *index = SpatialIndex::from_colliders(
        colliders
            .iter()
            .map(|(entity, transform, collider)| (entity, transform.translation, collider)),
    );
}

pub fn detect_contacts(index: Res<SpatialIndex>, mut events: ResMut<CollisionEvents>) {
    events.pairs = index.contacts();
    if !events.pairs.is_empty() {
        log::debug!("physics: {} contact pairs", events.pairs.len());
    }
}
