use bevy::prelude::*;

use crate::{
    components::{Disabled, Pilot},
    physics::{CollisionLayers, RayCast, SpatialIndex, SpatialQuery},
    simulation_config::SimulationConfig,
};

/// Reading reported when a ray hits nothing.
pub const NO_CONTACT: f32 = -1.0;

/// Sensor rays in the order agents receive them.
pub const SENSOR_DIRECTIONS: [SensorDirection; 5] = [
    SensorDirection::Forward,
    SensorDirection::Right,
    SensorDirection::Left,
    SensorDirection::ForwardRight,
    SensorDirection::ForwardLeft,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorDirection {
    Forward,
    Right,
    Left,
    ForwardRight,
    ForwardLeft,
}

impl SensorDirection {
    /// Unit direction in the ship's local frame. +Z is forward, +X is left.
    pub fn local(self) -> Vec3 {
        match self {
            SensorDirection::Forward => Vec3::Z,
            SensorDirection::Right => Vec3::NEG_X,
            SensorDirection::Left => Vec3::X,
            SensorDirection::ForwardRight => Vec3::new(-1.0, 0.0, 1.0).normalize(),
            SensorDirection::ForwardLeft => Vec3::new(1.0, 0.0, 1.0).normalize(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// `hit distance / ray length` in `(0, 1]`, or [`NO_CONTACT`].
    pub distance: f32,
    pub valid: bool,
}

impl SensorReading {
    pub const EMPTY: Self = Self {
        distance: NO_CONTACT,
        valid: false,
    };

    pub fn hit(distance: f32) -> Self {
        Self {
            distance,
            valid: true,
        }
    }
}

impl Default for SensorReading {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Latest sensor sweep for a pilot, consumed at the next decision point.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Observations {
    pub readings: [SensorReading; 5],
}

impl Observations {
    pub fn reading(&self, direction: SensorDirection) -> SensorReading {
        let index = SENSOR_DIRECTIONS
            .iter()
            .position(|candidate| *candidate == direction)
            .unwrap_or(0);
        self.readings[index]
    }

    /// Flat learner input: `(distance, 1)` per valid ray, `(1, 0)` per empty one.
    pub fn encode(&self) -> [f32; 10] {
        let mut encoded = [0.0; 10];
        for (slot, reading) in encoded.chunks_exact_mut(2).zip(&self.readings) {
            if reading.valid {
                slot[0] = reading.distance;
                slot[1] = 1.0;
            } else {
                slot[0] = 1.0;
                slot[1] = 0.0;
            }
        }
        encoded
    }
}

/// Casts the five sensor rays from `origin` with orientation `rotation`.
pub fn sense(
    spatial: &impl SpatialQuery,
    caster: Entity,
    origin: Vec3,
    rotation: Quat,
    ray_length: f32,
) -> Observations {
    let mut observations = Observations::default();
    for (reading, direction) in observations.readings.iter_mut().zip(SENSOR_DIRECTIONS) {
        let target = origin + rotation * direction.local() * ray_length;
        let hit = spatial.cast_ray(&RayCast {
            origin,
            target,
            filter: CollisionLayers::sensor_mask(),
            ignore: Some(caster),
        });
        *reading = match hit {
            Some(hit) => SensorReading::hit(hit.position.distance(origin) / ray_length),
            None => SensorReading::EMPTY,
        };
    }
    observations
}

pub fn raycast_observations(
    config: Res<SimulationConfig>,
    spatial: Res<SpatialIndex>,
    mut pilots: Query<(Entity, &Transform, &mut Observations), (With<Pilot>, Without<Disabled>)>,
) {
    let ray_length = config.sensors.ray_length;
    let spatial = &*spatial;
    pilots
        .par_iter_mut()
        .for_each(|(entity, transform, mut observations)| {
            *observations = sense(
                spatial,
                entity,
                transform.translation,
                transform.rotation,
                ray_length,
            );
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::RayHit;
    use std::cell::RefCell;

    struct FixedHits {
        forward_hit_at: Option<f32>,
        casts: RefCell<Vec<RayCast>>,
    }

    impl SpatialQuery for FixedHits {
        fn cast_ray(&self, ray: &RayCast) -> Option<RayHit> {
            self.casts.borrow_mut().push(*ray);
            let direction = (ray.target - ray.origin).normalize();
            let is_forward = direction.dot(Vec3::Z) > 0.999;
            match (is_forward, self.forward_hit_at) {
                (true, Some(distance)) => Some(RayHit {
                    entity: Entity::PLACEHOLDER,
                    position: ray.origin + direction * distance,
                }),
                _ => None,
            }
        }
    }

    #[test]
    fn readings_are_normalised_and_masked() {
        let spatial = FixedHits {
            forward_hit_at: Some(25.0),
            casts: RefCell::default(),
        };
        let caster = Entity::from_raw(7);
        let observations = sense(&spatial, caster, Vec3::ZERO, Quat::IDENTITY, 100.0);

        let forward = observations.reading(SensorDirection::Forward);
        assert!(forward.valid);
        assert!((forward.distance - 0.25).abs() < 1e-5);
        assert_eq!(observations.reading(SensorDirection::Left), SensorReading::EMPTY);

        let casts = spatial.casts.borrow();
        assert_eq!(casts.len(), 5);
        for ray in casts.iter() {
            assert_eq!(ray.ignore, Some(caster));
            assert!((ray.target.distance(ray.origin) - 100.0).abs() < 1e-3);
        }
    }

    #[test]
    fn rays_follow_ship_orientation() {
        let spatial = FixedHits {
            forward_hit_at: Some(50.0),
            casts: RefCell::default(),
        };
        // Yawed a quarter turn: the ship's left ray now points along world +Z.
        let rotation = Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2);
        let observations = sense(&spatial, Entity::from_raw(1), Vec3::ZERO, rotation, 100.0);
        assert!(observations.reading(SensorDirection::Left).valid);
        assert!(!observations.reading(SensorDirection::Forward).valid);
    }

    #[test]
    fn encoding_separates_empty_from_short() {
        let mut observations = Observations::default();
        observations.readings[0] = SensorReading::hit(0.05);
        let encoded = observations.encode();
        assert_eq!(&encoded[0..2], &[0.05, 1.0]);
        assert_eq!(&encoded[2..4], &[1.0, 0.0]);
    }
}
