//! Collision outcome resolution.
//!
//! Contact pairs are classified in parallel against a role snapshot taken at
//! the start of the step. Each worker appends intents to its own buffer; the
//! buffers are merged and replayed on one thread so an entity appearing in
//! several pairs is resolved exactly once:
//!
//! 1. destroy and disable intents are applied first,
//! 2. projectile hits are then accumulated per ship; a hit on a ship already
//!    disabled this tick is dropped, and the hit that would reach
//!    `hits_to_kill` disables the ship instead of incrementing its counter.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use bevy::prelude::*;
use rayon::prelude::*;

use crate::{
    components::{Disabled, HitCounter, Obstacle, PlayerOwned, Projectile},
    physics::CollisionEvents,
};

const CLASSIFY_CHUNK: usize = 64;

/// What an entity is, as far as collision outcomes are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionRole {
    Obstacle,
    Ship,
    Projectile { player_owned: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionIntent {
    Destroy(Entity),
    Disable(Entity),
    Hit { ship: Entity, player_owned: bool },
}

/// Outcome for a single contact pair, in rule precedence order.
pub fn classify_pair(
    roles: &HashMap<Entity, CollisionRole>,
    a: Entity,
    b: Entity,
) -> Vec<CollisionIntent> {
    let role_a = roles.get(&a).copied();
    let role_b = roles.get(&b).copied();

    match (role_a, role_b) {
        (Some(CollisionRole::Obstacle), Some(CollisionRole::Ship)) => {
            vec![CollisionIntent::Disable(b)]
        }
        (Some(CollisionRole::Ship), Some(CollisionRole::Obstacle)) => {
            vec![CollisionIntent::Disable(a)]
        }
        (Some(CollisionRole::Obstacle), Some(CollisionRole::Projectile { .. })) => {
            vec![CollisionIntent::Destroy(b)]
        }
        (Some(CollisionRole::Projectile { .. }), Some(CollisionRole::Obstacle)) => {
            vec![CollisionIntent::Destroy(a)]
        }
        (Some(CollisionRole::Ship), Some(CollisionRole::Ship)) => {
            vec![CollisionIntent::Disable(a), CollisionIntent::Disable(b)]
        }
        (Some(CollisionRole::Projectile { player_owned }), Some(CollisionRole::Ship)) => vec![
            CollisionIntent::Destroy(a),
            CollisionIntent::Hit {
                ship: b,
                player_owned,
            },
        ],
        (Some(CollisionRole::Ship), Some(CollisionRole::Projectile { player_owned })) => vec![
            CollisionIntent::Destroy(b),
            CollisionIntent::Hit {
                ship: a,
                player_owned,
            },
        ],
        (Some(CollisionRole::Projectile { .. }), Some(CollisionRole::Projectile { .. })) => {
            vec![CollisionIntent::Destroy(a), CollisionIntent::Destroy(b)]
        }
        _ => Vec::new(),
    }
}

/// Classifies every pair on the compute pool, one intent buffer per chunk.
pub fn classify_pairs(
    roles: &HashMap<Entity, CollisionRole>,
    pairs: &[(Entity, Entity)],
) -> Vec<CollisionIntent> {
    let buffers: Vec<Vec<CollisionIntent>> = pairs
        .par_chunks(CLASSIFY_CHUNK)
        .map(|chunk| {
            chunk
                .iter()
                .flat_map(|&(a, b)| classify_pair(roles, a, b))
                .collect()
        })
        .collect();
    buffers.into_iter().flatten().collect()
}

/// Net effect of one tick of collisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionResolution {
    pub destroyed: BTreeSet<Entity>,
    /// Ships to disable, with player credit.
    pub disabled: BTreeMap<Entity, bool>,
    /// New counter values for ships that were hit but survived.
    pub counters: BTreeMap<Entity, HitCounter>,
}

pub fn replay_intents(
    intents: &[CollisionIntent],
    counters: &HashMap<Entity, HitCounter>,
) -> CollisionResolution {
    let mut resolution = CollisionResolution::default();

    for intent in intents {
        match *intent {
            CollisionIntent::Destroy(entity) => {
                resolution.destroyed.insert(entity);
            }
            CollisionIntent::Disable(ship) => {
                resolution.disabled.insert(ship, false);
            }
            CollisionIntent::Hit { .. } => {}
        }
    }

    for intent in intents {
        let CollisionIntent::Hit { ship, player_owned } = *intent else {
            continue;
        };
        if resolution.disabled.contains_key(&ship) {
            continue;
        }
        let Some(current) = resolution
            .counters
            .get(&ship)
            .or_else(|| counters.get(&ship))
            .copied()
        else {
            continue;
        };
        if current.hits_taken + 1 >= current.hits_to_kill {
            resolution.counters.remove(&ship);
            resolution.disabled.insert(ship, player_owned);
        } else {
            resolution.counters.insert(
                ship,
                HitCounter {
                    hits_taken: current.hits_taken + 1,
                    ..current
                },
            );
        }
    }

    resolution
}

pub fn resolve_collisions(
    mut commands: Commands,
    events: Res<CollisionEvents>,
    obstacles: Query<Entity, With<Obstacle>>,
    ships: Query<(Entity, &HitCounter), Without<Disabled>>,
    projectiles: Query<(Entity, Has<PlayerOwned>), With<Projectile>>,
) {
    if events.pairs.is_empty() {
        return;
    }

    let mut roles: HashMap<Entity, CollisionRole> = HashMap::new();
    let mut counters: HashMap<Entity, HitCounter> = HashMap::new();
    roles.extend(obstacles.iter().map(|e| (e, CollisionRole::Obstacle)));
    for (entity, counter) in ships.iter() {
        roles.insert(entity, CollisionRole::Ship);
        counters.insert(entity, *counter);
    }
    roles.extend(
        projectiles
            .iter()
            .map(|(e, player_owned)| (e, CollisionRole::Projectile { player_owned })),
    );

    let intents = classify_pairs(&roles, &events.pairs);
    let resolution = replay_intents(&intents, &counters);

    for entity in &resolution.destroyed {
        commands.entity(*entity).despawn();
    }
    for (ship, killed_by_player) in &resolution.disabled {
        commands.entity(*ship).try_insert(Disabled {
            killed_by_player: *killed_by_player,
        });
    }
    for (ship, counter) in &resolution.counters {
        commands.entity(*ship).try_insert(*counter);
    }

    tracing::debug!(
        target: "dogfight::collision",
        pairs = events.pairs.len(),
        destroyed = resolution.destroyed.len(),
        disabled = resolution.disabled.len(),
        hits = resolution.counters.len(),
        "collision.replay"
    );
}
