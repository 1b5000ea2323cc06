use bevy::prelude::*;
use bevy_ecs::system::RunSystemOnce;
use dogfight_sim::collision::resolve_collisions;
use dogfight_sim::{CollisionEvents, Disabled, HitCounter, Obstacle, PlayerOwned, Projectile};

fn shot(world: &mut World, player_owned: bool) -> Entity {
    let projectile = Projectile {
        origin: Entity::PLACEHOLDER,
        heading: Vec3::Z,
    };
    if player_owned {
        world.spawn((projectile, PlayerOwned)).id()
    } else {
        world.spawn(projectile).id()
    }
}

fn resolve(world: &mut World, pairs: Vec<(Entity, Entity)>) {
    world.insert_resource(CollisionEvents { pairs });
    world.run_system_once(resolve_collisions);
}

#[test]
fn obstacle_outcome_survives_a_simultaneous_ship_collision() {
    let mut world = World::default();
    let obstacle = world.spawn(Obstacle { prefab: 1 }).id();
    let ship = world.spawn(HitCounter::new(3)).id();
    let other = world.spawn(HitCounter::new(3)).id();
    let bullet = shot(&mut world, true);

    resolve(
        &mut world,
        vec![(ship, other), (obstacle, ship), (bullet, ship)],
    );

    assert_eq!(
        world.get::<Disabled>(ship),
        Some(&Disabled {
            killed_by_player: false
        }),
        "scenery kills are never credited"
    );
    assert_eq!(world.get::<HitCounter>(ship).unwrap().hits_taken, 0);
    assert!(world.get::<Disabled>(other).is_some());
    assert!(world.get_entity(bullet).is_none());
    assert!(world.get_entity(obstacle).is_some());
}

#[test]
fn hit_counter_climbs_until_the_ship_is_disabled() {
    let mut world = World::default();
    let ship = world.spawn(HitCounter::new(3)).id();
    let mut observed = Vec::new();

    for _ in 0..3 {
        let bullet = shot(&mut world, true);
        resolve(&mut world, vec![(bullet, ship)]);
        let counter = *world.get::<HitCounter>(ship).unwrap();
        assert!(counter.hits_taken <= counter.hits_to_kill);
        observed.push(counter.hits_taken);
    }

    assert_eq!(observed, vec![1, 2, 2]);
    assert_eq!(
        world.get::<Disabled>(ship),
        Some(&Disabled {
            killed_by_player: true
        })
    );
}

#[test]
fn enemy_fire_disables_without_credit() {
    let mut world = World::default();
    let ship = world.spawn(HitCounter::new(1)).id();
    let bullet = shot(&mut world, false);

    resolve(&mut world, vec![(ship, bullet)]);

    assert_eq!(
        world.get::<Disabled>(ship),
        Some(&Disabled {
            killed_by_player: false
        })
    );
}

#[test]
fn unclassified_pairs_change_nothing() {
    let mut world = World::default();
    let first = world.spawn(Obstacle { prefab: 0 }).id();
    let second = world.spawn(Obstacle { prefab: 2 }).id();
    let stray = world.spawn_empty().id();

    resolve(&mut world, vec![(first, second), (first, stray)]);

    assert!(world.get_entity(first).is_some());
    assert!(world.get_entity(second).is_some());
    assert!(world.get_entity(stray).is_some());
}
