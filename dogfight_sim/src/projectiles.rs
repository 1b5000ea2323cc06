use bevy::prelude::*;

use crate::{
    components::{
        forward, ControlledPlayer, Disabled, NeedsToFire, PlayerOwned, Projectile, ShootingTimer,
    },
    physics::{Collider, CollisionLayers},
    resources::SimulationClock,
    simulation_config::{ProjectileConfig, SimulationConfig},
};

/// Muzzle positions in the firer's local frame.
pub fn muzzle_offsets(config: &ProjectileConfig, player: bool) -> Vec<Vec3> {
    let x = config.lateral_offset;
    let z = config.forward_offset;
    if player {
        let y = config.player_vertical_offset;
        vec![
            Vec3::new(x, y, z),
            Vec3::new(-x, y, z),
            Vec3::new(x, -y, z),
            Vec3::new(-x, -y, z),
        ]
    } else {
        vec![Vec3::new(x, 0.0, z), Vec3::new(-x, 0.0, z)]
    }
}

#[derive(Bundle)]
pub struct ProjectileBundle {
    pub projectile: Projectile,
    pub time_to_live: ShootingTimer,
    pub transform: Transform,
    pub collider: Collider,
}

impl ProjectileBundle {
    pub fn new(config: &ProjectileConfig, origin: Entity, firer: &Transform, offset: Vec3) -> Self {
        let pitch = Quat::from_rotation_x(config.pitch_offset_degrees.to_radians());
        Self {
            projectile: Projectile {
                origin,
                heading: forward(firer.rotation),
            },
            time_to_live: ShootingTimer::default(),
            transform: Transform::from_translation(firer.translation + firer.rotation * offset)
                .with_rotation(firer.rotation * pitch),
            collider: Collider::new(config.radius, CollisionLayers::PROJECTILE),
        }
    }
}

/// Consumes every fire request raised this tick.
///
/// Firers are handled in entity order so projectile ids do not depend on
/// how the previous step was scheduled.
pub fn spawn_projectiles(
    mut commands: Commands,
    config: Res<SimulationConfig>,
    firers: Query<(Entity, &Transform, Has<ControlledPlayer>, Has<Disabled>), With<NeedsToFire>>,
) {
    let mut requests: Vec<_> = firers.iter().collect();
    requests.sort_unstable_by_key(|(entity, ..)| *entity);

    let mut spawned = 0usize;
    for (entity, transform, is_player, disabled) in requests {
        commands.entity(entity).remove::<NeedsToFire>();
        if disabled {
            continue;
        }
        for offset in muzzle_offsets(&config.projectiles, is_player) {
            let bundle = ProjectileBundle::new(&config.projectiles, entity, transform, offset);
            if is_player {
                commands.spawn((bundle, PlayerOwned));
            } else {
                commands.spawn(bundle);
            }
            spawned += 1;
        }
    }

    if spawned > 0 {
        log::debug!("projectiles: spawned {spawned}");
    }
}

/// Flies projectiles straight along their spawn heading and expires them by age.
pub fn move_projectiles(
    mut commands: Commands,
    config: Res<SimulationConfig>,
    clock: Res<SimulationClock>,
    mut projectiles: Query<(Entity, &Projectile, &mut ShootingTimer, &mut Transform)>,
) {
    // Half a tick of slack so accumulated f32 age still expires on the lifetime's tick.
    let expires_at = config.projectiles.lifetime - 0.5 * clock.delta;
    let step = config.projectiles.speed * clock.delta;
    let mut expired = Vec::new();

    for (entity, projectile, mut time_to_live, mut transform) in projectiles.iter_mut() {
        time_to_live.elapsed += clock.delta;
        if time_to_live.elapsed >= expires_at {
            expired.push(entity);
            continue;
        }
        transform.translation += projectile.heading * step;
    }

    expired.sort_unstable();
    for entity in &expired {
        commands.entity(*entity).despawn();
    }
    if !expired.is_empty() {
        tracing::trace!(
            target: "dogfight::projectiles",
            expired = expired.len(),
            "projectiles.expired"
        );
    }
}
