use bevy::{ecs::system::ParallelCommands, prelude::*};

use crate::{
    components::{
        alignment, forward, ControlledPlayer, Disabled, NeedsToFire, RewardSignal, ShootingTimer,
        TargetAssignment, TriggerLatch,
    },
    resources::{PlayerInput, SimulationClock},
    simulation_config::{CombatConfig, SimulationConfig},
};

/// What one pilot does with its target this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Engagement {
    /// Target gone or outside the envelope: drop it and search again next tick.
    Disengage,
    /// Inside the envelope: shaping reward, and optionally a shot.
    Engage { reward: f32, fire: bool },
}

/// Range and aim gates applied to an engagement.
///
/// `cooldown_elapsed` is the time since the last shot, already including this tick.
pub fn evaluate_engagement(
    config: &CombatConfig,
    position: Vec3,
    heading: Vec3,
    target: Vec3,
    cooldown_elapsed: f32,
) -> Engagement {
    let aim = alignment(position, heading, target);
    if position.distance(target) < config.engage_range && aim > config.reward_min_alignment {
        let fire = aim > config.fire_min_alignment && cooldown_elapsed > config.fire_cooldown;
        Engagement::Engage {
            reward: aim * config.reward_scale,
            fire,
        }
    } else {
        Engagement::Disengage
    }
}

/// Advances shooting timers, posts shaping rewards and raises fire requests.
pub fn combat_timing(
    config: Res<SimulationConfig>,
    clock: Res<SimulationClock>,
    par_commands: ParallelCommands,
    live_targets: Query<&Transform, Without<Disabled>>,
    mut engaged: Query<
        (
            Entity,
            &Transform,
            &TargetAssignment,
            &mut ShootingTimer,
            &mut RewardSignal,
        ),
        Without<Disabled>,
    >,
) {
    let combat = &config.combat;
    let delta = clock.delta;
    let live_targets = &live_targets;

    engaged.par_iter_mut().for_each(
        |(entity, transform, assignment, mut timer, mut reward)| {
            timer.elapsed += delta;
            let engagement = match live_targets.get(assignment.target) {
                Ok(target) => evaluate_engagement(
                    combat,
                    transform.translation,
                    forward(transform.rotation),
                    target.translation,
                    timer.elapsed,
                ),
                Err(_) => Engagement::Disengage,
            };

            match engagement {
                Engagement::Engage { reward: value, fire } => {
                    reward.post(value);
                    if fire {
                        timer.elapsed = 0.0;
                        par_commands.command_scope(|mut commands| {
                            commands.entity(entity).try_insert(NeedsToFire);
                        });
                    }
                }
                Engagement::Disengage => {
                    par_commands.command_scope(|mut commands| {
                        commands.entity(entity).remove::<TargetAssignment>();
                    });
                }
            }
        },
    );
}

/// Fires the player's guns on a fresh trigger press once the cooldown has passed.
pub fn player_trigger(
    mut commands: Commands,
    config: Res<SimulationConfig>,
    clock: Res<SimulationClock>,
    input: Res<PlayerInput>,
    mut players: Query<(Entity, &mut TriggerLatch), (With<ControlledPlayer>, Without<Disabled>)>,
) {
    for (entity, mut latch) in players.iter_mut() {
        let pressed = input.trigger && !latch.held;
        latch.held = input.trigger;
        if !pressed {
            continue;
        }
        let cooled = latch
            .last_fired_at
            .map_or(true, |last| clock.elapsed - last > f64::from(config.combat.fire_cooldown));
        if cooled {
            latch.last_fired_at = Some(clock.elapsed);
            commands.entity(entity).insert(NeedsToFire);
        }
    }
}
