//! Episode and outcome management.
//!
//! Elimination is never terminal for an entity: every disabled ship is
//! penalised or scored, then respawned somewhere random in the same step.
//! The episode ends for the agent that was flying it, and the scenario ends
//! the first time an outcome is decided for the controlled player.

use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::Rng;

use crate::{
    agent::{AgentHandle, AgentProvider},
    components::{
        Combatant, ControlledPlayer, Disabled, HitCounter, Obstacle, Outcome, Penalty,
        PenaltySignal, Pilot, PilotControls, RewardSignal, ShootingTimer, TargetAssignment,
        TriggerLatch, Velocity,
    },
    observations::Observations,
    physics::{Collider, CollisionLayers},
    resources::{SimulationClock, SimulationRng},
    scenario::{ScenarioRules, ScenarioStatus},
    simulation_config::SimulationConfig,
};

/// Marker for the presentation layer: an elimination happened here.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ExplosionEvent {
    pub entity: Entity,
    pub position: Vec3,
    pub killed_by_player: bool,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeEvent {
    pub entity: Entity,
    pub won: bool,
    pub tick: u64,
}

#[derive(Bundle)]
pub struct PlayerBundle {
    pub combatant: Combatant,
    pub player: ControlledPlayer,
    pub hits: HitCounter,
    pub trigger: TriggerLatch,
    pub velocity: Velocity,
    pub transform: Transform,
    pub collider: Collider,
}

impl PlayerBundle {
    pub fn new(config: &SimulationConfig, rules: &ScenarioRules, transform: Transform) -> Self {
        Self {
            combatant: Combatant,
            player: ControlledPlayer::new(rules.points_to_win),
            hits: HitCounter::new(rules.player_hits_to_kill),
            trigger: TriggerLatch::default(),
            velocity: Velocity::ZERO,
            transform,
            collider: Collider::new(config.spawning.ship_radius, CollisionLayers::PLAYER),
        }
    }
}

#[derive(Bundle)]
pub struct PilotBundle {
    pub combatant: Combatant,
    pub pilot: Pilot,
    pub agent: AgentHandle,
    pub observations: Observations,
    pub controls: PilotControls,
    pub reward: RewardSignal,
    pub penalty: PenaltySignal,
    pub shooting: ShootingTimer,
    pub hits: HitCounter,
    pub velocity: Velocity,
    pub transform: Transform,
    pub collider: Collider,
}

impl PilotBundle {
    pub fn new(
        config: &SimulationConfig,
        rules: &ScenarioRules,
        agent: AgentHandle,
        transform: Transform,
    ) -> Self {
        Self {
            combatant: Combatant,
            pilot: Pilot,
            agent,
            observations: Observations::default(),
            controls: PilotControls::default(),
            reward: RewardSignal::default(),
            penalty: PenaltySignal::default(),
            shooting: ShootingTimer::default(),
            hits: HitCounter::new(rules.pilot_hits_to_kill),
            velocity: Velocity::ZERO,
            transform,
            collider: Collider::new(config.spawning.ship_radius, CollisionLayers::ENEMY),
        }
    }
}

/// Uniformly distributed orientation.
pub fn random_rotation(rng: &mut impl Rng) -> Quat {
    let u1: f32 = rng.gen();
    let u2: f32 = rng.gen::<f32>() * TAU;
    let u3: f32 = rng.gen::<f32>() * TAU;
    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    Quat::from_xyzw(a * u2.sin(), a * u2.cos(), b * u3.sin(), b * u3.cos()).normalize()
}

/// Random position inside the cube of half-width `extent`, random orientation.
pub fn random_transform(rng: &mut impl Rng, extent: f32) -> Transform {
    let position = Vec3::new(
        rng.gen_range(-extent..=extent),
        rng.gen_range(-extent..=extent),
        rng.gen_range(-extent..=extent),
    );
    Transform::from_translation(position).with_rotation(random_rotation(rng))
}

/// Spawns the initial population and returns the controlled player.
///
/// Expects the config, rules and RNG resources to be present.
pub fn populate_scenario(world: &mut World, provider: &mut dyn AgentProvider) -> Entity {
    let config = world.resource::<SimulationConfig>().clone();
    let rules = *world.resource::<ScenarioRules>();

    let (pilot_transforms, obstacles) =
        world.resource_scope(|_, mut rng: Mut<SimulationRng>| {
            let pilots: Vec<Transform> = (0..rules.pilot_count)
                .map(|_| random_transform(&mut rng.0, config.spawning.ship_spawn_extent))
                .collect();
            let obstacles: Vec<(usize, Transform)> = if rules.load_obstacles {
                (0..config.spawning.obstacle_count)
                    .map(|_| {
                        let prefab = rng.0.gen_range(0..config.spawning.obstacle_radii.len());
                        let transform =
                            random_transform(&mut rng.0, config.spawning.obstacle_spawn_extent);
                        (prefab, transform)
                    })
                    .collect()
            } else {
                Vec::new()
            };
            (pilots, obstacles)
        });

    let player = world
        .spawn(PlayerBundle::new(&config, &rules, Transform::default()))
        .id();

    for (slot, transform) in pilot_transforms.into_iter().enumerate() {
        let agent = AgentHandle(provider.provide(slot));
        world.spawn(PilotBundle::new(&config, &rules, agent, transform));
    }

    let obstacle_count = obstacles.len();
    for (prefab, transform) in obstacles {
        world.spawn((
            Obstacle { prefab },
            transform,
            Collider::new(
                config.spawning.obstacle_radii[prefab],
                CollisionLayers::OBSTACLE,
            ),
        ));
    }

    tracing::info!(
        target: "dogfight::scenario",
        pilots = rules.pilot_count,
        obstacles = obstacle_count,
        points_to_win = rules.points_to_win,
        "scenario.populated"
    );

    player
}

/// Drops last tick's outcome markers before anything else runs.
pub fn clear_transient_outcomes(mut commands: Commands, outcomes: Query<Entity, With<Outcome>>) {
    for entity in outcomes.iter() {
        commands.entity(entity).remove::<Outcome>();
    }
}

/// Scores, penalises and respawns every ship disabled this tick.
///
/// Ships are processed in entity order and credited kills are added one at a
/// time, so several kills in the same tick all count and the win check sees
/// the running total.
#[allow(clippy::too_many_arguments)]
pub fn manage_disabled(
    mut commands: Commands,
    config: Res<SimulationConfig>,
    clock: Res<SimulationClock>,
    mut rng: ResMut<SimulationRng>,
    mut status: ResMut<ScenarioStatus>,
    mut explosions: EventWriter<ExplosionEvent>,
    mut outcomes: EventWriter<OutcomeEvent>,
    mut players: Query<(Entity, &mut ControlledPlayer)>,
    mut disabled: Query<(
        Entity,
        &Disabled,
        &mut Transform,
        Option<&mut HitCounter>,
        Option<&mut Velocity>,
        Option<&mut PenaltySignal>,
    )>,
) {
    let mut eliminated: Vec<Entity> = disabled.iter().map(|(entity, ..)| entity).collect();
    if eliminated.is_empty() {
        return;
    }
    eliminated.sort_unstable();

    let mut player = players.get_single_mut().ok();
    let penalty = Penalty {
        value: config.spawning.elimination_penalty,
        ends_episode: true,
    };

    for entity in eliminated {
        let Ok((_, tag, mut transform, counter, velocity, signal)) = disabled.get_mut(entity) else {
            continue;
        };
        let is_player = player.as_ref().is_some_and(|(id, _)| *id == entity);

        if !is_player {
            if let Some(mut signal) = signal {
                signal.post(penalty);
            }
        }

        let mut outcome = is_player.then_some(false);
        if let Some((_, controlled)) = player.as_mut() {
            if tag.killed_by_player {
                controlled.score += 1;
            }
            if controlled.has_won() {
                outcome = Some(true);
            }
        }

        if let Some(won) = outcome {
            commands.entity(entity).insert(Outcome { won });
            outcomes.send(OutcomeEvent {
                entity,
                won,
                tick: clock.tick,
            });
            if status.decide(won, clock.tick) {
                tracing::info!(
                    target: "dogfight::episode",
                    won,
                    tick = clock.tick,
                    score = player.as_ref().map_or(0, |(_, controlled)| controlled.score),
                    "episode.outcome"
                );
            }
        }

        explosions.send(ExplosionEvent {
            entity,
            position: transform.translation,
            killed_by_player: tag.killed_by_player,
        });

        *transform = random_transform(&mut rng.0, config.spawning.ship_spawn_extent);
        if let Some(mut counter) = counter {
            counter.hits_taken = 0;
        }
        if let Some(mut velocity) = velocity {
            *velocity = Velocity::ZERO;
        }
        commands
            .entity(entity)
            .remove::<(Disabled, TargetAssignment)>();
    }
}
