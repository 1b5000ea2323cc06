//! Simulation core for the headless dogfight scenario.
//!
//! Builds a Bevy [`App`] whose `Update` schedule advances one fixed-length
//! combat tick per [`run_tick`]: pilots decide and fly, acquire and engage
//! targets, collisions are resolved, projectiles spawn and move, eliminated
//! ships are scored and respawned, and sensors are swept for the next
//! decision. Structural changes are deferred and applied at explicit
//! barriers between the stages.

pub mod agent;
pub mod collision;
pub mod combat;
pub mod components;
pub mod episode;
pub mod flight;
pub mod hud;
pub mod metrics;
pub mod observations;
pub mod physics;
pub mod projectiles;
pub mod resources;
pub mod scenario;
pub mod simulation_config;
pub mod targeting;

use bevy::prelude::*;

pub use agent::{AgentHandle, AgentProvider, Decision, PilotAgent, PilotLog, ScriptedPilot};
pub use components::{
    Combatant, ControlledPlayer, Disabled, HitCounter, Obstacle, Outcome, Penalty, PenaltySignal,
    Pilot, PlayerOwned, Projectile, RewardSignal, TargetAssignment, Velocity,
};
pub use episode::{ExplosionEvent, OutcomeEvent};
pub use metrics::SimulationMetrics;
pub use observations::{Observations, SensorDirection, SensorReading, NO_CONTACT};
pub use physics::{Collider, CollisionEvents, CollisionLayers, SpatialIndex, SpatialQuery};
pub use resources::{HudReadout, PlayerInput, SimulationClock, SimulationRng};
pub use scenario::{
    Difficulty, MapKind, ScenarioConfig, ScenarioError, ScenarioRules, ScenarioStatus,
};
pub use simulation_config::{
    load_simulation_config_from_env, SimulationConfig, SimulationConfigError,
    SimulationConfigSource,
};

/// Stages of one tick, run in declaration order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickSet {
    Prepare,
    Pilot,
    Acquire,
    Engage,
    Collide,
    Projectiles,
    Episode,
    Sense,
    Report,
}

/// Construct a Bevy [`App`] running one scenario.
///
/// Agents for the pilot ships come from `provider`, one per spawn slot.
/// Fails before any tick runs if the tuning values are invalid or the
/// population has no single controlled player.
pub fn build_scenario_app(
    config: SimulationConfig,
    scenario: &ScenarioConfig,
    provider: &mut dyn AgentProvider,
) -> Result<App, ScenarioError> {
    config.validate()?;
    let rules = scenario.rules(&config);

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_event::<ExplosionEvent>()
        .add_event::<OutcomeEvent>()
        .insert_resource(SimulationClock::new(config.tick_seconds))
        .insert_resource(SimulationRng::from_seed(scenario.seed))
        .insert_resource(rules)
        .insert_resource(config)
        .init_resource::<ScenarioStatus>()
        .init_resource::<PlayerInput>()
        .init_resource::<HudReadout>()
        .init_resource::<SpatialIndex>()
        .init_resource::<CollisionEvents>()
        .init_resource::<SimulationMetrics>()
        .configure_sets(
            Update,
            (
                TickSet::Prepare,
                TickSet::Pilot,
                TickSet::Acquire,
                TickSet::Engage,
                TickSet::Collide,
                TickSet::Projectiles,
                TickSet::Episode,
                TickSet::Sense,
                TickSet::Report,
            )
                .chain(),
        )
        .add_systems(
            Update,
            (episode::clear_transient_outcomes, apply_deferred)
                .chain()
                .in_set(TickSet::Prepare),
        )
        .add_systems(
            Update,
            (
                agent::request_decisions,
                (flight::fly_pilots, flight::fly_player),
            )
                .chain()
                .in_set(TickSet::Pilot),
        )
        .add_systems(
            Update,
            (targeting::find_targets, apply_deferred)
                .chain()
                .in_set(TickSet::Acquire),
        )
        .add_systems(
            Update,
            (
                (combat::combat_timing, combat::player_trigger),
                apply_deferred,
                metrics::tally_rewards,
                agent::deliver_rewards,
            )
                .chain()
                .in_set(TickSet::Engage),
        )
        .add_systems(
            Update,
            (
                physics::refresh_spatial_index,
                physics::detect_contacts,
                collision::resolve_collisions,
                apply_deferred,
            )
                .chain()
                .in_set(TickSet::Collide),
        )
        .add_systems(
            Update,
            (
                projectiles::spawn_projectiles,
                apply_deferred,
                projectiles::move_projectiles,
                apply_deferred,
            )
                .chain()
                .in_set(TickSet::Projectiles),
        )
        .add_systems(
            Update,
            (episode::manage_disabled, apply_deferred, agent::deliver_penalties)
                .chain()
                .in_set(TickSet::Episode),
        )
        .add_systems(
            Update,
            (physics::refresh_spatial_index, observations::raycast_observations)
                .chain()
                .in_set(TickSet::Sense),
        )
        .add_systems(
            Update,
            (hud::update_hud, metrics::collect_metrics, resources::advance_clock)
                .chain()
                .in_set(TickSet::Report),
        );

    let player = episode::populate_scenario(&mut app.world, provider);
    let verified = scenario::verify_population(&mut app.world)?;
    debug_assert_eq!(player, verified);

    Ok(app)
}

/// Execute a single simulation tick.
///
/// Returns `false` without touching the world once the scenario is decided,
/// unless the scenario was configured to continue after its outcome.
pub fn run_tick(app: &mut App) -> bool {
    let status = *app.world.resource::<ScenarioStatus>();
    let rules = *app.world.resource::<ScenarioRules>();
    if !status.is_running() && !rules.continue_after_outcome {
        return false;
    }
    app.update();
    true
}

/// Runs up to `ticks` ticks and returns how many actually ran.
pub fn run_ticks(app: &mut App, ticks: u64) -> u64 {
    let mut ran = 0;
    while ran < ticks && run_tick(app) {
        ran += 1;
    }
    ran
}
