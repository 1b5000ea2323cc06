mod common;

use dogfight_sim::{run_ticks, HudReadout, SimulationClock, SimulationMetrics};

#[test]
fn scenario_runs_and_dispatches_decisions() -> anyhow::Result<()> {
    let mut scenario = common::build(common::seeded(5))?;

    let ran = run_ticks(&mut scenario.app, 50);
    assert_eq!(ran, 50);

    let clock = *scenario.app.world.resource::<SimulationClock>();
    assert_eq!(clock.tick, 50);
    assert!((clock.elapsed - 1.0).abs() < 1e-3);

    assert_eq!(scenario.pilots().len(), 12);
    for slot in 0..scenario.logs.len() {
        let log = scenario.log(slot);
        assert_eq!(log.decisions, 10, "every fifth tick for slot {slot}");
        assert_eq!(log.observations.len(), 10);
    }

    let hud = scenario.app.world.resource::<HudReadout>();
    assert!(hud.score_text.starts_with("Score: "));
    assert!(hud.health_text.starts_with("Ship Health: "));

    let metrics = scenario.app.world.resource::<SimulationMetrics>();
    assert_eq!(metrics.tick, 49, "metrics are collected before the clock advances");
    Ok(())
}

#[test]
fn distant_planet_adds_obstacles() -> anyhow::Result<()> {
    let scenario_config = dogfight_sim::ScenarioConfig {
        map: dogfight_sim::MapKind::DistantPlanet,
        ..common::seeded(9)
    };
    let mut scenario = common::build(scenario_config)?;
    let obstacles = scenario
        .app
        .world
        .query::<&dogfight_sim::Obstacle>()
        .iter(&scenario.app.world)
        .count();
    assert_eq!(obstacles, 20);
    Ok(())
}

#[test]
fn negative_spawn_extent_is_rejected_before_spawning() {
    let mut config = dogfight_sim::SimulationConfig::builtin();
    config.spawning.ship_spawn_extent = -10.0;
    let mut provider = |_slot: usize| -> Box<dyn dogfight_sim::PilotAgent> {
        Box::new(dogfight_sim::ScriptedPilot::holding_course())
    };

    let result = dogfight_sim::build_scenario_app(config, &common::seeded(3), &mut provider);

    assert!(matches!(
        result,
        Err(dogfight_sim::ScenarioError::InvalidConfig(
            dogfight_sim::SimulationConfigError::Invalid(_)
        ))
    ));
}
