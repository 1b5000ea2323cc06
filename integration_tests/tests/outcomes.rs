mod common;

use bevy::ecs::event::Events;
use dogfight_sim::{
    run_tick, ControlledPlayer, Disabled, Outcome, OutcomeEvent, ScenarioStatus, SimulationClock,
};

#[test]
fn credited_kills_reaching_the_threshold_win() -> anyhow::Result<()> {
    let mut scenario = common::build(common::seeded(21))?;
    let player = scenario.player();
    let pilots = scenario.pilots();

    for pilot in &pilots[..10] {
        scenario.app.world.entity_mut(*pilot).insert(Disabled {
            killed_by_player: true,
        });
    }
    assert!(run_tick(&mut scenario.app));

    let world = &scenario.app.world;
    assert_eq!(world.get::<ControlledPlayer>(player).unwrap().score, 10);
    assert_eq!(world.get::<Outcome>(pilots[9]), Some(&Outcome { won: true }));
    assert!(world.get::<Outcome>(pilots[8]).is_none());
    assert!(matches!(
        *world.resource::<ScenarioStatus>(),
        ScenarioStatus::Won { tick: 0 }
    ));
    Ok(())
}

#[test]
fn elimination_after_the_threshold_reports_the_win() -> anyhow::Result<()> {
    let mut scenario = common::build(common::seeded(22))?;
    let player = scenario.player();
    let pilots = scenario.pilots();
    scenario
        .app
        .world
        .get_mut::<ControlledPlayer>(player)
        .unwrap()
        .score = 10;

    scenario
        .app
        .world
        .entity_mut(pilots[3])
        .insert(Disabled::default());
    assert!(run_tick(&mut scenario.app));

    assert_eq!(
        scenario.app.world.get::<Outcome>(pilots[3]),
        Some(&Outcome { won: true })
    );

    assert!(run_tick(&mut scenario.app), "scenario keeps running when asked to");
    assert!(
        scenario.app.world.get::<Outcome>(pilots[3]).is_none(),
        "outcome markers last a single tick"
    );
    Ok(())
}

#[test]
fn downed_player_loses_and_freezes_the_tick_driver() -> anyhow::Result<()> {
    let mut scenario = common::build(dogfight_sim::ScenarioConfig {
        continue_after_outcome: false,
        ..common::seeded(23)
    })?;
    let player = scenario.player();

    run_tick(&mut scenario.app);
    scenario
        .app
        .world
        .entity_mut(player)
        .insert(Disabled::default());
    assert!(run_tick(&mut scenario.app));

    let world = &scenario.app.world;
    assert_eq!(world.get::<Outcome>(player), Some(&Outcome { won: false }));
    assert_eq!(
        *world.resource::<ScenarioStatus>(),
        ScenarioStatus::Lost { tick: 1 }
    );
    let events: Vec<OutcomeEvent> = world
        .resource::<Events<OutcomeEvent>>()
        .iter_current_update_events()
        .copied()
        .collect();
    assert_eq!(
        events,
        vec![OutcomeEvent {
            entity: player,
            won: false,
            tick: 1
        }]
    );

    let tick_before = world.resource::<SimulationClock>().tick;
    assert!(!run_tick(&mut scenario.app));
    assert_eq!(
        scenario.app.world.resource::<SimulationClock>().tick,
        tick_before
    );
    Ok(())
}
