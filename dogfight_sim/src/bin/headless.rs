use std::env;

use tracing::{info, warn};

use dogfight_sim::{
    build_scenario_app, load_simulation_config_from_env, run_ticks, Difficulty, MapKind,
    PilotAgent, ScenarioConfig, ScenarioStatus, ScriptedPilot, SimulationMetrics,
};

const DEFAULT_TICKS: u64 = 3_000;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (config, source) = load_simulation_config_from_env();
    let scenario = scenario_from_env();
    let ticks = parse_env("DOGFIGHT_TICKS").unwrap_or(DEFAULT_TICKS);

    let mut provider = |_slot: usize| -> Box<dyn PilotAgent> {
        Box::new(ScriptedPilot::holding_course())
    };
    let mut app = match build_scenario_app(config, &scenario, &mut provider) {
        Ok(app) => app,
        Err(err) => {
            warn!(target: "dogfight::scenario", error = %err, "scenario.rejected");
            std::process::exit(1);
        }
    };

    info!(
        target: "dogfight::scenario",
        config = ?source,
        difficulty = ?scenario.difficulty,
        map = ?scenario.map,
        seed = ?scenario.seed,
        ticks,
        "dogfight headless runner ready"
    );

    let ran = run_ticks(&mut app, ticks);

    let status = *app.world.resource::<ScenarioStatus>();
    let metrics = app.world.resource::<SimulationMetrics>().clone();
    info!(
        target: "dogfight::scenario",
        ticks = ran,
        status = ?status,
        eliminations = metrics.eliminations_total,
        player_kills = metrics.player_kills,
        projectiles = metrics.live_projectiles,
        "scenario.finished"
    );
}

fn scenario_from_env() -> ScenarioConfig {
    let mut scenario = ScenarioConfig::default();
    if let Ok(value) = env::var("DOGFIGHT_DIFFICULTY") {
        match value.parse::<Difficulty>() {
            Ok(difficulty) => scenario.difficulty = difficulty,
            Err(err) => warn!(target: "dogfight::scenario", error = %err, "scenario.env_ignored"),
        }
    }
    if let Ok(value) = env::var("DOGFIGHT_MAP") {
        match value.parse::<MapKind>() {
            Ok(map) => scenario.map = map,
            Err(err) => warn!(target: "dogfight::scenario", error = %err, "scenario.env_ignored"),
        }
    }
    scenario.seed = parse_env("DOGFIGHT_SEED");
    scenario
}

fn parse_env(key: &str) -> Option<u64> {
    let value = env::var(key).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(target: "dogfight::scenario", key, value = %value, "scenario.env_ignored");
            None
        }
    }
}
