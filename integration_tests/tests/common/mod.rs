#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex, Once};

use bevy::prelude::*;
use dogfight_sim::{
    build_scenario_app, load_simulation_config_from_env, PilotAgent, PilotLog, ScenarioConfig,
    ScriptedPilot,
};

static INIT: Once = Once::new();

pub fn ensure_test_config() {
    INIT.call_once(|| {
        let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("test_simulation_config.json");

        debug_assert!(
            config_path.exists(),
            "missing test simulation config at {}",
            config_path.display()
        );

        std::env::set_var("SIM_CONFIG_PATH", &config_path);
    });
}

pub struct TestScenario {
    pub app: App,
    /// Call logs indexed by pilot spawn slot.
    pub logs: Vec<Arc<Mutex<PilotLog>>>,
}

impl TestScenario {
    /// Pilot entities in spawn-slot order.
    pub fn pilots(&mut self) -> Vec<Entity> {
        let mut query = self
            .app
            .world
            .query_filtered::<Entity, With<dogfight_sim::Pilot>>();
        let mut pilots: Vec<Entity> = query.iter(&self.app.world).collect();
        pilots.sort_unstable();
        pilots
    }

    pub fn player(&mut self) -> Entity {
        let mut query = self
            .app
            .world
            .query_filtered::<Entity, With<dogfight_sim::ControlledPlayer>>();
        query.single(&self.app.world)
    }

    pub fn log(&self, slot: usize) -> PilotLog {
        self.logs[slot].lock().expect("pilot log lock").clone()
    }
}

pub fn build(scenario: ScenarioConfig) -> anyhow::Result<TestScenario> {
    ensure_test_config();
    let (config, _) = load_simulation_config_from_env();

    let mut logs = Vec::new();
    let mut provider = |_slot: usize| -> Box<dyn PilotAgent> {
        let pilot = ScriptedPilot::holding_course();
        logs.push(pilot.log());
        Box::new(pilot)
    };
    let app = build_scenario_app(config, &scenario, &mut provider)?;

    Ok(TestScenario { app, logs })
}

/// Seeded scenario that keeps ticking after a stray outcome.
pub fn seeded(seed: u64) -> ScenarioConfig {
    ScenarioConfig {
        seed: Some(seed),
        continue_after_outcome: true,
        ..ScenarioConfig::default()
    }
}
