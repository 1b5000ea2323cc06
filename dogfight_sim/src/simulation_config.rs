use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use bevy::prelude::Resource;
use serde::Deserialize;
use thiserror::Error;

pub const BUILTIN_SIMULATION_CONFIG: &str = include_str!("data/simulation_config.json");

/// Tuning values shared by every system in the tick pipeline.
///
/// Loaded once before the scenario starts and only read afterwards.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed simulated duration of one tick, in seconds.
    pub tick_seconds: f32,
    /// Pilots are asked for a new decision every `decision_period` ticks.
    pub decision_period: u32,
    pub targeting: TargetingConfig,
    pub combat: CombatConfig,
    pub projectiles: ProjectileConfig,
    pub flight: FlightConfig,
    pub spawning: SpawnConfig,
    pub sensors: SensorConfig,
    pub hud_refresh_seconds: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_seconds: 0.02,
            decision_period: 5,
            targeting: TargetingConfig::default(),
            combat: CombatConfig::default(),
            projectiles: ProjectileConfig::default(),
            flight: FlightConfig::default(),
            spawning: SpawnConfig::default(),
            sensors: SensorConfig::default(),
            hud_refresh_seconds: 1.0,
        }
    }
}

impl SimulationConfig {
    pub fn builtin() -> Self {
        Self::from_json_str(BUILTIN_SIMULATION_CONFIG)
            .expect("builtin simulation config should parse")
    }

    pub fn from_json_str(json: &str) -> Result<Self, SimulationConfigError> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, SimulationConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|source| SimulationConfigError::ReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json_str(&contents)
    }

    /// Rejects values that would stall or destabilise the tick pipeline.
    pub fn validate(&self) -> Result<(), SimulationConfigError> {
        positive("tick_seconds", self.tick_seconds)?;
        if self.decision_period == 0 {
            return Err(SimulationConfigError::Invalid(
                "decision_period must be at least 1".to_string(),
            ));
        }
        positive("projectiles.lifetime", self.projectiles.lifetime)?;
        positive("projectiles.radius", self.projectiles.radius)?;
        positive("sensors.ray_length", self.sensors.ray_length)?;
        non_negative("spawning.ship_spawn_extent", self.spawning.ship_spawn_extent)?;
        non_negative(
            "spawning.obstacle_spawn_extent",
            self.spawning.obstacle_spawn_extent,
        )?;
        positive("spawning.ship_radius", self.spawning.ship_radius)?;
        if self.spawning.obstacle_radii.is_empty() {
            return Err(SimulationConfigError::Invalid(
                "at least one obstacle prefab radius is required".to_string(),
            ));
        }
        for radius in &self.spawning.obstacle_radii {
            positive("spawning.obstacle_radii", *radius)?;
        }
        Ok(())
    }
}

fn positive(key: &str, value: f32) -> Result<(), SimulationConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimulationConfigError::Invalid(format!(
            "{key} must be positive and finite, got {value}"
        )))
    }
}

/// Spawn extents are sampled as `-extent..=extent`, so zero is allowed.
fn non_negative(key: &str, value: f32) -> Result<(), SimulationConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimulationConfigError::Invalid(format!(
            "{key} must be non-negative and finite, got {value}"
        )))
    }
}

#[derive(Debug, Error)]
pub enum SimulationConfigError {
    #[error("failed to parse simulation config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read simulation config from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid simulation config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TargetingConfig {
    /// Candidates further than this may still be the first pick, but never replace one.
    pub engagement_radius: f32,
}

impl TargetingConfig {
    pub fn engagement_radius_sq(&self) -> f32 {
        self.engagement_radius * self.engagement_radius
    }
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            engagement_radius: 400.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub engage_range: f32,
    pub reward_min_alignment: f32,
    pub fire_min_alignment: f32,
    pub reward_scale: f32,
    pub fire_cooldown: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            engage_range: 400.0,
            reward_min_alignment: -0.2,
            fire_min_alignment: 0.8,
            reward_scale: 0.1,
            fire_cooldown: 0.2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    pub speed: f32,
    pub lifetime: f32,
    pub pitch_offset_degrees: f32,
    pub lateral_offset: f32,
    pub forward_offset: f32,
    pub player_vertical_offset: f32,
    pub radius: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 150.0,
            lifetime: 2.0,
            pitch_offset_degrees: 80.0,
            lateral_offset: 10.0,
            forward_offset: 10.0,
            player_vertical_offset: 3.0,
            radius: 1.0,
        }
    }
}

/// Turn rates are in degrees per second, speeds in world units per second.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    pub pilot_pitch_rate: f32,
    pub pilot_roll_rate: f32,
    pub pilot_speed: f32,
    pub player_look_rate: f32,
    pub player_roll_rate: f32,
    pub player_speed: f32,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            pilot_pitch_rate: 25.0,
            pilot_roll_rate: 40.0,
            pilot_speed: 55.0,
            player_look_rate: 80.0,
            player_roll_rate: 200.0,
            player_speed: 40.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub pilot_count: usize,
    pub obstacle_count: usize,
    /// Half-width of the cube ships spawn and respawn in.
    pub ship_spawn_extent: f32,
    pub obstacle_spawn_extent: f32,
    pub ship_radius: f32,
    /// One entry per obstacle prefab.
    pub obstacle_radii: Vec<f32>,
    pub elimination_penalty: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            pilot_count: 50,
            obstacle_count: 100,
            ship_spawn_extent: 400.0,
            obstacle_spawn_extent: 750.0,
            ship_radius: 4.0,
            obstacle_radii: vec![20.0, 35.0, 50.0],
            elimination_penalty: -3.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub ray_length: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self { ray_length: 100.0 }
    }
}

/// Where the active tuning values came from.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub enum SimulationConfigSource {
    Builtin,
    File(PathBuf),
}

pub fn load_simulation_config_from_env() -> (SimulationConfig, SimulationConfigSource) {
    if let Some(path) = env::var("SIM_CONFIG_PATH").ok().map(PathBuf::from) {
        match SimulationConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "dogfight::config",
                    path = %path.display(),
                    "simulation_config.loaded=file"
                );
                return (config, SimulationConfigSource::File(path));
            }
            Err(err) => {
                tracing::warn!(
                    target: "dogfight::config",
                    path = %path.display(),
                    error = %err,
                    "simulation_config.load_failed"
                );
            }
        }
    }

    tracing::info!(target: "dogfight::config", "simulation_config.loaded=builtin");
    (SimulationConfig::builtin(), SimulationConfigSource::Builtin)
}
