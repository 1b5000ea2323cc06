use std::str::FromStr;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    components::ControlledPlayer,
    simulation_config::{SimulationConfig, SimulationConfigError},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Easy,
    Hard,
}

impl FromStr for Difficulty {
    type Err = ScenarioError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ScenarioError::UnknownSetting {
                key: "difficulty",
                value: value.to_string(),
            }),
        }
    }
}

/// Map the scenario is played on. Only the distant planet carries obstacles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapKind {
    #[default]
    OpenSky,
    DistantPlanet,
}

impl FromStr for MapKind {
    type Err = ScenarioError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "open_sky" => Ok(MapKind::OpenSky),
            "distant_planet" => Ok(MapKind::DistantPlanet),
            _ => Err(ScenarioError::UnknownSetting {
                key: "map",
                value: value.to_string(),
            }),
        }
    }
}

/// Choices made before the scenario starts. Threaded into construction and
/// frozen into [`ScenarioRules`]; nothing reads it from global state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub difficulty: Difficulty,
    pub map: MapKind,
    pub seed: Option<u64>,
    /// Keep ticking after the scenario is decided.
    pub continue_after_outcome: bool,
    /// Overrides the configured pilot population.
    pub pilot_count: Option<usize>,
}

impl ScenarioConfig {
    pub fn rules(&self, config: &SimulationConfig) -> ScenarioRules {
        let hard = self.difficulty == Difficulty::Hard;
        ScenarioRules {
            difficulty: self.difficulty,
            pilot_hits_to_kill: if hard { 2 } else { 1 },
            player_hits_to_kill: if hard { 3 } else { 2 },
            points_to_win: if hard { 20 } else { 10 },
            pilot_count: self.pilot_count.unwrap_or(config.spawning.pilot_count),
            load_obstacles: self.map == MapKind::DistantPlanet,
            continue_after_outcome: self.continue_after_outcome,
        }
    }
}

/// Read-only per-scenario constants derived from [`ScenarioConfig`].
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioRules {
    pub difficulty: Difficulty,
    pub pilot_hits_to_kill: u32,
    pub player_hits_to_kill: u32,
    pub points_to_win: u32,
    pub pilot_count: usize,
    pub load_obstacles: bool,
    pub continue_after_outcome: bool,
}

#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScenarioStatus {
    #[default]
    Running,
    Won {
        tick: u64,
    },
    Lost {
        tick: u64,
    },
}

impl ScenarioStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, ScenarioStatus::Running)
    }

    /// Records a terminal outcome. The first one sticks.
    pub fn decide(&mut self, won: bool, tick: u64) -> bool {
        if !self.is_running() {
            return false;
        }
        *self = if won {
            ScenarioStatus::Won { tick }
        } else {
            ScenarioStatus::Lost { tick }
        };
        true
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario has no controlled player")]
    MissingPlayer,
    #[error("scenario expects one controlled player, found {0}")]
    DuplicatePlayer(usize),
    #[error(transparent)]
    InvalidConfig(#[from] SimulationConfigError),
    #[error("unknown {key} setting {value:?}")]
    UnknownSetting { key: &'static str, value: String },
}

/// Fails fast when the population cannot support a scenario.
pub fn verify_population(world: &mut World) -> Result<Entity, ScenarioError> {
    let mut players = world.query_filtered::<Entity, With<ControlledPlayer>>();
    let found: Vec<Entity> = players.iter(world).collect();
    match found.as_slice() {
        [] => Err(ScenarioError::MissingPlayer),
        [player] => Ok(*player),
        many => Err(ScenarioError::DuplicatePlayer(many.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_fixes_thresholds() {
        let config = SimulationConfig::default();
        let easy = ScenarioConfig::default().rules(&config);
        assert_eq!(
            (easy.pilot_hits_to_kill, easy.player_hits_to_kill, easy.points_to_win),
            (1, 2, 10)
        );
        let hard = ScenarioConfig {
            difficulty: Difficulty::Hard,
            ..ScenarioConfig::default()
        }
        .rules(&config);
        assert_eq!(
            (hard.pilot_hits_to_kill, hard.player_hits_to_kill, hard.points_to_win),
            (2, 3, 20)
        );
        assert_eq!(hard.pilot_count, 50);
    }

    #[test]
    fn only_distant_planet_loads_obstacles() {
        let config = SimulationConfig::default();
        let planet = ScenarioConfig {
            map: "distant-planet".parse().unwrap(),
            ..ScenarioConfig::default()
        };
        assert!(planet.rules(&config).load_obstacles);
        assert!(!ScenarioConfig::default().rules(&config).load_obstacles);
        assert!("swamp".parse::<MapKind>().is_err());
    }

    #[test]
    fn first_outcome_sticks() {
        let mut status = ScenarioStatus::default();
        assert!(status.decide(false, 12));
        assert!(!status.decide(true, 13));
        assert_eq!(status, ScenarioStatus::Lost { tick: 12 });
    }

    #[test]
    fn population_needs_exactly_one_player() {
        let mut world = World::default();
        assert!(matches!(
            verify_population(&mut world),
            Err(ScenarioError::MissingPlayer)
        ));
        let player = world.spawn(ControlledPlayer::new(10)).id();
        assert_eq!(verify_population(&mut world).unwrap(), player);
        world.spawn(ControlledPlayer::new(10));
        assert!(matches!(
            verify_population(&mut world),
            Err(ScenarioError::DuplicatePlayer(2))
        ));
    }
}
