use bevy::prelude::*;
use rand::{rngs::SmallRng, SeedableRng};

/// Fixed-step simulation time. Advanced once at the end of every tick.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct SimulationClock {
    pub tick: u64,
    pub elapsed: f64,
    pub delta: f32,
}

impl SimulationClock {
    pub fn new(delta: f32) -> Self {
        Self {
            tick: 0,
            elapsed: 0.0,
            delta,
        }
    }

    pub fn advance(&mut self) {
        self.tick += 1;
        self.elapsed += f64::from(self.delta);
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(0.02)
    }
}

/// Last step of every tick.
pub fn advance_clock(mut clock: ResMut<SimulationClock>) {
    clock.advance();
}

/// Source of all randomness in the simulation: spawn and respawn placement.
#[derive(Resource, Debug, Clone)]
pub struct SimulationRng(pub SmallRng);

impl SimulationRng {
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self(SmallRng::seed_from_u64(seed ^ 0xD06F_1647)),
            None => Self(SmallRng::from_entropy()),
        }
    }
}

/// Axis and trigger state for the controlled player, written by the host each tick.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub throttle: f32,
    pub trigger: bool,
}

/// Text the presentation layer shows for the controlled player.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct HudReadout {
    pub score: u32,
    pub points_to_win: u32,
    pub health_percent: u32,
    pub score_text: String,
    pub health_text: String,
    pub refreshed_at: f64,
}
