//! Boundary with the learning agents that fly pilot ships.
//!
//! The simulation only talks to an agent through [`PilotAgent`]: it shows it
//! observations, asks for a decision at a fixed cadence, and forwards reward
//! and penalty signals. Agents are handed in at scenario construction through
//! an [`AgentProvider`]; nothing here looks them up globally.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;

use crate::{
    components::{PenaltySignal, PilotControls, RewardSignal},
    observations::Observations,
    resources::SimulationClock,
    simulation_config::SimulationConfig,
};

/// Continuous control output of an agent, each axis in `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Decision {
    pub pitch: f32,
    pub roll: f32,
}

impl Decision {
    pub fn clamped(self) -> Self {
        Self {
            pitch: self.pitch.clamp(-1.0, 1.0),
            roll: self.roll.clamp(-1.0, 1.0),
        }
    }
}

pub trait PilotAgent: Send + Sync + 'static {
    fn observe(&mut self, observations: &Observations);

    fn decide(&mut self) -> Decision;

    fn reward(&mut self, value: f32);

    fn penalty(&mut self, value: f32, _ends_episode: bool) {
        self.reward(value);
    }

    fn end_episode(&mut self);
}

/// Owns the agent attached to a pilot ship.
#[derive(Component)]
pub struct AgentHandle(pub Box<dyn PilotAgent>);

impl AgentHandle {
    pub fn new(agent: impl PilotAgent) -> Self {
        Self(Box::new(agent))
    }
}

pub trait AgentProvider {
    /// Agent for the pilot spawned in `slot` (0-based spawn order).
    fn provide(&mut self, slot: usize) -> Box<dyn PilotAgent>;
}

impl<F> AgentProvider for F
where
    F: FnMut(usize) -> Box<dyn PilotAgent>,
{
    fn provide(&mut self, slot: usize) -> Box<dyn PilotAgent> {
        self(slot)
    }
}

/// Calls a [`ScriptedPilot`] has received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PilotLog {
    pub observations: Vec<Observations>,
    pub rewards: Vec<f32>,
    pub penalties: Vec<(f32, bool)>,
    pub episodes_ended: u32,
    pub decisions: u32,
}

/// Agent that always returns the same decision and records everything it is told.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPilot {
    decision: Decision,
    log: Arc<Mutex<PilotLog>>,
}

impl ScriptedPilot {
    pub fn new(decision: Decision) -> Self {
        Self {
            decision,
            log: Arc::default(),
        }
    }

    pub fn holding_course() -> Self {
        Self::new(Decision::default())
    }

    /// Shared view of the call log, readable after the pilot is moved into the world.
    pub fn log(&self) -> Arc<Mutex<PilotLog>> {
        Arc::clone(&self.log)
    }

    fn record(&self, f: impl FnOnce(&mut PilotLog)) {
        if let Ok(mut log) = self.log.lock() {
            f(&mut log);
        }
    }
}

impl PilotAgent for ScriptedPilot {
    fn observe(&mut self, observations: &Observations) {
        self.record(|log| log.observations.push(*observations));
    }

    fn decide(&mut self) -> Decision {
        self.record(|log| log.decisions += 1);
        self.decision
    }

    fn reward(&mut self, value: f32) {
        self.record(|log| log.rewards.push(value));
    }

    fn penalty(&mut self, value: f32, ends_episode: bool) {
        self.record(|log| log.penalties.push((value, ends_episode)));
    }

    fn end_episode(&mut self) {
        self.record(|log| log.episodes_ended += 1);
    }
}

/// Shows each agent its latest observations and stores the resulting decision.
///
/// Runs on ticks that are a multiple of the configured decision period.
pub fn request_decisions(
    config: Res<SimulationConfig>,
    clock: Res<SimulationClock>,
    mut pilots: Query<(&mut AgentHandle, &Observations, &mut PilotControls)>,
) {
    if clock.tick % u64::from(config.decision_period.max(1)) != 0 {
        return;
    }
    for (mut agent, observations, mut controls) in pilots.iter_mut() {
        agent.0.observe(observations);
        let decision = agent.0.decide().clamped();
        controls.pitch = decision.pitch;
        controls.roll = decision.roll;
    }
}

/// Drains this tick's reward mailboxes into the owning agents.
pub fn deliver_rewards(mut pilots: Query<(&mut RewardSignal, &mut AgentHandle)>) {
    for (mut signal, mut agent) in pilots.iter_mut() {
        if let Some(value) = signal.take() {
            agent.0.reward(value);
        }
    }
}

/// Drains elimination penalties and closes the agent's episode when requested.
pub fn deliver_penalties(mut pilots: Query<(&mut PenaltySignal, &mut AgentHandle)>) {
    for (mut signal, mut agent) in pilots.iter_mut() {
        let Some(penalty) = signal.take() else {
            continue;
        };
        if penalty.value == 0.0 {
            continue;
        }
        agent.0.penalty(penalty.value, penalty.ends_episode);
        if penalty.ends_episode {
            agent.0.end_episode();
        }
    }
}
