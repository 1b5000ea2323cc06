use bevy::prelude::*;

use crate::{
    components::{Combatant, Disabled, Projectile, RewardSignal},
    episode::ExplosionEvent,
    resources::SimulationClock,
};

#[derive(Resource, Default, Debug, Clone, PartialEq)]
pub struct SimulationMetrics {
    pub tick: u64,
    pub active_combatants: u32,
    pub live_projectiles: u32,
    pub eliminations_total: u64,
    pub eliminations_this_tick: u32,
    pub player_kills: u64,
    pub reward_this_tick: f32,
}

/// Sums shaping rewards before they are handed to the agents.
pub fn tally_rewards(mut metrics: ResMut<SimulationMetrics>, signals: Query<&RewardSignal>) {
    metrics.reward_this_tick = signals.iter().filter_map(RewardSignal::peek).sum();
}

pub fn collect_metrics(
    clock: Res<SimulationClock>,
    mut metrics: ResMut<SimulationMetrics>,
    mut explosions: EventReader<ExplosionEvent>,
    combatants: Query<(), (With<Combatant>, Without<Disabled>)>,
    projectiles: Query<(), With<Projectile>>,
) {
    metrics.tick = clock.tick;
    metrics.active_combatants = combatants.iter().count() as u32;
    metrics.live_projectiles = projectiles.iter().count() as u32;

    let mut eliminations = 0u32;
    for explosion in explosions.read() {
        eliminations += 1;
        if explosion.killed_by_player {
            metrics.player_kills += 1;
        }
    }
    metrics.eliminations_this_tick = eliminations;
    metrics.eliminations_total += u64::from(eliminations);

    log::debug!(
        "metrics: tick {} combatants {} projectiles {} eliminations {}",
        metrics.tick,
        metrics.active_combatants,
        metrics.live_projectiles,
        metrics.eliminations_this_tick
    );
}
