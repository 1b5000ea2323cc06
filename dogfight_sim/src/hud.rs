use bevy::prelude::*;

use crate::{
    components::{ControlledPlayer, HitCounter},
    resources::{HudReadout, SimulationClock},
    simulation_config::SimulationConfig,
};

impl HudReadout {
    pub fn refresh(&mut self, player: &ControlledPlayer, hits: &HitCounter, at: f64) {
        self.score = player.score;
        self.points_to_win = player.points_to_win;
        self.health_percent = hits.health_percent();
        self.score_text = format!("Score: {}", self.score);
        self.health_text = format!("Ship Health: {}%", self.health_percent);
        self.refreshed_at = at;
    }
}

/// Rewrites the readout once per refresh period of simulated time.
pub fn update_hud(
    config: Res<SimulationConfig>,
    clock: Res<SimulationClock>,
    mut hud: ResMut<HudReadout>,
    players: Query<(&ControlledPlayer, &HitCounter)>,
) {
    let due = hud.score_text.is_empty()
        || clock.elapsed - hud.refreshed_at >= f64::from(config.hud_refresh_seconds);
    if !due {
        return;
    }
    if let Ok((player, hits)) = players.get_single() {
        hud.refresh(player, hits, clock.elapsed);
    }
}
