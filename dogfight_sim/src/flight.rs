use bevy::prelude::*;

use crate::{
    components::{forward, ControlledPlayer, Disabled, Pilot, PilotControls, Velocity},
    resources::{PlayerInput, SimulationClock},
    simulation_config::{FlightConfig, SimulationConfig},
};

/// One tick of pilot flight: pitch about local X, roll about local Z, then
/// advance along the new nose direction at constant speed.
pub fn pilot_step(
    config: &FlightConfig,
    transform: &mut Transform,
    controls: PilotControls,
    dt: f32,
) {
    let pitch =
        Quat::from_rotation_x((controls.pitch * config.pilot_pitch_rate * dt).to_radians());
    let roll = Quat::from_rotation_z((-controls.roll * config.pilot_roll_rate * dt).to_radians());
    transform.rotation = (transform.rotation * pitch * roll).normalize();
    transform.translation += forward(transform.rotation) * config.pilot_speed * dt;
}

pub fn player_step(config: &FlightConfig, transform: &mut Transform, input: &PlayerInput, dt: f32) {
    let look = config.player_look_rate * dt;
    let yaw = Quat::from_rotation_y((input.yaw.clamp(-1.0, 1.0) * look).to_radians());
    let pitch = Quat::from_rotation_x((input.pitch.clamp(-1.0, 1.0) * look).to_radians());
    let roll = Quat::from_rotation_z(
        (-input.roll.clamp(-1.0, 1.0) * config.player_roll_rate * dt).to_radians(),
    );
    transform.rotation = (transform.rotation * yaw * pitch * roll).normalize();
    let throttle = input.throttle.clamp(0.0, 1.0);
    transform.translation += forward(transform.rotation) * throttle * config.player_speed * dt;
}

/// Kinematic flight for agent ships. Physics velocity is overridden to zero.
pub fn fly_pilots(
    config: Res<SimulationConfig>,
    clock: Res<SimulationClock>,
    mut pilots: Query<
        (&mut Transform, &PilotControls, Option<&mut Velocity>),
        (With<Pilot>, Without<Disabled>),
    >,
) {
    let flight = &config.flight;
    let dt = clock.delta;
    pilots
        .par_iter_mut()
        .for_each(|(mut transform, controls, velocity)| {
            if let Some(mut velocity) = velocity {
                *velocity = Velocity::ZERO;
            }
            pilot_step(flight, &mut transform, *controls, dt);
        });
}

pub fn fly_player(
    config: Res<SimulationConfig>,
    clock: Res<SimulationClock>,
    input: Res<PlayerInput>,
    mut players: Query<
        (&mut Transform, Option<&mut Velocity>),
        (With<ControlledPlayer>, Without<Disabled>),
    >,
) {
    for (mut transform, velocity) in players.iter_mut() {
        if let Some(mut velocity) = velocity {
            *velocity = Velocity::ZERO;
        }
        player_step(&config.flight, &mut transform, &input, clock.delta);
    }
}
