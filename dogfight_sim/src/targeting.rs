use bevy::{ecs::system::ParallelCommands, prelude::*};

use crate::{
    components::{alignment, forward, Combatant, Disabled, Pilot, TargetAssignment},
    simulation_config::SimulationConfig,
};

/// Position of every live combatant, captured once per tick and shared by all seekers.
#[derive(Debug, Clone, Default)]
pub struct CandidateSnapshot {
    pub candidates: Vec<(Entity, Vec3)>,
}

impl CandidateSnapshot {
    pub fn new(mut candidates: Vec<(Entity, Vec3)>) -> Self {
        candidates.sort_unstable_by_key(|(entity, _)| *entity);
        Self { candidates }
    }
}

/// Picks at most one target for a seeker at `position` facing `heading`.
///
/// The first candidate at non-zero distance is taken unconditionally. Later
/// candidates replace it only when they are inside the engagement radius and
/// strictly better aligned with the seeker's nose; ties keep the earlier pick.
pub fn select_target(
    position: Vec3,
    heading: Vec3,
    snapshot: &CandidateSnapshot,
    engagement_radius_sq: f32,
) -> Option<Entity> {
    let mut best: Option<(Entity, Vec3)> = None;
    for &(candidate, candidate_position) in &snapshot.candidates {
        let distance_sq = position.distance_squared(candidate_position);
        if distance_sq == 0.0 {
            continue;
        }
        match best {
            None => best = Some((candidate, candidate_position)),
            Some((_, best_position)) => {
                let best_alignment = alignment(position, heading, best_position);
                let candidate_alignment = alignment(position, heading, candidate_position);
                if distance_sq < engagement_radius_sq && candidate_alignment > best_alignment {
                    best = Some((candidate, candidate_position));
                }
            }
        }
    }
    best.map(|(entity, _)| entity)
}

/// Assigns targets to idle pilots from a single read-only candidate snapshot.
pub fn find_targets(
    config: Res<SimulationConfig>,
    par_commands: ParallelCommands,
    candidates: Query<(Entity, &Transform), (With<Combatant>, Without<Disabled>)>,
    seekers: Query<
        (Entity, &Transform),
        (With<Pilot>, Without<TargetAssignment>, Without<Disabled>),
    >,
) {
    let snapshot = CandidateSnapshot::new(
        candidates
            .iter()
            .map(|(entity, transform)| (entity, transform.translation))
            .collect(),
    );
    let radius_sq = config.targeting.engagement_radius_sq();
    let snapshot = &snapshot;

    seekers.par_iter().for_each(|(entity, transform)| {
        let heading = forward(transform.rotation);
        if let Some(target) = select_target(transform.translation, heading, snapshot, radius_sq) {
            par_commands.command_scope(|mut commands| {
                commands
                    .entity(entity)
                    .try_insert(TargetAssignment { target });
            });
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::tasks::{ComputeTaskPool, TaskPool};
    use bevy_ecs::system::RunSystemOnce;

    fn entity(index: u32) -> Entity {
        Entity::from_raw(index)
    }

    #[test]
    fn first_candidate_wins_without_competition() {
        let snapshot = CandidateSnapshot::new(vec![(entity(1), Vec3::new(0.0, 0.0, -900.0))]);
        let picked = select_target(Vec3::ZERO, Vec3::Z, &snapshot, 160_000.0);
        assert_eq!(picked, Some(entity(1)), "range only gates replacements");
    }

    #[test]
    fn self_at_zero_distance_is_skipped() {
        let snapshot = CandidateSnapshot::new(vec![
            (entity(1), Vec3::ZERO),
            (entity(2), Vec3::new(10.0, 0.0, 0.0)),
        ]);
        assert_eq!(
            select_target(Vec3::ZERO, Vec3::Z, &snapshot, 160_000.0),
            Some(entity(2))
        );
    }

    #[test]
    fn better_aligned_candidate_in_range_replaces_first() {
        let snapshot = CandidateSnapshot::new(vec![
            (entity(1), Vec3::new(50.0, 0.0, 0.0)),
            (entity(2), Vec3::new(0.0, 0.0, 300.0)),
        ]);
        assert_eq!(
            select_target(Vec3::ZERO, Vec3::Z, &snapshot, 160_000.0),
            Some(entity(2))
        );
    }

    #[test]
    fn candidates_outside_envelope_never_upgrade() {
        let snapshot = CandidateSnapshot::new(vec![
            (entity(1), Vec3::new(50.0, 0.0, 0.0)),
            (entity(2), Vec3::new(0.0, 0.0, 400.0)),
            (entity(3), Vec3::new(0.0, 0.0, 1_000.0)),
        ]);
        assert_eq!(
            select_target(Vec3::ZERO, Vec3::Z, &snapshot, 160_000.0),
            Some(entity(1)),
            "exactly 400 units is outside the strict envelope"
        );
    }

    #[test]
    fn equal_alignment_keeps_first_found() {
        let snapshot = CandidateSnapshot::new(vec![
            (entity(1), Vec3::new(0.0, 0.0, 100.0)),
            (entity(2), Vec3::new(0.0, 0.0, 200.0)),
        ]);
        assert_eq!(
            select_target(Vec3::ZERO, Vec3::Z, &snapshot, 160_000.0),
            Some(entity(1))
        );
    }

    #[test]
    fn selection_is_repeatable() {
        let snapshot = CandidateSnapshot::new(
            (1..40)
                .map(|i| {
                    let angle = i as f32 * 0.37;
                    (entity(i), Vec3::new(angle.cos(), angle.sin(), 0.5) * (i as f32 * 9.0))
                })
                .collect(),
        );
        let first = select_target(Vec3::ONE, Vec3::Y, &snapshot, 160_000.0);
        for _ in 0..10 {
            assert_eq!(select_target(Vec3::ONE, Vec3::Y, &snapshot, 160_000.0), first);
        }
    }

    #[test]
    fn find_targets_skips_disabled_candidates() {
        ComputeTaskPool::get_or_init(TaskPool::default);
        let mut world = World::default();
        world.insert_resource(SimulationConfig::default());
        let seeker = world
            .spawn((Combatant, Pilot, Transform::from_xyz(0.0, 0.0, 0.0)))
            .id();
        let downed = world
            .spawn((
                Combatant,
                Disabled::default(),
                Transform::from_xyz(0.0, 0.0, 20.0),
            ))
            .id();
        let live = world
            .spawn((Combatant, Transform::from_xyz(30.0, 0.0, 0.0)))
            .id();

        world.run_system_once(find_targets);

        let assignment = world.get::<TargetAssignment>(seeker).copied();
        assert_eq!(assignment, Some(TargetAssignment { target: live }));
        assert!(world.get::<TargetAssignment>(downed).is_none());
    }
}
