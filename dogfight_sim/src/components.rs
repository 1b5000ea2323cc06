use bevy::prelude::*;

/// Anything that can be targeted and can collide as a ship: pilots and the player.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Combatant;

/// Ship flown by an autonomous agent.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Pilot;

/// The ship flown from [`crate::PlayerInput`]. Carries the scenario score.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlledPlayer {
    pub score: u32,
    pub points_to_win: u32,
}

impl ControlledPlayer {
    pub fn new(points_to_win: u32) -> Self {
        Self {
            score: 0,
            points_to_win,
        }
    }

    pub fn has_won(&self) -> bool {
        self.score >= self.points_to_win
    }
}

/// Static scenery. Disables ships and absorbs projectiles.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Obstacle {
    pub prefab: usize,
}

/// Projectile hits absorbed so far. `hits_taken` stays below `hits_to_kill`;
/// the hit that would reach it disables the ship instead.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitCounter {
    pub hits_taken: u32,
    pub hits_to_kill: u32,
}

impl HitCounter {
    pub fn new(hits_to_kill: u32) -> Self {
        Self {
            hits_taken: 0,
            hits_to_kill: hits_to_kill.max(1),
        }
    }

    pub fn health_percent(&self) -> u32 {
        let remaining = self.hits_to_kill.saturating_sub(self.hits_taken) as f32;
        (100.0 * remaining / self.hits_to_kill as f32).round() as u32
    }
}

/// Present from elimination until the episode step respawns the ship.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Disabled {
    pub killed_by_player: bool,
}

/// Current engagement. Dropped as soon as the target is gone or out of envelope.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetAssignment {
    pub target: Entity,
}

/// Seconds since the last shot for ships, seconds alive for projectiles.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct ShootingTimer {
    pub elapsed: f32,
}

/// Raised by combat timing, consumed by the projectile spawner in the same tick.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct NeedsToFire;

/// Player trigger state. Cooldown is measured against the simulation clock.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct TriggerLatch {
    pub held: bool,
    pub last_fired_at: Option<f64>,
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    pub origin: Entity,
    /// Unit direction captured at spawn; projectiles fly straight.
    pub heading: Vec3,
}

/// Projectile counts toward the controlled player's score.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PlayerOwned;

/// Linear and angular velocity integrated by the physics collaborator.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    pub linear: Vec3,
    pub angular: Vec3,
}

impl Velocity {
    pub const ZERO: Self = Self {
        linear: Vec3::ZERO,
        angular: Vec3::ZERO,
    };
}

/// Latest pitch/roll decision, in `[-1, 1]`.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct PilotControls {
    pub pitch: f32,
    pub roll: f32,
}

/// One-shot reward mailbox, written by combat timing and drained by delivery.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct RewardSignal {
    pending: Option<f32>,
}

impl RewardSignal {
    pub fn post(&mut self, value: f32) {
        self.pending = Some(value);
    }

    pub fn peek(&self) -> Option<f32> {
        self.pending
    }

    pub fn take(&mut self) -> Option<f32> {
        self.pending.take()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penalty {
    pub value: f32,
    pub ends_episode: bool,
}

/// One-shot penalty mailbox, written on elimination.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct PenaltySignal {
    pending: Option<Penalty>,
}

impl PenaltySignal {
    pub fn post(&mut self, penalty: Penalty) {
        self.pending = Some(penalty);
    }

    pub fn peek(&self) -> Option<Penalty> {
        self.pending
    }

    pub fn take(&mut self) -> Option<Penalty> {
        self.pending.take()
    }
}

/// Episode result attached to the entity that decided it. Lives for one tick.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub won: bool,
}

/// Nose direction of a ship or projectile. The local +Z axis is forward.
pub fn forward(rotation: Quat) -> Vec3 {
    rotation * Vec3::Z
}

/// Cosine of the angle between `forward` and the direction to `target`.
///
/// Coincident points yield `0.0` rather than NaN.
pub fn alignment(origin: Vec3, forward: Vec3, target: Vec3) -> f32 {
    forward.dot((target - origin).normalize_or_zero())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_percent_tracks_hits() {
        let mut counter = HitCounter::new(3);
        assert_eq!(counter.health_percent(), 100);
        counter.hits_taken = 1;
        assert_eq!(counter.health_percent(), 67);
        counter.hits_taken = 2;
        assert_eq!(counter.health_percent(), 33);
    }

    #[test]
    fn mailboxes_are_one_shot() {
        let mut reward = RewardSignal::default();
        reward.post(0.05);
        assert_eq!(reward.take(), Some(0.05));
        assert_eq!(reward.take(), None);

        let mut penalty = PenaltySignal::default();
        penalty.post(Penalty {
            value: -3.0,
            ends_episode: true,
        });
        assert!(penalty.take().is_some());
        assert!(penalty.peek().is_none());
    }

    #[test]
    fn alignment_is_one_straight_ahead() {
        let value = alignment(Vec3::ZERO, Vec3::Z, Vec3::new(0.0, 0.0, 50.0));
        assert!((value - 1.0).abs() < 1e-6);
        assert_eq!(alignment(Vec3::ONE, Vec3::Z, Vec3::ONE), 0.0);
    }
}
