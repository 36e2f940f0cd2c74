//! Timed travel between connected locations

use log::debug;

use crate::coroutine::{Coroutine, CoroutineError, Instruction, Step};
use crate::entity::{Combatant, UserId};
use crate::events::SimEvent;
use crate::foundation::math::{distance, Point3};
use crate::world::WorldState;

/// Rejected travel commands
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TravelError {
    /// The player is not logged in
    #[error("player {0} is not active")]
    NotActive(UserId),

    /// Dead players stay put
    #[error("dead players cannot travel")]
    Dead,

    /// A travel is already under way
    #[error("already travelling")]
    AlreadyMoving,

    /// No such location
    #[error("unknown location '{0}'")]
    UnknownLocation(String),

    /// The current location has no visible connection to the destination
    #[error("no route from '{from}' to '{to}'")]
    NoConnection {
        /// Current location
        from: String,
        /// Requested destination
        to: String,
    },

    /// The connection exists but its condition is not met
    #[error("the way to '{0}' is locked")]
    Locked(String),
}

/// Seconds needed to cover the straight line between two points
///
/// Speed is floored at `min_speed` so a zero speed still arrives eventually.
pub fn travel_duration(from: &Point3, to: &Point3, speed: f32, min_speed: f32) -> f32 {
    distance(from, to) / speed.max(min_speed)
}

/// Travel coroutine
///
/// Waits in slices of at most `interval` seconds, reporting progress between
/// them, then moves the player. Slices never exceed one second. It stops
/// early if the player logs out or dies.
pub struct Travel {
    name: String,
    user: UserId,
    to: String,
    remaining: f32,
    interval: f32,
    pending_wait: Option<f32>,
}

impl Travel {
    /// Travel of `user` to `to` lasting `duration` seconds
    pub fn new(user: UserId, to: impl Into<String>, duration: f32, interval: f32) -> Self {
        let to = to.into();
        Self {
            name: format!("travel:{user}:{to}"),
            user,
            to,
            remaining: duration,
            interval: interval.clamp(f32::EPSILON, 1.0),
            pending_wait: None,
        }
    }
}

impl Coroutine<WorldState> for Travel {
    fn name(&self) -> &str {
        &self.name
    }

    fn resume(&mut self, world: &mut WorldState) -> Result<Step, CoroutineError> {
        let Some(player) = world.players.get_mut(&self.user) else {
            debug!("Travel of player {} to {} dropped, player left", self.user, self.to);
            return Ok(Step::Complete);
        };

        if player.is_dead() {
            player.set_moving(false);
            world.events.send(SimEvent::TravelAborted { user: self.user, to: self.to.clone() });
            return Ok(Step::Complete);
        }

        if let Some(waited) = self.pending_wait.take() {
            self.remaining -= waited;
            if self.remaining > 0.0 {
                world.events.send(SimEvent::TravelProgress {
                    user: self.user,
                    to: self.to.clone(),
                    remaining: self.remaining,
                });
            }
        }

        if self.remaining <= 0.0 {
            player.relocate(self.to.clone());
            player.set_moving(false);
            debug!("{} arrived at {}", player.name(), self.to);
            world.events.send(SimEvent::TravelArrived { user: self.user, location: self.to.clone() });
            return Ok(Step::Complete);
        }

        let wait = self.remaining.min(self.interval);
        self.pending_wait = Some(wait);
        Ok(Step::Yield(Instruction::Wait(wait)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::point_from;
    use approx::assert_relative_eq;

    #[test]
    fn test_duration_is_distance_over_speed() {
        let a = point_from([0.0, 0.0, 0.0]);
        let b = point_from([30.0, 0.0, 40.0]);
        assert_relative_eq!(travel_duration(&a, &b, 5.0, 0.01), 10.0);
    }

    #[test]
    fn test_zero_speed_is_floored() {
        let a = point_from([0.0, 0.0, 0.0]);
        let b = point_from([1.0, 0.0, 0.0]);
        assert_relative_eq!(travel_duration(&a, &b, 0.0, 0.5), 2.0);
    }
}
