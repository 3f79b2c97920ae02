//! Fleet-wide elevator selection.
//!
//! [find_elevator] is a pure function from a fleet snapshot and a passenger
//! call to the elevator that should service it. It does no I/O and takes no
//! locks; the HTTP entry feeds it value-copied snapshots read from the store.
//!
//! Candidates are weighed in three pools, in priority order: idle elevators,
//! elevators already moving the passenger's way, and finally any available
//! elevator by committed target floor. Every distance comparison tie-breaks
//! on the lowest elevator id, so the answer is deterministic regardless of
//! map iteration order.

use std::collections::HashMap;

use crate::passenger::Passenger;
use crate::status::{ElevatorState, ElevatorStatus};

/// The elevator chosen to service a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    /// Id of the chosen elevator
    pub elevator_id: i32,
    /// Group the chosen elevator belongs to
    pub group_id: i32,
}

/// Picks the elevator that should service `p`, or `None` when no elevator is
/// available.
///
/// Elevators in `MAINTENANCE` or `ERROR` never take part. Among the rest:
/// 1. the closest idle elevator and the closest elevator already moving in the
///    passenger's direction are determined;
/// 2. if both exist, whichever stands fewer floors from the passenger wins,
///    the idle one on equal distance;
/// 3. if neither exists, the elevator whose committed target floor lies
///    closest to the passenger is taken as a fallback.
pub fn find_elevator(statuses: &HashMap<i32, ElevatorStatus>, p: &Passenger) -> Option<Assignment> {
    let available: HashMap<i32, &ElevatorStatus> = statuses
        .iter()
        .filter(|(_, es)| {
            !matches!(es.current_state, ElevatorState::Maintenance | ElevatorState::Error)
        })
        .map(|(id, es)| (*id, es))
        .collect();

    // If all are unavailable, bail out early.
    if available.is_empty() {
        return None;
    }

    let closest_idle = closest_idle_id(&available, p);
    let closest_directional = closest_directional_id(&available, p);

    let chosen = match (closest_idle, closest_directional) {
        (Some(idle_id), Some(dir_id)) => {
            let idle_test = (available[&idle_id].current_floor - p.current_floor).abs();
            let dir_test = (available[&dir_id].current_floor - p.current_floor).abs();
            // The idle candidate wins ties.
            if idle_test <= dir_test {
                Some(idle_id)
            } else {
                Some(dir_id)
            }
        }
        (Some(idle_id), None) => Some(idle_id),
        (None, Some(dir_id)) => Some(dir_id),
        // No idle and none moving the same direction: fall back to whichever
        // elevator's current target floor ends up closest to the passenger.
        (None, None) => closest_to_target_id(&available, p),
    };

    chosen.map(|id| Assignment {
        elevator_id: id,
        group_id: available[&id].group_id,
    })
}

/// Returns the idling elevator closest to the passenger, if any idles.
fn closest_idle_id(statuses: &HashMap<i32, &ElevatorStatus>, p: &Passenger) -> Option<i32> {
    statuses
        .values()
        .filter(|es| es.current_state == ElevatorState::Idle)
        .min_by_key(|es| ((es.current_floor - p.current_floor).abs(), es.id))
        .map(|es| es.id)
}

/// Returns the elevator already moving in the passenger's desired direction
/// with the fewest floors between it and the passenger.
///
/// When exactly one elevator moves that way it must additionally lie before
/// the passenger in its direction of travel, or it is rejected: it may
/// already have passed the pickup floor. No such positional filter is applied
/// when several elevators qualify.
fn closest_directional_id(statuses: &HashMap<i32, &ElevatorStatus>, p: &Passenger) -> Option<i32> {
    let direction = if p.current_floor > p.destination_floor {
        ElevatorState::MovingDown
    } else {
        ElevatorState::MovingUp
    };

    let same_direction: Vec<&&ElevatorStatus> = statuses
        .values()
        .filter(|es| es.current_state == direction)
        .collect();

    if same_direction.is_empty() {
        return None;
    }

    if let [only] = same_direction.as_slice() {
        let before = match direction {
            ElevatorState::MovingUp => p.current_floor > only.current_floor,
            _ => p.current_floor < only.current_floor,
        };
        return before.then_some(only.id);
    }

    same_direction
        .iter()
        .min_by_key(|es| ((es.current_floor - p.current_floor).abs(), es.id))
        .map(|es| es.id)
}

/// Returns the elevator whose committed target floor is closest to the
/// passenger. Target floor is the highest or lowest point the elevator has
/// promised to reach for its current load.
fn closest_to_target_id(statuses: &HashMap<i32, &ElevatorStatus>, p: &Passenger) -> Option<i32> {
    statuses
        .values()
        .min_by_key(|es| ((es.current_target_floor - p.current_floor).abs(), es.id))
        .map(|es| es.id)
}
