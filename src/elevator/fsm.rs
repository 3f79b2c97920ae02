//! The per-tick state machine.
//!
//! [advance] moves an elevator's status one tick forward. It is a total
//! function over the current status and never fails; everything it needs is
//! already in the snapshot and the floor limits. All mutation happens under
//! the agent mutex held by the caller, so the functions here can stay plain
//! and synchronous.

use crate::passenger::Passenger;
use crate::status::{ElevatorState, ElevatorStatus};

/// Static per-elevator limits the state machine moves within.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Bottom floor the elevator can access
    pub min_floor: i32,
    /// Top floor the elevator can access
    pub max_floor: i32,
    /// Advisory capacity; boarding stops here and resumes on a later pass
    pub max_capacity: usize,
}

/// Advances the elevator one tick.
///
/// The next state is determined by the current state and the passengers
/// aboard and waiting. `current_floor` always stays within
/// `[min_floor, max_floor]` afterwards.
pub fn advance(status: &mut ElevatorStatus, limits: &Limits) {
    match status.current_state {
        // Idling: wait until the dispatcher routes someone here.
        ElevatorState::Idle => {
            if let Some(p) = status.waiting.first() {
                status.current_state = if p.current_floor > status.current_floor {
                    ElevatorState::MovingUp
                } else if p.current_floor < status.current_floor {
                    ElevatorState::MovingDown
                } else {
                    ElevatorState::Loading
                };
            }
        }

        ElevatorState::MovingUp => {
            if !status.passengers.is_empty()
                || !status.waiting.is_empty()
                || status.current_floor < limits.max_floor
            {
                if status.current_floor >= limits.max_floor {
                    // Work remains but no upward move is possible.
                    status.current_state = ElevatorState::Idle;
                    return;
                }
                status.current_floor += 1;

                if unload_count(status) > 0 {
                    status.current_state = ElevatorState::Unloading;
                    return;
                }
                if load_count(status) > 0 {
                    status.current_state = ElevatorState::Loading;
                }
            } else {
                status.current_state = ElevatorState::Idle;
            }
        }

        ElevatorState::MovingDown => {
            if !status.passengers.is_empty()
                || !status.waiting.is_empty()
                || status.current_floor > limits.min_floor
            {
                if status.current_floor <= limits.min_floor {
                    status.current_state = ElevatorState::Idle;
                    return;
                }
                status.current_floor -= 1;

                if unload_count(status) > 0 {
                    status.current_state = ElevatorState::Unloading;
                    return;
                }
                if load_count(status) > 0 {
                    status.current_state = ElevatorState::Loading;
                }
            } else {
                status.current_state = ElevatorState::Idle;
            }
        }

        ElevatorState::Loading => {
            load_passengers(status, limits);

            // Passengers are loaded, now decide which direction we were going in.
            // If nobody boarded (a race with the watcher), stay in Loading and
            // re-evaluate next tick.
            if let Some(p) = status.passengers.first() {
                status.current_state = if p.destination_floor > status.current_floor {
                    ElevatorState::MovingUp
                } else {
                    ElevatorState::MovingDown
                };
            }
        }

        ElevatorState::Unloading => {
            unload_passengers(status);

            // Aboard passengers have priority; then waiting passengers; then idle.
            if let Some(p) = status.passengers.first() {
                status.current_state = if p.destination_floor > status.current_floor {
                    ElevatorState::MovingUp
                } else if p.destination_floor < status.current_floor {
                    ElevatorState::MovingDown
                } else {
                    ElevatorState::Idle
                };
            } else if let Some(p) = status.waiting.first() {
                status.current_state = if p.current_floor > status.current_floor {
                    ElevatorState::MovingUp
                } else if p.current_floor < status.current_floor {
                    ElevatorState::MovingDown
                } else {
                    ElevatorState::Loading
                };
            } else {
                status.current_state = ElevatorState::Idle;
            }
        }

        // Out of service: anyone still aboard is discharged right here,
        // whatever their destination. Waiting passengers are kept but not
        // served until the operator clears the flag.
        ElevatorState::Maintenance => {
            status.passengers.clear();
        }

        ElevatorState::Error => {}
    }
}

/// Appends a freshly routed passenger to the waiting list and extends the
/// advertised commitment.
///
/// The target floor is the furthest floor, in the direction of the new
/// passenger, the elevator now has to reach; the dispatcher reads it to
/// reason about opportunistic pickups.
pub fn add_waiting(status: &mut ElevatorStatus, p: Passenger) {
    if status.waiting.is_empty() {
        status.current_target_floor = p.destination_floor;
    } else if p.current_floor > status.current_floor {
        status.current_target_floor = status.current_target_floor.max(p.destination_floor);
    } else if p.current_floor < status.current_floor {
        status.current_target_floor = status.current_target_floor.min(p.destination_floor);
    }
    status.waiting.push(p);
}

/// Boards every waiting passenger standing on the current floor, in arrival
/// order, stopping at the capacity limit. Everyone else keeps waiting.
fn load_passengers(status: &mut ElevatorStatus, limits: &Limits) {
    let mut still_waiting = Vec::with_capacity(status.waiting.len());

    for p in std::mem::take(&mut status.waiting) {
        if p.current_floor == status.current_floor && status.passengers.len() < limits.max_capacity
        {
            status.passengers.push(p);
        } else {
            still_waiting.push(p);
        }
    }
    status.waiting = still_waiting;
}

/// Discharges every aboard passenger whose destination is the current floor.
fn unload_passengers(status: &mut ElevatorStatus) {
    let floor = status.current_floor;
    status.passengers.retain(|p| p.destination_floor != floor);
}

/// Number of aboard passengers to discharge at the current floor.
fn unload_count(status: &ElevatorStatus) -> usize {
    status
        .passengers
        .iter()
        .filter(|p| p.destination_floor == status.current_floor)
        .count()
}

/// Number of waiting passengers to board at the current floor.
fn load_count(status: &ElevatorStatus) -> usize {
    status
        .waiting
        .iter()
        .filter(|p| p.current_floor == status.current_floor)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: Limits = Limits { min_floor: 1, max_floor: 16, max_capacity: 16 };

    fn base_status() -> ElevatorStatus {
        ElevatorStatus::new(0, 0, 1)
    }

    #[test]
    fn moves_up_towards_waiting_passenger() {
        let mut status = base_status();
        add_waiting(&mut status, Passenger::new(2, 4));

        advance(&mut status, &LIMITS);

        assert_eq!(status.current_state, ElevatorState::MovingUp);
    }

    #[test]
    fn moves_down_towards_waiting_passenger() {
        let mut status = base_status();
        status.current_floor = 5;
        add_waiting(&mut status, Passenger::new(2, 1));

        advance(&mut status, &LIMITS);

        assert_eq!(status.current_state, ElevatorState::MovingDown);
    }

    #[test]
    fn loads_on_the_spot_and_moves_down() {
        let mut status = base_status();
        status.current_floor = 3;
        add_waiting(&mut status, Passenger::new(3, 1));

        advance(&mut status, &LIMITS);
        assert_eq!(status.current_state, ElevatorState::Loading);

        advance(&mut status, &LIMITS);
        assert_eq!(status.passengers.len(), 1);
        assert!(status.waiting.is_empty());
        assert_eq!(status.current_state, ElevatorState::MovingDown);
    }

    #[test]
    fn unloads_then_turns_towards_waiting_passenger() {
        let mut status = base_status();
        status.current_state = ElevatorState::MovingDown;
        status.current_floor = 3;
        status.passengers.push(Passenger::new(8, 2));
        add_waiting(&mut status, Passenger::new(3, 1));

        advance(&mut status, &LIMITS);
        assert_eq!(status.current_state, ElevatorState::Unloading);
        assert_eq!(status.current_floor, 2);

        advance(&mut status, &LIMITS);
        assert!(status.passengers.is_empty());
        assert_eq!(status.current_state, ElevatorState::MovingUp);
    }

    #[test]
    fn walks_up_to_a_call_and_delivers() {
        // A single car parked at the bottom serves an 8 -> 16 call.
        let mut status = base_status();
        add_waiting(&mut status, Passenger::new(8, 16));

        advance(&mut status, &LIMITS);
        assert_eq!(status.current_state, ElevatorState::MovingUp);

        for expected_floor in 2..=8 {
            advance(&mut status, &LIMITS);
            assert_eq!(status.current_floor, expected_floor);
        }
        assert_eq!(status.current_state, ElevatorState::Loading);

        advance(&mut status, &LIMITS);
        assert_eq!(status.current_state, ElevatorState::MovingUp);
        assert_eq!(status.passengers.len(), 1);

        for expected_floor in 9..=16 {
            advance(&mut status, &LIMITS);
            assert_eq!(status.current_floor, expected_floor);
        }
        assert_eq!(status.current_state, ElevatorState::Unloading);

        advance(&mut status, &LIMITS);
        assert!(status.passengers.is_empty());
        assert_eq!(status.current_state, ElevatorState::Idle);
    }

    #[test]
    fn loads_immediately_when_call_is_on_the_spot() {
        let mut status = base_status();
        status.current_floor = 16;
        add_waiting(&mut status, Passenger::new(16, 1));

        advance(&mut status, &LIMITS);
        assert_eq!(status.current_state, ElevatorState::Loading);

        advance(&mut status, &LIMITS);
        assert_eq!(status.current_state, ElevatorState::MovingDown);
    }

    #[test]
    fn floor_stays_within_limits() {
        let mut status = base_status();
        status.current_floor = 16;
        status.current_state = ElevatorState::MovingUp;
        // A passenger is aboard, so the movement guard holds, but there is no
        // floor above to move to.
        status.passengers.push(Passenger::new(1, 16));

        advance(&mut status, &LIMITS);
        assert_eq!(status.current_floor, 16);
        assert_eq!(status.current_state, ElevatorState::Idle);

        let mut status = base_status();
        status.current_state = ElevatorState::MovingDown;
        status.passengers.push(Passenger::new(16, 1));

        advance(&mut status, &LIMITS);
        assert_eq!(status.current_floor, 1);
        assert_eq!(status.current_state, ElevatorState::Idle);
    }

    #[test]
    fn empty_mover_returns_to_idle() {
        let mut status = base_status();
        status.current_floor = 16;
        status.current_state = ElevatorState::MovingUp;

        advance(&mut status, &LIMITS);
        assert_eq!(status.current_state, ElevatorState::Idle);
        assert_eq!(status.current_floor, 16);
    }

    #[test]
    fn maintenance_discharges_everyone_and_stays_put() {
        let mut status = base_status();
        status.current_state = ElevatorState::Maintenance;
        status.current_floor = 7;
        status.passengers.push(Passenger::new(5, 12));
        add_waiting(&mut status, Passenger::new(3, 1));

        advance(&mut status, &LIMITS);

        assert!(status.passengers.is_empty());
        assert_eq!(status.current_floor, 7);
        assert_eq!(status.current_state, ElevatorState::Maintenance);
        // Routed passengers are stranded until the operator clears the flag.
        assert_eq!(status.waiting.len(), 1);

        // Another tick changes nothing.
        advance(&mut status, &LIMITS);
        assert_eq!(status.current_state, ElevatorState::Maintenance);
    }

    #[test]
    fn error_state_never_moves() {
        let mut status = base_status();
        status.current_state = ElevatorState::Error;
        add_waiting(&mut status, Passenger::new(8, 16));

        advance(&mut status, &LIMITS);

        assert_eq!(status.current_state, ElevatorState::Error);
        assert_eq!(status.current_floor, 1);
    }

    #[test]
    fn boarding_stops_at_capacity_and_resumes_later() {
        let limits = Limits { min_floor: 1, max_floor: 16, max_capacity: 2 };
        let mut status = base_status();
        status.current_floor = 3;
        status.current_state = ElevatorState::Loading;
        add_waiting(&mut status, Passenger::new(3, 8));
        add_waiting(&mut status, Passenger::new(3, 9));
        add_waiting(&mut status, Passenger::new(3, 10));

        advance(&mut status, &limits);

        assert_eq!(status.passengers.len(), 2);
        assert_eq!(status.waiting.len(), 1);
        assert_eq!(status.passengers[0].destination_floor, 8);
        assert_eq!(status.passengers[1].destination_floor, 9);
        assert_eq!(status.current_state, ElevatorState::MovingUp);

        // After the first two are delivered, a later pass picks up the rest.
        status.passengers.clear();
        status.current_state = ElevatorState::Loading;
        advance(&mut status, &limits);
        assert_eq!(status.passengers.len(), 1);
        assert!(status.waiting.is_empty());
    }

    #[test]
    fn boarding_preserves_arrival_order() {
        let mut status = base_status();
        status.current_floor = 4;
        status.current_state = ElevatorState::Loading;
        add_waiting(&mut status, Passenger::new(4, 10));
        add_waiting(&mut status, Passenger::new(6, 1));
        add_waiting(&mut status, Passenger::new(4, 12));

        advance(&mut status, &LIMITS);

        assert_eq!(status.passengers.len(), 2);
        assert_eq!(status.passengers[0].destination_floor, 10);
        assert_eq!(status.passengers[1].destination_floor, 12);
        assert_eq!(status.waiting.len(), 1);
        assert_eq!(status.waiting[0].current_floor, 6);
    }

    #[test]
    fn empty_loading_pass_stays_loading() {
        let mut status = base_status();
        status.current_state = ElevatorState::Loading;
        status.current_floor = 4;
        // The routed passenger has not arrived on the waiting list yet.
        advance(&mut status, &LIMITS);
        assert_eq!(status.current_state, ElevatorState::Loading);
    }

    #[test]
    fn target_floor_tracks_furthest_commitment() {
        let mut status = base_status();
        status.current_floor = 5;

        add_waiting(&mut status, Passenger::new(8, 10));
        assert_eq!(status.current_target_floor, 10);

        // Above the car: the commitment can only grow.
        add_waiting(&mut status, Passenger::new(9, 14));
        assert_eq!(status.current_target_floor, 14);
        add_waiting(&mut status, Passenger::new(7, 12));
        assert_eq!(status.current_target_floor, 14);

        // Below the car: the commitment shrinks towards the bottom.
        add_waiting(&mut status, Passenger::new(3, 1));
        assert_eq!(status.current_target_floor, 1);
    }

    #[test]
    fn target_floor_resets_with_first_passenger() {
        let mut status = base_status();
        status.current_floor = 5;
        add_waiting(&mut status, Passenger::new(8, 16));
        assert_eq!(status.current_target_floor, 16);

        status.waiting.clear();
        add_waiting(&mut status, Passenger::new(2, 3));
        assert_eq!(status.current_target_floor, 3);
    }

    #[test]
    fn open_work_never_grows_during_delivery() {
        let mut status = base_status();
        add_waiting(&mut status, Passenger::new(4, 9));
        add_waiting(&mut status, Passenger::new(6, 2));

        let mut open = status.passengers.len() + status.waiting.len();
        for _ in 0..64 {
            advance(&mut status, &LIMITS);
            let now = status.passengers.len() + status.waiting.len();
            assert!(now <= open, "open work grew from {} to {}", open, now);
            assert!(status.current_floor >= LIMITS.min_floor);
            assert!(status.current_floor <= LIMITS.max_floor);
            open = now;
        }
        assert_eq!(open, 0, "passengers were never delivered");
    }
}
