//! Elevator status snapshots.
//!
//! An [ElevatorStatus] is the observable state of one elevator at a point in time.
//! Agents publish serialized snapshots to the coordination store on every tick;
//! the dispatcher and the operator tooling only ever see these snapshots, never
//! a live reference.

/// JSON encoding helpers for snapshots and passengers
pub mod serial;

use serde::{Deserialize, Serialize};

use crate::passenger::Passenger;

/// The state an elevator is in between two ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElevatorState {
    /// Parked, no work queued
    Idle,
    /// Travelling one floor up per tick
    MovingUp,
    /// Travelling one floor down per tick
    MovingDown,
    /// Boarding waiting passengers at the current floor
    Loading,
    /// Discharging aboard passengers at the current floor
    Unloading,
    /// Taken out of service by an operator; does not respond to calls
    Maintenance,
    /// Unreachable or broken; does not respond to calls
    Error,
}

impl ElevatorState {
    /// Human-readable name, as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElevatorState::Idle => "IDLE",
            ElevatorState::MovingUp => "MOVING_UP",
            ElevatorState::MovingDown => "MOVING_DOWN",
            ElevatorState::Loading => "LOADING",
            ElevatorState::Unloading => "UNLOADING",
            ElevatorState::Maintenance => "MAINTENANCE",
            ElevatorState::Error => "ERROR",
        }
    }
}

/// Snapshot of one elevator's observable state.
///
/// Field names on the wire are stable; new fields must be additive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevatorStatus {
    /// Identifier of the elevator, unique within its group
    pub id: i32,

    /// Identifier of the group (bank) the elevator belongs to
    pub group_id: i32,

    /// Human-friendly identifier, `id + 1`
    pub display_id: i32,

    /// The floor the elevator is currently on
    pub current_floor: i32,

    /// The state the elevator is currently in
    pub current_state: ElevatorState,

    /// The furthest floor, in the current direction, the elevator has committed to reach
    pub current_target_floor: i32,

    /// Passengers currently aboard, in boarding order
    #[serde(default)]
    pub passengers: Vec<Passenger>,

    /// Passengers routed to this elevator but not yet boarded, in arrival order
    #[serde(rename = "waitingPassengers", default)]
    pub waiting: Vec<Passenger>,
}

impl ElevatorStatus {
    /// Creates a fresh status for an elevator parked at `floor`.
    pub fn new(id: i32, group_id: i32, floor: i32) -> Self {
        Self {
            id,
            group_id,
            display_id: id + 1,
            current_floor: floor,
            current_state: ElevatorState::Idle,
            current_target_floor: floor,
            passengers: Vec::new(),
            waiting: Vec::new(),
        }
    }

    /// The key uniquely identifying this elevator in the store, `<groupId>-<id>`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.group_id, self.id)
    }

    /// One-line human-readable summary, used for the per-tick status print.
    pub fn pretty(&self) -> String {
        format!(
            "Elevator {} is on floor {} in state {} with {} passengers and {} waiting passengers",
            self.display_id,
            self.current_floor,
            self.current_state.as_str(),
            self.passengers.len(),
            self.waiting.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip() {
        let mut status = ElevatorStatus::new(1, 0, 4);
        status.current_state = ElevatorState::MovingUp;
        status.current_target_floor = 12;
        status.passengers.push(Passenger::new(2, 12));
        status.waiting.push(Passenger::new(7, 1));

        let encoded = serial::encode_status(&status).expect("encode failed");
        let decoded = serial::decode_status(&encoded).expect("decode failed");

        assert_eq!(decoded.id, status.id);
        assert_eq!(decoded.group_id, status.group_id);
        assert_eq!(decoded.display_id, status.display_id);
        assert_eq!(decoded.current_floor, status.current_floor);
        assert_eq!(decoded.current_state, status.current_state);
        assert_eq!(decoded.current_target_floor, status.current_target_floor);
        assert_eq!(decoded.passengers, status.passengers);
        assert_eq!(decoded.waiting, status.waiting);
    }

    #[test]
    fn wire_field_names_are_stable() {
        let status = ElevatorStatus::new(0, 0, 1);
        let encoded = serial::encode_status(&status).expect("encode failed");
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();

        for field in [
            "id",
            "groupId",
            "displayId",
            "currentFloor",
            "currentState",
            "currentTargetFloor",
            "passengers",
            "waitingPassengers",
        ] {
            assert!(value.get(field).is_some(), "missing wire field {}", field);
        }
        assert_eq!(value["currentState"], "IDLE");
    }

    #[test]
    fn state_names_match_wire_encoding() {
        for state in [
            ElevatorState::Idle,
            ElevatorState::MovingUp,
            ElevatorState::MovingDown,
            ElevatorState::Loading,
            ElevatorState::Unloading,
            ElevatorState::Maintenance,
            ElevatorState::Error,
        ] {
            let encoded = serde_json::to_string(&state).unwrap();
            assert_eq!(encoded, format!("\"{}\"", state.as_str()));
        }
    }
}
