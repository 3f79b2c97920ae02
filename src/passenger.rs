//! Passenger value type shared by every component.

use serde::{Deserialize, Serialize};

/// A passenger request: where the passenger stands and where they want to go.
///
/// Immutable after creation. `current_floor != destination_floor` is validated
/// where the request enters the system; the state machine trusts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passenger {
    /// The floor the passenger is currently on
    pub current_floor: i32,

    /// The floor the passenger wants to go to
    pub destination_floor: i32,
}

impl Passenger {
    /// Creates a new passenger request.
    pub fn new(current_floor: i32, destination_floor: i32) -> Self {
        Self { current_floor, destination_floor }
    }
}
