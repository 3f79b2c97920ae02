//! Serialization and deserialization for [ElevatorStatus] and [Passenger]
//!
//! The store and the HTTP endpoints both speak JSON, so these helpers are the
//! single place where the wire format is produced and consumed. Failures are
//! logged and surfaced as `None`; callers decide whether a missing value is
//! fatal or just a skipped snapshot.

use crate::passenger::Passenger;
use crate::print;
use crate::status::ElevatorStatus;

/// Serializes an `ElevatorStatus` into its JSON wire format.
///
/// ## Parameters
/// - `status`: A reference to the `ElevatorStatus` to be serialized.
///
/// ## Returns
/// - A `String` containing the JSON document, or `None` if serialization failed.
pub fn encode_status(status: &ElevatorStatus) -> Option<String> {
    match serde_json::to_string(status) {
        Ok(encoded) => Some(encoded),
        Err(e) => {
            print::err(format!("Serialization failed: {} (serial.rs, encode_status())", e));
            None
        }
    }
}

/// Deserializes an `ElevatorStatus` from its JSON wire format.
///
/// ## Parameters
/// - `data`: The JSON document.
///
/// ## Returns
/// - The reconstructed `ElevatorStatus`, or `None` if deserialization failed.
pub fn decode_status(data: &str) -> Option<ElevatorStatus> {
    match serde_json::from_str(data) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            print::err(format!("Deserialization failed: {} (serial.rs, decode_status())", e));
            None
        }
    }
}

/// Serializes a `Passenger` into its JSON wire format.
pub fn encode_passenger(passenger: &Passenger) -> Option<String> {
    match serde_json::to_string(passenger) {
        Ok(encoded) => Some(encoded),
        Err(e) => {
            print::err(format!("Serialization failed: {} (serial.rs, encode_passenger())", e));
            None
        }
    }
}

/// Deserializes a `Passenger` from its JSON wire format.
pub fn decode_passenger(data: &str) -> Option<Passenger> {
    match serde_json::from_str(data) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            print::err(format!("Deserialization failed: {} (serial.rs, decode_passenger())", e));
            None
        }
    }
}
