//! HTTP client helpers for the operator loop.
//!
//! The operator does not get to pick which agent serves a request; any agent
//! can take it. Requests rotate over the fleet's ports with a monotonic
//! round-robin counter, and every call carries a short deadline so one dead
//! agent only costs one timeout.

use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::config;
use crate::http_api::MaintenanceRequest;
use crate::passenger::Passenger;

static CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(config::CLIENT_TIMEOUT)
        .build()
        .expect("Failed to build the agent HTTP client")
});

static NEXT_AGENT: AtomicUsize = AtomicUsize::new(0);

/// Result of a successful `/elevator_call`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResult {
    /// Id of the assigned elevator, as a string on the wire
    pub elevator_id: String,
    /// Group of the assigned elevator
    pub group_id: String,
}

/// Picks the next agent port, round-robin over the fleet.
pub fn next_port(ports: &[u16]) -> u16 {
    let index = NEXT_AGENT.fetch_add(1, Ordering::Relaxed);
    ports[index % ports.len()]
}

/// Sends a passenger call to the agent on `port` and returns the assignment.
pub async fn request_elevator(port: u16, p: &Passenger) -> Result<CallResult, reqwest::Error> {
    CLIENT
        .post(format!("http://localhost:{}/elevator_call", port))
        .json(p)
        .send()
        .await?
        .error_for_status()?
        .json::<CallResult>()
        .await
}

/// Sends a maintenance toggle to the agent on `port` and returns the echoed
/// request.
pub async fn request_maintenance(
    port: u16,
    elevator_id: i32,
    group_id: i32,
    maintenance: bool,
) -> Result<MaintenanceRequest, reqwest::Error> {
    let request = MaintenanceRequest {
        elevator_id: elevator_id.to_string(),
        group_id: group_id.to_string(),
        maintenance: maintenance.to_string(),
    };

    CLIENT
        .post(format!("http://localhost:{}/maintenance", port))
        .json(&request)
        .send()
        .await?
        .error_for_status()?
        .json::<MaintenanceRequest>()
        .await
}
