//! HTTP entry point.
//!
//! Every agent exposes the same two endpoints; a passenger call can enter the
//! fleet through any of them. The handlers only translate between JSON bodies
//! and store writes: `/elevator_call` reads the fleet's liveness snapshots,
//! asks the dispatcher for a car, and writes the passenger under the winning
//! agent's `wait/` key; `/maintenance` writes the operator's flag under
//! `maintenance/`. The bodies are decoded by hand so a malformed request
//! answers `500` with a readable message rather than a framework rejection.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::config;
use crate::dispatch;
use crate::passenger::Passenger;
use crate::print;
use crate::status::ElevatorStatus;
use crate::store::{Store, StoreNode};

/// Operator request to toggle maintenance mode, echoed back on success.
///
/// All fields are strings on the wire, `maintenance` being `"true"` or
/// `"false"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRequest {
    /// Id of the elevator to toggle
    pub elevator_id: String,
    /// Group of the elevator to toggle
    pub group_id: String,
    /// `"true"` to take the elevator out of service, `"false"` to return it
    pub maintenance: String,
}

/// Builds the router serving `/elevator_call` and `/maintenance` against the
/// given store handle.
pub fn router(store: Arc<dyn Store>) -> Router {
    Router::new()
        .route("/elevator_call", post(handle_elevator_call))
        .route("/maintenance", post(handle_maintenance))
        .with_state(store)
}

/// Binds `host:port` and serves the API until `shutdown` fires.
pub async fn serve(
    host: &str,
    port: u16,
    store: Arc<dyn Store>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    print::ok(format!("HTTP API listening on {}:{}", host, port));

    axum::serve(listener, router(store))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}

/// Handles the passenger's request for an elevator.
async fn handle_elevator_call(State(store): State<Arc<dyn Store>>, body: String) -> Response {
    let p: Passenger = match serde_json::from_str(&body) {
        Ok(p) => p,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error decoding passenger request: {}\n", e),
            )
                .into_response();
        }
    };

    let nodes = match store.list(config::STATUS_PREFIX).await {
        Ok(nodes) => nodes,
        Err(e) => {
            print::err(format!("Could not read fleet statuses: {}", e));
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error reading fleet statuses\n".to_string(),
            )
                .into_response();
        }
    };

    let statuses = decode_statuses(&nodes);

    let Some(assignment) = dispatch::find_elevator(&statuses, &p) else {
        print::warn("Could not schedule passenger. All elevators are busy.".to_string());
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };

    let passenger_json = match serde_json::to_string(&p) {
        Ok(json) => json,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error encoding passenger: {}\n", e),
            )
                .into_response();
        }
    };

    let wait_key = format!(
        "{}{}-{}",
        config::WAIT_PREFIX,
        assignment.group_id,
        assignment.elevator_id
    );
    if let Err(e) = store.set(&wait_key, &passenger_json, None).await {
        print::err(format!(
            "Could not assign passenger to elevator {}: {}",
            assignment.elevator_id, e
        ));
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error assigning passenger\n".to_string(),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "elevatorId": assignment.elevator_id.to_string(),
            "groupId": assignment.group_id.to_string(),
        })),
    )
        .into_response()
}

/// Handles a request to put an elevator in or out of maintenance mode.
async fn handle_maintenance(State(store): State<Arc<dyn Store>>, body: String) -> Response {
    let request: MaintenanceRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error decoding maintenance request: {}\n", e),
            )
                .into_response();
        }
    };

    let key = format!(
        "{}{}-{}",
        config::MAINTENANCE_PREFIX,
        request.group_id,
        request.elevator_id
    );
    if let Err(e) = store.set(&key, &request.maintenance, None).await {
        print::err(format!("Could not set maintenance mode: {}", e));
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error setting maintenance mode\n".to_string(),
        )
            .into_response();
    }

    (StatusCode::OK, Json(request)).into_response()
}

/// Decodes the fleet's liveness snapshots into the dispatcher's input map.
/// Malformed snapshots are skipped; one broken agent must not take the fleet
/// offline.
fn decode_statuses(nodes: &[StoreNode]) -> HashMap<i32, ElevatorStatus> {
    nodes
        .iter()
        .filter_map(|node| serde_json::from_str::<ElevatorStatus>(&node.value).ok())
        .map(|status| (status.id, status))
        .collect()
}
