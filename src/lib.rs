#![warn(missing_docs)]
//! # This projects library
//!
//! This library implements a distributed elevator-dispatch platform. Every elevator runs as an
//! autonomous agent owning its own motion and load state; the fleet cooperates through a shared
//! hierarchical key/value store with watch capability, and passenger calls can enter through any
//! agent's HTTP endpoint.
//!
//! ## Overview
//! - **Config**: Static parameters (timing, key schema, defaults).
//! - **Print**: Color-coded terminal logging with runtime toggles.
//! - **Init**: Argument parsing and per-agent configuration.
//! - **Passenger / Status**: The wire-level data model.
//! - **Store**: Coordination-store adapter (etcd v2 over HTTP, plus an in-process backend).
//! - **Elevator**: The per-agent state machine, tick loop and store watchers.
//! - **Dispatch**: Fleet-wide elevator selection for a passenger call.
//! - **HTTP API**: The `/elevator_call` and `/maintenance` endpoints.

/// Global parameters
pub mod config;

/// Print functions with color coding
pub mod print;

/// Startup argument parsing and agent configuration
pub mod init;

/// Passenger value type
pub mod passenger;

/// Elevator status snapshots and their JSON encoding
pub mod status;

/// Coordination-store adapter
pub mod store;

/// Elevator agent: state machine, tick loop and watchers
pub mod elevator;

/// Stateless fleet dispatcher
pub mod dispatch;

/// HTTP entry point for passenger calls and maintenance toggles
pub mod http_api;

/// HTTP client helpers for the operator loop
pub mod client;
