//! # config.rs – Centralized Parameter Store
//!
//! This module holds all static program parameters used throughout the system.
//! Keeping configuration in one place makes tuning, experimentation, and testing easier.

use std::sync::Mutex;
use std::time::Duration;
use once_cell::sync::Lazy;

//
// ──────────────────────────────────────────────────────────────
//   1. TIMING
// ──────────────────────────────────────────────────────────────
//

/// Period between two passes of an agent's state machine
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// TTL on the liveness status key. Must stay at least 2x [TICK_PERIOD]
/// so one slow tick does not evict the agent from the dispatcher's view.
pub const STATUS_TTL: Duration = Duration::from_secs(2);

/// Timeout for a single request against the coordination store
pub const STORE_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Deadline for client-side HTTP calls between agents
pub const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

/// First delay before re-establishing a failed store watch
pub const WATCH_BACKOFF_BASE: Duration = Duration::from_millis(250);

/// Upper bound on the watch reconnect delay
pub const WATCH_BACKOFF_MAX: Duration = Duration::from_secs(8);

/// Consecutive watch failures tolerated before the agent advertises ERROR
pub const WATCH_RETRY_BUDGET: u32 = 10;

//
// ──────────────────────────────────────────────────────────────
//   2. STORE KEY SCHEMA
// ──────────────────────────────────────────────────────────────
//

/// Durable status snapshots, one key per elevator, no TTL
pub const DURABLE_PREFIX: &str = "elevators/";

/// Liveness status snapshots, one key per elevator, TTL-bounded
pub const STATUS_PREFIX: &str = "elevator_status/";

/// Passenger assignment targets. A write under here wakes the owning agent.
pub const WAIT_PREFIX: &str = "wait/";

/// Maintenance flags, boolean strings `"true"` / `"false"`
pub const MAINTENANCE_PREFIX: &str = "maintenance/";

//
// ──────────────────────────────────────────────────────────────
//   3. FLEET DEFAULTS
// ──────────────────────────────────────────────────────────────
//

/// Default number of elevators in the fleet
pub const DEFAULT_ELEVATOR_COUNT: usize = 2;

/// Default number of elevator groups (banks)
pub const DEFAULT_GROUP_COUNT: i32 = 1;

/// Default bottom floor an elevator can access
pub const DEFAULT_MIN_FLOOR: i32 = 1;

/// Default top floor an elevator can access
pub const DEFAULT_MAX_FLOOR: i32 = 16;

/// Default advisory capacity in persons
pub const DEFAULT_MAX_CAPACITY: usize = 16;

/// Default URL of the coordination store. `mem://` selects the in-process backend.
pub const DEFAULT_STORE_URL: &str = "http://localhost:2379";

/// Host every agent's HTTP listener binds to
pub const DEFAULT_LISTEN_HOST: &str = "127.0.0.1";

/// First agent HTTP port; agent `i` listens on `DEFAULT_PORT_BASE + i`
pub const DEFAULT_PORT_BASE: u16 = 8080;

//
// ──────────────────────────────────────────────────────────────
//   4. LOGGING CONFIGURATION
// ──────────────────────────────────────────────────────────────
//

/// Enable/disable the per-tick status line of every agent
pub static PRINT_TICK_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of errors
pub static PRINT_ERR_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of warnings
pub static PRINT_WARN_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of success messages
pub static PRINT_OK_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of general info
pub static PRINT_INFO_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));
