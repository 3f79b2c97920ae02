//! The elevator agent.
//!
//! An [Elevator] exclusively owns one [ElevatorStatus] behind a mutex and
//! advances it once per tick. Everything else talks to the agent through the
//! coordination store: the dispatcher routes passengers by writing under the
//! agent's `wait/` key, operators flip the `maintenance/` flag, and the agent
//! answers by publishing status snapshots on every tick.

/// The per-tick state machine
pub mod fsm;

mod watcher;

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};

use crate::config;
use crate::init::AgentConfig;
use crate::passenger::Passenger;
use crate::print;
use crate::status::{serial, ElevatorState, ElevatorStatus};
use crate::store::{Store, StoreError};

/// One elevator agent: status, limits, and its handle to the store.
pub struct Elevator {
    limits: fsm::Limits,
    status: Arc<Mutex<ElevatorStatus>>,
    pub(crate) store: Arc<dyn Store>,
    key: String,
}

impl Elevator {
    /// Creates an agent parked at its bottom floor.
    pub fn new(cfg: &AgentConfig, store: Arc<dyn Store>) -> Self {
        let status = ElevatorStatus::new(cfg.id, cfg.group_id, cfg.min_floor);
        let key = status.key();

        Self {
            limits: fsm::Limits {
                min_floor: cfg.min_floor,
                max_floor: cfg.max_floor,
                max_capacity: cfg.max_capacity,
            },
            status: Arc::new(Mutex::new(status)),
            store,
            key,
        }
    }

    /// The key uniquely identifying this elevator in the store, `<groupId>-<id>`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Brings the agent to life.
    ///
    /// Rehydrates from the store's durable key when a previous incarnation
    /// left one behind, then spawns the tick loop, the passenger watcher and
    /// the maintenance watcher. All three stop when `shutdown` fires.
    pub async fn start(self: &Arc<Self>, shutdown: &broadcast::Sender<()>) {
        self.load_existing_status().await;

        let agent = self.clone();
        let rx = shutdown.subscribe();
        tokio::spawn(async move { agent.run_tick_loop(rx).await });

        let agent = self.clone();
        let rx = shutdown.subscribe();
        tokio::spawn(watcher::run(agent, watcher::Kind::Passenger, rx));

        let agent = self.clone();
        let rx = shutdown.subscribe();
        tokio::spawn(watcher::run(agent, watcher::Kind::Maintenance, rx));
    }

    /// The periodic heart of the agent. One state-machine pass per tick until
    /// shutdown.
    async fn run_tick_loop(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(config::TICK_PERIOD);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let snapshot = self.tick().await;
                    print::tick(snapshot.pretty());
                }
                _ = shutdown.recv() => {
                    print::info(format!("Stopping elevator {}", self.key));
                    break;
                }
            }
        }
    }

    /// Advances the state machine one pass and publishes the new snapshot.
    ///
    /// A store failure skips the publication for this tick; the next tick
    /// writes a fresh snapshot anyway.
    pub(crate) async fn tick(&self) -> ElevatorStatus {
        let snapshot = {
            let mut status = self.status.lock().await;
            fsm::advance(&mut status, &self.limits);
            status.clone()
        };

        if let Err(e) = self.save_state(&snapshot).await {
            print::err(format!("Could not save state for elevator {}: {}", self.key, e));
        }
        snapshot
    }

    /// Writes the snapshot under both status keys: the TTL-bounded liveness
    /// key first, then the durable key.
    async fn save_state(&self, snapshot: &ElevatorStatus) -> Result<(), StoreError> {
        let Some(encoded) = serial::encode_status(snapshot) else {
            // Unserializable snapshot, already logged. Nothing to publish.
            return Ok(());
        };

        self.store
            .set(
                &format!("{}{}", config::STATUS_PREFIX, self.key),
                &encoded,
                Some(config::STATUS_TTL),
            )
            .await?;

        self.store
            .set(&format!("{}{}", config::DURABLE_PREFIX, self.key), &encoded, None)
            .await?;

        Ok(())
    }

    /// Adopts the motion and load state a previous incarnation of this agent
    /// left under the durable key. Identity and limits always come from the
    /// local configuration.
    async fn load_existing_status(&self) {
        let key = format!("{}{}", config::DURABLE_PREFIX, self.key);

        match self.store.get(&key).await {
            Ok(Some(value)) => {
                if let Some(previous) = serial::decode_status(&value) {
                    let mut status = self.status.lock().await;
                    status.current_floor = previous
                        .current_floor
                        .clamp(self.limits.min_floor, self.limits.max_floor);
                    status.current_state = previous.current_state;
                    status.current_target_floor = previous.current_target_floor;
                    status.passengers = previous.passengers;
                    status.waiting = previous.waiting;
                    print::ok(format!("Elevator {} rehydrated from the store", self.key));
                }
            }
            Ok(None) => {
                print::info(format!("No previous status for elevator {}; starting fresh", self.key));
            }
            Err(e) => {
                print::warn(format!(
                    "Could not load previous status for elevator {}: {}",
                    self.key, e
                ));
            }
        }
    }

    /// Appends a passenger the dispatcher routed here and persists the new
    /// snapshot so the fleet view reflects the commitment right away.
    pub(crate) async fn handle_passenger(&self, p: Passenger) {
        let snapshot = {
            let mut status = self.status.lock().await;
            fsm::add_waiting(&mut status, p);
            status.clone()
        };

        if let Err(e) = self.save_state(&snapshot).await {
            print::err(format!("Could not save state for elevator {}: {}", self.key, e));
        }
    }

    /// Applies an operator's maintenance toggle. `true` takes the elevator
    /// out of service, `false` returns it to idle.
    pub(crate) async fn set_maintenance(&self, on: bool) {
        let mut status = self.status.lock().await;
        status.current_state = if on { ElevatorState::Maintenance } else { ElevatorState::Idle };
    }

    /// Advertises that this agent can no longer follow the store. The next
    /// published snapshot evicts it from dispatch.
    pub(crate) async fn mark_error(&self) {
        let mut status = self.status.lock().await;
        status.current_state = ElevatorState::Error;
    }

    #[cfg(test)]
    async fn snapshot(&self) -> ElevatorStatus {
        self.status.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem::MemStore;

    fn agent_config(id: i32) -> AgentConfig {
        AgentConfig {
            id,
            group_id: 0,
            display_id: id + 1,
            min_floor: 1,
            max_floor: 16,
            max_capacity: 16,
            store_url: "mem://".to_string(),
            listen_host: "127.0.0.1".to_string(),
            listen_port: 8080 + id as u16,
        }
    }

    #[tokio::test]
    async fn tick_publishes_liveness_and_durable_keys() {
        let store = Arc::new(MemStore::new());
        let elevator = Elevator::new(&agent_config(0), store.clone());

        elevator.tick().await;

        let liveness = store.get("elevator_status/0-0").await.unwrap().unwrap();
        let durable = store.get("elevators/0-0").await.unwrap().unwrap();
        assert_eq!(liveness, durable);

        let snapshot = serial::decode_status(&liveness).unwrap();
        assert_eq!(snapshot.id, 0);
        assert_eq!(snapshot.current_state, ElevatorState::Idle);
    }

    #[tokio::test]
    async fn routed_passenger_is_served_over_ticks() {
        let store = Arc::new(MemStore::new());
        let elevator = Elevator::new(&agent_config(0), store.clone());

        elevator.handle_passenger(Passenger::new(2, 4)).await;
        assert_eq!(elevator.snapshot().await.waiting.len(), 1);

        // Idle -> MovingUp -> floor 2 (Loading) -> board -> floor 3, 4 (Unloading) -> done.
        elevator.tick().await;
        assert_eq!(elevator.snapshot().await.current_state, ElevatorState::MovingUp);

        elevator.tick().await;
        assert_eq!(elevator.snapshot().await.current_state, ElevatorState::Loading);

        elevator.tick().await;
        let snapshot = elevator.snapshot().await;
        assert_eq!(snapshot.passengers.len(), 1);
        assert!(snapshot.waiting.is_empty());
        assert_eq!(snapshot.current_state, ElevatorState::MovingUp);

        elevator.tick().await;
        elevator.tick().await;
        let snapshot = elevator.snapshot().await;
        assert_eq!(snapshot.current_floor, 4);
        assert_eq!(snapshot.current_state, ElevatorState::Unloading);

        elevator.tick().await;
        let snapshot = elevator.snapshot().await;
        assert!(snapshot.passengers.is_empty());
        assert_eq!(snapshot.current_state, ElevatorState::Idle);
    }

    #[tokio::test]
    async fn rehydrates_previous_status() {
        let store = Arc::new(MemStore::new());

        let mut previous = ElevatorStatus::new(0, 0, 9);
        previous.current_state = ElevatorState::MovingDown;
        previous.passengers.push(Passenger::new(12, 3));
        store
            .set("elevators/0-0", &serial::encode_status(&previous).unwrap(), None)
            .await
            .unwrap();

        let elevator = Elevator::new(&agent_config(0), store.clone());
        elevator.load_existing_status().await;

        let snapshot = elevator.snapshot().await;
        assert_eq!(snapshot.current_floor, 9);
        assert_eq!(snapshot.current_state, ElevatorState::MovingDown);
        assert_eq!(snapshot.passengers.len(), 1);
    }

    #[tokio::test]
    async fn malformed_durable_status_is_ignored() {
        let store = Arc::new(MemStore::new());
        store.set("elevators/0-0", "not json", None).await.unwrap();

        let elevator = Elevator::new(&agent_config(0), store.clone());
        elevator.load_existing_status().await;

        let snapshot = elevator.snapshot().await;
        assert_eq!(snapshot.current_floor, 1);
        assert_eq!(snapshot.current_state, ElevatorState::Idle);
    }

    #[tokio::test]
    async fn maintenance_toggle_is_idempotent() {
        let store = Arc::new(MemStore::new());
        let elevator = Elevator::new(&agent_config(0), store.clone());

        elevator.set_maintenance(true).await;
        elevator.set_maintenance(true).await;
        assert_eq!(elevator.snapshot().await.current_state, ElevatorState::Maintenance);

        elevator.set_maintenance(false).await;
        assert_eq!(elevator.snapshot().await.current_state, ElevatorState::Idle);
    }
}
