//! Supervised store watchers.
//!
//! Every agent keeps two long-lived watches on the store: one on its `wait/`
//! key for passengers the dispatcher routes here, one on its `maintenance/`
//! key for operator toggles. A lost watch is re-established with exponential
//! backoff and jitter; when the retry budget runs dry the agent advertises
//! ERROR and the watcher dies for good.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::broadcast;

use crate::config;
use crate::elevator::Elevator;
use crate::passenger::Passenger;
use crate::print;
use crate::store::StoreEvent;

/// Which of the agent's two watch keys this task follows.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Kind {
    /// `wait/<key>`: passenger assignments
    Passenger,
    /// `maintenance/<key>`: operator toggles
    Maintenance,
}

impl Kind {
    fn prefix(&self, key: &str) -> String {
        match self {
            Kind::Passenger => format!("{}{}", config::WAIT_PREFIX, key),
            Kind::Maintenance => format!("{}{}", config::MAINTENANCE_PREFIX, key),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Kind::Passenger => "passenger",
            Kind::Maintenance => "maintenance",
        }
    }
}

/// Runs one supervised watch until shutdown or until the retry budget is
/// spent.
pub(crate) async fn run(
    elevator: Arc<Elevator>,
    kind: Kind,
    mut shutdown: broadcast::Receiver<()>,
) {
    let prefix = kind.prefix(elevator.key());
    let mut failures: u32 = 0;

    loop {
        if failures >= config::WATCH_RETRY_BUDGET {
            print::err(format!(
                "The {} watcher for elevator {} is out of retries; marking the elevator ERROR",
                kind.name(),
                elevator.key()
            ));
            elevator.mark_error().await;
            return;
        }

        if failures > 0 {
            tokio::select! {
                _ = tokio::time::sleep(backoff_delay(failures)) => {}
                _ = shutdown.recv() => return,
            }
        }

        let mut watch = match elevator.store.watch(&prefix).await {
            Ok(watch) => watch,
            Err(e) => {
                print::warn(format!(
                    "Could not open the {} watch for elevator {}: {}",
                    kind.name(),
                    elevator.key(),
                    e
                ));
                failures += 1;
                continue;
            }
        };

        loop {
            tokio::select! {
                _ = shutdown.recv() => return,
                event = watch.next() => match event {
                    Ok(event) => {
                        failures = 0;
                        handle_event(&elevator, kind, event).await;
                    }
                    Err(e) => {
                        print::warn(format!(
                            "The {} watch for elevator {} failed: {}",
                            kind.name(),
                            elevator.key(),
                            e
                        ));
                        failures += 1;
                        break;
                    }
                }
            }
        }
    }
}

/// Reconnect delay for the n-th consecutive failure: exponential from the
/// base, capped, stretched by up to 50% jitter so a flapping store is not
/// hammered in lockstep by the whole fleet.
fn backoff_delay(failures: u32) -> Duration {
    let doublings = failures.saturating_sub(1).min(5);
    let delay = config::WATCH_BACKOFF_BASE * 2u32.pow(doublings);
    let delay = delay.min(config::WATCH_BACKOFF_MAX);
    delay.mul_f64(rand::thread_rng().gen_range(1.0..1.5))
}

async fn handle_event(elevator: &Arc<Elevator>, kind: Kind, event: StoreEvent) {
    match kind {
        Kind::Passenger => match serde_json::from_str::<Passenger>(&event.value) {
            Ok(p) => {
                print::info(format!(
                    "Elevator {} accepted a passenger {} -> {}",
                    elevator.key(),
                    p.current_floor,
                    p.destination_floor
                ));
                elevator.handle_passenger(p).await;
            }
            Err(e) => {
                print::warn(format!(
                    "Ignoring malformed passenger for elevator {}: {}",
                    elevator.key(),
                    e
                ));
            }
        },
        Kind::Maintenance => match event.value.parse::<bool>() {
            Ok(on) => {
                print::ok(format!(
                    "Elevator {} maintenance mode set to {}",
                    elevator.key(),
                    on
                ));
                elevator.set_maintenance(on).await;
            }
            Err(_) => {
                print::warn(format!(
                    "Ignoring maintenance value {:?} for elevator {}",
                    event.value,
                    elevator.key()
                ));
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::AgentConfig;
    use crate::status::ElevatorState;
    use crate::store::mem::MemStore;
    use crate::store::{Store, StoreError, Watch};
    use async_trait::async_trait;

    fn test_elevator(store: Arc<dyn Store>) -> Arc<Elevator> {
        let cfg = AgentConfig {
            id: 0,
            group_id: 0,
            display_id: 1,
            min_floor: 1,
            max_floor: 16,
            max_capacity: 16,
            store_url: "mem://".to_string(),
            listen_host: "127.0.0.1".to_string(),
            listen_port: 8080,
        };
        Arc::new(Elevator::new(&cfg, store))
    }

    async fn wait_for_status<F>(elevator: &Arc<Elevator>, predicate: F)
    where
        F: Fn(&crate::status::ElevatorStatus) -> bool,
    {
        for _ in 0..200 {
            if predicate(&elevator.snapshot().await) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition never became true");
    }

    #[tokio::test]
    async fn passenger_write_reaches_the_waiting_list() {
        let store = Arc::new(MemStore::new());
        let elevator = test_elevator(store.clone());
        let (shutdown_tx, _) = broadcast::channel(1);

        tokio::spawn(run(elevator.clone(), Kind::Passenger, shutdown_tx.subscribe()));
        tokio::task::yield_now().await;

        store
            .set("wait/0-0", "{\"currentFloor\":3,\"destinationFloor\":9}", None)
            .await
            .unwrap();

        wait_for_status(&elevator, |snapshot| snapshot.waiting.len() == 1).await;

        let snapshot = elevator.snapshot().await;
        assert_eq!(snapshot.waiting[0], Passenger::new(3, 9));
        assert_eq!(snapshot.current_target_floor, 9);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn malformed_passenger_is_skipped() {
        let store = Arc::new(MemStore::new());
        let elevator = test_elevator(store.clone());
        let (shutdown_tx, _) = broadcast::channel(1);

        tokio::spawn(run(elevator.clone(), Kind::Passenger, shutdown_tx.subscribe()));
        tokio::task::yield_now().await;

        store.set("wait/0-0", "not a passenger", None).await.unwrap();
        store
            .set("wait/0-0", "{\"currentFloor\":2,\"destinationFloor\":5}", None)
            .await
            .unwrap();

        wait_for_status(&elevator, |snapshot| snapshot.waiting.len() == 1).await;

        assert_eq!(elevator.snapshot().await.waiting[0], Passenger::new(2, 5));
        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn maintenance_toggle_flips_state() {
        let store = Arc::new(MemStore::new());
        let elevator = test_elevator(store.clone());
        let (shutdown_tx, _) = broadcast::channel(1);

        tokio::spawn(run(elevator.clone(), Kind::Maintenance, shutdown_tx.subscribe()));
        tokio::task::yield_now().await;

        store.set("maintenance/0-0", "true", None).await.unwrap();

        wait_for_status(&elevator, |snapshot| {
            snapshot.current_state == ElevatorState::Maintenance
        })
        .await;

        store.set("maintenance/0-0", "false", None).await.unwrap();

        wait_for_status(&elevator, |snapshot| snapshot.current_state == ElevatorState::Idle).await;

        let _ = shutdown_tx.send(());
    }

    /// Store whose watches always fail, for exercising the retry budget.
    struct BrokenWatchStore;

    struct BrokenWatch;

    #[async_trait]
    impl Watch for BrokenWatch {
        async fn next(&mut self) -> Result<StoreEvent, StoreError> {
            Err(StoreError::Closed)
        }
    }

    #[async_trait]
    impl Store for BrokenWatchStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        async fn set(
            &self,
            _key: &str,
            _value: &str,
            _ttl: Option<Duration>,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn list(&self, _prefix: &str) -> Result<Vec<crate::store::StoreNode>, StoreError> {
            Ok(Vec::new())
        }

        async fn watch(&self, _prefix: &str) -> Result<Box<dyn Watch>, StoreError> {
            Ok(Box::new(BrokenWatch))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn spent_retry_budget_marks_the_elevator_error() {
        let elevator = test_elevator(Arc::new(BrokenWatchStore));
        let (shutdown_tx, _) = broadcast::channel(1);

        let handle = tokio::spawn(run(
            elevator.clone(),
            Kind::Passenger,
            shutdown_tx.subscribe(),
        ));
        handle.await.unwrap();

        assert_eq!(elevator.snapshot().await.current_state, ElevatorState::Error);
    }
}
