use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast;

use elevatorfleet::elevator::Elevator;
use elevatorfleet::init::{self, StartupParams};
use elevatorfleet::passenger::Passenger;
use elevatorfleet::status::ElevatorStatus;
use elevatorfleet::store::{self, Store};
use elevatorfleet::{client, config, http_api, print};

#[tokio::main]
async fn main() {
    let params = init::parse_args();

    print::info(format!(
        "Starting {} elevator(s) in {} group(s), floors {} to {}, store {}",
        params.elevator_count, params.group_count, params.min_floor, params.max_floor, params.store_url
    ));

    let store = match store::connect(&params.store_url) {
        Ok(store) => store,
        Err(e) => {
            print::err(format!("Cannot connect to the coordination store: {}", e));
            return;
        }
    };

    let (shutdown_tx, _) = broadcast::channel::<()>(8);

/* START ----------- One agent per elevator: controller + HTTP API ---------------------- */
    let configs = init::agent_configs(&params);
    let mut ports: Vec<u16> = Vec::with_capacity(configs.len());

    for cfg in &configs {
        ports.push(cfg.listen_port);

        let elevator = Arc::new(Elevator::new(cfg, store.clone()));
        elevator.start(&shutdown_tx).await;

        let host = cfg.listen_host.clone();
        let port = cfg.listen_port;
        let api_store = store.clone();
        let rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = http_api::serve(&host, port, api_store, rx).await {
                print::err(format!("HTTP API on port {} failed: {}", port, e));
            }
        });
    }
/* END ----------- One agent per elevator: controller + HTTP API ---------------------- */

/* START ----------- Shutdown on ctrl-c ---------------------- */
    {
        let tx = shutdown_tx.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            print::info("Shutting down".to_string());
            let _ = tx.send(());
        });
    }
/* END ----------- Shutdown on ctrl-c ---------------------- */

    print::ok(
        "Enter 'new' to add a passenger, 'maintenance' to toggle a car, \
         'status' for the fleet table, or 'exit' to leave."
            .to_string(),
    );

    operator_loop(&params, &ports, store, shutdown_tx).await;
}

/// Reads operator commands from stdin until shutdown.
async fn operator_loop(
    params: &StartupParams,
    ports: &[u16],
    store: Arc<dyn Store>,
    shutdown_tx: broadcast::Sender<()>,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shutdown_rx = shutdown_tx.subscribe();

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => match line.trim() {
                    "exit" => {
                        let _ = shutdown_tx.send(());
                        break;
                    }
                    "new" => process_new_passenger(params, ports, &mut lines).await,
                    "maintenance" => process_maintenance(ports, &mut lines).await,
                    "status" => process_status(&store).await,
                    "" => {}
                    other => print::warn(format!("Unknown command {:?}", other)),
                },
                Ok(None) => {
                    // stdin is closed (e.g. running detached). Park until shutdown.
                    let _ = shutdown_rx.recv().await;
                    break;
                }
                Err(e) => {
                    print::err(format!("Could not read from stdin: {}", e));
                    break;
                }
            }
        }
    }
}

/// Prompts for a passenger and sends the call to the next agent in the
/// round-robin rotation.
async fn process_new_passenger(
    params: &StartupParams,
    ports: &[u16],
    lines: &mut Lines<BufReader<Stdin>>,
) {
    println!("Enter your current floor:");
    let Some(current_floor) = read_floor(params, lines).await else { return };

    println!("Enter your destination floor:");
    let Some(destination_floor) = read_floor(params, lines).await else { return };

    if current_floor == destination_floor {
        print::warn("You're already on that floor!".to_string());
        return;
    }

    let p = Passenger::new(current_floor, destination_floor);
    match client::request_elevator(client::next_port(ports), &p).await {
        Ok(result) => {
            print::ok(format!(
                "Take elevator {} in group {}",
                result.elevator_id, result.group_id
            ));
        }
        Err(e) => print::err(format!("Could not send request: {}", e)),
    }
}

/// Prompts for an elevator and a toggle, and sends the maintenance request.
async fn process_maintenance(ports: &[u16], lines: &mut Lines<BufReader<Stdin>>) {
    println!("Enter the elevator id:");
    let Some(elevator_id) = read_number(lines).await else { return };

    println!("Enter the group id:");
    let Some(group_id) = read_number(lines).await else { return };

    println!("Enter 'on' or 'off':");
    let maintenance = match lines.next_line().await {
        Ok(Some(line)) => match line.trim() {
            "on" => true,
            "off" => false,
            other => {
                print::warn(format!("Expected 'on' or 'off', got {:?}", other));
                return;
            }
        },
        _ => return,
    };

    match client::request_maintenance(client::next_port(ports), elevator_id, group_id, maintenance)
        .await
    {
        Ok(echo) => {
            print::ok(format!(
                "Elevator {} in group {} maintenance set to {}",
                echo.elevator_id, echo.group_id, echo.maintenance
            ));
        }
        Err(e) => print::err(format!("Could not send request: {}", e)),
    }
}

/// Reads the fleet's liveness snapshots and renders the status table.
async fn process_status(store: &Arc<dyn Store>) {
    match store.list(config::STATUS_PREFIX).await {
        Ok(nodes) => {
            let mut statuses: Vec<ElevatorStatus> = nodes
                .iter()
                .filter_map(|node| serde_json::from_str(&node.value).ok())
                .collect();
            statuses.sort_by_key(|status| (status.group_id, status.id));
            print::fleet(&statuses);
        }
        Err(e) => print::err(format!("Could not read fleet statuses: {}", e)),
    }
}

/// Reads one line and parses it as a floor within the configured limits.
async fn read_floor(params: &StartupParams, lines: &mut Lines<BufReader<Stdin>>) -> Option<i32> {
    let floor = read_number(lines).await?;

    if floor < params.min_floor {
        print::warn(format!("Floor must be at least {}!", params.min_floor));
        return None;
    }
    if floor > params.max_floor {
        print::warn(format!("Floor is too high! The top floor is {}", params.max_floor));
        return None;
    }
    Some(floor)
}

/// Reads one line and parses it as a number.
async fn read_number(lines: &mut Lines<BufReader<Stdin>>) -> Option<i32> {
    match lines.next_line().await {
        Ok(Some(line)) => match line.trim().parse::<i32>() {
            Ok(number) => Some(number),
            Err(_) => {
                print::warn(format!("{:?} is not a number", line.trim()));
                None
            }
        },
        _ => None,
    }
}
