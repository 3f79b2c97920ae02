//! Startup argument parsing and per-agent configuration.

use std::env;

use crate::config;
use crate::print;

/// Everything one agent needs to know about itself.
///
/// This is the interface between the bootstrap and the core: the elevator,
/// the HTTP entry and the store adapter are configured from these fields and
/// nothing else.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Id of the elevator, unique within its group
    pub id: i32,
    /// Group (bank) the elevator belongs to
    pub group_id: i32,
    /// Human-friendly id, `id + 1`
    pub display_id: i32,
    /// Bottom floor the elevator can access
    pub min_floor: i32,
    /// Top floor the elevator can access
    pub max_floor: i32,
    /// Advisory capacity in persons
    pub max_capacity: usize,
    /// URL of the coordination store
    pub store_url: String,
    /// Host the agent's HTTP listener binds to
    pub listen_host: String,
    /// Port the agent's HTTP listener binds to
    pub listen_port: u16,
}

/// Fleet-level startup parameters collected from the command line.
#[derive(Debug, Clone)]
pub struct StartupParams {
    /// Number of elevators per group
    pub elevator_count: usize,
    /// Number of elevator groups
    pub group_count: i32,
    /// Bottom floor of every elevator
    pub min_floor: i32,
    /// Top floor of every elevator
    pub max_floor: i32,
    /// Advisory capacity of every elevator
    pub max_capacity: usize,
    /// URL of the coordination store
    pub store_url: String,
    /// First HTTP port; agents take consecutive ports from here
    pub port_base: u16,
}

impl Default for StartupParams {
    fn default() -> Self {
        Self {
            elevator_count: config::DEFAULT_ELEVATOR_COUNT,
            group_count: config::DEFAULT_GROUP_COUNT,
            min_floor: config::DEFAULT_MIN_FLOOR,
            max_floor: config::DEFAULT_MAX_FLOOR,
            max_capacity: config::DEFAULT_MAX_CAPACITY,
            store_url: config::DEFAULT_STORE_URL.to_string(),
            port_base: config::DEFAULT_PORT_BASE,
        }
    }
}

/// ### Reads arguments from `cargo run`
///
/// All options use the `key::value` form. Available options:
///
/// `elevators::<n>` &rarr; Number of elevators per group
/// `groups::<n>` &rarr; Number of elevator groups
/// `bottom_floor::<n>` &rarr; Bottom floor every elevator can access
/// `top_floor::<n>` &rarr; Top floor every elevator can access
/// `capacity::<n>` &rarr; Advisory capacity per elevator
/// `store_url::<url>` &rarr; Coordination store URL (`mem://` runs without etcd)
/// `port_base::<n>` &rarr; First agent HTTP port
/// `tick::(true/false)` &rarr; Prints every agent's per-tick status line
/// `print_err::(true/false)` &rarr; Prints error messages
/// `print_warn::(true/false)` &rarr; Prints warning messages
/// `print_ok::(true/false)` &rarr; Prints OK messages
/// `print_info::(true/false)` &rarr; Prints informational messages
/// `debug::` &rarr; Disables all prints except error messages
/// `help` &rarr; Displays all possible arguments without starting the program
///
/// If no arguments are provided, the defaults from [config] are used.
pub fn parse_args() -> StartupParams {
    let mut params = StartupParams::default();
    let args: Vec<String> = env::args().collect();

    for arg in args.iter().skip(1) {
        let parts: Vec<&str> = arg.split("::").collect();
        if parts.len() == 2 {
            let key = parts[0].to_lowercase();
            let value = parts[1].to_string();
            let is_true = value.to_lowercase() == "true";

            match key.as_str() {
                "elevators" => set_numeric(&mut params.elevator_count, &key, &value),
                "groups" => set_numeric(&mut params.group_count, &key, &value),
                "bottom_floor" => set_numeric(&mut params.min_floor, &key, &value),
                "top_floor" => set_numeric(&mut params.max_floor, &key, &value),
                "capacity" => set_numeric(&mut params.max_capacity, &key, &value),
                "port_base" => set_numeric(&mut params.port_base, &key, &value),
                "store_url" => params.store_url = value,
                "tick" => *config::PRINT_TICK_ON.lock().unwrap() = is_true,
                "print_err" => *config::PRINT_ERR_ON.lock().unwrap() = is_true,
                "print_warn" => *config::PRINT_WARN_ON.lock().unwrap() = is_true,
                "print_ok" => *config::PRINT_OK_ON.lock().unwrap() = is_true,
                "print_info" => *config::PRINT_INFO_ON.lock().unwrap() = is_true,
                "debug" => {
                    *config::PRINT_TICK_ON.lock().unwrap() = false;
                    *config::PRINT_WARN_ON.lock().unwrap() = false;
                    *config::PRINT_OK_ON.lock().unwrap() = false;
                    *config::PRINT_INFO_ON.lock().unwrap() = false;
                }
                _ => {}
            }
        } else if arg.to_lowercase() == "help" {
            println!("Available arguments:");
            println!("  elevators::<n>        number of elevators per group");
            println!("  groups::<n>           number of elevator groups");
            println!("  bottom_floor::<n>     bottom floor");
            println!("  top_floor::<n>        top floor");
            println!("  capacity::<n>         advisory capacity per elevator");
            println!("  store_url::<url>      coordination store URL, mem:// runs without etcd");
            println!("  port_base::<n>        first agent HTTP port");
            println!("  tick::true/false      per-tick status lines");
            println!("  print_err::true/false");
            println!("  print_warn::true/false");
            println!("  print_ok::true/false");
            println!("  print_info::true/false");
            println!("  debug                 (only error messages are shown)");
            std::process::exit(0);
        }
    }

    if params.min_floor >= params.max_floor {
        print::warn(format!(
            "bottom_floor {} is not below top_floor {}; falling back to defaults",
            params.min_floor, params.max_floor
        ));
        params.min_floor = config::DEFAULT_MIN_FLOOR;
        params.max_floor = config::DEFAULT_MAX_FLOOR;
    }

    params
}

/// Parses one numeric `key::value` option, keeping the default on bad input.
fn set_numeric<T: std::str::FromStr>(slot: &mut T, key: &str, value: &str) {
    match value.parse::<T>() {
        Ok(parsed) => *slot = parsed,
        Err(_) => print::warn(format!("Ignoring invalid value {:?} for {}", value, key)),
    }
}

/// Expands the fleet parameters into one [AgentConfig] per elevator.
///
/// Agents take consecutive HTTP ports from `port_base`, group by group.
pub fn agent_configs(params: &StartupParams) -> Vec<AgentConfig> {
    let mut configs = Vec::with_capacity(params.elevator_count * params.group_count.max(0) as usize);

    for group in 0..params.group_count {
        for i in 0..params.elevator_count {
            let id = i as i32;
            let port_offset = group as usize * params.elevator_count + i;

            configs.push(AgentConfig {
                id,
                group_id: group,
                display_id: id + 1,
                min_floor: params.min_floor,
                max_floor: params.max_floor,
                max_capacity: params.max_capacity,
                store_url: params.store_url.clone(),
                listen_host: config::DEFAULT_LISTEN_HOST.to_string(),
                listen_port: params.port_base + port_offset as u16,
            });
        }
    }

    configs
}
