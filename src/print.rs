//! Terminal logging with color-coded categories.
//!
//! Every category can be switched off at runtime through the toggles in [config],
//! so a noisy fleet can be quieted down without recompiling.

use crate::config;
use crate::status::{ElevatorState, ElevatorStatus};
use ansi_term::Colour::{self, Green, Red, Yellow, Purple};
use unicode_width::UnicodeWidthStr;

/// Prints an error message in red to the terminal.
///
/// If `PRINT_ERR_ON` is `false`, the message will not be printed.
///
/// ## Parameters
/// - `msg`: The error message to print.
///
/// ## Terminal output
/// - "\[ERROR\]:   {}", msg
pub fn err(msg: String) {
    let print_stat = config::PRINT_ERR_ON.lock().unwrap().clone();

    if print_stat {
        println!("{}{}\n", Red.paint("[ERROR]:   "), Red.paint(msg));
    }
}

/// Prints a warning message in yellow to the terminal.
///
/// If `PRINT_WARN_ON` is `false`, the message will not be printed.
///
/// ## Parameters
/// - `msg`: The warning message to print.
///
/// ## Terminal output
/// - "\[WARNING\]: {}", msg
pub fn warn(msg: String) {
    let print_stat = config::PRINT_WARN_ON.lock().unwrap().clone();

    if print_stat {
        println!("{}{}\n", Yellow.paint("[WARNING]: "), Yellow.paint(msg));
    }
}

/// Prints a success message in green to the terminal.
///
/// If `PRINT_OK_ON` is `false`, the message will not be printed.
///
/// ## Parameters
/// - `msg`: The success message to print.
///
/// ## Terminal output
/// - "\[OK\]:      {}", msg
pub fn ok(msg: String) {
    let print_stat = config::PRINT_OK_ON.lock().unwrap().clone();

    if print_stat {
        println!("{}{}\n", Green.paint("[OK]:      "), Green.paint(msg));
    }
}

/// Prints an informational message in light blue to the terminal.
///
/// If `PRINT_INFO_ON` is `false`, the message will not be printed.
///
/// ## Parameters
/// - `msg`: The informational message to print.
///
/// ## Terminal output
/// - "\[INFO\]:    {}", msg
pub fn info(msg: String) {
    let print_stat = config::PRINT_INFO_ON.lock().unwrap().clone();

    let light_blue = Colour::RGB(102, 178, 255);
    if print_stat {
        println!("{}{}\n", light_blue.paint("[INFO]:    "), light_blue.paint(msg));
    }
}

/// Prints one agent's per-tick status line in purple.
///
/// Emitted once per second per agent, so this is the first toggle to reach
/// for when the terminal gets too loud (`tick::false`).
pub fn tick(msg: String) {
    let print_stat = config::PRINT_TICK_ON.lock().unwrap().clone();

    if print_stat {
        println!("{}{}\n", Purple.paint("[TICK]:    "), Purple.paint(msg));
    }
}

/// Hjelpefunksjon for å sikre at kolonner har fast breidde
fn pad_text(text: &str, width: usize) -> String {
    let visible_width = UnicodeWidthStr::width(text);
    let padding = width.saturating_sub(visible_width);
    format!("{}{}", text, " ".repeat(padding))
}

fn state_cell(state: ElevatorState) -> String {
    match state {
        ElevatorState::Idle => pad_text(&Green.paint("Idle").to_string(), 22),
        ElevatorState::MovingUp => pad_text(&Yellow.paint("⬆️   Moving").to_string(), 23),
        ElevatorState::MovingDown => pad_text(&Yellow.paint("⬇️   Moving").to_string(), 23),
        ElevatorState::Loading => pad_text(&Purple.paint("Loading").to_string(), 22),
        ElevatorState::Unloading => pad_text(&Purple.paint("Unloading").to_string(), 22),
        ElevatorState::Maintenance => pad_text(&Yellow.paint("Maintenance").to_string(), 22),
        ElevatorState::Error => pad_text(&Red.paint("Error").to_string(), 22),
    }
}

/// Logs the fleet in a fixed-width table, one row per live elevator.
pub fn fleet(statuses: &[ElevatorStatus]) {
    println!("{}", Purple.bold().paint("┌────────────────────────────────┐"));
    println!("{}", Purple.bold().paint("│          FLEET STATUS          │"));
    println!("{}", Purple.bold().paint("└────────────────────────────────┘"));

    println!("┌──────┬───────┬───────┬────────┬─────────┬──────────┬───────────────┐");
    println!(
        "{}",
        ansi_term::Colour::White
            .bold()
            .paint("│ Car  │ Group │ Floor │ Target │ Aboard  │ Waiting  │ State         │")
    );
    println!("├──────┼───────┼───────┼────────┼─────────┼──────────┼───────────────┤");

    for status in statuses {
        println!(
            "│ {:<4} │ {:<5} │ {:<5} │ {:<6} │ {:<7} │ {:<8} │ {} │",
            status.display_id,
            status.group_id,
            status.current_floor,
            status.current_target_floor,
            status.passengers.len(),
            status.waiting.len(),
            state_cell(status.current_state),
        );
    }

    println!("└──────┴───────┴───────┴────────┴─────────┴──────────┴───────────────┘");
}
