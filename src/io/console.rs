//! Line-oriented button input for hosts without GPIO
//!
//! Each line is one instant. Tokens on the same line are simultaneous edges:
//! - `e` / `entry` / `a`, `x` / `exit` / `b`, `r` / `reset` / `j`
//! - a GPIO number (e.g. `5`, `6`, `22`), mapped through the configured pins
//!
//! Commands: `status` logs the current occupancy, `quit` requests shutdown.
//!
//! Input runs on its own OS thread and calls the dispatcher synchronously,
//! the way an edge interrupt preempts the scheduler.

use crate::domain::types::Source;
use crate::services::dispatcher::{Dispatcher, EdgeOutcome};
use crate::services::panel::PanelCore;
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// One parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    Edges { sources: Vec<Source>, pins: Vec<u32> },
    Status,
    Quit,
    Empty,
}

/// Parse a console line; unknown tokens are reported back
pub fn parse_line(line: &str) -> Result<ConsoleLine, String> {
    let line = line.trim();
    match line {
        "" => return Ok(ConsoleLine::Empty),
        "status" | "s" => return Ok(ConsoleLine::Status),
        "quit" | "q" => return Ok(ConsoleLine::Quit),
        _ => {}
    }

    let mut sources = Vec::new();
    let mut pins = Vec::new();
    for token in line.split(|c: char| c.is_whitespace() || c == ',') {
        if token.is_empty() {
            continue;
        }
        if let Some(source) = Source::from_token(token) {
            sources.push(source);
        } else if let Ok(pin) = token.parse::<u32>() {
            pins.push(pin);
        } else {
            return Err(token.to_string());
        }
    }
    Ok(ConsoleLine::Edges { sources, pins })
}

/// Read lines until EOF or `quit`, feeding edges to the dispatcher
///
/// Blocking; run it on a dedicated thread.
pub fn run_console_input<R: BufRead>(
    reader: R,
    dispatcher: Arc<Dispatcher>,
    core: Arc<PanelCore>,
    shutdown: watch::Sender<bool>,
) {
    info!("console_input_started");

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "console_read_error");
                break;
            }
        };

        match parse_line(&line) {
            Ok(ConsoleLine::Edges { sources, pins }) => {
                let mut outcomes = vec![EdgeOutcome::Unmapped; sources.len()];
                dispatcher.on_edges(&sources, &mut outcomes);
                outcomes.extend(pins.iter().map(|&pin| dispatcher.on_pin_edge(pin)));
                log_outcomes(&sources, &pins, &outcomes);
            }
            Ok(ConsoleLine::Status) => {
                info!(
                    count = %core.snapshot(),
                    max = %core.config().max_occupants(),
                    "occupancy_status"
                );
            }
            Ok(ConsoleLine::Quit) => break,
            Ok(ConsoleLine::Empty) => {}
            Err(token) => warn!(token = %token, "console_unknown_token"),
        }
    }

    info!("console_input_closed");
    let _ = shutdown.send(true);
}

fn log_outcomes(sources: &[Source], pins: &[u32], outcomes: &[EdgeOutcome]) {
    let labels = sources
        .iter()
        .map(|s| s.to_string())
        .chain(pins.iter().map(|p| format!("gpio{}", p)));
    for (label, outcome) in labels.zip(outcomes) {
        debug!(edge = %label, outcome = ?outcome, "console_edge");
    }
}
