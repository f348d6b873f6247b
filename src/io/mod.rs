//! IO modules - external interfaces
//!
//! This module contains the panel's edges to the outside world:
//! - `console` - line-oriented button input (host stand-in for GPIO edges)
//! - `sink` - feedback sinks that log or record display/LED/buzzer output

pub mod console;
pub mod sink;

// Re-export commonly used types
pub use console::run_console_input;
pub use sink::{LogSink, RecordingSink, SinkCall};
