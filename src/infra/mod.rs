//! Infrastructure - configuration, clocks and metrics
//!
//! This module contains infrastructure concerns:
//! - `config` - Application configuration (TOML loading, defaults)
//! - `clock` - Wrapping millisecond tick sources
//! - `metrics` - Lock-free metrics collection

pub mod clock;
pub mod config;
pub mod metrics;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::Config;
pub use metrics::Metrics;
