//! Domain models - core panel types
//!
//! This module contains the canonical data types used throughout the system:
//! - `Source` - which input line produced an event
//! - `StatusLabel` / `ColorTier` - feedback decisions derived from occupancy
//! - `PanelView` - one renderable frame of panel state
//! - `OccupancyError` - rejected counter mutations

pub mod types;

// Re-export commonly used types at module level
pub use types::{ColorTier, OccupancyError, PanelView, Source, StatusLabel, TonePulse};
