//! Services - synchronization core and control loops
//!
//! This module contains the panel's core logic:
//! - `debounce` - per-source timestamp gate for noisy edges
//! - `event_channel` - coalescing edge-to-task signals
//! - `dispatcher` - single edge handler for all monitored lines
//! - `occupancy` - bounded occupancy counter
//! - `feedback` - device-serialized display and tone output
//! - `panel` - panel core owning the counter, one step per event
//! - `tasks` - entry, exit and reset loops

pub mod debounce;
pub mod dispatcher;
pub mod event_channel;
pub mod feedback;
pub mod occupancy;
pub mod panel;
pub mod tasks;

// Re-export commonly used types
pub use dispatcher::{Dispatcher, EdgeOutcome};
pub use feedback::{Feedback, FeedbackSink};
pub use occupancy::OccupancyCounter;
pub use panel::{build_panel, PanelCore};
pub use tasks::spawn_access_tasks;
