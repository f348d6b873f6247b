//! Millisecond tick sources for edge timestamping
//!
//! Timestamps are wrapping `u32` milliseconds since boot, the same width a
//! microcontroller tick counter has. Consumers must compare them with
//! `wrapping_sub`, never with `<`.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// Monotonic millisecond clock readable from the edge handler
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u32;
}

/// Clock backed by `Instant`, counting from construction
pub struct MonotonicClock {
    boot: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { boot: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now_ms(&self) -> u32 {
        // Truncation is the wrap: the counter rolls over every ~49.7 days
        self.boot.elapsed().as_millis() as u32
    }
}

/// Manually driven clock for tests and replay
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU32,
}

impl ManualClock {
    pub fn new(start_ms: u32) -> Self {
        Self { now_ms: AtomicU32::new(start_ms) }
    }

    pub fn set(&self, ms: u32) {
        self.now_ms.store(ms, Ordering::Relaxed);
    }

    /// Advance by `ms`, wrapping like a hardware tick counter
    pub fn advance(&self, ms: u32) {
        let _ = self
            .now_ms
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |now| Some(now.wrapping_add(ms)));
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_ms(&self) -> u32 {
        self.now_ms.load(Ordering::Relaxed)
    }
}
