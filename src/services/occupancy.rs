//! Bounded occupancy counter
//!
//! The single source of truth for how many occupants are present. Every
//! mutation is one atomic read-modify-write, so the outcome a caller sees
//! (accepted or refused, and the resulting count) is the same observation
//! that decided it.
//!
//! Invariant: 0 <= count <= max at every instant.

use crate::domain::types::OccupancyError;
use std::sync::atomic::{AtomicU32, Ordering};

pub struct OccupancyCounter {
    count: AtomicU32,
    max: u32,
}

impl OccupancyCounter {
    pub fn new(max: u32) -> Self {
        Self { count: AtomicU32::new(0), max }
    }

    /// Admit one occupant if there is room
    ///
    /// Returns the new count, or `CapacityReached` without mutating.
    pub fn try_enter(&self) -> Result<u32, OccupancyError> {
        let max = self.max;
        self.count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < max).then_some(n + 1))
            .map(|prev| prev + 1)
            .map_err(|_| OccupancyError::CapacityReached { max })
    }

    /// Release one occupant if anyone is present
    ///
    /// Returns the new count, or `NoOccupantToRemove` without mutating.
    pub fn try_exit(&self) -> Result<u32, OccupancyError> {
        self.count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .map(|prev| prev - 1)
            .map_err(|_| OccupancyError::NoOccupantToRemove)
    }

    /// Drain to zero; returns how many occupants were removed
    pub fn reset_to_zero(&self) -> u32 {
        self.count.swap(0, Ordering::AcqRel)
    }

    #[inline]
    pub fn snapshot(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    #[inline]
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Seed a count directly (replay and tests)
    pub fn with_count(max: u32, count: u32) -> Self {
        Self { count: AtomicU32::new(count.min(max)), max }
    }
}
