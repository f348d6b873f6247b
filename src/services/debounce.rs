//! Per-source timestamp debounce filter
//!
//! Each source keeps the timestamp of its last accepted edge. An edge is
//! accepted only when strictly more than the source's window has elapsed.
//!
//! State is one `AtomicU64` per source so the filter can run inside the edge
//! handler: bit 32 marks "has fired", the low 32 bits hold the wrapping
//! millisecond stamp. Updates are a CAS, so two handlers racing on the same
//! source accept at most one edge.

use crate::domain::types::Source;
use crate::infra::config::Config;
use std::sync::atomic::{AtomicU64, Ordering};

const FIRED: u64 = 1 << 32;
const STAMP_MASK: u64 = u32::MAX as u64;

pub struct DebounceFilter {
    last_accepted: [AtomicU64; 3],
    threshold_ms: [u32; 3],
}

impl DebounceFilter {
    pub fn new(threshold_ms: [u32; 3]) -> Self {
        Self { last_accepted: std::array::from_fn(|_| AtomicU64::new(0)), threshold_ms }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Source::ALL.map(|source| config.debounce_ms(source)))
    }

    /// Accept or suppress an edge observed at `now_ms`
    ///
    /// On acceptance the source's timestamp becomes `now_ms`.
    pub fn accept(&self, source: Source, now_ms: u32) -> bool {
        let slot = &self.last_accepted[source.index()];
        let threshold = self.threshold_ms[source.index()];

        let mut current = slot.load(Ordering::Acquire);
        loop {
            if current & FIRED != 0 {
                let last = (current & STAMP_MASK) as u32;
                if now_ms.wrapping_sub(last) <= threshold {
                    return false;
                }
            }

            match slot.compare_exchange_weak(
                current,
                FIRED | now_ms as u64,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn threshold_ms(&self, source: Source) -> u32 {
        self.threshold_ms[source.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> DebounceFilter {
        DebounceFilter::new([200, 200, 200])
    }

    #[test]
    fn test_first_edge_accepted() {
        let filter = filter();
        assert!(filter.accept(Source::Entry, 0));
        assert!(filter.accept(Source::Exit, 5));
    }

    #[test]
    fn test_edges_within_window_suppressed() {
        let filter = filter();
        assert!(filter.accept(Source::Entry, 1000));
        assert!(!filter.accept(Source::Entry, 1050));
        assert!(!filter.accept(Source::Entry, 1200)); // exactly the window is still inside
        assert!(filter.accept(Source::Entry, 1201));
    }

    #[test]
    fn test_suppressed_edge_does_not_extend_window() {
        let filter = filter();
        assert!(filter.accept(Source::Exit, 1000));
        assert!(!filter.accept(Source::Exit, 1150));
        // Window is measured from the last accepted edge, not the last seen one
        assert!(filter.accept(Source::Exit, 1250));
    }

    #[test]
    fn test_sources_are_independent() {
        let filter = filter();
        assert!(filter.accept(Source::Entry, 1000));
        assert!(filter.accept(Source::Exit, 1001));
        assert!(filter.accept(Source::Reset, 1002));
        assert!(!filter.accept(Source::Entry, 1003));
    }

    #[test]
    fn test_wraparound_is_safe() {
        let filter = filter();
        assert!(filter.accept(Source::Entry, u32::MAX - 50));
        // 100ms later, after the counter wrapped
        assert!(!filter.accept(Source::Entry, 49));
        // 251ms later
        assert!(filter.accept(Source::Entry, 200));
    }

    #[test]
    fn test_per_source_thresholds() {
        let filter = DebounceFilter::new([200, 50, 1000]);
        assert!(filter.accept(Source::Exit, 0));
        assert!(filter.accept(Source::Exit, 51));
        assert!(filter.accept(Source::Reset, 0));
        assert!(!filter.accept(Source::Reset, 900));
        assert_eq!(filter.threshold_ms(Source::Reset), 1000);
    }

    #[test]
    fn test_concurrent_edges_accept_once() {
        use std::sync::Arc;
        use std::thread;

        let filter = Arc::new(filter());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let f = filter.clone();
                thread::spawn(move || f.accept(Source::Entry, 5000))
            })
            .collect();

        let accepted = handles.into_iter().map(|h| h.join().unwrap()).filter(|&a| a).count();
        assert_eq!(accepted, 1);
    }
}
