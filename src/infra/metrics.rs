//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations so the edge handler can record
//! outcomes without taking a lock. Reporting swaps the periodic counters.
//!
//! All atomics use Relaxed ordering: these are statistical
//! counters only. Do NOT use these atomics for coordination or logic decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Exponential bucket boundaries (microseconds)
/// Buckets: ≤100, ≤200, ≤400, ≤800, ≤1600, ≤3200, ≤6400, ≤12800, ≤25600, ≤51200, >51200
const BUCKET_BOUNDS: [u64; 10] = [100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200];
const NUM_BUCKETS: usize = 11;

/// Compute bucket index for a latency value using binary search
#[inline]
fn bucket_index(latency_us: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Swap all buckets to zero and return their values
#[inline]
fn swap_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.swap(0, Ordering::Relaxed);
    }
    result
}

/// Compute percentile from histogram buckets
/// Returns the upper bound of the bucket containing the percentile
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = (total as f64 * percentile) as u64;
    let mut cumulative = 0u64;

    // Upper bounds for each bucket (last bucket uses 2x the previous bound)
    const BUCKET_UPPER_BOUNDS: [u64; NUM_BUCKETS] =
        [100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200, 102400];

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[NUM_BUCKETS - 1]
}

/// Lock-free metrics collector
pub struct Metrics {
    /// Edges that raised a pending signal (monotonic)
    edges_raised: AtomicU64,
    /// Accepted edges folded into an already pending signal (monotonic)
    edges_coalesced: AtomicU64,
    /// Edges suppressed by the debounce window (monotonic)
    edges_debounced: AtomicU64,
    /// Edges on pins that are not monitored (monotonic)
    edges_unmapped: AtomicU64,
    /// Successful entries (monotonic)
    entries_total: AtomicU64,
    /// Entries refused at capacity (monotonic)
    entries_rejected: AtomicU64,
    /// Successful exits (monotonic)
    exits_total: AtomicU64,
    /// Exits signaled with nobody present (monotonic)
    exits_ignored: AtomicU64,
    /// Serviced resets (monotonic)
    resets_total: AtomicU64,
    /// Occupants drained by resets (monotonic)
    resets_drained: AtomicU64,
    /// Reset signals discarded at the end of a cooldown (monotonic)
    resets_suppressed: AtomicU64,
    /// Render latency histogram (reset on report)
    render_buckets: [AtomicU64; NUM_BUCKETS],
    /// Sum of render latencies (reset on report)
    render_sum_us: AtomicU64,
    /// Max render latency (reset on report)
    render_max_us: AtomicU64,
    /// Renders since last report (reset on report)
    renders_since_report: AtomicU64,
    /// Last report time (only accessed from reporter)
    last_report_time: parking_lot::Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            edges_raised: AtomicU64::new(0),
            edges_coalesced: AtomicU64::new(0),
            edges_debounced: AtomicU64::new(0),
            edges_unmapped: AtomicU64::new(0),
            entries_total: AtomicU64::new(0),
            entries_rejected: AtomicU64::new(0),
            exits_total: AtomicU64::new(0),
            exits_ignored: AtomicU64::new(0),
            resets_total: AtomicU64::new(0),
            resets_drained: AtomicU64::new(0),
            resets_suppressed: AtomicU64::new(0),
            render_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            render_sum_us: AtomicU64::new(0),
            render_max_us: AtomicU64::new(0),
            renders_since_report: AtomicU64::new(0),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    #[inline]
    pub fn record_edge_raised(&self) {
        self.edges_raised.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_edge_coalesced(&self) {
        self.edges_coalesced.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_edge_debounced(&self) {
        self.edges_debounced.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_edge_unmapped(&self) {
        self.edges_unmapped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of an entry attempt
    #[inline]
    pub fn record_entry(&self, accepted: bool) {
        if accepted {
            self.entries_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.entries_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record the outcome of an exit attempt
    #[inline]
    pub fn record_exit(&self, accepted: bool) {
        if accepted {
            self.exits_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.exits_ignored.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a serviced reset and how many occupants it drained
    #[inline]
    pub fn record_reset(&self, drained: u32) {
        self.resets_total.fetch_add(1, Ordering::Relaxed);
        self.resets_drained.fetch_add(drained as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_reset_suppressed(&self) {
        self.resets_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record time spent rendering under the device lock
    #[inline]
    pub fn record_render_latency(&self, latency_us: u64) {
        self.renders_since_report.fetch_add(1, Ordering::Relaxed);
        self.render_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        self.render_buckets[bucket_index(latency_us)].fetch_add(1, Ordering::Relaxed);
        update_atomic_max(&self.render_max_us, latency_us);
    }

    pub fn edges_raised(&self) -> u64 {
        self.edges_raised.load(Ordering::Relaxed)
    }

    pub fn edges_debounced(&self) -> u64 {
        self.edges_debounced.load(Ordering::Relaxed)
    }

    pub fn entries_rejected(&self) -> u64 {
        self.entries_rejected.load(Ordering::Relaxed)
    }

    pub fn exits_ignored(&self) -> u64 {
        self.exits_ignored.load(Ordering::Relaxed)
    }

    pub fn resets_suppressed(&self) -> u64 {
        self.resets_suppressed.load(Ordering::Relaxed)
    }

    /// Calculate and return metrics summary, then reset periodic counters
    pub fn report(&self, occupancy: u32) -> MetricsSummary {
        let renders = self.renders_since_report.swap(0, Ordering::Relaxed);
        let render_sum = self.render_sum_us.swap(0, Ordering::Relaxed);
        let render_max = self.render_max_us.swap(0, Ordering::Relaxed);
        let render_buckets = swap_buckets(&self.render_buckets);

        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };

        MetricsSummary {
            occupancy,
            interval_secs: elapsed.as_secs_f64(),
            edges_raised: self.edges_raised.load(Ordering::Relaxed),
            edges_coalesced: self.edges_coalesced.load(Ordering::Relaxed),
            edges_debounced: self.edges_debounced.load(Ordering::Relaxed),
            edges_unmapped: self.edges_unmapped.load(Ordering::Relaxed),
            entries_total: self.entries_total.load(Ordering::Relaxed),
            entries_rejected: self.entries_rejected.load(Ordering::Relaxed),
            exits_total: self.exits_total.load(Ordering::Relaxed),
            exits_ignored: self.exits_ignored.load(Ordering::Relaxed),
            resets_total: self.resets_total.load(Ordering::Relaxed),
            resets_drained: self.resets_drained.load(Ordering::Relaxed),
            resets_suppressed: self.resets_suppressed.load(Ordering::Relaxed),
            renders,
            render_avg_us: if renders > 0 { render_sum / renders } else { 0 },
            render_max_us: render_max,
            render_p99_us: percentile_from_buckets(&render_buckets, 0.99),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time metrics snapshot
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub occupancy: u32,
    pub interval_secs: f64,
    pub edges_raised: u64,
    pub edges_coalesced: u64,
    pub edges_debounced: u64,
    pub edges_unmapped: u64,
    pub entries_total: u64,
    pub entries_rejected: u64,
    pub exits_total: u64,
    pub exits_ignored: u64,
    pub resets_total: u64,
    pub resets_drained: u64,
    pub resets_suppressed: u64,
    /// Renders during this interval
    pub renders: u64,
    pub render_avg_us: u64,
    pub render_max_us: u64,
    pub render_p99_us: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            occupancy = %self.occupancy,
            interval_secs = format!("{:.1}", self.interval_secs),
            edges_raised = %self.edges_raised,
            edges_coalesced = %self.edges_coalesced,
            edges_debounced = %self.edges_debounced,
            edges_unmapped = %self.edges_unmapped,
            entries = %self.entries_total,
            entries_rejected = %self.entries_rejected,
            exits = %self.exits_total,
            exits_ignored = %self.exits_ignored,
            resets = %self.resets_total,
            resets_drained = %self.resets_drained,
            resets_suppressed = %self.resets_suppressed,
            renders = %self.renders,
            render_avg_us = %self.render_avg_us,
            render_max_us = %self.render_max_us,
            render_p99_us = %self.render_p99_us,
            "metrics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_outcomes() {
        let metrics = Metrics::new();

        metrics.record_entry(true);
        metrics.record_entry(true);
        metrics.record_entry(false);
        metrics.record_exit(false);
        metrics.record_reset(2);

        let summary = metrics.report(0);
        assert_eq!(summary.entries_total, 2);
        assert_eq!(summary.entries_rejected, 1);
        assert_eq!(summary.exits_total, 0);
        assert_eq!(summary.exits_ignored, 1);
        assert_eq!(summary.resets_total, 1);
        assert_eq!(summary.resets_drained, 2);
    }

    #[test]
    fn test_report_resets_render_window() {
        let metrics = Metrics::new();

        metrics.record_render_latency(100);
        metrics.record_render_latency(300);

        let summary = metrics.report(3);
        assert_eq!(summary.occupancy, 3);
        assert_eq!(summary.renders, 2);
        assert_eq!(summary.render_avg_us, 200);
        assert_eq!(summary.render_max_us, 300);

        // Periodic counters are cleared, monotonic ones are not
        let next = metrics.report(3);
        assert_eq!(next.renders, 0);
        assert_eq!(next.render_max_us, 0);
    }

    #[test]
    fn test_edge_counters_are_monotonic() {
        let metrics = Metrics::new();

        metrics.record_edge_raised();
        metrics.record_edge_debounced();
        metrics.record_edge_debounced();
        metrics.report(0);

        assert_eq!(metrics.edges_raised(), 1);
        assert_eq!(metrics.edges_debounced(), 2);
    }

    #[test]
    fn test_concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(Metrics::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let m = metrics.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    m.record_edge_raised();
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(metrics.edges_raised(), 10_000);
    }

    #[test]
    fn test_bucket_index() {
        assert_eq!(bucket_index(0), 0);
        assert_eq!(bucket_index(100), 0);
        assert_eq!(bucket_index(101), 1);
        assert_eq!(bucket_index(51200), 9);
        assert_eq!(bucket_index(51201), 10);
    }

    #[test]
    fn test_percentile_computation() {
        let mut buckets = [0u64; NUM_BUCKETS];
        buckets[0] = 90;
        buckets[5] = 10;
        assert_eq!(percentile_from_buckets(&buckets, 0.50), 100);
        assert_eq!(percentile_from_buckets(&buckets, 0.99), 3200);
        assert_eq!(percentile_from_buckets(&[0; NUM_BUCKETS], 0.99), 0);
    }
}
