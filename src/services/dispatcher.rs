//! Edge dispatcher - the single handler for every monitored input line
//!
//! Runs in edge-handler context: no I/O, no locks, no sleeping. It only
//! timestamps the edge, consults the debounce filter and raises the matching
//! event channel. Raising wakes the consumer task, which is the hand-back to
//! the scheduler.

use crate::domain::types::Source;
use crate::infra::clock::Clock;
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::services::debounce::DebounceFilter;
use crate::services::event_channel::EventChannels;
use std::sync::Arc;
use tracing::trace;

/// What happened to a single edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// Accepted and the channel went from idle to pending
    Raised,
    /// Accepted but a signal was already pending
    Coalesced,
    /// Inside the debounce window
    Debounced,
    /// Pin is not one of the monitored lines
    Unmapped,
}

pub struct Dispatcher {
    config: Config,
    debounce: DebounceFilter,
    channels: Arc<EventChannels>,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
}

impl Dispatcher {
    pub fn new(
        config: Config,
        channels: Arc<EventChannels>,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let debounce = DebounceFilter::from_config(&config);
        Self { config, debounce, channels, clock, metrics }
    }

    /// Handle an edge reported by GPIO number
    pub fn on_pin_edge(&self, pin: u32) -> EdgeOutcome {
        match self.config.source_for_pin(pin) {
            Some(source) => self.on_edge(source),
            None => {
                self.metrics.record_edge_unmapped();
                trace!(pin = %pin, "edge_unmapped");
                EdgeOutcome::Unmapped
            }
        }
    }

    /// Handle an edge on a known source
    pub fn on_edge(&self, source: Source) -> EdgeOutcome {
        let now_ms = self.clock.now_ms();
        self.dispatch(source, now_ms)
    }

    /// Handle several edges seen in the same invocation
    ///
    /// All edges share one timestamp and each is evaluated independently.
    /// Outcomes are written to the caller's buffer in order; edges beyond its
    /// length are not dispatched. Returns how many were handled.
    pub fn on_edges(&self, sources: &[Source], outcomes: &mut [EdgeOutcome]) -> usize {
        let now_ms = self.clock.now_ms();
        let mut handled = 0;
        for (&source, slot) in sources.iter().zip(outcomes.iter_mut()) {
            *slot = self.dispatch(source, now_ms);
            handled += 1;
        }
        handled
    }

    fn dispatch(&self, source: Source, now_ms: u32) -> EdgeOutcome {
        if !self.debounce.accept(source, now_ms) {
            self.metrics.record_edge_debounced();
            trace!(source = %source, now_ms = %now_ms, "edge_debounced");
            return EdgeOutcome::Debounced;
        }

        if self.channels.get(source).raise() {
            self.metrics.record_edge_raised();
            trace!(source = %source, now_ms = %now_ms, "edge_raised");
            EdgeOutcome::Raised
        } else {
            self.metrics.record_edge_coalesced();
            trace!(source = %source, now_ms = %now_ms, "edge_coalesced");
            EdgeOutcome::Coalesced
        }
    }

    pub fn channels(&self) -> &Arc<EventChannels> {
        &self.channels
    }
}
