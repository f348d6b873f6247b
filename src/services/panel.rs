//! Panel core - owns the occupancy counter and services one event at a time
//!
//! Each `handle_*` method is one Acting step of the matching task: mutate the
//! counter, emit tones, refresh the display. The tasks in `tasks` call these
//! after their channel fires.
//!
//! Reset outranks entry and exit through `gate`, a write-preferring lock:
//! entry/exit steps hold the shared side, a reset holds the exclusive side.
//! The reset task leaves its signal pending until it owns the gate, and an
//! entry/exit step will not start while a reset signal is outstanding. A
//! step already holding the shared side finishes first.

use crate::domain::types::{OccupancyError, Source};
use crate::infra::clock::Clock;
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::services::dispatcher::Dispatcher;
use crate::services::event_channel::EventChannels;
use crate::services::feedback::{Feedback, FeedbackSink};
use crate::services::occupancy::OccupancyCounter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};
use tracing::{debug, info, warn};

pub struct PanelCore {
    config: Config,
    counter: OccupancyCounter,
    channels: Arc<EventChannels>,
    feedback: Feedback,
    metrics: Arc<Metrics>,
    gate: RwLock<()>,
    reset_claimed: Notify,
    cooling_down: AtomicBool,
}

impl PanelCore {
    pub fn new(
        config: Config,
        channels: Arc<EventChannels>,
        sink: Box<dyn FeedbackSink>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let counter = OccupancyCounter::new(config.max_occupants());
        Self::with_counter(config, counter, channels, sink, metrics)
    }

    pub fn with_counter(
        config: Config,
        counter: OccupancyCounter,
        channels: Arc<EventChannels>,
        sink: Box<dyn FeedbackSink>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let feedback = Feedback::new(sink, metrics.clone());
        Self {
            config,
            counter,
            channels,
            feedback,
            metrics,
            gate: RwLock::new(()),
            reset_claimed: Notify::new(),
            cooling_down: AtomicBool::new(false),
        }
    }

    /// Hold off while a reset signal waits to be claimed
    ///
    /// Signals raised during a cooldown are about to be discarded and do not
    /// hold anything up.
    async fn defer_to_reset(&self) {
        let reset = self.channels.get(Source::Reset);
        loop {
            let claimed = self.reset_claimed.notified();
            tokio::pin!(claimed);
            claimed.as_mut().enable();

            if !reset.is_pending() || self.cooling_down.load(Ordering::Acquire) {
                return;
            }
            debug!("deferring_to_reset");
            claimed.await;
        }
    }

    /// Entry step: admit one occupant or sound the rejection tone
    ///
    /// The rejection decision is the same atomic observation as the failed
    /// increment, never a second read of the counter.
    pub async fn handle_entry(&self) -> Result<u32, OccupancyError> {
        self.defer_to_reset().await;
        let _shared = self.gate.read().await;

        let result = self.counter.try_enter();
        self.metrics.record_entry(result.is_ok());

        match result {
            Ok(count) => {
                info!(count = %count, max = %self.counter.max(), "entry_accepted");
            }
            Err(e) => {
                warn!(max = %self.counter.max(), reason = %e, "entry_rejected");
                self.feedback.play(&[self.config.reject_tone()]).await;
            }
        }

        self.refresh();
        result
    }

    /// Exit step: release one occupant; an exit with nobody present is ignored
    pub async fn handle_exit(&self) -> Result<u32, OccupancyError> {
        self.defer_to_reset().await;
        let _shared = self.gate.read().await;

        let result = self.counter.try_exit();
        self.metrics.record_exit(result.is_ok());

        match result {
            Ok(count) => info!(count = %count, max = %self.counter.max(), "exit_accepted"),
            Err(e) => debug!(reason = %e, "exit_ignored"),
        }

        self.refresh();
        result
    }

    /// Reset step: drain, confirm with two pulses, refresh, then cool down
    ///
    /// The pending reset signal is consumed once the gate is held. Reset
    /// signals raised during the cooldown are discarded when it ends.
    /// Returns how many occupants were drained.
    pub async fn handle_reset(&self) -> u32 {
        let reset = self.channels.get(Source::Reset);
        let drained = {
            let _exclusive = self.gate.write().await;
            reset.try_take();
            self.cooling_down.store(true, Ordering::Release);
            self.reset_claimed.notify_waiters();

            let drained = self.counter.reset_to_zero();
            self.metrics.record_reset(drained);
            info!(drained = %drained, "reset");

            self.feedback.play(&self.config.reset_tone()).await;
            self.refresh();
            drained
        };

        tokio::time::sleep(Duration::from_millis(self.config.reset_cooldown_ms())).await;

        if reset.try_take() {
            self.metrics.record_reset_suppressed();
            info!(cooldown_ms = %self.config.reset_cooldown_ms(), "reset_suppressed_cooldown");
        }
        self.cooling_down.store(false, Ordering::Release);

        drained
    }

    /// Render the current snapshot
    pub fn refresh(&self) {
        self.feedback.refresh(self.counter.snapshot(), self.counter.max());
    }

    pub fn snapshot(&self) -> u32 {
        self.counter.snapshot()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn channels(&self) -> &Arc<EventChannels> {
        &self.channels
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}

/// Wire a panel: shared channels and metrics, the core, and its dispatcher
pub fn build_panel(
    config: Config,
    sink: Box<dyn FeedbackSink>,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
) -> (Arc<PanelCore>, Arc<Dispatcher>) {
    let channels = Arc::new(EventChannels::new());
    let dispatcher = Dispatcher::new(config.clone(), channels.clone(), clock, metrics.clone());
    let core = PanelCore::new(config, channels, sink, metrics);
    (Arc::new(core), Arc::new(dispatcher))
}
