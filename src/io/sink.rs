//! Feedback sinks for hosts without panel hardware
//!
//! - `LogSink` renders the display, RGB indicator and buzzer as structured
//!   log events
//! - `RecordingSink` keeps every call for inspection (tests, replay)

use crate::domain::types::PanelView;
use crate::services::feedback::FeedbackSink;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Renders panel output through `tracing`
#[derive(Debug, Default)]
pub struct LogSink;

impl FeedbackSink for LogSink {
    fn render_status(&mut self, view: &PanelView) {
        let (r, g, b) = view.tier.rgb();
        info!(
            users = %view.users_line(),
            status = %view.status_line(),
            color = %view.tier,
            rgb = format!("{},{},{}", r, g, b),
            "display"
        );
    }

    fn emit_tone(&mut self, frequency_hz: u32, duration_ms: u64) {
        info!(frequency_hz = %frequency_hz, duration_ms = %duration_ms, "buzzer_on");
    }

    fn stop_tone(&mut self) {
        tracing::debug!("buzzer_off");
    }
}

/// One recorded sink call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Render(PanelView),
    Tone { frequency_hz: u32, duration_ms: u64 },
    StopTone,
}

/// Sink that records calls; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    calls: Arc<Mutex<Vec<SinkCall>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().clone()
    }

    /// Most recently rendered view
    pub fn last_view(&self) -> Option<PanelView> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            SinkCall::Render(view) => Some(*view),
            _ => None,
        })
    }

    /// Tones emitted at a given pitch
    pub fn tone_count(&self, frequency_hz: u32) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| {
                matches!(call, SinkCall::Tone { frequency_hz: f, .. } if *f == frequency_hz)
            })
            .count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

impl FeedbackSink for RecordingSink {
    fn render_status(&mut self, view: &PanelView) {
        self.calls.lock().push(SinkCall::Render(*view));
    }

    fn emit_tone(&mut self, frequency_hz: u32, duration_ms: u64) {
        self.calls.lock().push(SinkCall::Tone { frequency_hz, duration_ms });
    }

    fn stop_tone(&mut self) {
        self.calls.lock().push(SinkCall::StopTone);
    }
}
