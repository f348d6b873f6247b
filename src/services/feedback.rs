//! Feedback driver - serializes access to the display/LED/buzzer device
//!
//! The device lock is held for exactly one sink call and released by the
//! guard on every path. Tone timing happens between calls, outside the lock,
//! so a task sounding a tone never blocks another task's render for longer
//! than a single call.

use crate::domain::types::{PanelView, TonePulse};
use crate::infra::metrics::Metrics;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Output device driven by the panel core
///
/// Calls are synchronous and assumed to succeed; an implementation that can
/// fail logs the failure itself.
pub trait FeedbackSink: Send {
    /// Draw the occupancy text and set the indicator color
    fn render_status(&mut self, view: &PanelView);
    /// Start sounding a tone; the caller stops it after `duration_ms`
    fn emit_tone(&mut self, frequency_hz: u32, duration_ms: u64);
    fn stop_tone(&mut self);
}

pub struct Feedback {
    device: Mutex<Box<dyn FeedbackSink>>,
    metrics: Arc<Metrics>,
}

impl Feedback {
    pub fn new(sink: Box<dyn FeedbackSink>, metrics: Arc<Metrics>) -> Self {
        Self { device: Mutex::new(sink), metrics }
    }

    /// Render the panel for the given occupancy
    pub fn refresh(&self, count: u32, max: u32) {
        let view = PanelView::new(count, max);
        let start = Instant::now();
        {
            let mut device = self.device.lock();
            device.render_status(&view);
        }
        let latency_us = start.elapsed().as_micros() as u64;
        self.metrics.record_render_latency(latency_us);

        debug!(
            count = %view.count,
            max = %view.max,
            status = %view.label,
            color = %view.tier,
            render_us = %latency_us,
            "panel_refreshed"
        );
    }

    /// Sound each pulse in order, silencing between pulses
    pub async fn play(&self, pulses: &[TonePulse]) {
        for pulse in pulses {
            self.device.lock().emit_tone(pulse.frequency_hz, pulse.duration_ms);
            tokio::time::sleep(Duration::from_millis(pulse.duration_ms)).await;
            self.device.lock().stop_tone();
            if pulse.pause_ms > 0 {
                tokio::time::sleep(Duration::from_millis(pulse.pause_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{ColorTier, StatusLabel};
    use crate::io::sink::{RecordingSink, SinkCall};

    #[test]
    fn test_refresh_renders_view() {
        let sink = RecordingSink::new();
        let feedback = Feedback::new(Box::new(sink.clone()), Arc::new(Metrics::new()));

        feedback.refresh(8, 9);

        let view = sink.last_view().unwrap();
        assert_eq!(view.count, 8);
        assert_eq!(view.label, StatusLabel::Ok);
        assert_eq!(view.tier, ColorTier::Amber);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_two_pulses() {
        let sink = RecordingSink::new();
        let feedback = Feedback::new(Box::new(sink.clone()), Arc::new(Metrics::new()));
        let pulse = TonePulse { frequency_hz: 1500, duration_ms: 100, pause_ms: 50 };

        let start = tokio::time::Instant::now();
        feedback.play(&[pulse, TonePulse { pause_ms: 0, ..pulse }]).await;

        assert_eq!(start.elapsed(), Duration::from_millis(250));
        assert_eq!(
            sink.calls(),
            vec![
                SinkCall::Tone { frequency_hz: 1500, duration_ms: 100 },
                SinkCall::StopTone,
                SinkCall::Tone { frequency_hz: 1500, duration_ms: 100 },
                SinkCall::StopTone,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_not_blocked_by_tone() {
        let sink = RecordingSink::new();
        let feedback = Arc::new(Feedback::new(Box::new(sink.clone()), Arc::new(Metrics::new())));

        let player = {
            let feedback = feedback.clone();
            tokio::spawn(async move {
                feedback
                    .play(&[TonePulse { frequency_hz: 500, duration_ms: 100, pause_ms: 0 }])
                    .await
            })
        };
        tokio::task::yield_now().await;

        // Mid-tone render goes straight through
        feedback.refresh(1, 9);
        player.await.unwrap();

        let calls = sink.calls();
        assert!(matches!(calls[0], SinkCall::Tone { .. }));
        assert!(matches!(calls[1], SinkCall::Render(_)));
        assert_eq!(calls[2], SinkCall::StopTone);
    }
}
