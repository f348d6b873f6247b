//! End-to-end panel tests: edge -> dispatcher -> channel -> task -> counter -> sink

use access_panel::domain::types::{ColorTier, PanelView, Source, StatusLabel};
use access_panel::infra::{Config, ManualClock, Metrics};
use access_panel::io::{RecordingSink, SinkCall};
use access_panel::services::{
    build_panel, spawn_access_tasks, Dispatcher, EdgeOutcome, PanelCore,
};
use std::sync::Arc;
use std::time::Duration;

const REJECT_HZ: u32 = 500;
const RESET_HZ: u32 = 1500;

/// Test harness holding the wired panel and its fakes
struct TestPanel {
    core: Arc<PanelCore>,
    dispatcher: Arc<Dispatcher>,
    clock: Arc<ManualClock>,
    sink: RecordingSink,
}

impl TestPanel {
    fn start(config: Config) -> Self {
        let clock = Arc::new(ManualClock::new(1_000));
        let sink = RecordingSink::new();
        let (core, dispatcher) = build_panel(
            config,
            Box::new(sink.clone()),
            clock.clone(),
            Arc::new(Metrics::new()),
        );
        spawn_access_tasks(core.clone());
        Self { core, dispatcher, clock, sink }
    }

    /// Press a button well outside its debounce window and let the task finish
    async fn press(&self, source: Source) -> EdgeOutcome {
        self.clock.advance(250);
        let outcome = self.dispatcher.on_edge(source);
        settle().await;
        outcome
    }

    async fn press_n(&self, source: Source, n: usize) {
        for _ in 0..n {
            self.press(source).await;
        }
    }

    fn view(&self) -> PanelView {
        self.sink.last_view().expect("panel rendered at least once")
    }
}

/// Long enough for any single step including the reset cooldown
async fn settle() {
    tokio::time::sleep(Duration::from_secs(1)).await;
}

#[tokio::test(start_paused = true)]
async fn test_initial_render_is_vacant() {
    let panel = TestPanel::start(Config::default());
    settle().await;

    assert_eq!(panel.view(), PanelView::new(0, 9));
    assert_eq!(panel.view().tier, ColorTier::Blue);
}

#[tokio::test(start_paused = true)]
async fn test_three_entries_show_ok_green() {
    let panel = TestPanel::start(Config::default());

    panel.press_n(Source::Entry, 3).await;

    assert_eq!(panel.core.snapshot(), 3);
    let view = panel.view();
    assert_eq!(view.label, StatusLabel::Ok);
    assert_eq!(view.tier, ColorTier::Green);
}

#[tokio::test(start_paused = true)]
async fn test_last_slot_fills_red_without_rejection() {
    let panel = TestPanel::start(Config::default());
    panel.press_n(Source::Entry, 8).await;
    assert_eq!(panel.view().tier, ColorTier::Amber);

    panel.press(Source::Entry).await;

    assert_eq!(panel.core.snapshot(), 9);
    let view = panel.view();
    assert_eq!(view.label, StatusLabel::Full);
    assert_eq!(view.tier, ColorTier::Red);
    assert_eq!(panel.sink.tone_count(REJECT_HZ), 0);
}

#[tokio::test(start_paused = true)]
async fn test_entry_when_full_sounds_rejection() {
    let panel = TestPanel::start(Config::default());
    panel.press_n(Source::Entry, 9).await;

    panel.press(Source::Entry).await;

    assert_eq!(panel.core.snapshot(), 9);
    assert_eq!(panel.sink.tone_count(REJECT_HZ), 1);
    assert_eq!(panel.view().label, StatusLabel::Full);
}

#[tokio::test(start_paused = true)]
async fn test_one_rejection_tone_per_accepted_signal() {
    let panel = TestPanel::start(Config::default().with_max_occupants(2).unwrap());
    panel.press_n(Source::Entry, 2).await;

    panel.press_n(Source::Entry, 4).await;

    assert_eq!(panel.core.snapshot(), 2);
    assert_eq!(panel.sink.tone_count(REJECT_HZ), 4);
}

#[tokio::test(start_paused = true)]
async fn test_reset_drains_once_and_ignores_cooldown_press() {
    let panel = TestPanel::start(Config::default());
    panel.press_n(Source::Entry, 5).await;
    panel.sink.clear();

    panel.clock.advance(250);
    assert_eq!(panel.dispatcher.on_edge(Source::Reset), EdgeOutcome::Raised);

    // 300ms later the first reset is cooling down; this press passes debounce
    tokio::time::sleep(Duration::from_millis(300)).await;
    panel.clock.advance(300);
    assert_eq!(panel.dispatcher.on_edge(Source::Reset), EdgeOutcome::Raised);
    settle().await;

    assert_eq!(panel.core.snapshot(), 0);
    assert_eq!(panel.sink.tone_count(RESET_HZ), 2, "one two-pulse confirmation only");
    let view = panel.view();
    assert_eq!(view.label, StatusLabel::Vacant);
    assert_eq!(view.tier, ColorTier::Blue);
    assert_eq!(panel.core.metrics().resets_suppressed(), 1);

    // Tone, pause, tone
    let tones: Vec<_> = panel
        .sink
        .calls()
        .into_iter()
        .filter(|c| !matches!(c, SinkCall::Render(_)))
        .collect();
    assert_eq!(
        tones,
        vec![
            SinkCall::Tone { frequency_hz: RESET_HZ, duration_ms: 100 },
            SinkCall::StopTone,
            SinkCall::Tone { frequency_hz: RESET_HZ, duration_ms: 100 },
            SinkCall::StopTone,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_reset_after_cooldown_is_serviced() {
    let panel = TestPanel::start(Config::default());
    panel.press_n(Source::Entry, 2).await;

    panel.press(Source::Reset).await;
    panel.press_n(Source::Entry, 1).await;
    panel.press(Source::Reset).await;

    assert_eq!(panel.core.snapshot(), 0);
    assert_eq!(panel.sink.tone_count(RESET_HZ), 4);
}

#[tokio::test(start_paused = true)]
async fn test_exit_sequence_never_goes_negative() {
    let panel = TestPanel::start(Config::default());
    panel.press_n(Source::Entry, 2).await;

    panel.press_n(Source::Exit, 5).await;

    assert_eq!(panel.core.snapshot(), 0);
    assert_eq!(panel.view().label, StatusLabel::Vacant);
    assert_eq!(panel.sink.tone_count(REJECT_HZ), 0);
    assert_eq!(panel.core.metrics().exits_ignored(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_bounce_produces_one_entry() {
    let panel = TestPanel::start(Config::default());

    panel.clock.advance(250);
    assert_eq!(panel.dispatcher.on_edge(Source::Entry), EdgeOutcome::Raised);
    for _ in 0..5 {
        panel.clock.advance(20);
        assert_eq!(panel.dispatcher.on_edge(Source::Entry), EdgeOutcome::Debounced);
    }
    settle().await;

    assert_eq!(panel.core.snapshot(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_signals_raised_before_consumption_coalesce() {
    let panel = TestPanel::start(Config::default());
    settle().await;

    // Two accepted edges before the entry task gets to run
    panel.clock.advance(250);
    assert_eq!(panel.dispatcher.on_edge(Source::Entry), EdgeOutcome::Raised);
    panel.clock.advance(250);
    assert_eq!(panel.dispatcher.on_edge(Source::Entry), EdgeOutcome::Coalesced);
    settle().await;

    assert_eq!(panel.core.snapshot(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_simultaneous_entry_and_exit() {
    let panel = TestPanel::start(Config::default());
    panel.press_n(Source::Entry, 3).await;

    panel.clock.advance(250);
    let mut outcomes = [EdgeOutcome::Unmapped; 2];
    panel.dispatcher.on_edges(&[Source::Entry, Source::Exit], &mut outcomes);
    assert_eq!(outcomes, [EdgeOutcome::Raised, EdgeOutcome::Raised]);
    settle().await;

    assert_eq!(panel.core.snapshot(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_reset_serviced_before_simultaneous_entry() {
    let panel = TestPanel::start(Config::default());
    panel.press_n(Source::Entry, 3).await;

    panel.clock.advance(250);
    let mut outcomes = [EdgeOutcome::Unmapped; 2];
    panel.dispatcher.on_edges(&[Source::Entry, Source::Reset], &mut outcomes);
    assert_eq!(outcomes, [EdgeOutcome::Raised, EdgeOutcome::Raised]);
    settle().await;

    // Drained to 0 first, then the entry lands
    assert_eq!(panel.core.snapshot(), 1);
    assert_eq!(panel.view().count, 1);
    assert_eq!(panel.sink.tone_count(RESET_HZ), 2);
}

#[tokio::test(start_paused = true)]
async fn test_reset_serviced_before_simultaneous_exit() {
    let panel = TestPanel::start(Config::default());
    panel.press_n(Source::Entry, 3).await;

    panel.clock.advance(250);
    let mut outcomes = [EdgeOutcome::Unmapped; 2];
    panel.dispatcher.on_edges(&[Source::Exit, Source::Reset], &mut outcomes);
    settle().await;

    // The exit finds nobody left to remove
    assert_eq!(panel.core.snapshot(), 0);
    assert_eq!(panel.core.metrics().exits_ignored(), 1);
    assert_eq!(panel.view().label, StatusLabel::Vacant);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_producers_stay_in_bounds() {
    let panel = TestPanel::start(Config::default().with_reset_cooldown_ms(0));
    let channels = panel.core.channels().clone();

    // Raise channels directly from plain threads, bypassing debounce
    let producers: Vec<_> = [Source::Entry, Source::Exit, Source::Entry]
        .into_iter()
        .map(|source| {
            let channels = channels.clone();
            std::thread::spawn(move || {
                for _ in 0..40 {
                    channels.get(source).raise();
                    std::thread::sleep(Duration::from_millis(2));
                }
            })
        })
        .collect();

    let reset_channels = channels.clone();
    let resetter = std::thread::spawn(move || {
        for _ in 0..3 {
            std::thread::sleep(Duration::from_millis(25));
            reset_channels.get(Source::Reset).raise();
        }
    });

    for _ in 0..50 {
        assert!(panel.core.snapshot() <= 9);
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    for p in producers {
        p.join().unwrap();
    }
    resetter.join().unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    // A final reset drains whatever the producers left behind
    channels.get(Source::Reset).raise();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(panel.core.snapshot(), 0);
    assert_eq!(panel.view().count, 0);
}
