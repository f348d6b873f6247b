//! Panel TUI - terminal front panel for the access panel
//!
//! Emulates the board's feedback devices:
//! - OLED text (users count and status line)
//! - RGB indicator (blue / green / amber / red)
//! - Buzzer (active tone and recent tones)
//!
//! Keys: `a`/`e` entry, `b`/`x` exit, `j`/`r` reset, `q`/Esc quit.
//! Key presses go through the same dispatcher as GPIO edges, so key repeat
//! is debounced exactly like a bouncing button. Keys are read on a dedicated
//! thread; the async side only redraws.

use access_panel::domain::types::{ColorTier, PanelView, Source};
use access_panel::infra::{Config, Metrics, MonotonicClock};
use access_panel::services::{
    build_panel, spawn_access_tasks, Dispatcher, EdgeOutcome, FeedbackSink, PanelCore,
};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use parking_lot::Mutex;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
    Frame, Terminal,
};
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Maximum entries to keep in the activity list
const MAX_ACTIVITY: usize = 12;
const FRAME_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(name = "panel-tui", about = "Terminal front panel for the access panel")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,
}

/// What the emulated devices currently show
#[derive(Default)]
struct PanelScreen {
    view: Option<PanelView>,
    tone: Option<u32>,
    activity: VecDeque<(Instant, String, Color)>,
}

impl PanelScreen {
    fn push_activity(&mut self, text: String, color: Color) {
        self.activity.push_front((Instant::now(), text, color));
        if self.activity.len() > MAX_ACTIVITY {
            self.activity.pop_back();
        }
    }
}

type SharedScreen = Arc<Mutex<PanelScreen>>;

/// Feedback sink that draws into the shared screen state
struct TuiSink {
    screen: SharedScreen,
}

impl FeedbackSink for TuiSink {
    fn render_status(&mut self, view: &PanelView) {
        self.screen.lock().view = Some(*view);
    }

    fn emit_tone(&mut self, frequency_hz: u32, duration_ms: u64) {
        let mut screen = self.screen.lock();
        screen.tone = Some(frequency_hz);
        screen.push_activity(format!("♪ {}Hz {}ms", frequency_hz, duration_ms), Color::Magenta);
    }

    fn stop_tone(&mut self) {
        self.screen.lock().tone = None;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config_path = Config::resolve_config_path(args.config);
    let config = Config::load_from_path(&config_path);

    let screen: SharedScreen = Arc::new(Mutex::new(PanelScreen::default()));
    let (core, dispatcher) = build_panel(
        config,
        Box::new(TuiSink { screen: screen.clone() }),
        Arc::new(MonotonicClock::new()),
        Arc::new(Metrics::new()),
    );
    let tasks = spawn_access_tasks(core.clone());

    // Key input blocks on the terminal, so it gets its own thread like the
    // console input of the headless binary
    let (quit_tx, quit_rx) = watch::channel(false);
    let key_screen = screen.clone();
    std::thread::Builder::new()
        .name("tui-keys".to_string())
        .spawn(move || run_key_input(dispatcher, key_screen, quit_tx))?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_ui(&mut terminal, &screen, &core, quit_rx).await;

    for task in tasks {
        task.abort();
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Read keys until quit, feeding button presses to the dispatcher
fn run_key_input(dispatcher: Arc<Dispatcher>, screen: SharedScreen, quit: watch::Sender<bool>) {
    loop {
        let event = match event::read() {
            Ok(event) => event,
            Err(_) => break,
        };
        let Event::Key(key) = event else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let source = match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Char(c) => Source::from_token(&c.to_string()),
            _ => None,
        };

        if let Some(source) = source {
            let outcome = dispatcher.on_edge(source);
            let color = match outcome {
                EdgeOutcome::Raised => Color::Green,
                EdgeOutcome::Coalesced => Color::Yellow,
                EdgeOutcome::Debounced | EdgeOutcome::Unmapped => Color::DarkGray,
            };
            screen.lock().push_activity(format!("{:<6} {:?}", source.as_str(), outcome), color);
        }
    }
    let _ = quit.send(true);
}

async fn run_ui(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    screen: &SharedScreen,
    core: &PanelCore,
    mut quit: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut frames = tokio::time::interval(FRAME_INTERVAL);

    loop {
        {
            let s = screen.lock();
            terminal.draw(|f| draw_ui(f, &s, core))?;
        }

        tokio::select! {
            _ = frames.tick() => {}
            _ = quit.changed() => return Ok(()),
        }
    }
}

fn tier_color(tier: ColorTier) -> Color {
    let (r, g, b) = tier.rgb();
    Color::Rgb(r, g, b)
}

fn draw_ui(f: &mut Frame, screen: &PanelScreen, core: &PanelCore) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // OLED
            Constraint::Length(3), // Capacity gauge
            Constraint::Min(0),    // Activity + help
        ])
        .split(f.area());

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(24), Constraint::Length(16), Constraint::Length(16)])
        .split(chunks[0]);

    let view = screen
        .view
        .unwrap_or_else(|| PanelView::new(core.snapshot(), core.config().max_occupants()));

    draw_oled(f, top[0], &view);
    draw_led(f, top[1], &view);
    draw_buzzer(f, top[2], screen.tone);
    draw_capacity(f, chunks[1], &view);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(28)])
        .split(chunks[2]);

    draw_activity(f, bottom[0], screen);
    draw_help(f, bottom[1]);
}

fn draw_oled(f: &mut Frame, area: Rect, view: &PanelView) {
    let text = vec![
        Line::from(Span::styled(view.users_line(), Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(view.status_line()),
    ];
    let oled = Paragraph::new(text).block(
        Block::default()
            .title(" OLED ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(oled, area);
}

fn draw_led(f: &mut Frame, area: Rect, view: &PanelView) {
    let color = tier_color(view.tier);
    let led = Paragraph::new(vec![
        Line::from(Span::styled("  ████  ", Style::default().fg(color))),
        Line::from(Span::styled("  ████  ", Style::default().fg(color))),
        Line::from(format!("  {}", view.tier.as_str().to_uppercase())),
    ])
    .block(Block::default().title(" RGB ").borders(Borders::ALL));
    f.render_widget(led, area);
}

fn draw_buzzer(f: &mut Frame, area: Rect, tone: Option<u32>) {
    let (text, color) = match tone {
        Some(hz) => (format!("♪ {} Hz", hz), Color::Magenta),
        None => ("silent".to_string(), Color::DarkGray),
    };
    let buzzer = Paragraph::new(Line::from(Span::styled(text, Style::default().fg(color))))
        .block(Block::default().title(" Buzzer ").borders(Borders::ALL));
    f.render_widget(buzzer, area);
}

fn draw_capacity(f: &mut Frame, area: Rect, view: &PanelView) {
    let ratio = if view.max > 0 { view.count as f64 / view.max as f64 } else { 0.0 };
    let gauge = Gauge::default()
        .block(Block::default().title(" Capacity ").borders(Borders::ALL))
        .gauge_style(Style::default().fg(tier_color(view.tier)))
        .ratio(ratio.min(1.0))
        .label(format!("{}/{}", view.count, view.max));
    f.render_widget(gauge, area);
}

fn draw_activity(f: &mut Frame, area: Rect, screen: &PanelScreen) {
    let items: Vec<ListItem> = screen
        .activity
        .iter()
        .map(|(at, text, color)| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:>5.1}s ", at.elapsed().as_secs_f64()),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(text.clone(), Style::default().fg(*color)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Activity ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );
    f.render_widget(list, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("a / e   entry"),
        Line::from("b / x   exit"),
        Line::from("j / r   reset"),
        Line::from("q       quit"),
    ])
    .block(Block::default().title(" Buttons ").borders(Borders::ALL));
    f.render_widget(help, area);
}
