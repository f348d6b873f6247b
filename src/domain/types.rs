//! Shared types for the access panel

use std::fmt;
use thiserror::Error;

/// Signal source behind each monitored input line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Entry,
    Exit,
    Reset,
}

impl Source {
    /// All sources in dispatch order
    pub const ALL: [Source; 3] = [Source::Entry, Source::Exit, Source::Reset];

    /// Dense index for per-source arrays
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Source::Entry => 0,
            Source::Exit => 1,
            Source::Reset => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Entry => "entry",
            Source::Exit => "exit",
            Source::Reset => "reset",
        }
    }

    /// Parse a console token into a source
    ///
    /// Accepts the full name, its first letter, or the original board's
    /// button letters (A = entry, B = exit, J = joystick reset).
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "entry" | "e" | "a" => Some(Source::Entry),
            "exit" | "x" | "b" => Some(Source::Exit),
            "reset" | "r" | "j" => Some(Source::Reset),
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Occupancy status shown on the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLabel {
    Vacant,
    Ok,
    Full,
}

impl StatusLabel {
    pub fn for_count(count: u32, max: u32) -> Self {
        if count == 0 {
            StatusLabel::Vacant
        } else if count < max {
            StatusLabel::Ok
        } else {
            StatusLabel::Full
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLabel::Vacant => "VACANT",
            StatusLabel::Ok => "OK",
            StatusLabel::Full => "FULL",
        }
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Four-tier indicator color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTier {
    Blue,
    Green,
    Amber,
    Red,
}

impl ColorTier {
    /// Blue when empty, red when full, amber with one slot left, green otherwise
    pub fn for_count(count: u32, max: u32) -> Self {
        if count == 0 {
            ColorTier::Blue
        } else if count >= max {
            ColorTier::Red
        } else if count == max - 1 {
            ColorTier::Amber
        } else {
            ColorTier::Green
        }
    }

    /// PWM duty levels (0..=255) for the red, green and blue channels
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            ColorTier::Blue => (0, 0, 255),
            ColorTier::Green => (0, 255, 0),
            ColorTier::Amber => (255, 255, 0),
            ColorTier::Red => (255, 0, 0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorTier::Blue => "blue",
            ColorTier::Green => "green",
            ColorTier::Amber => "amber",
            ColorTier::Red => "red",
        }
    }
}

impl fmt::Display for ColorTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a sink needs to render one frame of panel state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelView {
    pub count: u32,
    pub max: u32,
    pub label: StatusLabel,
    pub tier: ColorTier,
}

impl PanelView {
    pub fn new(count: u32, max: u32) -> Self {
        Self {
            count,
            max,
            label: StatusLabel::for_count(count, max),
            tier: ColorTier::for_count(count, max),
        }
    }

    /// Header line as drawn on the OLED
    pub fn users_line(&self) -> String {
        format!("Users: {}/{}", self.count, self.max)
    }

    /// Status line as drawn on the OLED
    pub fn status_line(&self) -> String {
        match self.label {
            StatusLabel::Full => "STATUS: FULL!!!".to_string(),
            label => format!("STATUS: {}", label),
        }
    }
}

/// One pulse of a tone sequence: sound for `duration_ms`, then stay silent for `pause_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TonePulse {
    pub frequency_hz: u32,
    pub duration_ms: u64,
    pub pause_ms: u64,
}

/// Rejected occupancy mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OccupancyError {
    #[error("capacity reached ({max} occupants)")]
    CapacityReached { max: u32 },
    #[error("no occupant to remove")]
    NoOccupantToRemove,
}
