//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument (parsed by the binaries)
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/panel.toml
//!
//! Every field has a compiled-in default, so a missing file or section yields
//! the stock panel (9 occupants, 200ms debounce, 500ms reset cooldown).

use crate::domain::types::{Source, TonePulse};
use anyhow::{bail, Context};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Maximum number of occupants
pub const MAX_OCCUPANTS: u32 = 9;
/// Debounce window applied to every input line (ms)
pub const DEBOUNCE_MS: u32 = 200;
/// Minimum interval between two serviced resets (ms)
pub const RESET_COOLDOWN_MS: u64 = 500;
/// Reset confirmation: two pulses at this pitch
pub const RESET_TONE_HZ: u32 = 1500;
pub const RESET_PULSE_MS: u64 = 100;
pub const RESET_PAUSE_MS: u64 = 50;
/// Capacity rejection: one short low tone
pub const REJECT_TONE_HZ: u32 = 500;
pub const REJECT_TONE_MS: u64 = 100;

/// GPIO numbers of the original board (buttons A, B and joystick press)
pub const ENTRY_PIN: u32 = 5;
pub const EXIT_PIN: u32 = 6;
pub const RESET_PIN: u32 = 22;

const DEFAULT_CONFIG_PATH: &str = "config/panel.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct PanelSection {
    #[serde(default = "default_max_occupants")]
    pub max_occupants: u32,
}

impl Default for PanelSection {
    fn default() -> Self {
        Self { max_occupants: default_max_occupants() }
    }
}

fn default_max_occupants() -> u32 {
    MAX_OCCUPANTS
}

#[derive(Debug, Clone, Deserialize)]
pub struct PinsSection {
    #[serde(default = "default_entry_pin")]
    pub entry: u32,
    #[serde(default = "default_exit_pin")]
    pub exit: u32,
    #[serde(default = "default_reset_pin")]
    pub reset: u32,
}

impl Default for PinsSection {
    fn default() -> Self {
        Self { entry: ENTRY_PIN, exit: EXIT_PIN, reset: RESET_PIN }
    }
}

fn default_entry_pin() -> u32 {
    ENTRY_PIN
}

fn default_exit_pin() -> u32 {
    EXIT_PIN
}

fn default_reset_pin() -> u32 {
    RESET_PIN
}

#[derive(Debug, Clone, Deserialize)]
pub struct DebounceSection {
    #[serde(default = "default_debounce_ms")]
    pub entry_ms: u32,
    #[serde(default = "default_debounce_ms")]
    pub exit_ms: u32,
    #[serde(default = "default_debounce_ms")]
    pub reset_ms: u32,
}

impl Default for DebounceSection {
    fn default() -> Self {
        Self { entry_ms: DEBOUNCE_MS, exit_ms: DEBOUNCE_MS, reset_ms: DEBOUNCE_MS }
    }
}

fn default_debounce_ms() -> u32 {
    DEBOUNCE_MS
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetSection {
    #[serde(default = "default_reset_cooldown_ms")]
    pub cooldown_ms: u64,
    #[serde(default = "default_reset_tone_hz")]
    pub tone_hz: u32,
    #[serde(default = "default_reset_pulse_ms")]
    pub pulse_ms: u64,
    #[serde(default = "default_reset_pause_ms")]
    pub pause_ms: u64,
}

impl Default for ResetSection {
    fn default() -> Self {
        Self {
            cooldown_ms: RESET_COOLDOWN_MS,
            tone_hz: RESET_TONE_HZ,
            pulse_ms: RESET_PULSE_MS,
            pause_ms: RESET_PAUSE_MS,
        }
    }
}

fn default_reset_cooldown_ms() -> u64 {
    RESET_COOLDOWN_MS
}

fn default_reset_tone_hz() -> u32 {
    RESET_TONE_HZ
}

fn default_reset_pulse_ms() -> u64 {
    RESET_PULSE_MS
}

fn default_reset_pause_ms() -> u64 {
    RESET_PAUSE_MS
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejectSection {
    #[serde(default = "default_reject_tone_hz")]
    pub tone_hz: u32,
    #[serde(default = "default_reject_tone_ms")]
    pub duration_ms: u64,
}

impl Default for RejectSection {
    fn default() -> Self {
        Self { tone_hz: REJECT_TONE_HZ, duration_ms: REJECT_TONE_MS }
    }
}

fn default_reject_tone_hz() -> u32 {
    REJECT_TONE_HZ
}

fn default_reject_tone_ms() -> u64 {
    REJECT_TONE_MS
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSection {
    #[serde(default = "default_metrics_interval")]
    pub interval_secs: u64,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval() }
    }
}

fn default_metrics_interval() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub panel: PanelSection,
    #[serde(default)]
    pub pins: PinsSection,
    #[serde(default)]
    pub debounce: DebounceSection,
    #[serde(default)]
    pub reset: ResetSection,
    #[serde(default)]
    pub reject: RejectSection,
    #[serde(default)]
    pub metrics: MetricsSection,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    max_occupants: u32,
    entry_pin: u32,
    exit_pin: u32,
    reset_pin: u32,
    debounce_ms: [u32; 3],
    reset_cooldown_ms: u64,
    reset_tone_hz: u32,
    reset_pulse_ms: u64,
    reset_pause_ms: u64,
    reject_tone_hz: u32,
    reject_tone_ms: u64,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default".to_string())
    }
}

impl Config {
    /// Determine config file path: command line, then CONFIG_FILE, then default
    pub fn resolve_config_path(cli_path: Option<String>) -> String {
        if let Some(path) = cli_path {
            return path;
        }

        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        DEFAULT_CONFIG_PATH.to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content, path.display().to_string())
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str, origin: String) -> anyhow::Result<Self> {
        let toml_config: TomlConfig = toml::from_str(content)
            .with_context(|| format!("Failed to parse config file {}", origin))?;

        let config = Self::from_toml(toml_config, origin);
        config.validate()?;
        Ok(config)
    }

    fn from_toml(toml_config: TomlConfig, config_file: String) -> Self {
        Self {
            max_occupants: toml_config.panel.max_occupants,
            entry_pin: toml_config.pins.entry,
            exit_pin: toml_config.pins.exit,
            reset_pin: toml_config.pins.reset,
            debounce_ms: [
                toml_config.debounce.entry_ms,
                toml_config.debounce.exit_ms,
                toml_config.debounce.reset_ms,
            ],
            reset_cooldown_ms: toml_config.reset.cooldown_ms,
            reset_tone_hz: toml_config.reset.tone_hz,
            reset_pulse_ms: toml_config.reset.pulse_ms,
            reset_pause_ms: toml_config.reset.pause_ms,
            reject_tone_hz: toml_config.reject.tone_hz,
            reject_tone_ms: toml_config.reject.duration_ms,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            config_file,
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.max_occupants == 0 {
            bail!("panel.max_occupants must be at least 1");
        }
        let pins = [self.entry_pin, self.exit_pin, self.reset_pin];
        if pins[0] == pins[1] || pins[0] == pins[2] || pins[1] == pins[2] {
            bail!("pins.entry, pins.exit and pins.reset must be distinct (got {:?})", pins);
        }
        if self.metrics_interval_secs == 0 {
            bail!("metrics.interval_secs must be at least 1");
        }
        Ok(())
    }

    /// Load configuration from an explicit path, falling back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Map a GPIO number to the input line it is wired to
    pub fn source_for_pin(&self, pin: u32) -> Option<Source> {
        if pin == self.entry_pin {
            Some(Source::Entry)
        } else if pin == self.exit_pin {
            Some(Source::Exit)
        } else if pin == self.reset_pin {
            Some(Source::Reset)
        } else {
            None
        }
    }

    pub fn pin_for_source(&self, source: Source) -> u32 {
        match source {
            Source::Entry => self.entry_pin,
            Source::Exit => self.exit_pin,
            Source::Reset => self.reset_pin,
        }
    }

    pub fn max_occupants(&self) -> u32 {
        self.max_occupants
    }

    pub fn debounce_ms(&self, source: Source) -> u32 {
        self.debounce_ms[source.index()]
    }

    pub fn reset_cooldown_ms(&self) -> u64 {
        self.reset_cooldown_ms
    }

    /// Reset confirmation: tone, pause, tone
    pub fn reset_tone(&self) -> [TonePulse; 2] {
        let pulse = TonePulse {
            frequency_hz: self.reset_tone_hz,
            duration_ms: self.reset_pulse_ms,
            pause_ms: self.reset_pause_ms,
        };
        [pulse, TonePulse { pause_ms: 0, ..pulse }]
    }

    pub fn reject_tone(&self) -> TonePulse {
        TonePulse {
            frequency_hz: self.reject_tone_hz,
            duration_ms: self.reject_tone_ms,
            pause_ms: 0,
        }
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Override the capacity; fails the same validation as a config file
    pub fn with_max_occupants(mut self, max: u32) -> anyhow::Result<Self> {
        self.max_occupants = max;
        self.validate()?;
        Ok(self)
    }

    /// Override the reset cooldown (any value is valid, 0 disables it)
    pub fn with_reset_cooldown_ms(mut self, ms: u64) -> Self {
        self.reset_cooldown_ms = ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_occupants(), 9);
        assert_eq!(config.debounce_ms(Source::Entry), 200);
        assert_eq!(config.debounce_ms(Source::Exit), 200);
        assert_eq!(config.debounce_ms(Source::Reset), 200);
        assert_eq!(config.reset_cooldown_ms(), 500);
        assert_eq!(config.config_file(), "default");
    }

    #[test]
    fn test_source_for_pin() {
        let config = Config::default();
        assert_eq!(config.source_for_pin(5), Some(Source::Entry));
        assert_eq!(config.source_for_pin(6), Some(Source::Exit));
        assert_eq!(config.source_for_pin(22), Some(Source::Reset));
        assert_eq!(config.source_for_pin(13), None);
        assert_eq!(config.pin_for_source(Source::Reset), 22);
    }

    #[test]
    fn test_tone_parameters() {
        let config = Config::default();
        let [first, second] = config.reset_tone();
        assert_eq!(first.frequency_hz, 1500);
        assert_eq!(first.duration_ms, 100);
        assert_eq!(first.pause_ms, 50);
        assert_eq!(second.pause_ms, 0);

        let reject = config.reject_tone();
        assert_eq!(reject.frequency_hz, 500);
        assert_eq!(reject.duration_ms, 100);
    }

    #[test]
    fn test_resolve_config_path_prefers_cli() {
        let path = Config::resolve_config_path(Some("config/lab.toml".to_string()));
        assert_eq!(path, "config/lab.toml");
    }

    #[test]
    fn test_resolve_config_path_default() {
        if env::var("CONFIG_FILE").is_err() {
            assert_eq!(Config::resolve_config_path(None), DEFAULT_CONFIG_PATH);
        }
    }

    #[test]
    fn test_with_max_occupants_validates() {
        assert_eq!(Config::default().with_max_occupants(3).unwrap().max_occupants(), 3);
        assert!(Config::default().with_max_occupants(0).is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str("[panel]\nmax_occupants = 4\n", "inline".to_string())
            .unwrap();
        assert_eq!(config.max_occupants(), 4);
        assert_eq!(config.debounce_ms(Source::Exit), 200);
        assert_eq!(config.reset_cooldown_ms(), 500);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = Config::from_toml_str("[panel]\nmax_occupants = 0\n", "inline".to_string())
            .unwrap_err();
        assert!(err.to_string().contains("max_occupants"));
    }

    #[test]
    fn test_duplicate_pins_rejected() {
        let err = Config::from_toml_str("[pins]\nentry = 6\n", "inline".to_string()).unwrap_err();
        assert!(err.to_string().contains("distinct"));
    }
}
