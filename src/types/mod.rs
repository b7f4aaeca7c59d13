//! Core data types for moodmate.
//!
//! This module defines the data structures used for:
//! - Session mode and phase
//! - Clock display formatting
//! - Application and meditation configuration with validation
//! - Page selection for the hosting shell

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ============================================================================
// SessionMode
// ============================================================================

/// How a timed session counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Counts down from a fixed target to zero and completes itself
    Countdown,
    /// Counts up without bound until explicitly stopped
    Stopwatch,
}

impl SessionMode {
    /// Returns the string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Countdown => "countdown",
            SessionMode::Stopwatch => "stopwatch",
        }
    }
}

// ============================================================================
// SessionPhase
// ============================================================================

/// Represents the current phase of a timed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No session in progress
    #[default]
    Idle,
    /// Ticks are being applied
    Running,
    /// Countdown suspended, remaining time kept
    Paused,
    /// Countdown reached zero; terminal until acknowledged or reset
    Completed,
}

impl SessionPhase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Running => "running",
            SessionPhase::Paused => "paused",
            SessionPhase::Completed => "completed",
        }
    }

    /// Returns true while a session is in progress (running or paused).
    pub fn is_in_progress(&self) -> bool {
        matches!(self, SessionPhase::Running | SessionPhase::Paused)
    }
}

// ============================================================================
// Clock formatting
// ============================================================================

/// Formats seconds as `MM:SS`.
///
/// Minutes are zero padded to two digits and never roll into hours, so
/// 100 minutes renders as `100:00`.
pub fn format_clock(total_seconds: u64) -> String {
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}", minutes, seconds)
}

// ============================================================================
// SessionSnapshot
// ============================================================================

/// Point-in-time view of a session, as read by hosts and displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session mode
    pub mode: SessionMode,
    /// Current phase
    pub phase: SessionPhase,
    /// Seconds counted in the current segment
    #[serde(rename = "elapsedSeconds")]
    pub elapsed_seconds: u64,
    /// Seconds left (countdown only, 0 for stopwatch)
    #[serde(rename = "remainingSeconds")]
    pub remaining_seconds: u64,
    /// Lifetime total of finished stopwatch segments
    #[serde(rename = "accumulatedSeconds")]
    pub accumulated_seconds: u64,
}

impl SessionSnapshot {
    /// Returns the clock the user should see: remaining time for a
    /// countdown, elapsed time for a stopwatch.
    pub fn display_seconds(&self) -> u64 {
        match self.mode {
            SessionMode::Countdown => self.remaining_seconds,
            SessionMode::Stopwatch => self.elapsed_seconds,
        }
    }
}

// ============================================================================
// MeditationConfig
// ============================================================================

/// Shortest meditation the host accepts, in minutes.
pub const MIN_MEDITATION_MINUTES: u32 = 1;
/// Longest meditation the host accepts, in minutes.
pub const MAX_MEDITATION_MINUTES: u32 = 60;

/// Configuration for one guided meditation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeditationConfig {
    /// Duration in minutes (1-60)
    pub minutes: u32,
}

impl Default for MeditationConfig {
    fn default() -> Self {
        Self { minutes: 5 }
    }
}

impl MeditationConfig {
    /// Creates a configuration from raw user input, clamping into 1-60.
    pub fn clamped(minutes: i64) -> Self {
        let minutes = minutes.clamp(
            i64::from(MIN_MEDITATION_MINUTES),
            i64::from(MAX_MEDITATION_MINUTES),
        );
        Self {
            minutes: minutes as u32,
        }
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.minutes < MIN_MEDITATION_MINUTES || self.minutes > MAX_MEDITATION_MINUTES {
            return Err("Meditation length must be between 1 and 60 minutes".to_string());
        }
        Ok(())
    }

    /// Returns the countdown target in seconds.
    pub fn target_seconds(&self) -> u64 {
        u64::from(self.minutes) * 60
    }
}

// ============================================================================
// AppConfig
// ============================================================================

fn default_meditation_minutes() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_tip_fade_millis() -> u64 {
    300
}

/// User configuration read from `config.json`.
///
/// Every field has a default, so a partial file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Meditation length offered when none is given
    #[serde(default = "default_meditation_minutes")]
    pub default_meditation_minutes: u32,

    /// Audio file looped during meditation; a soft tone is used when unset
    #[serde(default)]
    pub meditation_track: Option<PathBuf>,

    /// Whether any audio is played
    #[serde(default = "default_true")]
    pub sound_enabled: bool,

    /// Length of the tip cross-fade in milliseconds
    #[serde(default = "default_tip_fade_millis")]
    pub tip_fade_millis: u64,

    /// Calm music playlist
    #[serde(default)]
    pub music_tracks: Vec<PathBuf>,

    /// Overrides where persisted values are stored
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_meditation_minutes: default_meditation_minutes(),
            meditation_track: None,
            sound_enabled: default_true(),
            tip_fade_millis: default_tip_fade_millis(),
            music_tracks: Vec::new(),
            data_dir: None,
        }
    }
}

impl AppConfig {
    /// Returns the default location of the configuration file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("moodmate").join("config.json"))
    }

    /// Loads the configuration from `path`.
    ///
    /// A missing file yields the defaults. A malformed file is logged and
    /// also yields the defaults.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Self::default();
            }
            Err(e) => {
                warn!("Could not read config {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str(&text) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Loads the configuration from the default location.
    pub fn load_default() -> Self {
        Self::default_path()
            .map(|path| Self::load(&path))
            .unwrap_or_default()
    }

    /// Returns the directory that holds persisted values.
    pub fn resolve_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("moodmate")
        })
    }

    /// Returns the default meditation configuration, clamped into range.
    pub fn meditation(&self) -> MeditationConfig {
        let configured = MeditationConfig {
            minutes: self.default_meditation_minutes,
        };
        match configured.validate() {
            Ok(()) => configured,
            Err(e) => {
                warn!("{}, clamping {}", e, self.default_meditation_minutes);
                MeditationConfig::clamped(i64::from(self.default_meditation_minutes))
            }
        }
    }
}

// ============================================================================
// ActivePage
// ============================================================================

/// The one page shown by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivePage {
    /// The chat box
    #[default]
    None,
    /// Calm music player
    Music,
    /// Guided meditation
    Meditation,
    /// Journal
    Journal,
    /// Walk tracker
    Walk,
}

impl ActivePage {
    /// Returns the string representation of the page.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivePage::None => "none",
            ActivePage::Music => "music",
            ActivePage::Meditation => "meditation",
            ActivePage::Journal => "journal",
            ActivePage::Walk => "walk",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
