//! moodmate library
//!
//! This library provides the core functionality for the moodmate CLI.
//! It includes:
//! - Timed session engine shared by the meditation countdown and the walk
//!   stopwatch
//! - Durable counters over a key-value store
//! - Looping audio playback for meditation
//! - Page hosts, the authentication gate and the page shell
//! - CLI command parsing, display utilities and interactive runners
//! - Type definitions for configuration and session state

pub mod app;
pub mod cli;
pub mod session;
pub mod sound;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    format_clock, ActivePage, AppConfig, MeditationConfig, SessionMode, SessionPhase,
    SessionSnapshot,
};

// Re-export session engine types
pub use session::{
    ClockSource, JsonFileStore, KeyValueStore, ManualClock, MemoryStore, PersistentCounter,
    SessionError, SessionEvent, SessionSideEffectDriver, StorageError, Tick, TimedSession,
    TipRotator, TokioClock,
};

// Re-export sound types
pub use sound::{
    meditation_sound, try_create_audio, AudioOutput, MockAudio, RodioAudio, SoundError,
    SoundSource,
};

// Re-export page types
pub use app::{
    MeditationHost, MockAuthenticator, MusicHost, MusicPlaylist, Page, Shell, ShellError,
    ThemePreference, WalkHost,
};
