//! Sound playback for moodmate.
//!
//! This module provides the looping audio used during meditation:
//!
//! - A user-chosen audio file, looped
//! - A generated calm tone when no file is configured or it cannot be read
//! - Graceful degradation when no audio device is present
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   AudioOutput    │ ← play / pause / seek_to_start
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │    RodioAudio    │────▶│   Audio file     │
//! │   (looping sink) │     ├──────────────────┤
//! │                  │────▶│  Sine tone       │
//! └──────────────────┘     │  (fallback)      │
//!                          └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use moodmate::sound::{meditation_sound, AudioOutput, RodioAudio};
//!
//! let mut audio = RodioAudio::new(meditation_sound(None), false).expect("audio init");
//! audio.play().expect("playback failed");
//! audio.pause();
//! audio.seek_to_start();
//! ```

mod error;
mod player;
mod source;

use std::sync::{Arc, Mutex};

pub use error::SoundError;
pub use player::{try_create_audio, RodioAudio};
pub use source::{discover_tracks, meditation_sound, SoundSource};

/// Controls for one looping audio stream.
pub trait AudioOutput {
    /// Starts or continues playback.
    ///
    /// # Errors
    ///
    /// Returns an error if playback could not start. Callers treat this as
    /// non-fatal.
    fn play(&mut self) -> Result<(), SoundError>;

    /// Halts playback, keeping the position.
    fn pause(&mut self);

    /// Rewinds to the beginning.
    fn seek_to_start(&mut self);

    /// Returns true while audio is audible.
    fn is_playing(&self) -> bool;
}

impl<T: AudioOutput + ?Sized> AudioOutput for Box<T> {
    fn play(&mut self) -> Result<(), SoundError> {
        (**self).play()
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn seek_to_start(&mut self) {
        (**self).seek_to_start()
    }

    fn is_playing(&self) -> bool {
        (**self).is_playing()
    }
}

/// A call recorded by [`MockAudio`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCall {
    Play,
    Pause,
    SeekToStart,
}

#[derive(Debug, Default)]
struct MockAudioState {
    calls: Vec<AudioCall>,
    playing: bool,
    should_fail: bool,
}

/// Mock audio output for testing.
///
/// Clones share state, so a test can keep a handle after moving one into a
/// driver.
#[derive(Debug, Clone, Default)]
pub struct MockAudio {
    state: Arc<Mutex<MockAudioState>>,
}

impl MockAudio {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `play` fail, as a blocked autoplay would.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.state.lock().unwrap().should_fail = should_fail;
    }

    #[must_use]
    pub fn calls(&self) -> Vec<AudioCall> {
        self.state.lock().unwrap().calls.clone()
    }

    #[must_use]
    pub fn play_count(&self) -> usize {
        self.calls().iter().filter(|c| **c == AudioCall::Play).count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }
}

impl AudioOutput for MockAudio {
    fn play(&mut self) -> Result<(), SoundError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(AudioCall::Play);
        if state.should_fail {
            return Err(SoundError::PlaybackError("Mock failure".to_string()));
        }
        state.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.calls.push(AudioCall::Pause);
        state.playing = false;
    }

    fn seek_to_start(&mut self) {
        self.state.lock().unwrap().calls.push(AudioCall::SeekToStart);
    }

    fn is_playing(&self) -> bool {
        self.state.lock().unwrap().playing
    }
}
