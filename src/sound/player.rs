//! Looping audio player implementation using rodio.
//!
//! This module provides the `RodioAudio` player, which loops one
//! [`SoundSource`] through a rodio `Sink` for as long as it is playing.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::source::SineWave;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, warn};

use super::error::SoundError;
use super::source::SoundSource;
use super::AudioOutput;

/// Volume applied to the generated tone.
const TONE_VOLUME: f32 = 0.08;

/// A looping player backed by a rodio sink.
///
/// The sink starts paused and empty. `play` loads the source on first use,
/// `seek_to_start` clears it so the next `play` begins from the top.
pub struct RodioAudio {
    /// The audio output stream (must be kept alive for playback).
    _stream: OutputStream,
    /// Handle kept so the sink can be rebuilt after errors.
    stream_handle: OutputStreamHandle,
    sink: Sink,
    source: SoundSource,
    /// Whether sound playback is disabled.
    disabled: bool,
}

impl RodioAudio {
    /// Creates a player for `source`.
    ///
    /// # Arguments
    ///
    /// * `source` - The sound to loop.
    /// * `disabled` - If true, `play` silently does nothing.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no audio output device
    /// is available.
    pub fn new(source: SoundSource, disabled: bool) -> Result<Self, SoundError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| SoundError::DeviceNotAvailable(e.to_string()))?;
        let sink =
            Sink::try_new(&stream_handle).map_err(|e| SoundError::StreamError(e.to_string()))?;
        sink.pause();

        debug!("Audio output stream initialized for {}", source.name());

        Ok(Self {
            _stream: stream,
            stream_handle,
            sink,
            source,
            disabled,
        })
    }

    /// Returns the source being looped.
    #[must_use]
    pub fn source(&self) -> &SoundSource {
        &self.source
    }

    /// Queues the source, falling back to the tone if the file is unusable.
    fn load(&mut self) -> Result<(), SoundError> {
        match &self.source {
            SoundSource::File { path, name } => match open_looped(path) {
                Ok(looped) => {
                    debug!("Looping sound file: {}", name);
                    self.sink.append(looped);
                }
                Err(e) if e.should_fallback_to_tone() => {
                    warn!("Failed to load '{}': {}, falling back to tone", name, e);
                    self.append_tone(super::source::meditation_sound(None));
                }
                Err(e) => return Err(e),
            },
            SoundSource::Tone { .. } => self.append_tone(self.source.clone()),
        }
        Ok(())
    }

    fn append_tone(&self, source: SoundSource) {
        if let SoundSource::Tone { frequency_hz, .. } = source {
            self.sink
                .append(SineWave::new(frequency_hz as f32).amplify(TONE_VOLUME));
        }
    }

    fn rebuild_sink(&mut self) -> Result<(), SoundError> {
        self.sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| SoundError::StreamError(e.to_string()))?;
        self.sink.pause();
        Ok(())
    }
}

/// Opens and decodes a file, repeating it forever.
fn open_looped(path: &Path) -> Result<impl Source<Item = i16> + Send + 'static, SoundError> {
    let file = File::open(path)
        .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))?;
    let decoder =
        Decoder::new(BufReader::new(file)).map_err(|e| SoundError::DecodeError(e.to_string()))?;
    Ok(decoder.repeat_infinite())
}

impl AudioOutput for RodioAudio {
    fn play(&mut self) -> Result<(), SoundError> {
        if self.disabled {
            debug!("Sound playback disabled, skipping");
            return Ok(());
        }

        if self.sink.empty() {
            if let Err(e) = self.load() {
                // A failed load can leave the sink unusable.
                self.rebuild_sink()?;
                return Err(e);
            }
        }
        self.sink.play();
        debug!("Playback started");
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn seek_to_start(&mut self) {
        // Clearing drops the queued loop; the next play reloads from the top.
        self.sink.clear();
    }

    fn is_playing(&self) -> bool {
        !self.sink.is_paused() && !self.sink.empty()
    }
}

impl std::fmt::Debug for RodioAudio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioAudio")
            .field("source", &self.source)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

/// Creates a player, returning None if audio is unavailable.
///
/// If audio initialization fails, a warning is logged and None is returned;
/// the session then simply runs without sound.
#[must_use]
pub fn try_create_audio(source: SoundSource, disabled: bool) -> Option<RodioAudio> {
    match RodioAudio::new(source, disabled) {
        Ok(player) => Some(player),
        Err(e) => {
            warn!("Audio not available, sound disabled: {}", e);
            None
        }
    }
}
