//! Sound source management.
//!
//! A meditation loops either an audio file chosen by the user or a soft
//! generated tone when no file is configured. The music playlist is built
//! from files discovered in a directory.

use std::path::{Path, PathBuf};

/// Represents the source of a sound to be played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSource {
    /// An audio file on disk.
    File {
        /// Display name (the file stem).
        name: String,
        /// The full path to the sound file.
        path: PathBuf,
    },
    /// A generated sine tone.
    Tone {
        /// Display name.
        name: String,
        /// Pitch in hertz.
        frequency_hz: u32,
    },
}

impl SoundSource {
    /// Creates a file sound source named after the file stem.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::File { name, path }
    }

    /// Creates a tone source.
    #[must_use]
    pub fn tone(name: impl Into<String>, frequency_hz: u32) -> Self {
        Self::Tone {
            name: name.into(),
            frequency_hz,
        }
    }

    /// Returns the name of the sound source.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Tone { name, .. } => name,
        }
    }

    /// Returns the file path if this is a file source.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File { path, .. } => Some(path),
            Self::Tone { .. } => None,
        }
    }
}

/// Pitch of the fallback meditation drone.
const DEFAULT_TONE_HZ: u32 = 174;

/// Supported audio file extensions.
const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg", "aiff", "m4a"];

/// Returns the meditation sound: the configured track, or the soft tone.
#[must_use]
pub fn meditation_sound(track: Option<&Path>) -> SoundSource {
    match track {
        Some(path) => SoundSource::file(path),
        None => SoundSource::tone("calm tone", DEFAULT_TONE_HZ),
    }
}

/// Discovers audio files in `dir`, sorted by name.
///
/// Returns an empty vector if the directory is missing or unreadable.
#[must_use]
pub fn discover_tracks(dir: &Path) -> Vec<SoundSource> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut tracks: Vec<SoundSource> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        })
        .map(SoundSource::file)
        .collect();

    tracks.sort_by(|a, b| a.name().cmp(b.name()));
    tracks
}
