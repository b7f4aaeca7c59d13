//! Calm music player page.

use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::{debug, warn};

use crate::sound::{discover_tracks, AudioOutput, SoundSource};
use crate::types::AppConfig;

/// File names of the bundled calm tracks.
pub const CALM_TRACKS: [&str; 5] = [
    "calm1.mp3",
    "calm2.mp3",
    "calm3.mp3",
    "calm4.mp3",
    "calm5.mp3",
];

/// Ordered tracks with a wrapping cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicPlaylist {
    tracks: Vec<PathBuf>,
    index: usize,
    minimized: bool,
}

impl MusicPlaylist {
    pub fn new(tracks: Vec<PathBuf>) -> Self {
        Self {
            tracks,
            index: 0,
            minimized: false,
        }
    }

    /// The five calm tracks, looked up in `dir`.
    pub fn calm(dir: &Path) -> Self {
        Self::new(CALM_TRACKS.iter().map(|name| dir.join(name)).collect())
    }

    /// Audio files found in `dir`, or the calm tracks when there are none.
    pub fn discover(dir: &Path) -> Self {
        let found: Vec<PathBuf> = discover_tracks(dir)
            .iter()
            .filter_map(|source| source.path().map(Path::to_path_buf))
            .collect();
        if found.is_empty() {
            Self::calm(dir)
        } else {
            Self::new(found)
        }
    }

    /// The configured tracks, falling back to `<data_dir>/music`.
    pub fn from_config(config: &AppConfig, data_dir: &Path) -> Self {
        if config.music_tracks.is_empty() {
            Self::discover(&data_dir.join("music"))
        } else {
            Self::new(config.music_tracks.clone())
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&Path> {
        self.tracks.get(self.index).map(PathBuf::as_path)
    }

    /// One-based label shown to the listener.
    pub fn label(&self) -> String {
        format!("Track {}", self.index + 1)
    }

    /// Jumps to a random track and restores the full view.
    pub fn open(&mut self, rng: &mut impl Rng) -> usize {
        if !self.tracks.is_empty() {
            self.index = rng.gen_range(0..self.tracks.len());
        }
        self.minimized = false;
        self.index
    }

    /// Rewinds the cursor to the first track.
    pub fn close(&mut self) {
        self.index = 0;
        self.minimized = false;
    }

    pub fn next(&mut self) -> usize {
        if !self.tracks.is_empty() {
            self.index = (self.index + 1) % self.tracks.len();
        }
        self.index
    }

    pub fn prev(&mut self) -> usize {
        if !self.tracks.is_empty() {
            self.index = self
                .index
                .checked_sub(1)
                .unwrap_or(self.tracks.len() - 1);
        }
        self.index
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub fn toggle_minimized(&mut self) -> bool {
        self.minimized = !self.minimized;
        self.minimized
    }
}

/// Builds the audio output for one track.
pub type AudioFactory = Box<dyn FnMut(&SoundSource) -> Option<Box<dyn AudioOutput>>>;

/// Music page: a playlist and the output playing its current track.
pub struct MusicHost {
    pub playlist: MusicPlaylist,
    audio: Option<Box<dyn AudioOutput>>,
    factory: AudioFactory,
}

impl MusicHost {
    pub fn new(playlist: MusicPlaylist, factory: AudioFactory) -> Self {
        Self {
            playlist,
            audio: None,
            factory,
        }
    }

    /// Opens on a random track and starts playing it.
    pub fn open(&mut self) {
        self.playlist.open(&mut rand::thread_rng());
        self.play_current();
    }

    pub fn next(&mut self) -> usize {
        let index = self.playlist.next();
        self.play_current();
        index
    }

    pub fn prev(&mut self) -> usize {
        let index = self.playlist.prev();
        self.play_current();
        index
    }

    pub fn is_playing(&self) -> bool {
        self.audio.as_ref().is_some_and(|audio| audio.is_playing())
    }

    /// Silences the current track and rewinds the playlist.
    pub fn teardown(&mut self) {
        self.halt();
        self.audio = None;
        self.playlist.close();
    }

    fn halt(&mut self) {
        if let Some(audio) = self.audio.as_mut() {
            audio.pause();
            audio.seek_to_start();
        }
    }

    fn play_current(&mut self) {
        self.halt();
        let Some(path) = self.playlist.current() else {
            debug!("Playlist is empty");
            self.audio = None;
            return;
        };

        let source = SoundSource::file(path);
        self.audio = (self.factory)(&source);
        if let Some(audio) = self.audio.as_mut() {
            match audio.play() {
                Ok(()) => debug!("Playing {}", source.name()),
                Err(e) => warn!("Could not play {}: {}", source.name(), e),
            }
        }
    }
}

impl std::fmt::Debug for MusicHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MusicHost")
            .field("playlist", &self.playlist)
            .field("has_audio", &self.audio.is_some())
            .finish_non_exhaustive()
    }
}
