//! Display utilities for the moodmate CLI.
//!
//! This module provides formatted output for:
//! - Session status lines
//! - Walk totals and tips
//! - Error messages

use std::io::Write;

use crate::app::MusicPlaylist;
use crate::types::{format_clock, SessionPhase, SessionSnapshot};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the meditation banner and key help.
    pub fn show_meditation_start(minutes: u32, track: &str) {
        println!("* Meditating for {} min ({})", minutes, track);
        println!("  [p] pause/resume  [s] stop");
    }

    /// Shows the walk banner and key help.
    pub fn show_walk_help(total: &str) {
        println!("Walk tracker - total walked {}", total);
        println!("  [enter] start/stop  [t] tip  [r] reset  [q] quit");
    }

    /// Shows one status line for a session.
    pub fn show_status(snapshot: &SessionSnapshot) {
        println!("{}", Self::status_line(snapshot));
    }

    /// Redraws the status line in place.
    pub fn show_progress(snapshot: &SessionSnapshot) {
        print!("\r{}   ", Self::status_line(snapshot));
        let _ = std::io::stdout().flush();
    }

    /// Shows the lifetime walking total.
    pub fn show_walk_total(total_seconds: u64) {
        println!("{}", Self::walk_total_line(total_seconds));
    }

    pub fn show_walk_reset() {
        println!("[] Walk total cleared");
    }

    pub fn show_tip(tip: &str) {
        println!("Tip: {}", tip);
    }

    /// Shows the track now playing.
    pub fn show_track(playlist: &MusicPlaylist) {
        println!("{}", Self::track_line(playlist));
    }

    pub fn show_theme(dark: bool) {
        println!("Theme: {}", if dark { "dark" } else { "light" });
    }

    pub fn show_meditation_complete() {
        println!("* Meditation complete");
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    /// Formats a session as `<state> MM:SS`.
    pub fn status_line(snapshot: &SessionSnapshot) -> String {
        let state = match snapshot.phase {
            SessionPhase::Idle => "[]",
            SessionPhase::Running => ">",
            SessionPhase::Paused => "||",
            SessionPhase::Completed => "*",
        };
        format!("{} {}", state, format_clock(snapshot.display_seconds()))
    }

    /// Formats the playlist position, compact when minimized.
    pub fn track_line(playlist: &MusicPlaylist) -> String {
        if playlist.is_minimized() {
            return format!("~ {}", playlist.label());
        }
        let name = playlist
            .current()
            .and_then(|path| path.file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("~ {} of {}: {}", playlist.label(), playlist.len(), name)
    }

    /// Formats the lifetime walking total.
    pub fn walk_total_line(total_seconds: u64) -> String {
        format!("Total walked: {}", format_clock(total_seconds))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionMode;

    fn snapshot(mode: SessionMode, phase: SessionPhase, elapsed: u64, remaining: u64) -> SessionSnapshot {
        SessionSnapshot {
            mode,
            phase,
            elapsed_seconds: elapsed,
            remaining_seconds: remaining,
            accumulated_seconds: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Status Line Tests
    // ------------------------------------------------------------------------

    mod status_line_tests {
        use super::*;

        #[test]
        fn test_running_countdown_shows_remaining() {
            let s = snapshot(SessionMode::Countdown, SessionPhase::Running, 10, 290);
            assert_eq!(Display::status_line(&s), "> 04:50");
        }

        #[test]
        fn test_paused_countdown() {
            let s = snapshot(SessionMode::Countdown, SessionPhase::Paused, 30, 30);
            assert_eq!(Display::status_line(&s), "|| 00:30");
        }

        #[test]
        fn test_completed_countdown() {
            let s = snapshot(SessionMode::Countdown, SessionPhase::Completed, 60, 0);
            assert_eq!(Display::status_line(&s), "* 00:00");
        }

        #[test]
        fn test_stopwatch_shows_elapsed() {
            let s = snapshot(SessionMode::Stopwatch, SessionPhase::Running, 75, 0);
            assert_eq!(Display::status_line(&s), "> 01:15");
        }
    }

    // ------------------------------------------------------------------------
    // Track Line Tests
    // ------------------------------------------------------------------------

    mod track_line_tests {
        use super::*;
        use std::path::Path;

        #[test]
        fn test_full_and_minimized() {
            let mut playlist = MusicPlaylist::calm(Path::new("/music"));
            playlist.next();
            assert_eq!(Display::track_line(&playlist), "~ Track 2 of 5: calm2");

            playlist.toggle_minimized();
            assert_eq!(Display::track_line(&playlist), "~ Track 2");
        }
    }

    // ------------------------------------------------------------------------
    // Walk Total Tests
    // ------------------------------------------------------------------------

    mod walk_total_tests {
        use super::*;

        #[test]
        fn test_zero() {
            assert_eq!(Display::walk_total_line(0), "Total walked: 00:00");
        }

        #[test]
        fn test_past_an_hour() {
            assert_eq!(Display::walk_total_line(100 * 60 + 5), "Total walked: 100:05");
        }
    }
}
