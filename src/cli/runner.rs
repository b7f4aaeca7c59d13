//! Interactive session loops.
//!
//! Each runner multiplexes the session clock, pending tip fades and line
//! input on one task with `tokio::select!`. Input is any async line source,
//! normally stdin.

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use super::display::Display;
use crate::app::{MeditationHost, MusicHost, WalkHost};
use crate::session::ClockSource;

/// How a meditation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeditationOutcome {
    /// The countdown reached zero.
    Completed,
    /// The user stopped early.
    Stopped,
}

/// Runs a meditation until it completes or the user stops it.
///
/// Keys: `p` pauses or resumes, `s` or `q` stops. Once input closes the
/// meditation runs to completion, unless it is paused.
///
/// # Errors
///
/// Returns an error if the session cannot start or input cannot be read.
pub async fn run_meditation<C, R>(
    host: &mut MeditationHost<C>,
    input: R,
) -> Result<MeditationOutcome>
where
    C: ClockSource,
    R: AsyncBufRead + Unpin,
{
    host.start()?;
    Display::show_progress(&host.session.snapshot());

    let mut lines = input.lines();
    let mut input_open = true;

    loop {
        tokio::select! {
            tick = host.session.next_tick() => {
                host.on_tick(tick);
                Display::show_progress(&host.session.snapshot());
                if host.is_closed() {
                    println!();
                    Display::show_meditation_complete();
                    return Ok(MeditationOutcome::Completed);
                }
            }
            line = lines.next_line(), if input_open => {
                match line? {
                    Some(line) => match line.trim() {
                        "p" => match host.toggle_pause() {
                            Ok(_) => Display::show_progress(&host.session.snapshot()),
                            Err(e) => debug!("Ignored pause toggle: {}", e),
                        },
                        "s" | "q" => {
                            host.stop_and_close();
                            println!();
                            return Ok(MeditationOutcome::Stopped);
                        }
                        other => debug!("Ignored input {:?}", other),
                    },
                    None => {
                        debug!("Input closed");
                        input_open = false;
                        if !host.session.is_running() {
                            host.stop_and_close();
                            return Ok(MeditationOutcome::Stopped);
                        }
                    }
                }
            }
        }
    }
}

/// Runs the walk tracker until the user quits or input closes.
///
/// Keys: enter or `w` starts and stops a walk, `t` shows another tip, `r`
/// clears the total, `q` quits. A walk still running on exit is banked.
///
/// Returns the lifetime total in seconds.
///
/// # Errors
///
/// Returns an error if input cannot be read.
pub async fn run_walk<C, R>(host: &mut WalkHost<C>, input: R) -> Result<u64>
where
    C: ClockSource,
    R: AsyncBufRead + Unpin,
{
    Display::show_walk_help(&host.total_display());
    Display::show_tip(host.tip());

    let mut lines = input.lines();

    loop {
        tokio::select! {
            tick = host.session.next_tick() => {
                host.on_tick(tick);
                Display::show_progress(&host.session.snapshot());
            }
            _ = host.driver.settle_tip() => {
                println!();
                Display::show_tip(host.tip());
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) => match line.trim() {
                        "" | "w" => {
                            host.toggle();
                            Display::show_status(&host.session.snapshot());
                            if !host.session.is_running() {
                                Display::show_walk_total(host.session.accumulated_total());
                            }
                        }
                        "t" => {
                            host.next_tip();
                        }
                        "r" => {
                            host.reset();
                            Display::show_walk_reset();
                        }
                        "q" => break,
                        other => debug!("Ignored input {:?}", other),
                    },
                    None => break,
                }
            }
        }
    }

    host.teardown();
    let total = host.session.accumulated_total();
    Display::show_walk_total(total);
    Ok(total)
}

/// Plays the calm music playlist until the user quits or input closes.
///
/// Keys: `n` next track, `p` previous track, `m` minimize, `q` quits.
/// Returns the index of the last track played.
///
/// # Errors
///
/// Returns an error if input cannot be read.
pub async fn run_music<R>(host: &mut MusicHost, input: R) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    host.open();
    Display::show_track(&host.playlist);

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "n" => {
                host.next();
                Display::show_track(&host.playlist);
            }
            "p" => {
                host.prev();
                Display::show_track(&host.playlist);
            }
            "m" => {
                host.playlist.toggle_minimized();
                Display::show_track(&host.playlist);
            }
            "q" => break,
            other => debug!("Ignored input {:?}", other),
        }
    }

    let last = host.playlist.index();
    host.teardown();
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::WALK_TOTAL_KEY;
    use crate::session::{MemoryStore, TokioClock, DEFAULT_TIP_FADE};
    use crate::sound::MockAudio;
    use crate::types::{MeditationConfig, SessionPhase};
    use std::time::Duration;
    use tokio::io::{AsyncWriteExt, BufReader};

    fn meditation_host(minutes: u32, audio: &MockAudio) -> MeditationHost<TokioClock> {
        MeditationHost::new(
            TokioClock::new(),
            Some(Box::new(audio.clone())),
            MeditationConfig { minutes },
        )
    }

    // ------------------------------------------------------------------------
    // Meditation Runner Tests
    // ------------------------------------------------------------------------

    mod meditation_runner_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_runs_to_completion_without_input() {
            let audio = MockAudio::new();
            let mut host = meditation_host(1, &audio);

            let outcome = run_meditation(&mut host, BufReader::new(tokio::io::empty()))
                .await
                .unwrap();

            assert_eq!(outcome, MeditationOutcome::Completed);
            assert_eq!(host.phase(), SessionPhase::Completed);
            assert_eq!(host.display(), "00:00");
            assert!(!crate::sound::AudioOutput::is_playing(&audio));
        }

        #[tokio::test(start_paused = true)]
        async fn test_stop_key_ends_early() {
            let audio = MockAudio::new();
            let mut host = meditation_host(5, &audio);

            let outcome = run_meditation(&mut host, &b"s\n"[..]).await.unwrap();

            assert_eq!(outcome, MeditationOutcome::Stopped);
            assert_eq!(host.phase(), SessionPhase::Idle);
            assert!(host.is_closed());
        }

        #[tokio::test(start_paused = true)]
        async fn test_paused_with_closed_input_stops() {
            let audio = MockAudio::new();
            let mut host = meditation_host(5, &audio);

            let outcome = run_meditation(&mut host, &b"p\n"[..]).await.unwrap();

            assert_eq!(outcome, MeditationOutcome::Stopped);
        }
    }

    // ------------------------------------------------------------------------
    // Music Runner Tests
    // ------------------------------------------------------------------------

    mod music_runner_tests {
        use super::*;
        use crate::app::{AudioFactory, MusicPlaylist};
        use crate::sound::{AudioOutput, SoundSource};
        use std::path::Path;

        fn silent_host(handle: &MockAudio) -> MusicHost {
            let handle = handle.clone();
            let factory: AudioFactory = Box::new(move |_source: &SoundSource| {
                Some(Box::new(handle.clone()) as Box<dyn AudioOutput>)
            });
            MusicHost::new(MusicPlaylist::calm(Path::new("/music")), factory)
        }

        #[tokio::test]
        async fn test_next_moves_forward_and_quit_silences() {
            let audio = MockAudio::new();
            let mut host = silent_host(&audio);

            // Previous then next lands back where the host opened.
            let last = run_music(&mut host, &b"p\nn\nq\n"[..]).await.unwrap();

            assert!(last < 5);
            assert!(!audio.is_playing());
            assert_eq!(host.playlist.index(), 0);
        }
    }

    // ------------------------------------------------------------------------
    // Walk Runner Tests
    // ------------------------------------------------------------------------

    mod walk_runner_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_walk_banks_elapsed_time() {
            let store = MemoryStore::with_entry(WALK_TOTAL_KEY, "100");
            let mut host = WalkHost::new(TokioClock::new(), Box::new(store.clone()), DEFAULT_TIP_FADE);

            let (reader, mut writer) = tokio::io::duplex(64);
            tokio::spawn(async move {
                writer.write_all(b"\n").await.unwrap();
                tokio::time::sleep(Duration::from_millis(5_500)).await;
                writer.write_all(b"\nq\n").await.unwrap();
            });

            let total = run_walk(&mut host, BufReader::new(reader)).await.unwrap();

            assert_eq!(total, 105);
            assert_eq!(store.get(WALK_TOTAL_KEY).as_deref(), Some("105"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_quit_while_walking_banks() {
            let store = MemoryStore::new();
            let mut host = WalkHost::new(TokioClock::new(), Box::new(store.clone()), DEFAULT_TIP_FADE);

            let (reader, mut writer) = tokio::io::duplex(64);
            tokio::spawn(async move {
                writer.write_all(b"w\n").await.unwrap();
                tokio::time::sleep(Duration::from_millis(3_500)).await;
                drop(writer);
            });

            let total = run_walk(&mut host, BufReader::new(reader)).await.unwrap();

            assert_eq!(total, 3);
        }

        #[tokio::test(start_paused = true)]
        async fn test_reset_key_clears_total() {
            let store = MemoryStore::with_entry(WALK_TOTAL_KEY, "900");
            let mut host = WalkHost::new(TokioClock::new(), Box::new(store.clone()), DEFAULT_TIP_FADE);

            let total = run_walk(&mut host, &b"r\nq\n"[..]).await.unwrap();

            assert_eq!(total, 0);
            assert_eq!(store.get(WALK_TOTAL_KEY), None);
        }
    }
}
