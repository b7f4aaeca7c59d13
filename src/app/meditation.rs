//! Guided meditation page.
//!
//! Binds a countdown session to looping audio. The page closes itself when
//! the countdown completes, and closing it any other way stops the session
//! and the audio together.

use std::cell::Cell;
use std::rc::Rc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::session::{
    ClockSource, SessionError, SessionEvent, SessionSideEffectDriver, Tick, TimedSession,
};
use crate::sound::AudioOutput;
use crate::types::{MeditationConfig, SessionPhase};

/// Meditation countdown with audio and auto-close.
pub struct MeditationHost<C: ClockSource> {
    pub session: TimedSession<C>,
    pub driver: SessionSideEffectDriver,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    config: MeditationConfig,
    closed: Rc<Cell<bool>>,
}

impl<C: ClockSource> MeditationHost<C> {
    /// Creates an open, idle meditation page.
    pub fn new(clock: C, audio: Option<Box<dyn AudioOutput>>, config: MeditationConfig) -> Self {
        let (event_tx, events) = mpsc::unbounded_channel();
        let closed = Rc::new(Cell::new(false));

        let on_complete = closed.clone();
        let mut driver = SessionSideEffectDriver::new().on_completed(move || {
            debug!("Meditation complete, closing");
            on_complete.set(true);
        });
        if let Some(audio) = audio {
            driver = driver.with_audio(audio);
        }

        Self {
            session: TimedSession::countdown(clock, event_tx),
            driver,
            events,
            config,
            closed,
        }
    }

    pub fn config(&self) -> MeditationConfig {
        self.config
    }

    /// Sets the length from raw input, clamped into 1-60 minutes.
    ///
    /// Ignored while a session is in progress.
    pub fn set_minutes(&mut self, minutes: i64) -> MeditationConfig {
        if !self.session.phase().is_in_progress() {
            self.config = MeditationConfig::clamped(minutes);
        }
        self.config
    }

    /// Starts the countdown and its audio.
    ///
    /// # Errors
    ///
    /// Returns the session's refusal if it cannot start.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.session.is_completed() {
            self.session.acknowledge();
        }
        self.closed.set(false);
        let result = self.session.start(Some(self.config.target_seconds()));
        self.pump();
        result
    }

    /// Pauses a running meditation, or resumes a paused one with time left.
    ///
    /// Returns the phase after the toggle.
    ///
    /// # Errors
    ///
    /// Returns `NotRunning` if there is nothing to pause or resume.
    pub fn toggle_pause(&mut self) -> Result<SessionPhase, SessionError> {
        let result = match self.session.phase() {
            SessionPhase::Running => self.session.pause(),
            SessionPhase::Paused if self.session.remaining_seconds() > 0 => self.session.resume(),
            _ => Err(SessionError::NotRunning),
        };
        self.pump();
        result.map(|()| self.session.phase())
    }

    /// Applies one tick from the session's clock.
    pub fn on_tick(&mut self, tick: Tick) -> bool {
        let applied = self.session.on_tick(tick);
        self.pump();
        applied
    }

    /// Applies queued ticks.
    pub fn process_pending_ticks(&mut self) -> usize {
        let applied = self.session.process_pending_ticks();
        self.pump();
        applied
    }

    /// Stops everything and closes the page.
    pub fn stop_and_close(&mut self) {
        self.session.stop();
        self.pump();
        self.teardown();
        self.closed.set(true);
    }

    /// Releases the clock subscription and audio.
    pub fn teardown(&mut self) {
        if self.session.phase().is_in_progress() {
            self.session.stop();
            self.pump();
        }
        self.driver.teardown();
    }

    /// Returns true once the page has closed, by completion or by the user.
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    /// Remaining time as `MM:SS`.
    pub fn display(&self) -> String {
        self.session.display()
    }

    /// Forwards queued session events to the driver.
    fn pump(&mut self) -> Vec<SessionEvent> {
        self.driver.drain(&mut self.events)
    }
}

impl<C: ClockSource> std::fmt::Debug for MeditationHost<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeditationHost")
            .field("session", &self.session)
            .field("config", &self.config)
            .field("closed", &self.closed.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ManualClock;
    use crate::sound::{AudioCall, MockAudio};

    fn create_host(minutes: u32) -> (MeditationHost<ManualClock>, ManualClock, MockAudio) {
        let clock = ManualClock::new();
        let audio = MockAudio::new();
        let host = MeditationHost::new(
            clock.clone(),
            Some(Box::new(audio.clone())),
            MeditationConfig { minutes },
        );
        (host, clock, audio)
    }

    #[test]
    fn test_start_plays_audio() {
        let (mut host, clock, audio) = create_host(5);
        host.start().unwrap();

        assert_eq!(host.phase(), SessionPhase::Running);
        assert_eq!(host.display(), "05:00");
        assert!(audio.is_playing());
        assert!(clock.is_active());
    }

    #[test]
    fn test_completion_closes_and_silences() {
        let (mut host, clock, audio) = create_host(1);
        host.start().unwrap();

        clock.advance(59);
        host.process_pending_ticks();
        assert_eq!(host.display(), "00:01");
        assert!(!host.is_closed());
        assert!(audio.is_playing());

        clock.advance(1);
        host.process_pending_ticks();
        assert_eq!(host.display(), "00:00");
        assert_eq!(host.phase(), SessionPhase::Completed);
        assert!(host.is_closed());
        assert!(!audio.is_playing());
        assert!(!clock.is_active());
    }

    #[test]
    fn test_toggle_pause() {
        let (mut host, clock, audio) = create_host(2);
        host.start().unwrap();
        clock.advance(30);
        host.process_pending_ticks();

        assert_eq!(host.toggle_pause().unwrap(), SessionPhase::Paused);
        assert!(!audio.is_playing());
        assert_eq!(host.display(), "01:30");

        assert_eq!(host.toggle_pause().unwrap(), SessionPhase::Running);
        assert!(audio.is_playing());
    }

    #[test]
    fn test_toggle_pause_when_idle() {
        let (mut host, _clock, _audio) = create_host(2);
        assert_eq!(host.toggle_pause(), Err(SessionError::NotRunning));
    }

    #[test]
    fn test_stop_and_close() {
        let (mut host, clock, audio) = create_host(10);
        host.start().unwrap();
        audio.clear_calls();

        host.stop_and_close();

        assert!(host.is_closed());
        assert_eq!(host.phase(), SessionPhase::Idle);
        assert!(!audio.is_playing());
        assert!(!clock.is_active());
        assert_eq!(audio.calls()[..2], [AudioCall::Pause, AudioCall::SeekToStart]);
    }

    #[test]
    fn test_set_minutes_clamps_and_locks() {
        let (mut host, _clock, _audio) = create_host(5);
        assert_eq!(host.set_minutes(90).minutes, 60);
        assert_eq!(host.set_minutes(0).minutes, 1);

        host.set_minutes(3);
        host.start().unwrap();
        assert_eq!(host.set_minutes(20).minutes, 3);
    }

    #[test]
    fn test_restart_after_completion() {
        let (mut host, clock, _audio) = create_host(1);
        host.start().unwrap();
        clock.advance(60);
        host.process_pending_ticks();
        assert!(host.is_closed());

        host.start().unwrap();
        assert!(!host.is_closed());
        assert_eq!(host.display(), "01:00");
    }

    #[test]
    fn test_silent_audio_failure_keeps_timer() {
        let (mut host, clock, audio) = create_host(1);
        audio.set_should_fail(true);

        host.start().unwrap();
        clock.advance(10);
        assert_eq!(host.process_pending_ticks(), 10);
        assert_eq!(host.display(), "00:50");
    }
}
