//! Side effects driven by session transitions.
//!
//! [`SessionSideEffectDriver`] listens to [`SessionEvent`]s and turns them into
//! audio control, tip rotation and the completion signal. It holds no session
//! state of its own beyond what it needs to keep those effects consistent.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, warn};

use super::timer::SessionEvent;
use crate::sound::AudioOutput;
use crate::types::SessionMode;

/// Walking tips shown by the walk tracker.
pub const WALK_TIPS: [&str; 9] = [
    "Walk briskly to boost your heart health.",
    "Keep a steady pace and breathe deeply.",
    "Walking outdoors improves mood and creativity.",
    "Try walking in nature for extra relaxation.",
    "Use your walk time to clear your mind.",
    "Good posture while walking helps prevent aches.",
    "Walk for at least 30 minutes daily for health benefits.",
    "Walking with a friend can make it more enjoyable.",
    "Remember to stretch gently before and after your walk.",
];

/// Default length of the tip cross-fade.
pub const DEFAULT_TIP_FADE: Duration = Duration::from_millis(300);

// ============================================================================
// TipRotator
// ============================================================================

/// Rotates through tips with a short fade between them.
///
/// A request starts a fade; the new tip is chosen when the fade settles.
/// Requests made while a fade is in flight are coalesced into it.
#[derive(Debug)]
pub struct TipRotator {
    tips: Vec<String>,
    index: usize,
    fade: Duration,
    fade_deadline: Option<Instant>,
    rng: StdRng,
}

impl TipRotator {
    /// Creates a rotator over `tips`, starting at the first one.
    pub fn new(tips: Vec<String>, fade: Duration) -> Self {
        Self {
            tips,
            index: 0,
            fade,
            fade_deadline: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a rotator over the built-in walking tips.
    pub fn walk_tips(fade: Duration) -> Self {
        Self::new(WALK_TIPS.iter().map(|t| t.to_string()).collect(), fade)
    }

    /// Replaces the random source with a seeded one.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Returns the tip currently shown.
    pub fn current(&self) -> &str {
        self.tips.get(self.index).map_or("", String::as_str)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns true while a fade is in flight.
    pub fn is_fading(&self) -> bool {
        self.fade_deadline.is_some()
    }

    /// Asks for another tip.
    ///
    /// Returns false if a fade was already in flight.
    pub fn request_next(&mut self) -> bool {
        if self.fade_deadline.is_some() {
            debug!("Tip request coalesced into pending fade");
            return false;
        }
        self.fade_deadline = Some(Instant::now() + self.fade);
        true
    }

    /// Waits for the pending fade, then switches tips.
    ///
    /// Never resolves when no fade is pending. Cancel safe.
    pub async fn settle(&mut self) -> usize {
        match self.fade_deadline {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.commit()
            }
            None => std::future::pending().await,
        }
    }

    /// Drops a pending fade without switching tips.
    pub fn cancel(&mut self) {
        if self.fade_deadline.take().is_some() {
            debug!("Pending tip fade cancelled");
        }
    }

    fn commit(&mut self) -> usize {
        self.fade_deadline = None;
        if self.tips.len() > 1 {
            let mut next = self.rng.gen_range(0..self.tips.len());
            while next == self.index {
                next = self.rng.gen_range(0..self.tips.len());
            }
            self.index = next;
        }
        self.index
    }
}

// ============================================================================
// SessionSideEffectDriver
// ============================================================================

/// Turns session events into audio, tip and completion effects.
///
/// Audio only plays while a countdown is running. The completion callback
/// fires once per countdown completion.
#[derive(Default)]
pub struct SessionSideEffectDriver {
    audio: Option<Box<dyn AudioOutput>>,
    tips: Option<TipRotator>,
    on_completed: Option<Box<dyn FnMut()>>,
    completion_notified: bool,
}

impl SessionSideEffectDriver {
    /// Creates a driver with no effects attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the audio played while a countdown runs.
    #[must_use]
    pub fn with_audio(mut self, audio: impl AudioOutput + 'static) -> Self {
        self.audio = Some(Box::new(audio));
        self
    }

    /// Attaches a tip rotator.
    #[must_use]
    pub fn with_tips(mut self, tips: TipRotator) -> Self {
        self.tips = Some(tips);
        self
    }

    /// Sets the callback invoked when a countdown completes.
    #[must_use]
    pub fn on_completed(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_completed = Some(Box::new(callback));
        self
    }

    /// Reacts to one session event.
    pub fn handle(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Started {
                mode: SessionMode::Countdown,
                ..
            } => {
                self.completion_notified = false;
                self.start_audio();
            }
            SessionEvent::Resumed => self.start_audio(),
            SessionEvent::Paused { .. } | SessionEvent::Acknowledged => self.halt_audio(),
            SessionEvent::Stopped { .. } | SessionEvent::Reset => {
                self.halt_audio();
                if let Some(tips) = self.tips.as_mut() {
                    tips.cancel();
                }
            }
            SessionEvent::Completed => {
                self.halt_audio();
                self.notify_completed();
            }
            SessionEvent::Started { .. }
            | SessionEvent::Tick { .. }
            | SessionEvent::TotalChanged { .. } => {}
        }
    }

    /// Handles every event already queued on `rx` and returns them.
    pub fn drain(&mut self, rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            self.handle(&event);
            events.push(event);
        }
        events
    }

    /// Stops and rewinds audio.
    pub fn halt_audio(&mut self) {
        if let Some(audio) = self.audio.as_mut() {
            audio.pause();
            audio.seek_to_start();
        }
    }

    /// Returns true while attached audio is playing.
    pub fn is_audio_playing(&self) -> bool {
        self.audio.as_ref().is_some_and(|audio| audio.is_playing())
    }

    pub fn tips(&self) -> Option<&TipRotator> {
        self.tips.as_ref()
    }

    /// Asks the tip rotator for another tip.
    ///
    /// Returns false if there is no rotator or a fade is already pending.
    pub fn request_tip(&mut self) -> bool {
        self.tips.as_mut().is_some_and(TipRotator::request_next)
    }

    /// Waits for a pending tip fade to settle. Never resolves when none is
    /// pending.
    pub async fn settle_tip(&mut self) -> usize {
        match self.tips.as_mut() {
            Some(tips) => tips.settle().await,
            None => std::future::pending().await,
        }
    }

    /// Releases everything the driver holds in flight.
    pub fn teardown(&mut self) {
        self.halt_audio();
        if let Some(tips) = self.tips.as_mut() {
            tips.cancel();
        }
    }

    fn start_audio(&mut self) {
        if let Some(audio) = self.audio.as_mut() {
            if let Err(e) = audio.play() {
                warn!("Audio playback failed, continuing silently: {}", e);
            }
        }
    }

    fn notify_completed(&mut self) {
        if self.completion_notified {
            return;
        }
        self.completion_notified = true;
        if let Some(callback) = self.on_completed.as_mut() {
            callback();
        }
    }
}

impl std::fmt::Debug for SessionSideEffectDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSideEffectDriver")
            .field("has_audio", &self.audio.is_some())
            .field("tips", &self.tips)
            .field("completion_notified", &self.completion_notified)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::{AudioCall, MockAudio};
    use std::cell::Cell;
    use std::rc::Rc;

    fn countdown_started() -> SessionEvent {
        SessionEvent::Started {
            mode: SessionMode::Countdown,
            target_seconds: 60,
        }
    }

    // ------------------------------------------------------------------------
    // Audio Tests
    // ------------------------------------------------------------------------

    mod audio_tests {
        use super::*;

        #[test]
        fn test_countdown_start_plays() {
            let audio = MockAudio::new();
            let mut driver = SessionSideEffectDriver::new().with_audio(audio.clone());

            driver.handle(&countdown_started());

            assert!(driver.is_audio_playing());
            assert_eq!(audio.calls(), vec![AudioCall::Play]);
        }

        #[test]
        fn test_stopwatch_start_is_silent() {
            let audio = MockAudio::new();
            let mut driver = SessionSideEffectDriver::new().with_audio(audio.clone());

            driver.handle(&SessionEvent::Started {
                mode: SessionMode::Stopwatch,
                target_seconds: 0,
            });

            assert!(audio.calls().is_empty());
        }

        #[test]
        fn test_halting_events_pause_and_rewind() {
            let halting = [
                SessionEvent::Paused {
                    remaining_seconds: 10,
                },
                SessionEvent::Stopped {
                    finalized_seconds: 0,
                },
                SessionEvent::Completed,
                SessionEvent::Reset,
            ];

            for event in halting {
                let audio = MockAudio::new();
                let mut driver = SessionSideEffectDriver::new().with_audio(audio.clone());
                driver.handle(&countdown_started());
                audio.clear_calls();

                driver.handle(&event);

                assert!(!driver.is_audio_playing(), "still playing after {:?}", event);
                assert_eq!(audio.calls(), vec![AudioCall::Pause, AudioCall::SeekToStart]);
            }
        }

        #[test]
        fn test_resume_plays_again() {
            let audio = MockAudio::new();
            let mut driver = SessionSideEffectDriver::new().with_audio(audio.clone());
            driver.handle(&countdown_started());
            driver.handle(&SessionEvent::Paused {
                remaining_seconds: 30,
            });
            driver.handle(&SessionEvent::Resumed);

            assert!(driver.is_audio_playing());
            assert_eq!(audio.play_count(), 2);
        }

        #[test]
        fn test_playback_failure_is_swallowed() {
            let audio = MockAudio::new();
            audio.set_should_fail(true);
            let mut driver = SessionSideEffectDriver::new().with_audio(audio.clone());

            driver.handle(&countdown_started());

            assert!(!driver.is_audio_playing());
            assert_eq!(audio.play_count(), 1);
        }

        #[test]
        fn test_no_audio_attached() {
            let mut driver = SessionSideEffectDriver::new();
            driver.handle(&countdown_started());
            driver.handle(&SessionEvent::Completed);
            assert!(!driver.is_audio_playing());
        }
    }

    // ------------------------------------------------------------------------
    // Completion Tests
    // ------------------------------------------------------------------------

    mod completion_tests {
        use super::*;

        #[test]
        fn test_completion_fires_once() {
            let fired = Rc::new(Cell::new(0));
            let counter = fired.clone();
            let mut driver =
                SessionSideEffectDriver::new().on_completed(move || counter.set(counter.get() + 1));

            driver.handle(&countdown_started());
            driver.handle(&SessionEvent::Completed);
            driver.handle(&SessionEvent::Completed);

            assert_eq!(fired.get(), 1);
        }

        #[test]
        fn test_completion_rearms_on_next_start() {
            let fired = Rc::new(Cell::new(0));
            let counter = fired.clone();
            let mut driver =
                SessionSideEffectDriver::new().on_completed(move || counter.set(counter.get() + 1));

            for _ in 0..3 {
                driver.handle(&countdown_started());
                driver.handle(&SessionEvent::Completed);
                driver.handle(&SessionEvent::Acknowledged);
            }

            assert_eq!(fired.get(), 3);
        }

        #[test]
        fn test_drain_handles_queued_events() {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let audio = MockAudio::new();
            let mut driver = SessionSideEffectDriver::new().with_audio(audio.clone());

            tx.send(countdown_started()).unwrap();
            tx.send(SessionEvent::Completed).unwrap();

            let events = driver.drain(&mut rx);
            assert_eq!(events.len(), 2);
            assert!(!driver.is_audio_playing());
        }
    }

    // ------------------------------------------------------------------------
    // Tip Rotation Tests
    // ------------------------------------------------------------------------

    mod tip_tests {
        use super::*;
        use tokio::time::timeout;

        #[test]
        fn test_walk_tips() {
            let tips = TipRotator::walk_tips(DEFAULT_TIP_FADE);
            assert_eq!(tips.index(), 0);
            assert_eq!(tips.current(), WALK_TIPS[0]);
            assert!(!tips.is_fading());
        }

        #[tokio::test(start_paused = true)]
        async fn test_request_fades_then_switches() {
            let mut tips = TipRotator::walk_tips(DEFAULT_TIP_FADE).with_seed(7);

            assert!(tips.request_next());
            assert!(tips.is_fading());
            assert_eq!(tips.index(), 0);

            let next = tips.settle().await;
            assert_ne!(next, 0);
            assert!(!tips.is_fading());
            assert_eq!(tips.current(), WALK_TIPS[next]);
        }

        #[tokio::test(start_paused = true)]
        async fn test_concurrent_requests_coalesce() {
            let mut tips = TipRotator::walk_tips(DEFAULT_TIP_FADE).with_seed(1);

            assert!(tips.request_next());
            assert!(!tips.request_next());
            assert!(!tips.request_next());

            tips.settle().await;
            // Only one fade was in flight.
            let again = timeout(Duration::from_secs(1), tips.settle()).await;
            assert!(again.is_err());
        }

        #[tokio::test(start_paused = true)]
        async fn test_never_repeats_current() {
            let mut tips = TipRotator::walk_tips(Duration::from_millis(10)).with_seed(42);
            for _ in 0..50 {
                let before = tips.index();
                tips.request_next();
                let after = tips.settle().await;
                assert_ne!(before, after);
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_single_tip_stays() {
            let mut tips = TipRotator::new(vec!["only".to_string()], DEFAULT_TIP_FADE);
            tips.request_next();
            assert_eq!(tips.settle().await, 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_settle_takes_fade_duration() {
            let mut tips = TipRotator::walk_tips(DEFAULT_TIP_FADE);
            tips.request_next();

            let early = timeout(Duration::from_millis(200), tips.settle()).await;
            assert!(early.is_err());
            assert!(tips.is_fading());

            let late = timeout(Duration::from_millis(200), tips.settle()).await;
            assert!(late.is_ok());
        }

        #[tokio::test(start_paused = true)]
        async fn test_reset_cancels_pending_fade() {
            let mut driver = SessionSideEffectDriver::new()
                .with_tips(TipRotator::walk_tips(DEFAULT_TIP_FADE));

            assert!(driver.request_tip());
            driver.handle(&SessionEvent::Reset);

            assert!(!driver.tips().unwrap().is_fading());
            let settled = timeout(Duration::from_secs(1), driver.settle_tip()).await;
            assert!(settled.is_err());
        }

        #[test]
        fn test_request_without_rotator() {
            let mut driver = SessionSideEffectDriver::new();
            assert!(!driver.request_tip());
        }
    }
}
