//! Timed session state machine.
//!
//! A [`TimedSession`] is either a countdown (meditation) or a stopwatch
//! (walk). It owns its clock subscription and, for stopwatches, the
//! persistent counter holding the lifetime total.
//!
//! ```text
//! Countdown:  Idle -> Running <-> Paused
//!                       |            |
//!                       +-> Completed -> Idle   (acknowledge / reset)
//!                       +------------+-> Idle   (stop / reset)
//!
//! Stopwatch:  Idle <-> Running                  (pause and stop both finalize)
//! ```
//!
//! Transitions are reported on an event channel; the session never touches
//! audio or the presentation layer itself.

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::clock::{ClockSource, SubscriptionId, Tick, TickSender};
use super::counter::PersistentCounter;
use super::error::SessionError;
use crate::types::{format_clock, SessionMode, SessionPhase, SessionSnapshot};

// ============================================================================
// SessionEvent
// ============================================================================

/// Session transitions, in the order they happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session started
    Started {
        /// Session mode
        mode: SessionMode,
        /// Countdown target (0 for stopwatch)
        target_seconds: u64,
    },
    /// One tick was applied
    Tick {
        /// Seconds counted in this segment
        elapsed_seconds: u64,
        /// Seconds left (countdown only)
        remaining_seconds: u64,
    },
    /// Countdown paused
    Paused {
        /// Seconds left at the pause
        remaining_seconds: u64,
    },
    /// Countdown resumed
    Resumed,
    /// Session stopped before completing
    Stopped {
        /// Seconds folded into the lifetime total (stopwatch only)
        finalized_seconds: u64,
    },
    /// Countdown reached zero
    Completed,
    /// Completed countdown returned to idle
    Acknowledged,
    /// Session and lifetime total cleared
    Reset,
    /// Lifetime total changed
    TotalChanged {
        /// New total in seconds
        total_seconds: u64,
    },
}

// ============================================================================
// TimedSession
// ============================================================================

/// A countdown or stopwatch driven by a [`ClockSource`].
pub struct TimedSession<C: ClockSource> {
    mode: SessionMode,
    phase: SessionPhase,
    target_seconds: u64,
    elapsed_seconds: u64,
    accumulated_total: u64,
    clock: C,
    subscription: Option<SubscriptionId>,
    tick_tx: TickSender,
    tick_rx: mpsc::UnboundedReceiver<Tick>,
    counter: Option<PersistentCounter>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl<C: ClockSource> TimedSession<C> {
    fn new(
        mode: SessionMode,
        clock: C,
        counter: Option<PersistentCounter>,
        event_tx: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let accumulated_total = counter.as_ref().map_or(0, PersistentCounter::load);

        Self {
            mode,
            phase: SessionPhase::Idle,
            target_seconds: 0,
            elapsed_seconds: 0,
            accumulated_total,
            clock,
            subscription: None,
            tick_tx,
            tick_rx,
            counter,
            event_tx,
        }
    }

    /// Creates an idle countdown session.
    pub fn countdown(clock: C, event_tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self::new(SessionMode::Countdown, clock, None, event_tx)
    }

    /// Creates an idle stopwatch session.
    ///
    /// The lifetime total is read from `counter` once, here.
    pub fn stopwatch(
        clock: C,
        counter: PersistentCounter,
        event_tx: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let session = Self::new(SessionMode::Stopwatch, clock, Some(counter), event_tx);
        debug!(total = session.accumulated_total, "Stopwatch loaded");
        session
    }

    /// Starts a session.
    ///
    /// `target_seconds` is required for a countdown and ignored for a
    /// stopwatch.
    ///
    /// # Errors
    ///
    /// - `AlreadyRunning` if a session is in progress
    /// - `AwaitingAcknowledge` if a countdown completed and was not acknowledged
    /// - `InvalidTarget` if a countdown target is missing or zero
    pub fn start(&mut self, target_seconds: Option<u64>) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Running | SessionPhase::Paused => {
                return Err(SessionError::AlreadyRunning)
            }
            SessionPhase::Completed => return Err(SessionError::AwaitingAcknowledge),
            SessionPhase::Idle => {}
        }

        let target = match self.mode {
            SessionMode::Countdown => match target_seconds {
                Some(target) if target > 0 => target,
                other => {
                    debug!(requested = ?other, "Rejected countdown start");
                    return Err(SessionError::InvalidTarget(other.unwrap_or(0)));
                }
            },
            SessionMode::Stopwatch => 0,
        };

        self.target_seconds = target;
        self.elapsed_seconds = 0;
        self.phase = SessionPhase::Running;
        self.subscribe();

        info!(mode = self.mode.as_str(), target_seconds = target, "Session started");
        self.emit(SessionEvent::Started {
            mode: self.mode,
            target_seconds: target,
        });
        Ok(())
    }

    /// Applies one tick.
    ///
    /// Ticks from a stale subscription, or arriving while not running, are
    /// ignored. Returns true if the tick was applied.
    pub fn on_tick(&mut self, tick: Tick) -> bool {
        if self.phase != SessionPhase::Running || self.subscription != Some(tick.subscription) {
            debug!(subscription = tick.subscription, "Ignored stale tick");
            return false;
        }

        self.elapsed_seconds += 1;
        self.emit(SessionEvent::Tick {
            elapsed_seconds: self.elapsed_seconds,
            remaining_seconds: self.remaining_seconds(),
        });

        if self.mode == SessionMode::Countdown && self.remaining_seconds() == 0 {
            self.unsubscribe();
            self.phase = SessionPhase::Completed;
            info!(target_seconds = self.target_seconds, "Countdown completed");
            self.emit(SessionEvent::Completed);
        }

        true
    }

    /// Applies every tick already queued, in order.
    ///
    /// Returns the number of ticks applied.
    pub fn process_pending_ticks(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(tick) = self.tick_rx.try_recv() {
            if self.on_tick(tick) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next tick.
    ///
    /// Never resolves while no subscription is live. Cancel safe, so it can
    /// be used as a `tokio::select!` branch.
    pub async fn next_tick(&mut self) -> Tick {
        if self.subscription.is_none() {
            return std::future::pending().await;
        }
        match self.tick_rx.recv().await {
            Some(tick) => tick,
            None => std::future::pending().await,
        }
    }

    /// Pauses the session.
    ///
    /// A countdown keeps its remaining time. A stopwatch has no paused state:
    /// the running segment is folded into the lifetime total and the session
    /// returns to idle.
    ///
    /// # Errors
    ///
    /// Returns `NotRunning` if the session is not running.
    pub fn pause(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Running {
            return Err(SessionError::NotRunning);
        }

        match self.mode {
            SessionMode::Countdown => {
                self.unsubscribe();
                self.phase = SessionPhase::Paused;
                debug!(remaining = self.remaining_seconds(), "Countdown paused");
                self.emit(SessionEvent::Paused {
                    remaining_seconds: self.remaining_seconds(),
                });
            }
            SessionMode::Stopwatch => self.finish_segment(),
        }
        Ok(())
    }

    /// Resumes a paused countdown from its remaining time.
    ///
    /// # Errors
    ///
    /// Returns `NotPaused` if the session is not paused.
    pub fn resume(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Paused {
            return Err(SessionError::NotPaused);
        }

        self.phase = SessionPhase::Running;
        self.subscribe();
        debug!(remaining = self.remaining_seconds(), "Countdown resumed");
        self.emit(SessionEvent::Resumed);
        Ok(())
    }

    /// Stops a running or paused session.
    ///
    /// A stopwatch folds its segment into the lifetime total; a countdown
    /// discards its remaining time. Returns false, with no side effects, if
    /// nothing was in progress.
    pub fn stop(&mut self) -> bool {
        if !self.phase.is_in_progress() {
            return false;
        }

        match self.mode {
            SessionMode::Stopwatch => self.finish_segment(),
            SessionMode::Countdown => {
                self.unsubscribe();
                self.phase = SessionPhase::Idle;
                self.target_seconds = 0;
                self.elapsed_seconds = 0;
                info!("Countdown stopped");
                self.emit(SessionEvent::Stopped {
                    finalized_seconds: 0,
                });
            }
        }
        true
    }

    /// Returns a completed countdown to idle.
    ///
    /// Returns false if the session had not completed.
    pub fn acknowledge(&mut self) -> bool {
        if self.phase != SessionPhase::Completed {
            return false;
        }

        self.phase = SessionPhase::Idle;
        self.target_seconds = 0;
        self.elapsed_seconds = 0;
        self.emit(SessionEvent::Acknowledged);
        true
    }

    /// Returns to idle from any state and clears the lifetime total,
    /// including its persisted entry.
    pub fn reset(&mut self) {
        self.unsubscribe();
        self.phase = SessionPhase::Idle;
        self.target_seconds = 0;
        self.elapsed_seconds = 0;
        self.accumulated_total = 0;
        if let Some(counter) = self.counter.as_mut() {
            counter.clear();
        }

        info!(mode = self.mode.as_str(), "Session reset");
        self.emit(SessionEvent::Reset);
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    pub fn is_completed(&self) -> bool {
        self.phase == SessionPhase::Completed
    }

    pub fn target_seconds(&self) -> u64 {
        self.target_seconds
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Seconds left in a countdown; always 0 for a stopwatch.
    pub fn remaining_seconds(&self) -> u64 {
        match self.mode {
            SessionMode::Countdown => self.target_seconds.saturating_sub(self.elapsed_seconds),
            SessionMode::Stopwatch => 0,
        }
    }

    pub fn accumulated_total(&self) -> u64 {
        self.accumulated_total
    }

    /// Returns true while the session holds a clock subscription.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The clock face: remaining time for a countdown, elapsed for a
    /// stopwatch, as `MM:SS`.
    pub fn display(&self) -> String {
        format_clock(self.snapshot().display_seconds())
    }

    /// The lifetime total as `MM:SS`.
    pub fn total_display(&self) -> String {
        format_clock(self.accumulated_total)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode,
            phase: self.phase,
            elapsed_seconds: self.elapsed_seconds,
            remaining_seconds: self.remaining_seconds(),
            accumulated_seconds: self.accumulated_total,
        }
    }

    /// Folds the running stopwatch segment into the lifetime total.
    fn finish_segment(&mut self) {
        self.unsubscribe();
        self.phase = SessionPhase::Idle;

        let segment = std::mem::take(&mut self.elapsed_seconds);
        if segment > 0 {
            self.accumulated_total = self.accumulated_total.saturating_add(segment);
            if let Some(counter) = self.counter.as_mut() {
                counter.save(self.accumulated_total);
            }
        }

        info!(segment, total = self.accumulated_total, "Stopwatch segment finished");
        self.emit(SessionEvent::Stopped {
            finalized_seconds: segment,
        });
        if segment > 0 {
            self.emit(SessionEvent::TotalChanged {
                total_seconds: self.accumulated_total,
            });
        }
    }

    fn subscribe(&mut self) {
        self.unsubscribe();
        self.subscription = Some(self.clock.start(self.tick_tx.clone()));
    }

    fn unsubscribe(&mut self) {
        if self.subscription.take().is_some() {
            self.clock.stop();
        }
        // Drop anything queued by the old subscription.
        while self.tick_rx.try_recv().is_ok() {}
    }

    fn emit(&self, event: SessionEvent) {
        if self.event_tx.send(event).is_err() {
            debug!(?event, "No listener for session event");
        }
    }
}

impl<C: ClockSource> Drop for TimedSession<C> {
    fn drop(&mut self) {
        if self.subscription.take().is_some() {
            self.clock.stop();
        }
    }
}

impl<C: ClockSource> std::fmt::Debug for TimedSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedSession")
            .field("mode", &self.mode)
            .field("phase", &self.phase)
            .field("target_seconds", &self.target_seconds)
            .field("elapsed_seconds", &self.elapsed_seconds)
            .field("accumulated_total", &self.accumulated_total)
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
