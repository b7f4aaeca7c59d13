//! Tick sources for timed sessions.
//!
//! A clock delivers one [`Tick`] per second into a channel owned by the
//! session. Every `start` opens a new subscription with a fresh id and every
//! tick carries the id it was produced for, so a session can discard ticks
//! that were already queued when it stopped the clock.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::debug;

/// Interval between ticks.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Identifies one start/stop span of a clock.
pub type SubscriptionId = u64;

/// One second of session time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Subscription that produced this tick
    pub subscription: SubscriptionId,
}

/// Channel end ticks are delivered into.
pub type TickSender = mpsc::UnboundedSender<Tick>;

/// A source of one-second ticks.
pub trait ClockSource {
    /// Starts delivering ticks to `sink`.
    ///
    /// Any previous subscription is stopped first, so at most one tick chain
    /// is ever live.
    fn start(&mut self, sink: TickSender) -> SubscriptionId;

    /// Stops delivering ticks. Safe to call when not started.
    fn stop(&mut self);

    /// Returns true while a subscription is live.
    fn is_active(&self) -> bool;
}

// ============================================================================
// TokioClock
// ============================================================================

/// Wall-clock ticks driven by a `tokio::time::interval` task.
///
/// Missed ticks are skipped rather than replayed; a suspended process
/// undercounts.
#[derive(Debug)]
pub struct TokioClock {
    period: Duration,
    next_id: SubscriptionId,
    task: Option<JoinHandle<()>>,
}

impl TokioClock {
    /// Creates a clock ticking once per second.
    pub fn new() -> Self {
        Self::with_period(TICK_PERIOD)
    }

    /// Creates a clock with a custom period.
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            next_id: 0,
            task: None,
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for TokioClock {
    fn start(&mut self, sink: TickSender) -> SubscriptionId {
        self.stop();

        self.next_id += 1;
        let id = self.next_id;
        let period = self.period;

        self.task = Some(tokio::spawn(async move {
            // First tick one full period after start.
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if sink.send(Tick { subscription: id }).is_err() {
                    break;
                }
            }
        }));

        debug!(subscription = id, "Clock started");
        id
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(subscription = self.next_id, "Clock stopped");
        }
    }

    fn is_active(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for TokioClock {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// ManualClock
// ============================================================================

#[derive(Debug, Default)]
struct ManualState {
    next_id: SubscriptionId,
    active: Option<(SubscriptionId, TickSender)>,
    starts: usize,
    stops: usize,
}

/// Clock that only ticks when told to.
///
/// Clones share state, so a test can keep one handle while the session owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    state: Arc<Mutex<ManualState>>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `n` ticks to the live subscription.
    ///
    /// Returns how many were delivered (0 when stopped).
    pub fn advance(&self, n: u64) -> u64 {
        let state = self.state.lock().unwrap();
        let Some((id, sink)) = state.active.as_ref() else {
            return 0;
        };

        let mut sent = 0;
        for _ in 0..n {
            if sink.send(Tick { subscription: *id }).is_err() {
                break;
            }
            sent += 1;
        }
        sent
    }

    /// Returns how many times the clock was started.
    #[must_use]
    pub fn starts(&self) -> usize {
        self.state.lock().unwrap().starts
    }

    /// Returns how many live subscriptions were stopped.
    #[must_use]
    pub fn stops(&self) -> usize {
        self.state.lock().unwrap().stops
    }
}

impl ClockSource for ManualClock {
    fn start(&mut self, sink: TickSender) -> SubscriptionId {
        let mut state = self.state.lock().unwrap();
        if state.active.take().is_some() {
            state.stops += 1;
        }
        state.next_id += 1;
        state.starts += 1;
        let id = state.next_id;
        state.active = Some((id, sink));
        id
    }

    fn stop(&mut self) {
        let mut state = self.state.lock().unwrap();
        if state.active.take().is_some() {
            state.stops += 1;
        }
    }

    fn is_active(&self) -> bool {
        self.state.lock().unwrap().active.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================
