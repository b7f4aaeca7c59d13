//! Walk tracker page.
//!
//! A stopwatch whose finished segments add up to a lifetime walking total,
//! plus a rotating walking tip.

use tokio::sync::mpsc;
use tokio::time::Duration;

use crate::session::{
    ClockSource, KeyValueStore, PersistentCounter, SessionEvent, SessionSideEffectDriver, Tick,
    TimedSession, TipRotator,
};
use crate::types::SessionPhase;

/// Storage key of the lifetime walking total.
pub const WALK_TOTAL_KEY: &str = "totalWalkSeconds";

/// Walk stopwatch with a persisted total and tips.
pub struct WalkHost<C: ClockSource> {
    pub session: TimedSession<C>,
    pub driver: SessionSideEffectDriver,
    events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl<C: ClockSource> WalkHost<C> {
    /// Creates the page, loading the total from `store`.
    pub fn new(clock: C, store: Box<dyn KeyValueStore>, tip_fade: Duration) -> Self {
        Self::with_tips(clock, store, TipRotator::walk_tips(tip_fade))
    }

    /// Creates the page with a custom tip rotator.
    pub fn with_tips(clock: C, store: Box<dyn KeyValueStore>, tips: TipRotator) -> Self {
        let (event_tx, events) = mpsc::unbounded_channel();
        let counter = PersistentCounter::new(WALK_TOTAL_KEY, store);
        Self {
            session: TimedSession::stopwatch(clock, counter, event_tx),
            driver: SessionSideEffectDriver::new().with_tips(tips),
            events,
        }
    }

    /// Starts walking, or stops and banks the walk.
    ///
    /// Returns true if the walk is now running.
    pub fn toggle(&mut self) -> bool {
        if self.session.is_running() {
            self.session.stop();
        } else if let Err(e) = self.session.start(None) {
            tracing::warn!("Could not start walk: {}", e);
        }
        self.pump();
        self.session.is_running()
    }

    /// Stops any walk and clears the lifetime total.
    pub fn reset(&mut self) {
        self.session.reset();
        self.pump();
    }

    /// Requests a new tip. Coalesced while a fade is in flight.
    pub fn next_tip(&mut self) -> bool {
        self.driver.request_tip()
    }

    /// Returns the tip currently shown.
    pub fn tip(&self) -> &str {
        self.driver.tips().map_or("", TipRotator::current)
    }

    pub fn is_tip_fading(&self) -> bool {
        self.driver.tips().is_some_and(TipRotator::is_fading)
    }

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

    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    /// Current walk as `MM:SS`.
    pub fn elapsed_display(&self) -> String {
        self.session.display()
    }

    /// Lifetime total as `MM:SS`.
    pub fn total_display(&self) -> String {
        self.session.total_display()
    }

    /// Banks any running walk and drops pending tip fades.
    pub fn teardown(&mut self) {
        self.session.stop();
        self.pump();
        self.driver.teardown();
    }

    fn pump(&mut self) -> Vec<SessionEvent> {
        self.driver.drain(&mut self.events)
    }
}

impl<C: ClockSource> std::fmt::Debug for WalkHost<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalkHost")
            .field("session", &self.session)
            .field("driver", &self.driver)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ManualClock, MemoryStore, DEFAULT_TIP_FADE, WALK_TIPS};

    fn create_host(store: &MemoryStore) -> (WalkHost<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let host = WalkHost::new(clock.clone(), Box::new(store.clone()), DEFAULT_TIP_FADE);
        (host, clock)
    }

    #[test]
    fn test_walk_banks_total() {
        let store = MemoryStore::new();
        let (mut host, clock) = create_host(&store);

        assert!(host.toggle());
        clock.advance(42);
        host.process_pending_ticks();
        assert_eq!(host.elapsed_display(), "00:42");

        assert!(!host.toggle());
        assert_eq!(host.elapsed_display(), "00:00");
        assert_eq!(host.total_display(), "00:42");
        assert_eq!(store.get(WALK_TOTAL_KEY).as_deref(), Some("42"));
    }

    #[test]
    fn test_total_survives_restart() {
        let store = MemoryStore::with_entry(WALK_TOTAL_KEY, "150");
        let (mut host, clock) = create_host(&store);
        assert_eq!(host.total_display(), "02:30");

        host.toggle();
        clock.advance(30);
        host.process_pending_ticks();
        host.toggle();

        let (again, _clock) = create_host(&store);
        assert_eq!(again.total_display(), "03:00");
    }

    #[test]
    fn test_reset_clears_store() {
        let store = MemoryStore::with_entry(WALK_TOTAL_KEY, "600");
        let (mut host, clock) = create_host(&store);
        host.toggle();
        clock.advance(5);
        host.process_pending_ticks();

        host.reset();

        assert_eq!(host.phase(), SessionPhase::Idle);
        assert_eq!(host.total_display(), "00:00");
        assert_eq!(store.get(WALK_TOTAL_KEY), None);
        assert!(!clock.is_active());
    }

    #[test]
    fn test_teardown_banks_running_walk() {
        let store = MemoryStore::new();
        let (mut host, clock) = create_host(&store);
        host.toggle();
        clock.advance(12);
        host.process_pending_ticks();

        host.teardown();

        assert_eq!(store.get(WALK_TOTAL_KEY).as_deref(), Some("12"));
        assert!(!clock.is_active());
    }

    #[test]
    fn test_empty_walk_writes_nothing() {
        let store = MemoryStore::new();
        let (mut host, _clock) = create_host(&store);
        host.toggle();
        host.toggle();
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_tip_changes_after_fade() {
        let store = MemoryStore::new();
        let clock = ManualClock::new();
        let mut host = WalkHost::with_tips(
            clock,
            Box::new(store),
            TipRotator::walk_tips(DEFAULT_TIP_FADE).with_seed(3),
        );
        assert_eq!(host.tip(), WALK_TIPS[0]);

        assert!(host.next_tip());
        assert!(!host.next_tip());
        assert!(host.is_tip_fading());

        host.driver.settle_tip().await;
        assert!(!host.is_tip_fading());
        assert_ne!(host.tip(), WALK_TIPS[0]);
    }
}
