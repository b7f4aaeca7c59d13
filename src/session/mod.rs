//! Timed session engine.
//!
//! This module contains the reusable timer core shared by the meditation
//! countdown and the walk stopwatch:
//! - `clock`: one-second tick sources
//! - `counter`: durable named counters over a key-value store
//! - `timer`: the session state machine
//! - `effects`: audio, tip rotation and completion driven by session events
//! - `error`: refusals and storage failures

pub mod clock;
pub mod counter;
pub mod effects;
pub mod error;
pub mod timer;

pub use clock::{ClockSource, ManualClock, SubscriptionId, Tick, TokioClock, TICK_PERIOD};
pub use counter::{JsonFileStore, KeyValueStore, MemoryStore, PersistentCounter};
pub use effects::{SessionSideEffectDriver, TipRotator, DEFAULT_TIP_FADE, WALK_TIPS};
pub use error::{SessionError, StorageError};
pub use timer::{SessionEvent, TimedSession};
