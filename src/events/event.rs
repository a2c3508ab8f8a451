//! # Runtime events emitted by the runner, its lanes and the presentation loop.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Unit lifecycle**: submitted, starting, finished, failed, cancelled, timeout
//! - **State**: slot updates applied or discarded by the presentation loop
//! - **Isolation**: counter mutations
//! - **Runtime**: shutdown progress and subscriber health
//!
//! The [`Event`] struct carries additional metadata such as timestamps, unit
//! label, discipline, slot and value.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use tasklane::{Discipline, Event, EventKind};
//!
//! let ev = Event::new(EventKind::UnitFailed)
//!     .with_unit("load-data")
//!     .with_discipline(Discipline::Concurrent)
//!     .with_reason("failed to load data");
//!
//! assert_eq!(ev.kind, EventKind::UnitFailed);
//! assert_eq!(ev.unit.as_deref(), Some("load-data"));
//! assert_eq!(ev.reason.as_deref(), Some("failed to load data"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::state::{Slot, Value};
use crate::units::Discipline;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `unit`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `unit`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Shutdown events ===
    /// Shutdown requested; lanes stop accepting work.
    ShutdownRequested,

    /// All in-flight units finished within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; remaining units were cancelled.
    GraceExceeded,

    // === Unit lifecycle events ===
    /// Unit accepted by its lane.
    ///
    /// Sets:
    /// - `unit`: unit label
    /// - `discipline`: lane discipline
    UnitSubmitted,

    /// Unit is starting.
    ///
    /// Sets:
    /// - `unit`: unit label
    /// - `discipline`: lane discipline
    UnitStarting,

    /// Unit produced a value.
    ///
    /// Sets:
    /// - `unit`: unit label
    /// - `discipline`: lane discipline
    /// - `value`: produced value
    UnitFinished,

    /// Unit failed; the failure was caught at the unit boundary.
    ///
    /// Sets:
    /// - `unit`: unit label
    /// - `discipline`: lane discipline
    /// - `reason`: failure message
    UnitFailed,

    /// Unit was cancelled before or while running.
    ///
    /// Sets:
    /// - `unit`: unit label
    /// - `discipline`: lane discipline
    UnitCanceled,

    /// Unit exceeded its configured timeout (always followed by `UnitFailed`).
    ///
    /// Sets:
    /// - `unit`: unit label
    /// - `timeout_ms`: configured timeout (ms)
    TimeoutHit,

    // === State events ===
    /// Presentation loop applied a slot update.
    ///
    /// Sets:
    /// - `slot`: updated slot
    /// - `value`: new value
    /// - `version`: slot version after the update
    StatePublished,

    /// Presentation loop discarded an update whose producer was cancelled.
    ///
    /// Sets:
    /// - `slot`: target slot
    /// - `value`: discarded value
    StateDiscarded,

    // === Isolation events ===
    /// Isolated counter changed.
    ///
    /// Sets:
    /// - `value`: new counter value
    CounterChanged,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Unit label (or subscriber name for subscriber events).
    pub unit: Option<Arc<str>>,
    /// Discipline of the unit, if applicable.
    pub discipline: Option<Discipline>,
    /// Published slot, if applicable.
    pub slot: Option<Slot>,
    /// Value carried by the event (unit result, slot value, counter value).
    pub value: Option<Value>,
    /// Slot version after a state update.
    pub version: Option<u64>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Unit timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            unit: None,
            discipline: None,
            slot: None,
            value: None,
            version: None,
            reason: None,
            timeout_ms: None,
        }
    }

    /// Attaches a unit label.
    #[inline]
    pub fn with_unit(mut self, unit: impl Into<Arc<str>>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Attaches a discipline.
    #[inline]
    pub fn with_discipline(mut self, discipline: Discipline) -> Self {
        self.discipline = Some(discipline);
        self
    }

    /// Attaches a slot.
    #[inline]
    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Attaches a value.
    #[inline]
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Attaches a slot version.
    #[inline]
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_unit(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_unit(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::UnitStarting);
        let b = Event::new(EventKind::UnitFinished);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn timeout_is_stored_in_millis() {
        let ev = Event::new(EventKind::TimeoutHit).with_timeout(Duration::from_millis(1500));
        assert_eq!(ev.timeout_ms, Some(1500));
    }
}
