//! # Non-blocking event fan-out to multiple subscribers.
//!
//! Provides [`SubscriberSet`], which hands every event to each subscriber's
//! own bounded queue without blocking the caller.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → SubscriberPanicked
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!     │    (bounded)
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//!          (bounded)
//! ```
//!
//! ## Rules
//! - **No cross-subscriber ordering**: subscriber A may process event N while B processes N+5
//! - **Per-subscriber FIFO**: each subscriber sees events in bus order
//! - **Overflow**: event dropped for that subscriber only, `SubscriberOverflow` published
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Panic isolation**: a panic is caught, published as `SubscriberPanicked`,
//!   and the worker moves on to the next event

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::warn;

use crate::error::panic_message;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

/// Per-subscriber channel metadata.
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for event subscribers.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// Minimum queue capacity is 1.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            workers.push(tokio::spawn(worker(sub, rx, bus.clone())));
            channels.push(SubscriberChannel { name, sender: tx });
        }
        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Number of subscribers in the set.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// True when the set has no subscribers.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Emits an event to all subscribers (clones the event once).
    pub fn emit(&self, event: &Event) {
        if self.channels.is_empty() {
            return;
        }
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Emits a pre-allocated `Arc<Event>` to all subscribers.
    ///
    /// Overflow events are never re-published when they themselves overflow.
    pub fn emit_arc(&self, event: Arc<Event>) {
        let is_overflow_evt = matches!(event.kind, EventKind::SubscriberOverflow);

        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !is_overflow_evt {
                warn!(subscriber = channel.name, reason, seq = event.seq, "subscriber dropped event");
                self.bus
                    .publish(Event::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Closes every queue and waits for the workers to finish what they hold.
    pub async fn shutdown(self) {
        drop(self.channels);

        for h in self.workers {
            let _ = h.await;
        }
    }
}

async fn worker(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let fut = sub.on_event(ev.as_ref());
        if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
            let info = panic_message(&*panic);
            warn!(subscriber = sub.name(), %info, "subscriber panicked");
            bus.publish(Event::subscriber_panicked(sub.name(), info));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.seen.lock().expect("lock").push(ev.seq);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    /// Holds the first event until `gate` is cancelled.
    struct Blocker {
        gate: tokio_util::sync::CancellationToken,
        handled: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl Subscribe for Blocker {
        async fn on_event(&self, _ev: &Event) {
            self.handled
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.gate.cancelled().await;
        }
        fn name(&self) -> &'static str {
            "blocker"
        }
        fn queue_capacity(&self) -> usize {
            1
        }
    }

    struct Panicky;

    #[async_trait]
    impl Subscribe for Panicky {
        async fn on_event(&self, ev: &Event) {
            if ev.kind == EventKind::UnitFailed {
                panic!("cannot handle failures");
            }
        }
        fn name(&self) -> &'static str {
            "panicky"
        }
    }

    #[tokio::test]
    async fn each_subscriber_sees_events_in_order() {
        let bus = Bus::new(64);
        let rec = Arc::new(Recorder::default());
        let set = SubscriberSet::new(vec![rec.clone() as Arc<dyn Subscribe>], bus);

        let events: Vec<Event> = (0..10).map(|_| Event::new(EventKind::UnitStarting)).collect();
        for ev in &events {
            set.emit(ev);
        }
        set.shutdown().await;

        let expected: Vec<u64> = events.iter().map(|e| e.seq).collect();
        assert_eq!(*rec.seen.lock().expect("lock"), expected);
    }

    #[tokio::test]
    async fn panic_is_reported_and_worker_survives() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let rec = Arc::new(Recorder::default());
        let set = SubscriberSet::new(
            vec![Arc::new(Panicky) as Arc<dyn Subscribe>, rec.clone()],
            bus,
        );

        set.emit(&Event::new(EventKind::UnitFailed));
        set.emit(&Event::new(EventKind::UnitFinished));
        set.shutdown().await;

        let ev = rx.recv().await.expect("panic event");
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert_eq!(ev.unit.as_deref(), Some("panicky"));
        assert_eq!(ev.reason.as_deref(), Some("cannot handle failures"));
        assert_eq!(rec.seen.lock().expect("lock").len(), 2);
    }

    #[tokio::test]
    async fn full_queue_drops_event_and_reports_overflow() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let gate = tokio_util::sync::CancellationToken::new();
        let blocker = Arc::new(Blocker {
            gate: gate.clone(),
            handled: std::sync::atomic::AtomicUsize::new(0),
        });
        let set = SubscriberSet::new(vec![blocker.clone() as Arc<dyn Subscribe>], bus);

        for _ in 0..3 {
            set.emit(&Event::new(EventKind::UnitStarting));
        }

        let overflows: Vec<Event> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|e| e.kind == EventKind::SubscriberOverflow)
            .collect();
        assert!(!overflows.is_empty());
        for ev in &overflows {
            assert_eq!(ev.unit.as_deref(), Some("blocker"));
            assert!(ev.reason.as_deref().is_some_and(|r| r.contains("reason=full")));
        }

        // an overflow event that itself overflows is not re-published
        set.emit(&Event::subscriber_overflow("other", "full"));
        assert!(rx.try_recv().is_err());

        gate.cancel();
        set.shutdown().await;
        assert_eq!(blocker.handled.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
