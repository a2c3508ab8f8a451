//! # Publisher: multi-producer, single-applier state funnel.
//!
//! Producers on any lane call [`Publisher::publish`] (waits until applied) or
//! [`Publisher::post`] (fire-and-forget). Both enqueue onto one unbounded mpsc
//! channel drained by a single presentation loop, which is the only writer of
//! the slot cells.
//!
//! ## Rules
//! - Updates to a slot are applied in enqueue order (FIFO channel, one applier).
//! - Reads go straight to the slot's `watch` cell; they never wait on the loop
//!   and always see a whole value (old or new).
//! - An update carrying a cancelled guard token is **discarded** at apply time,
//!   so a cancelled unit never produces a stale write.
//! - Every applied update is emitted once as `StatePublished` on the bus.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::SubmitError;
use crate::events::{Bus, Event, EventKind};

use super::{Slot, UnknownSlot, Value};

/// Latest value of a slot with its mutation count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Published {
    /// Current value.
    pub value: Value,
    /// Number of updates applied to this slot (0 = placeholder).
    pub version: u64,
}

enum Message {
    Update {
        slot: Slot,
        value: Value,
        guard: Option<CancellationToken>,
        ack: Option<oneshot::Sender<bool>>,
    },
    Barrier(oneshot::Sender<()>),
}

/// One watch cell per slot, indexed by [`Slot::index`].
struct Cells {
    slots: Vec<watch::Sender<Published>>,
}

impl Cells {
    fn new() -> Self {
        let slots = Slot::ALL
            .into_iter()
            .map(|slot| {
                let (tx, _rx) = watch::channel(Published {
                    value: slot.placeholder(),
                    version: 0,
                });
                tx
            })
            .collect();
        Self { slots }
    }

    fn cell(&self, slot: Slot) -> &watch::Sender<Published> {
        &self.slots[slot.index()]
    }

    /// Applies one update. Only the presentation loop calls this.
    fn apply(&self, slot: Slot, value: Value, guard: Option<&CancellationToken>, bus: &Bus) -> bool {
        if guard.is_some_and(|t| t.is_cancelled()) {
            warn!(%slot, %value, "discarding update from cancelled producer");
            bus.publish(
                Event::new(EventKind::StateDiscarded)
                    .with_slot(slot)
                    .with_value(value),
            );
            return false;
        }

        let mut version = 0;
        self.cell(slot).send_modify(|p| {
            p.version += 1;
            p.value = value.clone();
            version = p.version;
        });
        bus.publish(
            Event::new(EventKind::StatePublished)
                .with_slot(slot)
                .with_value(value)
                .with_version(version),
        );
        true
    }
}

/// Cloneable handle to the published state.
///
/// A publisher may carry a guard token (see [`Publisher::guarded`]); updates
/// sent through it are dropped once that token is cancelled.
#[derive(Clone)]
pub struct Publisher {
    tx: mpsc::UnboundedSender<Message>,
    cells: Arc<Cells>,
    guard: Option<CancellationToken>,
}

impl Publisher {
    /// Creates the slot cells and spawns the presentation loop.
    ///
    /// The loop runs until every publisher is dropped or `token` is cancelled;
    /// on cancellation it still applies whatever was already enqueued.
    pub fn spawn(bus: Bus, token: CancellationToken) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cells = Arc::new(Cells::new());
        tokio::spawn(presentation_loop(rx, Arc::clone(&cells), bus, token));
        Self {
            tx,
            cells,
            guard: None,
        }
    }

    /// Returns a publisher whose updates are discarded once `token` is cancelled.
    pub fn guarded(&self, token: CancellationToken) -> Self {
        Self {
            tx: self.tx.clone(),
            cells: Arc::clone(&self.cells),
            guard: Some(token),
        }
    }

    /// Enqueues an update and returns immediately.
    pub fn post(&self, slot: Slot, value: impl Into<Value>) -> Result<(), SubmitError> {
        self.send(Message::Update {
            slot,
            value: value.into(),
            guard: self.guard.clone(),
            ack: None,
        })
    }

    /// Enqueues an update and waits until the presentation loop has handled it.
    ///
    /// Returns `Ok(false)` when the update was discarded because this
    /// publisher's guard was cancelled.
    pub async fn publish(&self, slot: Slot, value: impl Into<Value>) -> Result<bool, SubmitError> {
        let (ack, applied) = oneshot::channel();
        self.send(Message::Update {
            slot,
            value: value.into(),
            guard: self.guard.clone(),
            ack: Some(ack),
        })?;
        applied.await.map_err(|_| SubmitError::Closed)
    }

    /// Waits until every update enqueued before this call has been handled.
    pub async fn flush(&self) -> Result<(), SubmitError> {
        let (done, rx) = oneshot::channel();
        self.send(Message::Barrier(done))?;
        rx.await.map_err(|_| SubmitError::Closed)
    }

    /// Latest value of `slot`.
    pub fn read(&self, slot: Slot) -> Value {
        self.cells.cell(slot).borrow().value.clone()
    }

    /// Latest value of the slot called `name` (e.g. `"status"`).
    pub fn read_named(&self, name: &str) -> Result<Value, UnknownSlot> {
        Ok(self.read(name.parse()?))
    }

    /// Number of updates applied to `slot` so far.
    pub fn version(&self, slot: Slot) -> u64 {
        self.cells.cell(slot).borrow().version
    }

    /// Change-notification receiver for `slot`.
    ///
    /// A `watch` receiver only keeps the latest value; to observe every
    /// mutation subscribe to `StatePublished` events instead.
    pub fn subscribe(&self, slot: Slot) -> watch::Receiver<Published> {
        self.cells.cell(slot).subscribe()
    }

    /// Copy of every slot's latest value.
    pub fn snapshot(&self) -> Vec<(Slot, Value)> {
        Slot::ALL
            .into_iter()
            .map(|slot| (slot, self.read(slot)))
            .collect()
    }

    fn send(&self, msg: Message) -> Result<(), SubmitError> {
        self.tx.send(msg).map_err(|_| SubmitError::Closed)
    }
}

async fn presentation_loop(
    mut rx: mpsc::UnboundedReceiver<Message>,
    cells: Arc<Cells>,
    bus: Bus,
    token: CancellationToken,
) {
    let mut closing = false;
    loop {
        let msg = tokio::select! {
            biased;
            _ = token.cancelled(), if !closing => {
                rx.close();
                closing = true;
                continue;
            }
            msg = rx.recv() => match msg {
                Some(msg) => msg,
                None => break,
            },
        };

        match msg {
            Message::Update {
                slot,
                value,
                guard,
                ack,
            } => {
                let applied = cells.apply(slot, value, guard.as_ref(), &bus);
                if let Some(ack) = ack {
                    let _ = ack.send(applied);
                }
            }
            Message::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("presentation loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publisher() -> (Publisher, Bus) {
        let bus = Bus::new(1024);
        (Publisher::spawn(bus.clone(), CancellationToken::new()), bus)
    }

    #[tokio::test]
    async fn starts_with_placeholders() {
        let (p, _bus) = publisher();
        assert_eq!(p.read(Slot::Status), Value::from("Loading..."));
        assert_eq!(p.read(Slot::CounterValue), Value::Int(0));
        assert_eq!(p.version(Slot::IncomingData), 0);
    }

    #[tokio::test]
    async fn publish_is_visible_once_acknowledged() {
        let (p, bus) = publisher();
        let mut rx = bus.subscribe();

        assert_eq!(p.publish(Slot::Status, "ready").await, Ok(true));
        assert_eq!(p.read(Slot::Status), Value::from("ready"));
        assert_eq!(p.version(Slot::Status), 1);
        assert_eq!(p.read_named("status"), Ok(Value::from("ready")));

        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::StatePublished);
        assert_eq!(ev.slot, Some(Slot::Status));
        assert_eq!(ev.version, Some(1));
    }

    #[tokio::test]
    async fn cancelled_guard_discards_update() {
        let (p, _bus) = publisher();
        let token = CancellationToken::new();
        let guarded = p.guarded(token.clone());

        assert_eq!(guarded.publish(Slot::Status, "first").await, Ok(true));
        token.cancel();
        assert_eq!(guarded.publish(Slot::Status, "stale").await, Ok(false));

        assert_eq!(p.read(Slot::Status), Value::from("first"));
        assert_eq!(p.version(Slot::Status), 1);
    }

    #[tokio::test]
    async fn posts_from_one_producer_apply_in_order() {
        let (p, bus) = publisher();
        let mut rx = bus.subscribe();

        for i in 0..50_i64 {
            p.post(Slot::CounterValue, i).expect("post");
        }
        p.flush().await.expect("flush");

        for expected in 0..50 {
            let ev = rx.recv().await.expect("event");
            assert_eq!(ev.value, Some(Value::Int(expected)));
        }
        assert_eq!(p.read(Slot::CounterValue), Value::Int(49));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_producers_lose_nothing() {
        let (p, _bus) = publisher();

        let mut joins = Vec::new();
        for producer in 0..8 {
            let p = p.clone();
            joins.push(tokio::spawn(async move {
                for i in 0..100 {
                    p.post(Slot::Background, format!("{producer}:{i}"))
                        .expect("post");
                }
            }));
        }
        for j in joins {
            j.await.expect("producer");
        }
        p.flush().await.expect("flush");

        assert_eq!(p.version(Slot::Background), 800);
    }

    #[tokio::test]
    async fn subscribers_wake_on_change() {
        let (p, _bus) = publisher();
        let mut rx = p.subscribe(Slot::IncomingData);

        p.post(Slot::IncomingData, "payload").expect("post");
        rx.changed().await.expect("changed");
        assert_eq!(rx.borrow().value, Value::from("payload"));
    }
}
