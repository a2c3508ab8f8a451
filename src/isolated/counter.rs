use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::SubmitError;
use crate::events::{Bus, Event, EventKind};
use crate::state::{Publisher, Slot};

enum Command {
    Increment { reply: oneshot::Sender<i64> },
    Read { reply: oneshot::Sender<i64> },
    Run(BoxFuture<'static, ()>),
}

/// Handle to the isolated counter actor.
///
/// Cloning the handle is cheap; every clone talks to the same actor.
#[derive(Clone, Debug)]
pub struct IsolatedCounter {
    tx: mpsc::Sender<Command>,
}

impl IsolatedCounter {
    /// Spawns the actor with a mailbox of `capacity` commands (min 1).
    ///
    /// With `mirror` set, every increment re-publishes the new value to
    /// [`Slot::CounterValue`] from inside the actor turn.
    /// The actor stops when `token` is cancelled or every handle is dropped.
    pub fn spawn(
        capacity: usize,
        bus: Bus,
        mirror: Option<Publisher>,
        token: CancellationToken,
    ) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let actor = CounterActor {
            value: 0,
            bus,
            mirror,
        };
        tokio::spawn(actor.run(rx, token));
        Self { tx }
    }

    /// Adds one to the counter and waits until the increment is applied.
    pub async fn increment(&self) -> Result<(), SubmitError> {
        self.increment_and_read().await.map(|_| ())
    }

    /// Current counter value.
    pub async fn read(&self) -> Result<i64, SubmitError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Read { reply }).await?;
        rx.await.map_err(|_| SubmitError::Closed)
    }

    /// Adds one and returns the new value in a single actor turn.
    pub async fn increment_and_read(&self) -> Result<i64, SubmitError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Increment { reply }).await?;
        rx.await.map_err(|_| SubmitError::Closed)
    }

    /// Reserves a mailbox slot for a future, waiting for room.
    pub(crate) async fn reserve(&self) -> Result<RunPermit<'_>, SubmitError> {
        self.tx
            .reserve()
            .await
            .map(RunPermit)
            .map_err(|_| SubmitError::Closed)
    }

    /// Non-waiting variant of [`IsolatedCounter::reserve`].
    pub(crate) fn try_reserve(&self) -> Result<RunPermit<'_>, SubmitError> {
        self.tx.try_reserve().map(RunPermit).map_err(|e| match e {
            mpsc::error::TrySendError::Full(()) => SubmitError::Full,
            mpsc::error::TrySendError::Closed(()) => SubmitError::Closed,
        })
    }

    async fn send(&self, cmd: Command) -> Result<(), SubmitError> {
        self.tx.send(cmd).await.map_err(|_| SubmitError::Closed)
    }
}

/// Reserved mailbox slot.
pub(crate) struct RunPermit<'a>(mpsc::Permit<'a, Command>);

impl RunPermit<'_> {
    /// Queues `fut` to run inside the actor.
    ///
    /// The future runs to completion before the actor takes its next command,
    /// so it must not call back into this counter.
    pub(crate) fn run(self, fut: BoxFuture<'static, ()>) {
        self.0.send(Command::Run(fut));
    }
}

struct CounterActor {
    value: i64,
    bus: Bus,
    mirror: Option<Publisher>,
}

impl CounterActor {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>, token: CancellationToken) {
        loop {
            let cmd = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                cmd = rx.recv() => match cmd {
                    Some(cmd) => cmd,
                    None => break,
                },
            };

            match cmd {
                Command::Increment { reply } => {
                    let value = self.increment();
                    let _ = reply.send(value);
                }
                Command::Read { reply } => {
                    let _ = reply.send(self.value);
                }
                Command::Run(fut) => fut.await,
            }
        }
        debug!(value = self.value, "counter actor stopped");
    }

    fn increment(&mut self) -> i64 {
        self.value += 1;
        if let Some(mirror) = &self.mirror {
            // closed only after shutdown; the counter itself stays correct
            let _ = mirror.post(Slot::CounterValue, self.value);
        }
        self.bus
            .publish(Event::new(EventKind::CounterChanged).with_value(self.value));
        self.value
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::state::Value;

    fn counter(mirror: Option<Publisher>, bus: Bus) -> IsolatedCounter {
        IsolatedCounter::spawn(8, bus, mirror, CancellationToken::new())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_never_lost() {
        let c = counter(None, Bus::new(16));

        let mut joins = Vec::new();
        for _ in 0..200 {
            let c = c.clone();
            joins.push(tokio::spawn(async move { c.increment().await }));
        }
        for j in joins {
            j.await.expect("join").expect("increment");
        }

        assert_eq!(c.read().await, Ok(200));
    }

    #[tokio::test]
    async fn mirror_is_monotonic() {
        let bus = Bus::new(1024);
        let publisher = Publisher::spawn(bus.clone(), CancellationToken::new());
        let mut rx = bus.subscribe();
        let c = counter(Some(publisher.clone()), bus);

        for _ in 0..20 {
            c.increment().await.expect("increment");
        }
        publisher.flush().await.expect("flush");

        let mut seen = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::StatePublished && ev.slot == Some(Slot::CounterValue) {
                seen.push(ev.value.and_then(|v| v.as_int()).expect("int"));
            }
        }
        assert_eq!(seen, (1..=20).collect::<Vec<i64>>());
        assert_eq!(publisher.read(Slot::CounterValue), Value::Int(20));
    }

    #[tokio::test(start_paused = true)]
    async fn queued_work_runs_between_counter_turns() {
        let c = counter(None, Bus::new(16));
        let busy = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&busy);
        c.reserve().await.expect("reserve").run(Box::pin(async move {
            flag.store(true, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(1)).await;
            flag.store(false, Ordering::SeqCst);
        }));

        // the read is queued behind the work and only answered after it
        assert_eq!(c.increment_and_read().await, Ok(1));
        assert!(!busy.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn stopped_actor_reports_closed() {
        let token = CancellationToken::new();
        let c = IsolatedCounter::spawn(4, Bus::new(4), None, token.clone());
        c.increment().await.expect("increment");

        token.cancel();
        tokio::task::yield_now().await;

        assert_eq!(c.read().await, Err(SubmitError::Closed));
    }
}
