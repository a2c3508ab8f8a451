//! # Runner: dispatches units to their lanes and drives graceful shutdown.
//!
//! The [`Runner`] owns the event bus, the published state, the isolated
//! counter and the lanes. It assigns every submitted unit an id and a child
//! cancellation token, and hands the job to the lane its [`Discipline`] names.
//!
//! ## High-level architecture
//! ```text
//! submit(UnitSpec)
//!     │  with_defaults(cfg), id, child token, UnitSubmitted
//!     ├── Serial     ──► [bounded queue] ──► serial worker ──► execute (one at a time)
//!     ├── Concurrent ──► tracker.spawn ──► (semaphore) ──► execute
//!     ├── Bridged    ──► tracker.spawn ──► (semaphore) ──► execute(bridge trigger)
//!     └── Isolated   ──► counter mailbox ──► execute (between counter turns)
//!
//! execute ── publish(slot, value) ──► Publisher ──► presentation loop
//!         └─ Event ──► Bus ──► listener ──► SubscriberSet ──► subscribers
//!
//! Shutdown path:
//!   shutdown()
//!     └─► Bus.publish(ShutdownRequested)
//!     └─► intake.cancel()            → submit returns Closed, serial queue closes
//!     └─► wait up to cfg.grace for queued and running units:
//!            ├─ Ok       → runtime.cancel() → Bus.publish(AllStoppedWithin)
//!            └─ exceeded → runtime.cancel() (cancels every unit)
//!                          → Bus.publish(GraceExceeded)
//!                          → RuntimeError::GraceExceeded { running }
//! ```
//!
//! ## Example
//! ```rust
//! use tasklane::{Config, Runner, Slot, UnitContext, UnitError, UnitFn, UnitSpec, Value};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = Runner::new(Config::default());
//!
//!     let hello = UnitFn::arc("hello", |_ctx: UnitContext| async move {
//!         Ok::<_, UnitError>(Value::from("hello"))
//!     });
//!     let handle = runner
//!         .submit(UnitSpec::serial(hello).with_publish(Slot::Status))
//!         .await?;
//!
//!     assert_eq!(handle.await?, Value::from("hello"));
//!     assert_eq!(runner.read(Slot::Status), Value::from("hello"));
//!
//!     runner.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Semaphore, broadcast, mpsc, oneshot};
use tokio_util::sync::{CancellationToken, DropGuard};
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::error::{RuntimeError, SubmitError};
use crate::events::{Event, EventKind};
use crate::isolated::IsolatedCounter;
use crate::state::{Publisher, Slot, Value};
use crate::units::{Discipline, UnitSpec};

use super::builder::RunnerBuilder;
use super::config::Config;
use super::execute::{Job, Shared, execute};
use super::handle::UnitHandle;
use super::lanes::run_concurrent;

/// Lane slot secured before a unit is announced.
enum Ticket<'a> {
    Serial(mpsc::Permit<'a, Job>),
    Isolated(crate::isolated::RunPermit<'a>),
    Spawn,
}

/// Schedules units on their lanes and owns the runtime they share.
///
/// Must be built inside a tokio runtime.
pub struct Runner {
    cfg: Config,
    shared: Shared,
    counter: IsolatedCounter,
    serial: mpsc::Sender<Job>,
    semaphore: Option<Arc<Semaphore>>,
    tracker: TaskTracker,
    intake: CancellationToken,
    runtime: CancellationToken,
    next_id: AtomicU64,
    _listener: DropGuard,
}

impl Runner {
    /// Builds a runner without subscribers. See [`RunnerBuilder`] for more options.
    pub fn new(cfg: Config) -> Arc<Self> {
        RunnerBuilder::new(cfg).build()
    }

    /// Returns a builder.
    pub fn builder(cfg: Config) -> RunnerBuilder {
        RunnerBuilder::new(cfg)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new_internal(
        cfg: Config,
        shared: Shared,
        counter: IsolatedCounter,
        serial: mpsc::Sender<Job>,
        semaphore: Option<Arc<Semaphore>>,
        tracker: TaskTracker,
        intake: CancellationToken,
        runtime: CancellationToken,
        listener: DropGuard,
    ) -> Self {
        Self {
            cfg,
            shared,
            counter,
            serial,
            semaphore,
            tracker,
            intake,
            runtime,
            next_id: AtomicU64::new(1),
            _listener: listener,
        }
    }

    /// Submits a unit, waiting for queue room on bounded lanes.
    ///
    /// The spec inherits `Config::timeout` if it has none.
    pub async fn submit(&self, spec: UnitSpec) -> Result<UnitHandle, SubmitError> {
        self.ensure_open()?;
        let ticket = match spec.discipline() {
            Discipline::Serial => Ticket::Serial(
                self.serial
                    .reserve()
                    .await
                    .map_err(|_| SubmitError::Closed)?,
            ),
            Discipline::Isolated => Ticket::Isolated(self.counter.reserve().await?),
            Discipline::Concurrent | Discipline::Bridged => Ticket::Spawn,
        };
        Ok(self.dispatch(spec, ticket))
    }

    /// Submits a unit without waiting; fails with [`SubmitError::Full`] when
    /// the serial queue or the counter mailbox has no room.
    pub fn try_submit(&self, spec: UnitSpec) -> Result<UnitHandle, SubmitError> {
        self.ensure_open()?;
        let ticket = match spec.discipline() {
            Discipline::Serial => {
                Ticket::Serial(self.serial.try_reserve().map_err(|e| match e {
                    mpsc::error::TrySendError::Full(()) => SubmitError::Full,
                    mpsc::error::TrySendError::Closed(()) => SubmitError::Closed,
                })?)
            }
            Discipline::Isolated => Ticket::Isolated(self.counter.try_reserve()?),
            Discipline::Concurrent | Discipline::Bridged => Ticket::Spawn,
        };
        Ok(self.dispatch(spec, ticket))
    }

    fn ensure_open(&self) -> Result<(), SubmitError> {
        if self.intake.is_cancelled() {
            Err(SubmitError::Closed)
        } else {
            Ok(())
        }
    }

    fn dispatch(&self, spec: UnitSpec, ticket: Ticket<'_>) -> UnitHandle {
        let spec = spec.with_defaults(&self.cfg);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = self.runtime.child_token();
        let (reply, outcome) = oneshot::channel();
        let handle = UnitHandle::new(
            id,
            spec.label_arc(),
            spec.discipline(),
            token.clone(),
            outcome,
        );

        self.shared.bus.publish(
            Event::new(EventKind::UnitSubmitted)
                .with_unit(spec.label_arc())
                .with_discipline(spec.discipline()),
        );

        let job = Job {
            id,
            spec,
            token,
            reply,
        };
        match ticket {
            Ticket::Serial(permit) => permit.send(job),
            Ticket::Isolated(permit) => {
                let fut = self.tracker.track_future(execute(job, self.shared.clone()));
                permit.run(Box::pin(fut));
            }
            Ticket::Spawn => {
                self.tracker.spawn(run_concurrent(
                    job,
                    self.shared.clone(),
                    self.semaphore.clone(),
                ));
            }
        }
        handle
    }

    /// Handle to the published state.
    pub fn publisher(&self) -> &Publisher {
        &self.shared.publisher
    }

    /// Latest value of `slot`.
    pub fn read(&self, slot: Slot) -> Value {
        self.shared.publisher.read(slot)
    }

    /// Handle to the isolated counter.
    pub fn counter(&self) -> &IsolatedCounter {
        &self.counter
    }

    /// Receiver of every runtime event published from now on.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }

    /// Sorted labels of the units executing right now.
    pub fn running(&self) -> Vec<String> {
        self.shared.inflight.snapshot()
    }

    /// Runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// True once [`Runner::shutdown`] was called.
    pub fn is_closed(&self) -> bool {
        self.intake.is_cancelled()
    }

    /// Stops accepting work and waits up to `Config::grace` for queued and
    /// running units.
    ///
    /// Units still running after the grace period are cancelled and named in
    /// [`RuntimeError::GraceExceeded`]. Published state stays readable after
    /// shutdown; further publishes fail with [`SubmitError::Closed`].
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.shared
            .bus
            .publish(Event::new(EventKind::ShutdownRequested));
        self.intake.cancel();
        self.tracker.close();

        let grace = self.cfg.grace;
        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => {
                self.runtime.cancel();
                self.shared
                    .bus
                    .publish(Event::new(EventKind::AllStoppedWithin));
                debug!("all units stopped within grace");
                Ok(())
            }
            Err(_elapsed) => {
                let running = self.shared.inflight.snapshot();
                self.runtime.cancel();
                self.shared.bus.publish(
                    Event::new(EventKind::GraceExceeded).with_reason(running.join(", ")),
                );
                warn!(?grace, ?running, "shutdown grace exceeded");
                Err(RuntimeError::GraceExceeded { grace, running })
            }
        }
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.intake.cancel();
        self.runtime.cancel();
    }
}
