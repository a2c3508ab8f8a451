use std::sync::Arc;

use tokio::sync::{Semaphore, broadcast::error::RecvError, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::warn;

use crate::{
    core::Config,
    events::Bus,
    isolated::IsolatedCounter,
    state::Publisher,
    subscribers::{Subscribe, SubscriberSet},
};

use super::{
    alive::InFlight,
    execute::Shared,
    lanes::serial_worker,
    runner::Runner,
};

/// Builder for constructing a [`Runner`] with optional subscribers.
pub struct RunnerBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl RunnerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (unit lifecycle, state changes, etc.)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds a single subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds and returns the Runner instance.
    ///
    /// This consumes the builder and initializes all runtime components:
    /// - Event bus and the listener fanning it out to subscribers
    /// - Presentation loop owning the published state
    /// - Isolated counter actor (mirroring into `counterValue`)
    /// - Serial lane worker and the optional concurrency semaphore
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Arc<Runner> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let listener = CancellationToken::new();
        spawn_listener(&bus, subs, listener.clone());

        let runtime = CancellationToken::new();
        let intake = CancellationToken::new();

        let publisher = Publisher::spawn(bus.clone(), runtime.clone());
        let counter = IsolatedCounter::spawn(
            self.cfg.mailbox_capacity_clamped(),
            bus.clone(),
            Some(publisher.clone()),
            runtime.clone(),
        );

        let semaphore = self.cfg.concurrency_limit().map(Semaphore::new).map(Arc::new);

        let shared = Shared {
            bus,
            publisher,
            inflight: InFlight::new(),
            bridge_timeout: self.cfg.bridge_timeout(),
        };

        let tracker = TaskTracker::new();
        let (serial_tx, serial_rx) = mpsc::channel(self.cfg.serial_capacity_clamped());
        tracker.spawn(serial_worker(serial_rx, shared.clone(), intake.clone()));

        Arc::new(Runner::new_internal(
            self.cfg,
            shared,
            counter,
            serial_tx,
            semaphore,
            tracker,
            intake,
            runtime,
            listener.drop_guard(),
        ))
    }
}

/// Subscribes to the bus and forwards events to the subscriber set (fire-and-forget).
///
/// Runs until `stop` is cancelled (the runner was dropped), then forwards
/// whatever is still buffered. A lagging listener skips the lost events and
/// keeps going.
fn spawn_listener(bus: &Bus, set: Arc<SubscriberSet>, stop: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            let res = tokio::select! {
                biased;
                res = rx.recv() => res,
                _ = stop.cancelled() => break,
            };
            match res {
                Ok(ev) => set.emit(&ev),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscriber listener lagged behind the bus");
                }
                Err(RecvError::Closed) => return,
            }
        }
        while let Ok(ev) = rx.try_recv() {
            set.emit(&ev);
        }
    });
}
