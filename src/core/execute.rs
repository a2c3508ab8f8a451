//! # Execute a single unit.
//!
//! Runs one [`Job`] to completion on whatever lane picked it up: applies the
//! timeout, races the body against cancellation, publishes the outcome to the
//! unit's slot and emits lifecycle events to the [`Bus`].
//!
//! ## Event flow
//!
//! ```text
//! Cancelled before start:
//!   token.is_cancelled() → publish UnitCanceled → reply Err(Canceled)
//!
//! Success:
//!   UnitStarting → body → Ok(v) → publish v to slot → UnitFinished
//!
//! Failure:
//!   UnitStarting → body → Err(e) → publish failure text to slot → UnitFailed
//!
//! Timeout:
//!   UnitStarting → timeout exceeded → cancel attempt → TimeoutHit
//!                                   → publish failure text → UnitFailed (timeout)
//!
//! Cancellation while running:
//!   UnitStarting → token cancelled → body dropped → UnitCanceled (nothing published)
//! ```
//!
//! ## Rules
//! - Always emits **exactly one** terminal event: `UnitFinished`, `UnitFailed` or `UnitCanceled`
//! - Errors and panics are caught here and never reach the lane
//! - The body runs under an **attempt** token (child of the unit token); once the
//!   attempt ends, late publishes from anything it spawned are discarded
//! - The outcome publish is guarded by the unit token, so a cancelled unit never
//!   writes its slot

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::oneshot;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::bridge::bridge;
use crate::error::{UnitError, panic_message};
use crate::events::{Bus, Event, EventKind};
use crate::state::{Publisher, Value};
use crate::units::{Body, Discipline, UnitContext, UnitSpec};

use super::alive::InFlight;

/// Unit accepted by a lane, waiting to be executed.
pub(crate) struct Job {
    pub(crate) id: u64,
    pub(crate) spec: UnitSpec,
    pub(crate) token: CancellationToken,
    pub(crate) reply: oneshot::Sender<Result<Value, UnitError>>,
}

/// Everything a lane needs to execute jobs.
#[derive(Clone)]
pub(crate) struct Shared {
    pub(crate) bus: Bus,
    pub(crate) publisher: Publisher,
    pub(crate) inflight: InFlight,
    pub(crate) bridge_timeout: Option<Duration>,
}

/// Executes `job` and sends its outcome to the job's handle.
pub(crate) async fn execute(job: Job, shared: Shared) {
    let Job {
        id,
        spec,
        token,
        reply,
    } = job;
    let label = spec.label_arc();
    let discipline = spec.discipline();

    if token.is_cancelled() {
        publish_canceled(&shared.bus, &label, discipline);
        let _ = reply.send(Err(UnitError::Canceled));
        return;
    }

    let alive = shared.inflight.enter(id, Arc::clone(&label));
    shared.bus.publish(
        Event::new(EventKind::UnitStarting)
            .with_unit(Arc::clone(&label))
            .with_discipline(discipline),
    );
    debug!(unit = %label, %discipline, "unit starting");

    let attempt = token.child_token();
    let res = tokio::select! {
        biased;
        _ = token.cancelled() => Err(UnitError::Canceled),
        res = run_attempt(&spec, &attempt, &shared) => res,
    };
    attempt.cancel();

    if let Some(slot) = spec.publish_to() {
        let value = match &res {
            Ok(v) => Some(v.clone()),
            Err(UnitError::Canceled) => None,
            Err(e) => Some(spec.failure_value(e)),
        };
        if let Some(value) = value {
            // Ok(false) means the unit was cancelled while publishing.
            let _ = shared.publisher.guarded(token.clone()).publish(slot, value).await;
        }
    }

    match &res {
        Ok(value) => {
            debug!(unit = %label, %value, "unit finished");
            shared.bus.publish(
                Event::new(EventKind::UnitFinished)
                    .with_unit(Arc::clone(&label))
                    .with_discipline(discipline)
                    .with_value(value.clone()),
            );
        }
        Err(UnitError::Canceled) => publish_canceled(&shared.bus, &label, discipline),
        Err(e) => {
            warn!(unit = %label, error = %e, code = e.as_label(), "unit failed");
            shared.bus.publish(
                Event::new(EventKind::UnitFailed)
                    .with_unit(Arc::clone(&label))
                    .with_discipline(discipline)
                    .with_reason(e.to_string()),
            );
        }
    }

    drop(alive);
    let _ = reply.send(res);
}

/// Runs the body once, applying the optional timeout.
///
/// On timeout the attempt token is cancelled and `TimeoutHit` is emitted.
async fn run_attempt(
    spec: &UnitSpec,
    attempt: &CancellationToken,
    shared: &Shared,
) -> Result<Value, UnitError> {
    let body = run_body(spec, attempt.clone(), shared);

    match spec.timeout().filter(|d| *d > Duration::ZERO) {
        Some(dur) => match time::timeout(dur, body).await {
            Ok(r) => r,
            Err(_elapsed) => {
                attempt.cancel();
                shared.bus.publish(
                    Event::new(EventKind::TimeoutHit)
                        .with_unit(spec.label_arc())
                        .with_discipline(spec.discipline())
                        .with_timeout(dur),
                );
                Err(UnitError::Timeout { timeout: dur })
            }
        },
        None => body.await,
    }
}

/// Drives either a unit or a bridge trigger, converting panics into errors.
async fn run_body(
    spec: &UnitSpec,
    token: CancellationToken,
    shared: &Shared,
) -> Result<Value, UnitError> {
    let fut: BoxFuture<'_, Result<Value, UnitError>> = match spec.body() {
        Body::Unit(unit) => {
            let ctx = UnitContext::new(spec.label_arc(), token, &shared.publisher);
            unit.run(ctx)
        }
        Body::Bridge(trigger) => {
            let trigger = Arc::clone(trigger);
            let timeout = shared.bridge_timeout;
            Box::pin(async move {
                let (resolver, bridged) = bridge::<Value>();
                trigger(resolver);
                Ok::<_, UnitError>(bridged.with_timeout(timeout).await?)
            })
        }
    };

    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => Err(UnitError::Panicked {
            info: panic_message(&*panic),
        }),
    }
}

fn publish_canceled(bus: &Bus, label: &Arc<str>, discipline: Discipline) {
    debug!(unit = %label, "unit cancelled");
    bus.publish(
        Event::new(EventKind::UnitCanceled)
            .with_unit(Arc::clone(label))
            .with_discipline(discipline),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Slot;
    use crate::units::UnitFn;

    fn shared() -> Shared {
        let bus = Bus::new(256);
        Shared {
            publisher: Publisher::spawn(bus.clone(), CancellationToken::new()),
            bus,
            inflight: InFlight::new(),
            bridge_timeout: None,
        }
    }

    fn job(spec: UnitSpec) -> (Job, oneshot::Receiver<Result<Value, UnitError>>, CancellationToken) {
        let (reply, rx) = oneshot::channel();
        let token = CancellationToken::new();
        let job = Job {
            id: 1,
            spec,
            token: token.clone(),
            reply,
        };
        (job, rx, token)
    }

    #[tokio::test]
    async fn success_publishes_value_then_finishes() {
        let shared = shared();
        let mut events = shared.bus.subscribe();
        let unit = UnitFn::arc("ok", |_ctx: UnitContext| async move {
            Ok::<_, UnitError>(Value::from("done"))
        });
        let (job, rx, _token) = job(UnitSpec::concurrent(unit).with_publish(Slot::Status));

        execute(job, shared.clone()).await;

        assert_eq!(rx.await.expect("reply"), Ok(Value::from("done")));
        assert_eq!(shared.publisher.read(Slot::Status), Value::from("done"));

        let kinds: Vec<EventKind> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::UnitStarting,
                EventKind::StatePublished,
                EventKind::UnitFinished
            ]
        );
    }

    #[tokio::test]
    async fn failure_publishes_failure_text() {
        let shared = shared();
        let unit = UnitFn::arc("load", |_ctx: UnitContext| async move {
            Err::<Value, _>(UnitError::LoadFailure)
        });
        let spec = UnitSpec::concurrent(unit)
            .with_publish(Slot::Status)
            .with_failure_text("Failed to load data.");
        let (job, rx, _token) = job(spec);

        execute(job, shared.clone()).await;

        assert_eq!(rx.await.expect("reply"), Err(UnitError::LoadFailure));
        assert_eq!(
            shared.publisher.read(Slot::Status),
            Value::from("Failed to load data.")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_cancels_attempt() {
        let shared = shared();
        let mut events = shared.bus.subscribe();
        let unit = UnitFn::arc("slow", |ctx: UnitContext| async move {
            ctx.sleep(Duration::from_secs(60)).await?;
            Ok::<_, UnitError>(Value::Int(1))
        });
        let spec = UnitSpec::serial(unit).with_timeout(Some(Duration::from_secs(1)));
        let (job, rx, _token) = job(spec);

        execute(job, shared).await;

        assert_eq!(
            rx.await.expect("reply"),
            Err(UnitError::Timeout {
                timeout: Duration::from_secs(1)
            })
        );
        let kinds: Vec<EventKind> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|e| e.kind)
            .collect();
        assert!(kinds.contains(&EventKind::TimeoutHit));
        assert_eq!(kinds.last(), Some(&EventKind::UnitFailed));
    }

    #[tokio::test]
    async fn cancelled_job_never_starts() {
        let shared = shared();
        let unit = UnitFn::arc("never", |_ctx: UnitContext| async move {
            if true {
                panic!("must not run");
            }
            Ok::<_, UnitError>(Value::Int(0))
        });
        let (job, rx, token) = job(UnitSpec::serial(unit).with_publish(Slot::Status));
        token.cancel();

        execute(job, shared.clone()).await;

        assert_eq!(rx.await.expect("reply"), Err(UnitError::Canceled));
        assert_eq!(shared.publisher.version(Slot::Status), 0);
    }

    #[tokio::test]
    async fn panic_is_caught_at_unit_boundary() {
        let shared = shared();
        let unit = UnitFn::arc("boom", |_ctx: UnitContext| async move {
            if true {
                panic!("boom");
            }
            Ok::<_, UnitError>(Value::Int(0))
        });
        let (job, rx, _token) = job(UnitSpec::concurrent(unit));

        execute(job, shared.clone()).await;

        assert_eq!(
            rx.await.expect("reply"),
            Err(UnitError::Panicked {
                info: "boom".to_string()
            })
        );
        assert!(shared.inflight.snapshot().is_empty());
    }

    #[tokio::test]
    async fn bridge_trigger_resolves_value() {
        let shared = shared();
        let spec = UnitSpec::bridged("fetch", |resolver| {
            std::thread::spawn(move || {
                resolver.resolve(Value::from("late"));
            });
        })
        .with_publish(Slot::IncomingData);
        let (job, rx, _token) = job(spec);

        execute(job, shared.clone()).await;

        assert_eq!(rx.await.expect("reply"), Ok(Value::from("late")));
        assert_eq!(
            shared.publisher.read(Slot::IncomingData),
            Value::from("late")
        );
    }
}
