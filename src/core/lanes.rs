//! # Lane workers.
//!
//! - **Serial**: one worker task drains a bounded FIFO queue and executes jobs
//!   one at a time. A job (including its outcome publish) completes before the
//!   next one is taken.
//! - **Concurrent / bridged**: every job gets its own task, optionally gated
//!   by the global semaphore.
//!
//! The isolated lane has no worker here; its jobs run inside the
//! [`IsolatedCounter`](crate::IsolatedCounter) mailbox.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::execute::{Job, Shared, execute};

/// Serial lane worker.
///
/// Runs until the queue is closed and empty. Cancelling `intake` closes the
/// queue; jobs already queued are still executed.
pub(crate) async fn serial_worker(
    mut rx: mpsc::Receiver<Job>,
    shared: Shared,
    intake: CancellationToken,
) {
    let mut closing = false;
    loop {
        let job = tokio::select! {
            biased;
            _ = intake.cancelled(), if !closing => {
                rx.close();
                closing = true;
                continue;
            }
            job = rx.recv() => match job {
                Some(job) => job,
                None => break,
            },
        };
        execute(job, shared.clone()).await;
    }
    debug!("serial lane stopped");
}

/// Executes one concurrent or bridged job, holding a global permit if a cap is set.
pub(crate) async fn run_concurrent(job: Job, shared: Shared, semaphore: Option<Arc<Semaphore>>) {
    let _permit = acquire(semaphore, &job.token).await;
    execute(job, shared).await;
}

/// Waits for a permit; gives up when the unit is cancelled first.
///
/// A unit cancelled while waiting is reported as cancelled by `execute`.
async fn acquire(
    semaphore: Option<Arc<Semaphore>>,
    token: &CancellationToken,
) -> Option<OwnedSemaphorePermit> {
    let semaphore = semaphore?;
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        permit = semaphore.acquire_owned() => permit.ok(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::oneshot;
    use tokio::task::JoinSet;

    use super::*;
    use crate::core::alive::InFlight;
    use crate::error::UnitError;
    use crate::events::Bus;
    use crate::state::{Publisher, Value};
    use crate::units::{UnitContext, UnitFn, UnitSpec};

    fn shared() -> Shared {
        let bus = Bus::new(256);
        Shared {
            publisher: Publisher::spawn(bus.clone(), CancellationToken::new()),
            bus,
            inflight: InFlight::new(),
            bridge_timeout: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn semaphore_caps_concurrency() {
        let shared = shared();
        let semaphore = Some(Arc::new(Semaphore::new(2)));
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut set = JoinSet::new();
        for i in 0..6_u64 {
            let (current, peak) = (Arc::clone(&current), Arc::clone(&peak));
            let unit = UnitFn::arc("capped", move |_ctx: UnitContext| {
                let (current, peak) = (Arc::clone(&current), Arc::clone(&peak));
                async move {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    current.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, UnitError>(Value::Int(0))
                }
            });
            let (reply, _rx) = oneshot::channel();
            let job = Job {
                id: i,
                spec: UnitSpec::concurrent(unit),
                token: CancellationToken::new(),
                reply,
            };
            set.spawn(run_concurrent(job, shared.clone(), semaphore.clone()));
        }
        while set.join_next().await.is_some() {}

        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn serial_worker_drains_queue_after_intake_closes() {
        let shared = shared();
        let (tx, rx) = mpsc::channel(8);
        let intake = CancellationToken::new();

        let mut outcomes = Vec::new();
        for i in 0..3_i64 {
            let unit = UnitFn::arc("queued", move |_ctx: UnitContext| async move {
                Ok::<_, UnitError>(Value::Int(i))
            });
            let (reply, outcome) = oneshot::channel();
            tx.send(Job {
                id: i as u64,
                spec: UnitSpec::serial(unit),
                token: CancellationToken::new(),
                reply,
            })
            .await
            .expect("send");
            outcomes.push(outcome);
        }
        intake.cancel();

        serial_worker(rx, shared, intake).await;

        for (i, outcome) in outcomes.into_iter().enumerate() {
            assert_eq!(outcome.await.expect("reply"), Ok(Value::Int(i as i64)));
        }
        assert!(tx.is_closed());
    }
}
