//! # Unit abstraction and its execution context.
//!
//! This module defines the [`Unit`] trait (async, cancelable, value-producing)
//! and the [`UnitContext`] every run receives. The common handle type is
//! [`UnitRef`], an `Arc<dyn Unit>` suitable for sharing across lanes.
//!
//! A unit receives a context carrying its cancellation token and a publisher
//! guarded by that token: once the unit is cancelled, nothing it publishes is
//! applied.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::UnitError;
use crate::state::{Publisher, Slot, Value};

/// Shared handle to a unit.
pub type UnitRef = Arc<dyn Unit>;

/// # Asynchronous, cancelable unit of work.
///
/// A `Unit` has a stable [`name`](Unit::name) and an async [`run`](Unit::run)
/// method that produces a [`Value`].
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tasklane::{Unit, UnitContext, UnitError, Value};
///
/// struct Answer;
///
/// #[async_trait]
/// impl Unit for Answer {
///     fn name(&self) -> &str { "answer" }
///
///     async fn run(&self, ctx: UnitContext) -> Result<Value, UnitError> {
///         if ctx.is_cancelled() {
///             return Err(UnitError::Canceled);
///         }
///         Ok(Value::Int(42))
///     }
/// }
/// ```
#[async_trait]
pub trait Unit: Send + Sync + 'static {
    /// Returns a stable, human-readable unit name.
    fn name(&self) -> &str;

    /// Executes the unit once.
    ///
    /// The runner drops the future when the unit is cancelled, so
    /// implementations need not poll the token between awaits.
    async fn run(&self, ctx: UnitContext) -> Result<Value, UnitError>;
}

/// Execution context handed to [`Unit::run`].
#[derive(Clone)]
pub struct UnitContext {
    label: Arc<str>,
    token: CancellationToken,
    publisher: Publisher,
}

impl UnitContext {
    pub(crate) fn new(label: Arc<str>, token: CancellationToken, publisher: &Publisher) -> Self {
        let publisher = publisher.guarded(token.clone());
        Self {
            label,
            token,
            publisher,
        }
    }

    /// Label the unit was submitted under.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Cancellation token of this run.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// True once the unit has been cancelled (explicitly, by timeout or by shutdown).
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Publisher guarded by this run's token.
    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// Publishes `value` to `slot` and waits until it is applied.
    ///
    /// Fails with [`UnitError::Canceled`] when the update was discarded (this
    /// run was cancelled) or the presentation loop is gone (shutdown).
    pub async fn publish(&self, slot: Slot, value: impl Into<Value>) -> Result<(), UnitError> {
        match self.publisher.publish(slot, value).await {
            Ok(true) => Ok(()),
            Ok(false) | Err(_) => Err(UnitError::Canceled),
        }
    }

    /// Sleeps for `delay`, returning early with [`UnitError::Canceled`] on cancellation.
    pub async fn sleep(&self, delay: Duration) -> Result<(), UnitError> {
        tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = self.token.cancelled() => Err(UnitError::Canceled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Bus;

    #[tokio::test(start_paused = true)]
    async fn sleep_stops_on_cancel() {
        let publisher = Publisher::spawn(Bus::new(16), CancellationToken::new());
        let token = CancellationToken::new();
        let ctx = UnitContext::new(Arc::from("sleeper"), token.clone(), &publisher);

        let sleeper = tokio::spawn({
            let ctx = ctx.clone();
            async move { ctx.sleep(Duration::from_secs(3600)).await }
        });
        token.cancel();

        assert_eq!(sleeper.await.expect("join"), Err(UnitError::Canceled));
        assert_eq!(ctx.label(), "sleeper");
    }

    #[tokio::test]
    async fn publish_after_cancel_is_rejected() {
        let publisher = Publisher::spawn(Bus::new(16), CancellationToken::new());
        let token = CancellationToken::new();
        let ctx = UnitContext::new(Arc::from("writer"), token.clone(), &publisher);

        ctx.publish(Slot::Status, "live").await.expect("publish");
        token.cancel();

        assert_eq!(ctx.publish(Slot::Status, "stale").await, Err(UnitError::Canceled));
        assert_eq!(publisher.read(Slot::Status), Value::from("live"));
    }
}
