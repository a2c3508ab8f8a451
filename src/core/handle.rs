use std::future::IntoFuture;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::UnitError;
use crate::state::Value;
use crate::units::Discipline;

/// Handle to a submitted unit.
///
/// Dropping the handle does **not** cancel the unit; fire-and-forget callers
/// can ignore it. Await [`UnitHandle::outcome`] (or the handle itself) to get
/// the unit's result.
#[derive(Debug)]
pub struct UnitHandle {
    id: u64,
    label: Arc<str>,
    discipline: Discipline,
    token: CancellationToken,
    outcome: oneshot::Receiver<Result<Value, UnitError>>,
}

impl UnitHandle {
    pub(crate) fn new(
        id: u64,
        label: Arc<str>,
        discipline: Discipline,
        token: CancellationToken,
        outcome: oneshot::Receiver<Result<Value, UnitError>>,
    ) -> Self {
        Self {
            id,
            label,
            discipline,
            token,
            outcome,
        }
    }

    /// Runner-unique id of the unit.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Label the unit was submitted under.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Lane the unit was submitted to.
    pub fn discipline(&self) -> Discipline {
        self.discipline
    }

    /// Cancels the unit.
    ///
    /// A queued unit never starts; a running unit is dropped at its next
    /// suspension point. Either way nothing it publishes afterwards is applied.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once the unit was cancelled (explicitly or by shutdown).
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token that cancels this unit; lets another task cancel it after the
    /// handle was consumed by [`UnitHandle::outcome`].
    pub fn cancel_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Waits for the unit's outcome.
    ///
    /// Fails with [`UnitError::Lost`] when the lane dropped the unit without
    /// running it (the runner was torn down).
    pub async fn outcome(self) -> Result<Value, UnitError> {
        self.outcome.await.unwrap_or(Err(UnitError::Lost))
    }
}

impl IntoFuture for UnitHandle {
    type Output = Result<Value, UnitError>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.outcome())
    }
}
