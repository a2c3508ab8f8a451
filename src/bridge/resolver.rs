use std::fmt;
use std::future::IntoFuture;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::oneshot;

use crate::error::BridgeError;

/// Sending half of a bridge; hand it (or clones of it) to the callback.
pub struct Resolver<T> {
    slot: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl<T> Resolver<T> {
    /// Resolves the bridge with `value`.
    ///
    /// Returns `true` if this call delivered the value; `false` if the bridge
    /// was already resolved or its awaiting side is gone.
    pub fn resolve(&self, value: T) -> bool {
        let sender = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }

    /// True once any clone has resolved.
    pub fn is_resolved(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

/// Awaiting half of a bridge.
///
/// Await it directly (`bridged.await`) or via [`Bridged::wait`].
#[must_use = "a bridge does nothing unless awaited"]
pub struct Bridged<T> {
    rx: oneshot::Receiver<T>,
    timeout: Option<Duration>,
}

impl<T> Bridged<T> {
    /// Fails with [`BridgeError::TimedOut`] if the callback does not fire within `timeout`.
    ///
    /// `None` or a zero duration means wait forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|d| *d > Duration::ZERO);
        self
    }

    /// Waits for the callback.
    pub async fn wait(self) -> Result<T, BridgeError> {
        match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, self.rx).await {
                Ok(res) => res.map_err(|_| BridgeError::Dropped),
                Err(_elapsed) => Err(BridgeError::TimedOut { timeout }),
            },
            None => self.rx.await.map_err(|_| BridgeError::Dropped),
        }
    }
}

impl<T: Send + 'static> IntoFuture for Bridged<T> {
    type Output = Result<T, BridgeError>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}

/// Creates a fresh single-resolution bridge.
pub fn bridge<T>() -> (Resolver<T>, Bridged<T>) {
    let (tx, rx) = oneshot::channel();
    (
        Resolver {
            slot: Arc::new(Mutex::new(Some(tx))),
        },
        Bridged { rx, timeout: None },
    )
}

/// Calls `trigger` with a fresh resolver and waits for it to fire.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tasklane::bridge::bridged;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let answer = bridged(|resolver| {
///     tokio::spawn(async move {
///         tokio::time::sleep(Duration::from_millis(10)).await;
///         resolver.resolve(42);
///     });
/// })
/// .await;
///
/// assert_eq!(answer, Ok(42));
/// # }
/// ```
pub async fn bridged<T, F>(trigger: F) -> Result<T, BridgeError>
where
    T: Send + 'static,
    F: FnOnce(Resolver<T>),
{
    let (resolver, bridged) = bridge();
    trigger(resolver);
    bridged.await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_exactly_once() {
        let (resolver, bridged) = bridge::<&'static str>();
        let second = resolver.clone();

        assert!(resolver.resolve("first"));
        assert!(!second.resolve("second"));
        assert!(second.is_resolved());

        assert_eq!(bridged.await, Ok("first"));
    }

    #[tokio::test]
    async fn dropped_resolver_fails_the_wait() {
        let result = bridged::<u8, _>(|resolver| drop(resolver)).await;
        assert_eq!(result, Err(BridgeError::Dropped));
    }

    #[tokio::test(start_paused = true)]
    async fn never_firing_callback_times_out() {
        let (resolver, bridged) = bridge::<u8>();
        let result = bridged
            .with_timeout(Some(Duration::from_secs(5)))
            .wait()
            .await;

        assert_eq!(
            result,
            Err(BridgeError::TimedOut {
                timeout: Duration::from_secs(5)
            })
        );
        assert!(!resolver.resolve(1));
    }

    #[tokio::test(start_paused = true)]
    async fn two_invocations_resolve_independently() {
        let call = |n: u32| {
            bridged(move |resolver| {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(u64::from(n) * 10)).await;
                    resolver.resolve(n);
                });
            })
        };

        let (a, b) = tokio::join!(call(1), call(2));
        assert_eq!(a, Ok(1));
        assert_eq!(b, Ok(2));
    }

    #[tokio::test]
    async fn resolving_from_a_plain_thread_works() {
        let result = bridged(|resolver| {
            std::thread::spawn(move || {
                resolver.resolve(String::from("from thread"));
            });
        })
        .await;
        assert_eq!(result.as_deref(), Ok("from thread"));
    }
}
