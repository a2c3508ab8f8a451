//! Simulated completion-handler API.

use std::time::Duration;

/// Payload delivered by [`fetch_data`].
pub const LEGACY_PAYLOAD: &str = "Data fetched from legacy API";

/// Calls `completion` once, `delay` from now, from a background task.
///
/// Must be called inside a tokio runtime.
pub fn fetch_data<F>(delay: Duration, completion: F)
where
    F: FnOnce(String) + Send + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        completion(LEGACY_PAYLOAD.to_string());
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::bridged;

    #[tokio::test(start_paused = true)]
    async fn bridges_into_a_future() {
        let started = tokio::time::Instant::now();
        let data = bridged(|resolver| {
            fetch_data(Duration::from_secs(5), move |data| {
                resolver.resolve(data);
            })
        })
        .await;

        assert_eq!(data.as_deref(), Ok(LEGACY_PAYLOAD));
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
