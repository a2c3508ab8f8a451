//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the runner.
//!
//! Config is used in two ways:
//! 1. **Runner creation**: `RunnerBuilder::new(config)`
//! 2. **UnitSpec defaults**: `UnitSpec::with_defaults(&config)` (done by `Runner::submit`)
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → unlimited (no global semaphore created)
//! - `timeout = 0s` → no timeout (treated as `None` by `UnitSpec::with_defaults`)
//! - `bridge_timeout = 0s` → bridged units wait for their callback forever

use std::time::Duration;

/// Global configuration for the runner.
///
/// ## Field semantics
/// - `grace`: Maximum wait for in-flight units during shutdown (`0s` = don't wait)
/// - `max_concurrent`: Concurrent/bridged lane limit (`0` = unlimited)
/// - `bus_capacity`: Event bus ring buffer size (min 1)
/// - `serial_capacity`: Serial lane queue length (min 1)
/// - `mailbox_capacity`: Isolated counter mailbox length (min 1)
/// - `timeout`: Default per-unit timeout (`0s` = no timeout)
/// - `bridge_timeout`: How long a bridged unit waits for its callback (`0s` = forever)
///
/// ## Notes
/// All fields are public for flexibility. Prefer using helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for in-flight units when shutting down.
    ///
    /// When [`Runner::shutdown`](crate::Runner::shutdown) is called:
    /// - lanes stop accepting work
    /// - runner waits up to `grace` for queued and running units
    /// - whatever is left is cancelled and `RuntimeError::GraceExceeded` is returned
    pub grace: Duration,

    /// Maximum number of concurrent (and bridged) units running at once.
    ///
    /// - `0` = unlimited (no semaphore)
    /// - `n > 0` = at most `n` units run simultaneously
    pub max_concurrent: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` messages will
    /// receive `Lagged` and skip older items.
    pub bus_capacity: usize,

    /// Capacity of the serial lane queue.
    ///
    /// `Runner::try_submit` returns `SubmitError::Full` when it is exhausted;
    /// `Runner::submit` waits for room instead.
    pub serial_capacity: usize,

    /// Capacity of the isolated counter mailbox.
    pub mailbox_capacity: usize,

    /// Default unit timeout.
    ///
    /// - `Duration::ZERO` = no timeout
    /// - `> 0` = applied to every unit without an explicit timeout
    pub timeout: Duration,

    /// Maximum wait for a bridged callback to fire.
    ///
    /// - `Duration::ZERO` = wait forever
    pub bridge_timeout: Duration,
}

impl Config {
    /// Returns the global concurrency limit as an `Option`.
    ///
    /// - `None` → unlimited (no semaphore)
    /// - `Some(n)` → at most `n` concurrent units
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }

    /// Returns the default per-unit timeout as an `Option`.
    #[inline]
    pub fn default_timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Returns the bridge timeout as an `Option`.
    #[inline]
    pub fn bridge_timeout(&self) -> Option<Duration> {
        if self.bridge_timeout == Duration::ZERO {
            None
        } else {
            Some(self.bridge_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the serial queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn serial_capacity_clamped(&self) -> usize {
        self.serial_capacity.max(1)
    }

    /// Returns the counter mailbox capacity clamped to a minimum of 1.
    #[inline]
    pub fn mailbox_capacity_clamped(&self) -> usize {
        self.mailbox_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 60s`
    /// - `max_concurrent = 0` (unlimited)
    /// - `bus_capacity = 1024`
    /// - `serial_capacity = 256`, `mailbox_capacity = 256`
    /// - `timeout = 0s`, `bridge_timeout = 0s` (none)
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(60),
            max_concurrent: 0,
            bus_capacity: 1024,
            serial_capacity: 256,
            mailbox_capacity: 256,
            timeout: Duration::from_secs(0),
            bridge_timeout: Duration::from_secs(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sentinels_mean_none() {
        let cfg = Config::default();
        assert_eq!(cfg.concurrency_limit(), None);
        assert_eq!(cfg.default_timeout(), None);
        assert_eq!(cfg.bridge_timeout(), None);
    }

    #[test]
    fn capacities_are_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            serial_capacity: 0,
            mailbox_capacity: 0,
            max_concurrent: 3,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.serial_capacity_clamped(), 1);
        assert_eq!(cfg.mailbox_capacity_clamped(), 1);
        assert_eq!(cfg.concurrency_limit(), Some(3));
    }
}
