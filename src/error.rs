//! Error types used by the tasklane runtime and by units of work.
//!
//! This module defines four enums:
//!
//! - [`UnitError`] - errors raised by a single unit execution.
//! - [`BridgeError`] - errors raised while awaiting a callback-bridged result.
//! - [`SubmitError`] - a lane refused or lost a submission.
//! - [`RuntimeError`] - errors raised by the runner itself (shutdown).
//!
//! All of them provide `as_label` for logs/metrics.

use std::any::Any;
use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the tasklane runtime.
///
/// These represent failures in the orchestration itself, such as a shutdown
/// sequence exceeding its grace period.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some units were still in flight.
    #[error("shutdown timeout {grace:?} exceeded; still running: {running:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Labels of the units that did not finish in time.
        running: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tasklane::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), running: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// # Errors produced while awaiting a bridged callback.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeError {
    /// Every resolver was dropped and the callback never fired.
    #[error("callback dropped without resolving")]
    Dropped,

    /// The callback did not fire within the configured bridge timeout.
    #[error("callback did not fire within {timeout:?}")]
    TimedOut {
        /// The timeout that elapsed.
        timeout: Duration,
    },
}

impl BridgeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BridgeError::Dropped => "bridge_dropped",
            BridgeError::TimedOut { .. } => "bridge_timed_out",
        }
    }
}

/// # Errors produced by unit execution.
///
/// [`UnitError::LoadFailure`] is the only failure a unit payload raises on its
/// own; everything else comes from the runtime around it (timeouts,
/// cancellation, a bridge that never fired).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    /// Simulated data load failed.
    #[error("failed to load data")]
    LoadFailure,

    /// Unit execution exceeded its timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Unit was cancelled before or while running.
    #[error("unit cancelled")]
    Canceled,

    /// Bridged callback failed to resolve.
    #[error("bridge failed: {0}")]
    Bridge(#[from] BridgeError),

    /// Unit body panicked; the panic was caught at the unit boundary.
    #[error("unit panicked: {info}")]
    Panicked {
        /// Panic message, if it was a string.
        info: String,
    },

    /// The lane dropped the unit without reporting an outcome (shutdown).
    #[error("unit outcome lost")]
    Lost,
}

impl UnitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tasklane::UnitError;
    /// use std::time::Duration;
    ///
    /// let err = UnitError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "unit_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            UnitError::LoadFailure => "unit_load_failure",
            UnitError::Timeout { .. } => "unit_timeout",
            UnitError::Canceled => "unit_canceled",
            UnitError::Bridge(e) => e.as_label(),
            UnitError::Panicked { .. } => "unit_panicked",
            UnitError::Lost => "unit_lost",
        }
    }

    /// True for failures raised by the unit payload itself.
    ///
    /// # Example
    /// ```
    /// use tasklane::UnitError;
    ///
    /// assert!(UnitError::LoadFailure.is_payload_failure());
    /// assert!(!UnitError::Canceled.is_payload_failure());
    /// ```
    pub fn is_payload_failure(&self) -> bool {
        matches!(self, UnitError::LoadFailure)
    }
}

/// Error returned when a lane cannot accept work.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// Lane queue is full (try again later or use the async submit).
    #[error("lane queue full")]
    Full,

    /// Lane is closed (runner shut down).
    #[error("lane closed")]
    Closed,
}

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_error_converts_into_unit_error() {
        let err: UnitError = BridgeError::Dropped.into();
        assert_eq!(err, UnitError::Bridge(BridgeError::Dropped));
        assert_eq!(err.as_label(), "bridge_dropped");
        assert!(!err.is_payload_failure());
    }

    #[test]
    fn load_failure_message_is_stable() {
        assert_eq!(UnitError::LoadFailure.to_string(), "failed to load data");
        assert_eq!(UnitError::LoadFailure.as_label(), "unit_load_failure");
    }
}
