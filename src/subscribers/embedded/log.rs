//! # LogWriter: renders events through `tracing`
//!
//! A minimal subscriber that logs incoming [`Event`]s. Use it for tests or demos;
//! install a `tracing` subscriber (e.g. `tracing-subscriber`) to see the output.
//!
//! ## Example output
//! ```text
//! INFO [submitted] unit="serial-1" discipline=serial
//! INFO [starting] unit="serial-1" discipline=serial
//! INFO [published] slot=status value=Serial Task 1 started version=1
//! INFO [finished] unit="serial-1" value=Serial Task 1 finished
//! WARN [failed] unit="load-data" reason="failed to load data"
//! WARN [timeout] unit="slow" timeout_ms=100
//! INFO [counter] value=3
//! INFO [shutdown-requested]
//! INFO [all-stopped-within-grace]
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let unit = e.unit.as_deref().unwrap_or("unknown");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::SubscriberPanicked => {
                warn!(subscriber = unit, info = reason, "[subscriber-panicked]");
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = unit, reason, "[subscriber-overflow]");
            }
            EventKind::ShutdownRequested => info!("[shutdown-requested]"),
            EventKind::AllStoppedWithin => info!("[all-stopped-within-grace]"),
            EventKind::GraceExceeded => warn!(running = reason, "[grace-exceeded]"),
            EventKind::UnitSubmitted => {
                debug!(unit, discipline = ?e.discipline, "[submitted]");
            }
            EventKind::UnitStarting => {
                info!(unit, discipline = ?e.discipline, "[starting]");
            }
            EventKind::UnitFinished => {
                info!(unit, value = ?e.value, "[finished]");
            }
            EventKind::UnitFailed => warn!(unit, reason, "[failed]"),
            EventKind::UnitCanceled => info!(unit, "[cancelled]"),
            EventKind::TimeoutHit => warn!(unit, timeout_ms = ?e.timeout_ms, "[timeout]"),
            EventKind::StatePublished => {
                info!(slot = ?e.slot, value = ?e.value, version = ?e.version, "[published]");
            }
            EventKind::StateDiscarded => {
                warn!(slot = ?e.slot, value = ?e.value, "[discarded]");
            }
            EventKind::CounterChanged => info!(value = ?e.value, "[counter]"),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
