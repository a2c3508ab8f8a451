//! # In-flight unit tracker.
//!
//! Remembers which units are executing right now, keyed by unit id (labels may
//! repeat). Used by [`Runner::running`](crate::Runner::running) and to name the
//! units left over when shutdown exceeds its grace period.
//!
//! ## Rules
//! - An entry exists exactly while its [`Alive`] guard lives; dropping the
//!   guard (normal return, panic or the future being dropped) removes it.
//! - [`InFlight::snapshot`] returns labels sorted, duplicates kept.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Thread-safe set of in-flight units.
#[derive(Clone, Default)]
pub(crate) struct InFlight {
    state: Arc<Mutex<HashMap<u64, Arc<str>>>>,
}

impl InFlight {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Marks unit `id` as running until the returned guard is dropped.
    pub(crate) fn enter(&self, id: u64, label: Arc<str>) -> Alive {
        self.lock().insert(id, label);
        Alive {
            id,
            state: Arc::clone(&self.state),
        }
    }

    /// Returns sorted labels of currently running units.
    pub(crate) fn snapshot(&self) -> Vec<String> {
        let mut alive: Vec<String> = self.lock().values().map(|l| l.to_string()).collect();
        alive.sort_unstable();
        alive
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Arc<str>>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registration of one running unit; removes itself on drop.
pub(crate) struct Alive {
    id: u64,
    state: Arc<Mutex<HashMap<u64, Arc<str>>>>,
}

impl Drop for Alive {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_removes_entry_on_drop() {
        let inflight = InFlight::new();
        let a = inflight.enter(1, Arc::from("b-unit"));
        let b = inflight.enter(2, Arc::from("a-unit"));
        let c = inflight.enter(3, Arc::from("a-unit"));

        assert_eq!(inflight.snapshot(), vec!["a-unit", "a-unit", "b-unit"]);

        drop(b);
        drop(a);
        assert_eq!(inflight.snapshot(), vec!["a-unit"]);

        drop(c);
        assert!(inflight.snapshot().is_empty());
    }
}
