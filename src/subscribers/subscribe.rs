//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging custom event handlers into the
//! runner. Each subscriber is driven by a dedicated worker loop fed by a bounded
//! queue owned by the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching); they do **not** block the
//!   lanes, the presentation loop, nor other subscribers.
//! - Each subscriber **declares** its preferred queue capacity via
//!   [`Subscribe::queue_capacity`]. If a queue overflows, events for that
//!   subscriber are **dropped** and a `SubscriberOverflow` event is published.
//!
//! ## Example
//! ```rust
//! use std::sync::Mutex;
//! use async_trait::async_trait;
//! use tasklane::{Event, EventKind, Subscribe, Value};
//!
//! /// Records every value applied to a slot.
//! #[derive(Default)]
//! struct Recorder(Mutex<Vec<Value>>);
//!
//! #[async_trait]
//! impl Subscribe for Recorder {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::StatePublished {
//!             if let Some(v) = &ev.value {
//!                 self.0.lock().unwrap().push(v.clone());
//!             }
//!         }
//!     }
//!     fn name(&self) -> &'static str { "recorder" }
//!     fn queue_capacity(&self) -> usize { 4096 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should avoid
/// blocking the async runtime (prefer async I/O and cooperative waits).
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
