//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the runner, its lanes,
//! the presentation loop, the isolated counter and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Runner` (submit/shutdown), `core::execute` (unit lifecycle),
//!   `Publisher` loop (state changes), `IsolatedCounter` actor,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the runner's listener (fans out to `SubscriberSet`) and
//!   any receiver obtained from [`Runner::events`](crate::Runner::events).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
