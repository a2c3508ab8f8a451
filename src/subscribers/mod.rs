//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! that fans runtime events from the [`Bus`](crate::events::Bus) out to them.
//!
//! ## Architecture
//! ```text
//! lanes / presentation loop / counter ── publish(Event) ──► Bus
//!                                                            │
//!                                              Runner listener (one per runner)
//!                                                            │
//!                                                  SubscriberSet::emit(&Event)
//!                                              ┌─────────────┼─────────────┐
//!                                              ▼             ▼             ▼
//!                                          LogWriter      Recorder      Custom
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod embedded;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
