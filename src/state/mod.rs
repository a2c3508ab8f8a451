//! # Published state.
//!
//! Holds the latest observable values and applies every update from a single
//! presentation loop, whatever lane produced it.
//!
//! ```text
//! serial lane ─────┐
//! concurrent lane ─┼── Publisher::publish / post ──► [mpsc] ──► presentation loop
//! counter actor ───┤                                               │
//! bridged unit ────┘                                               ├─► watch cell per slot ──► read / subscribe
//!                                                                  └─► Bus: StatePublished / StateDiscarded
//! ```
//!
//! - [`Slot`] fixed set of named slots
//! - [`Value`] text or integer payload
//! - [`Publisher`] cloneable handle (write via the loop, read lock-free of the loop)

mod publisher;
mod slot;
mod value;

pub use publisher::{Published, Publisher};
pub use slot::{Slot, UnknownSlot};
pub use value::Value;
