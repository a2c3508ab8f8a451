//! # Isolated counter.
//!
//! A single integer owned by one actor task. Every operation is a message on
//! the actor's bounded mailbox, so at most one of them is in flight at any
//! instant and increments are never lost.
//!
//! ```text
//! increment() ──┐
//! read()       ─┼──► [mailbox] ──► CounterActor { value }
//! isolated unit ┘                    ├─► reply (oneshot)
//!                                    ├─► Publisher::post(counterValue)  (mirror)
//!                                    └─► Bus: CounterChanged
//! ```
//!
//! Isolated units submitted to the runner execute inside the same mailbox,
//! interleaved with counter operations in arrival order.

mod counter;

pub use counter::IsolatedCounter;
pub(crate) use counter::RunPermit;
