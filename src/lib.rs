//! # tasklane
//!
//! **Tasklane** runs labeled units of work under one of four concurrency
//! disciplines and publishes their results to a small set of observable slots,
//! race-free, from a single presentation loop.
//!
//! - **Serial**: strict FIFO, one at a time; a unit's publish is applied before the next unit starts.
//! - **Concurrent**: no ordering; optional global cap.
//! - **Isolated**: serialized with every operation on the isolated counter actor.
//! - **Bridged**: a callback-style API adapted into an awaitable that resolves exactly once.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  UnitSpec    │   │  UnitSpec    │   │  UnitSpec    │   │  UnitSpec    │
//!     │  (serial)    │   │ (concurrent) │   │  (isolated)  │   │  (bridged)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼                  ▼
//! ┌──────────────────────────────────────────────────────────────────────────────┐
//! │  Runner                                                                      │
//! │  - serial queue + worker        - TaskTracker (+ Semaphore)                  │
//! │  - IsolatedCounter mailbox      - InFlight (running labels)                  │
//! └──────┬──────────────────┬──────────────────┬──────────────────┬──────────────┘
//!        ▼                  ▼                  ▼                  ▼
//!    execute()          execute()          execute()          execute(bridge)
//!        │ publish(slot, value)                                   │
//!        ▼                                                        ▼
//! ┌──────────────────────────────────────┐        ┌──────────────────────────────┐
//! │ Publisher ──► presentation loop      │        │ Bus (broadcast channel)      │
//! │   (single applier, watch per slot)   │──────► │ UnitStarting, StatePublished │
//! └──────────────────────────────────────┘ events │ CounterChanged, ...          │
//!        ▲ read(slot)                             └──────────────┬───────────────┘
//!        │                                                       ▼
//!    Commands / collaborators                         listener ──► SubscriberSet
//!                                                               ┌─────┼─────┐
//!                                                               ▼     ▼     ▼
//!                                                         LogWriter  sub2  subN
//! ```
//!
//! ### Lifecycle of a unit
//! ```text
//! submit(spec) ──► UnitSubmitted ──► lane
//!   ├─ cancelled before start  ─► UnitCanceled
//!   └─ UnitStarting ─► body (timeout, cancellable)
//!        ├─ Ok(v)          ─► publish v          ─► UnitFinished
//!        ├─ Err(e)         ─► publish failure    ─► UnitFailed (TimeoutHit first on timeout)
//!        └─ cancelled      ─► nothing published  ─► UnitCanceled
//! ```
//!
//! ## Features
//! | Area               | Description                                              | Key types                                  |
//! |--------------------|----------------------------------------------------------|--------------------------------------------|
//! | **Runtime**        | Submit units to lanes, cancel them, shut down gracefully. | [`Runner`], [`RunnerBuilder`], [`UnitHandle`] |
//! | **Units**          | Define units as functions or trait impls.                | [`Unit`], [`UnitFn`], [`UnitSpec`]         |
//! | **State**          | Observable slots applied by one presentation loop.       | [`Publisher`], [`Slot`], [`Value`]         |
//! | **Isolation**      | Actor-owned counter.                                     | [`IsolatedCounter`]                        |
//! | **Bridging**       | Callback-to-future adapter.                              | [`bridge()`], [`bridged`], [`Resolver`]    |
//! | **Subscriber API** | Hook into runtime events.                                | [`Subscribe`], [`Event`], [`EventKind`]    |
//! | **Errors**         | Typed errors for units, bridges, lanes and shutdown.     | [`UnitError`], [`RuntimeError`]            |
//! | **Commands**       | Ready-made demo actions.                                 | [`Commands`], [`Timings`]                  |
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`] subscriber.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tasklane::{Commands, Config, Runner, Slot, Timings, Value};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn tasklane::Subscribe>> = vec![Arc::new(tasklane::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn tasklane::Subscribe>> = Vec::new();
//!
//!     let runner = Runner::builder(Config::default())
//!         .with_subscribers(subs)
//!         .build();
//!     let commands = Commands::with_timings(runner.clone(), Timings::instant());
//!
//!     commands.fetch().await?.await?;
//!     assert_eq!(runner.read(Slot::IncomingData), Value::from("Data fetched from legacy API"));
//!
//!     runner.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod bridge;
mod commands;
mod core;
mod error;
mod events;
mod isolated;
mod state;
mod subscribers;
mod units;

// ---- Public re-exports ----

pub use bridge::{Bridged, Resolver, bridge, bridged};
pub use commands::{
    BACKGROUND_PAYLOAD, COUNT, Commands, LEGACY_PAYLOAD, LOAD_FAILURE, LOAD_SUCCESS,
    REFRESH_DONE, Timings, fetch_data,
};
pub use crate::core::{Config, Runner, RunnerBuilder, UnitHandle};
pub use error::{BridgeError, RuntimeError, SubmitError, UnitError};
pub use events::{Bus, Event, EventKind};
pub use isolated::IsolatedCounter;
pub use state::{Published, Publisher, Slot, UnknownSlot, Value};
pub use subscribers::{Subscribe, SubscriberSet};
pub use units::{Discipline, Trigger, Unit, UnitContext, UnitFn, UnitRef, UnitSpec};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
