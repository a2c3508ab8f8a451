//! Runtime core: scheduling and lifecycle.
//!
//! The public API from this module is [`Runner`] (with [`RunnerBuilder`]),
//! [`Config`] and [`UnitHandle`].
//!
//! Internal modules:
//! - [`execute`]: runs one unit with timeout/cancellation, outcome publishing and events;
//! - [`lanes`]: serial worker and concurrent spawning;
//! - [`runner`]: dispatches units to lanes, handles shutdown;
//! - [`alive`]: tracks in-flight units.

mod alive;
mod builder;
mod config;
mod execute;
mod handle;
mod lanes;
mod runner;

pub use builder::RunnerBuilder;
pub use config::Config;
pub use handle::UnitHandle;
pub use runner::Runner;
