//! # Built-in subscribers
//!
//! - [`LogWriter`]: renders events via `tracing` (demo/debug).

mod log;

pub use log::LogWriter;
