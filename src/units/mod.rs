//! # Units of work and their specifications.
//!
//! This module provides the unit-related types:
//! - [`Unit`] - trait for implementing async cancelable units producing a [`Value`](crate::Value)
//! - [`UnitFn`] - function-backed unit implementation
//! - [`UnitRef`] - shared reference to a unit (`Arc<dyn Unit>`)
//! - [`UnitContext`] - per-run token and guarded publisher
//! - [`UnitSpec`] - unit bundled with its [`Discipline`] and outcome handling

mod discipline;
mod spec;
mod unit;
mod unit_fn;

pub use discipline::Discipline;
pub(crate) use spec::Body;
pub use spec::{Trigger, UnitSpec};
pub use unit::{Unit, UnitContext, UnitRef};
pub use unit_fn::UnitFn;
