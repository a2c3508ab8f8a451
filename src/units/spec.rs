//! # Unit specification.
//!
//! Defines [`UnitSpec`]: a bundle describing **what** to run (a unit, or a
//! callback trigger for bridged work), **where** (its [`Discipline`]), and what
//! to do with the outcome (optional target slot, failure text, timeout).
//!
//! A spec is created with one constructor per discipline:
//! - [`UnitSpec::serial`], [`UnitSpec::concurrent`], [`UnitSpec::isolated`] take a [`UnitRef`]
//! - [`UnitSpec::bridged`] takes a trigger that receives a one-shot [`Resolver`]
//!
//! The spec is then passed to [`Runner::submit`](crate::Runner::submit).

use std::sync::Arc;
use std::time::Duration;

use crate::bridge::Resolver;
use crate::core::Config;
use crate::error::UnitError;
use crate::state::{Slot, Value};

use super::{Discipline, UnitRef};

/// Callback-style trigger of a bridged unit.
///
/// Receives the resolver of a fresh bridge; the unit completes when any clone
/// of the resolver fires.
pub type Trigger = Arc<dyn Fn(Resolver<Value>) + Send + Sync>;

#[derive(Clone)]
pub(crate) enum Body {
    Unit(UnitRef),
    Bridge(Trigger),
}

/// Specification for running one unit on a lane.
///
/// ## Example
/// ```rust
/// use tasklane::{Discipline, Slot, UnitContext, UnitError, UnitFn, UnitSpec, Value};
///
/// let load = UnitFn::arc("load", |_ctx: UnitContext| async move {
///     Err::<Value, _>(UnitError::LoadFailure)
/// });
///
/// let spec = UnitSpec::concurrent(load)
///     .with_publish(Slot::Status)
///     .with_failure_text("Failed to load data.");
///
/// assert_eq!(spec.discipline(), Discipline::Concurrent);
/// assert_eq!(spec.label(), "load");
/// assert_eq!(
///     spec.failure_value(&UnitError::LoadFailure),
///     Value::from("Failed to load data."),
/// );
/// ```
#[derive(Clone)]
pub struct UnitSpec {
    label: Arc<str>,
    discipline: Discipline,
    body: Body,
    timeout: Option<Duration>,
    publish_to: Option<Slot>,
    failure_text: Option<Arc<str>>,
}

impl UnitSpec {
    /// Runs `unit` on the serial lane.
    pub fn serial(unit: UnitRef) -> Self {
        Self::for_unit(unit, Discipline::Serial)
    }

    /// Runs `unit` on the concurrent lane.
    pub fn concurrent(unit: UnitRef) -> Self {
        Self::for_unit(unit, Discipline::Concurrent)
    }

    /// Runs `unit` inside the isolated counter's mailbox.
    pub fn isolated(unit: UnitRef) -> Self {
        Self::for_unit(unit, Discipline::Isolated)
    }

    /// Bridges a callback-style completion into a unit.
    ///
    /// `trigger` is called once per run with a fresh resolver; the unit's
    /// value is whatever the callback resolves with.
    pub fn bridged<F>(label: impl Into<Arc<str>>, trigger: F) -> Self
    where
        F: Fn(Resolver<Value>) + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            discipline: Discipline::Bridged,
            body: Body::Bridge(Arc::new(trigger)),
            timeout: None,
            publish_to: None,
            failure_text: None,
        }
    }

    fn for_unit(unit: UnitRef, discipline: Discipline) -> Self {
        Self {
            label: Arc::from(unit.name()),
            discipline,
            body: Body::Unit(unit),
            timeout: None,
            publish_to: None,
            failure_text: None,
        }
    }

    /// Inherits the timeout from config when none is set.
    ///
    /// Uses `Config::default_timeout()` so that `0s` in config is treated as `None`.
    pub fn with_defaults(mut self, cfg: &Config) -> Self {
        if self.timeout.is_none() {
            self.timeout = cfg.default_timeout();
        }
        self
    }

    /// Returns a new spec with updated timeout (`None` = no timeout).
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Publishes the outcome to `slot`: the value on success, the failure text on error.
    pub fn with_publish(mut self, slot: Slot) -> Self {
        self.publish_to = Some(slot);
        self
    }

    /// Text published instead of the error message when the unit fails.
    pub fn with_failure_text(mut self, text: impl Into<Arc<str>>) -> Self {
        self.failure_text = Some(text.into());
        self
    }

    /// Label of the unit.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn label_arc(&self) -> Arc<str> {
        Arc::clone(&self.label)
    }

    /// Lane the unit runs on.
    pub fn discipline(&self) -> Discipline {
        self.discipline
    }

    /// Per-run timeout, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Slot the outcome is published to, if any.
    pub fn publish_to(&self) -> Option<Slot> {
        self.publish_to
    }

    /// Value published for a failed run.
    pub fn failure_value(&self, err: &UnitError) -> Value {
        match &self.failure_text {
            Some(text) => Value::Text(Arc::clone(text)),
            None => Value::from(err.to_string()),
        }
    }

    pub(crate) fn body(&self) -> &Body {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{UnitContext, UnitFn};

    fn noop() -> UnitRef {
        UnitFn::arc("noop", |_ctx: UnitContext| async move { Ok::<_, UnitError>(Value::Int(0)) })
    }

    #[test]
    fn defaults_fill_only_missing_timeout() {
        let cfg = Config {
            timeout: Duration::from_secs(3),
            ..Config::default()
        };

        let inherited = UnitSpec::serial(noop()).with_defaults(&cfg);
        assert_eq!(inherited.timeout(), Some(Duration::from_secs(3)));

        let explicit = UnitSpec::serial(noop())
            .with_timeout(Some(Duration::from_secs(1)))
            .with_defaults(&cfg);
        assert_eq!(explicit.timeout(), Some(Duration::from_secs(1)));

        let none = UnitSpec::serial(noop()).with_defaults(&Config::default());
        assert_eq!(none.timeout(), None);
    }

    #[test]
    fn failure_value_falls_back_to_error_message() {
        let spec = UnitSpec::isolated(noop());
        assert_eq!(
            spec.failure_value(&UnitError::LoadFailure),
            Value::from("failed to load data")
        );
    }

    #[test]
    fn bridged_spec_keeps_label() {
        let spec = UnitSpec::bridged("fetch", |r: Resolver<Value>| {
            r.resolve(Value::from("done"));
        });
        assert_eq!(spec.label(), "fetch");
        assert_eq!(spec.discipline(), Discipline::Bridged);
        assert!(matches!(spec.body(), Body::Bridge(_)));
    }
}
