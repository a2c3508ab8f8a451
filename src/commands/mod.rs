//! # Commands: the collaborator-facing facade.
//!
//! [`Commands`] turns the demo actions into units on the right lane and reads
//! the published slots back. Each command returns as soon as its units are
//! queued; await the returned handles when you need the outcome.
//!
//! | command              | lane                | publishes                                        |
//! |----------------------|---------------------|--------------------------------------------------|
//! | `run_serial`         | serial              | `status`: Serial Task 1/2 started, finished      |
//! | `run_concurrent`     | concurrent (x2)     | `status`: Concurrent Task 1/2 started, finished  |
//! | `fetch`              | bridged             | `incomingData`: legacy API payload               |
//! | `increment_counter`  | isolated            | `counterValue`: new value                        |
//! | `load_data`          | concurrent          | `status`: success or failure text                |
//! | `refresh_status`     | concurrent          | `status`: "Data loaded successfully!"            |
//! | `load_background`    | concurrent          | `background`: background payload                 |
//! | `load_count`         | concurrent          | nothing; the handle yields 42                    |
//!
//! ## Example
//! ```rust
//! use tasklane::{Commands, Config, Runner, Timings, Value};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = Runner::new(Config::default());
//!     let commands = Commands::with_timings(runner.clone(), Timings::instant());
//!
//!     for h in commands.run_serial().await? {
//!         h.await?;
//!     }
//!     assert_eq!(commands.status(), Value::from("Serial Task 2 finished"));
//!
//!     assert_eq!(commands.increment_counter().await?, 1);
//!     runner.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod legacy;
mod timings;

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::core::{Runner, UnitHandle};
use crate::error::{SubmitError, UnitError};
use crate::state::{Slot, Value};
use crate::units::{UnitContext, UnitFn, UnitRef, UnitSpec};

pub use legacy::{LEGACY_PAYLOAD, fetch_data};
pub use timings::Timings;

/// Published when the data load succeeds.
pub const LOAD_SUCCESS: &str = "Successfully loaded data!";
/// Published when the data load fails.
pub const LOAD_FAILURE: &str = "Failed to load data.";
/// Published by the status refresh.
pub const REFRESH_DONE: &str = "Data loaded successfully!";
/// Published by the background load.
pub const BACKGROUND_PAYLOAD: &str = "Data fetched from background task";
/// Returned by the count load.
pub const COUNT: i64 = 42;

/// Demo actions on top of a [`Runner`].
#[derive(Clone)]
pub struct Commands {
    runner: Arc<Runner>,
    timings: Timings,
}

impl Commands {
    /// Commands with the default (demo) timings.
    pub fn new(runner: Arc<Runner>) -> Self {
        Self::with_timings(runner, Timings::default())
    }

    /// Commands with custom timings.
    pub fn with_timings(runner: Arc<Runner>, timings: Timings) -> Self {
        Self { runner, timings }
    }

    /// Runner the commands submit to.
    pub fn runner(&self) -> &Arc<Runner> {
        &self.runner
    }

    /// Timings in use.
    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    /// Two serial steps; `status` goes through the four step messages in order.
    pub async fn run_serial(&self) -> Result<Vec<UnitHandle>, SubmitError> {
        let t = &self.timings;
        let mut handles = Vec::with_capacity(2);
        for (n, delay) in [(1, t.serial_first), (2, t.serial_second)] {
            let spec = UnitSpec::serial(step("Serial", n, delay)).with_publish(Slot::Status);
            handles.push(self.runner.submit(spec).await?);
        }
        Ok(handles)
    }

    /// Two concurrent steps; their `status` messages interleave freely.
    pub async fn run_concurrent(&self) -> Result<Vec<UnitHandle>, SubmitError> {
        let t = &self.timings;
        let mut handles = Vec::with_capacity(2);
        for (n, delay) in [(1, t.concurrent_first), (2, t.concurrent_second)] {
            let spec =
                UnitSpec::concurrent(step("Concurrent", n, delay)).with_publish(Slot::Status);
            handles.push(self.runner.submit(spec).await?);
        }
        Ok(handles)
    }

    /// Calls the legacy callback API through a bridge and publishes its payload
    /// to `incomingData`.
    pub async fn fetch(&self) -> Result<UnitHandle, SubmitError> {
        let delay = self.timings.legacy_fetch;
        let spec = UnitSpec::bridged("fetch-legacy", move |resolver| {
            fetch_data(delay, move |data| {
                resolver.resolve(Value::from(data));
            });
        })
        .with_publish(Slot::IncomingData);
        self.runner.submit(spec).await
    }

    /// Increments the isolated counter and returns the new value.
    ///
    /// Returns once `counterValue` shows the new value (or a later one).
    pub async fn increment_counter(&self) -> Result<i64, SubmitError> {
        let value = self.runner.counter().increment_and_read().await?;
        // the mirror was posted before the actor replied
        self.runner.publisher().flush().await?;
        Ok(value)
    }

    /// Simulated data load that fails with probability `Timings::failure_rate`.
    pub async fn load_data(&self) -> Result<UnitHandle, SubmitError> {
        let delay = self.timings.load_data;
        let rate = self.timings.failure_probability();
        let unit = UnitFn::arc("load-data", move |ctx: UnitContext| async move {
            ctx.sleep(delay).await?;
            if rand::rng().random_bool(rate) {
                return Err(UnitError::LoadFailure);
            }
            Ok::<_, UnitError>(Value::from(LOAD_SUCCESS))
        });
        let spec = UnitSpec::concurrent(unit)
            .with_publish(Slot::Status)
            .with_failure_text(LOAD_FAILURE);
        self.runner.submit(spec).await
    }

    /// Slow status refresh.
    pub async fn refresh_status(&self) -> Result<UnitHandle, SubmitError> {
        let spec = UnitSpec::concurrent(delayed(
            "refresh-status",
            self.timings.refresh_status,
            Value::from(REFRESH_DONE),
        ))
        .with_publish(Slot::Status)
        .with_failure_text(LOAD_FAILURE);
        self.runner.submit(spec).await
    }

    /// Background load published to `background`.
    pub async fn load_background(&self) -> Result<UnitHandle, SubmitError> {
        let spec = UnitSpec::concurrent(delayed(
            "load-background",
            self.timings.background,
            Value::from(BACKGROUND_PAYLOAD),
        ))
        .with_publish(Slot::Background);
        self.runner.submit(spec).await
    }

    /// Count load; the handle resolves to [`COUNT`], nothing is published.
    pub async fn load_count(&self) -> Result<UnitHandle, SubmitError> {
        let spec = UnitSpec::concurrent(delayed(
            "load-count",
            self.timings.load_count,
            Value::Int(COUNT),
        ));
        self.runner.submit(spec).await
    }

    /// Current `status`.
    pub fn status(&self) -> Value {
        self.runner.read(Slot::Status)
    }

    /// Current `incomingData`.
    pub fn incoming_data(&self) -> Value {
        self.runner.read(Slot::IncomingData)
    }

    /// Current `counterValue`.
    pub fn counter_value(&self) -> i64 {
        self.runner
            .read(Slot::CounterValue)
            .as_int()
            .unwrap_or_default()
    }

    /// Current `background`.
    pub fn background(&self) -> Value {
        self.runner.read(Slot::Background)
    }
}

/// "`kind` Task `n`": publishes "started", waits `delay`, finishes with "finished".
fn step(kind: &'static str, n: u8, delay: Duration) -> UnitRef {
    UnitFn::arc(
        format!("{}-task-{n}", kind.to_lowercase()),
        move |ctx: UnitContext| async move {
            ctx.publish(Slot::Status, format!("{kind} Task {n} started"))
                .await?;
            ctx.sleep(delay).await?;
            Ok::<_, UnitError>(Value::from(format!("{kind} Task {n} finished")))
        },
    )
}

/// Waits `delay`, then yields `value`.
fn delayed(name: &'static str, delay: Duration, value: Value) -> UnitRef {
    UnitFn::arc(name, move |ctx: UnitContext| {
        let value = value.clone();
        async move {
            ctx.sleep(delay).await?;
            Ok::<_, UnitError>(value)
        }
    })
}
