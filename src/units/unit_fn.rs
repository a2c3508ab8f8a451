//! # Function-backed unit (`UnitFn`)
//!
//! [`UnitFn`] wraps a closure `F: Fn(UnitContext) -> Fut`, producing a fresh
//! future per run. No state is shared between runs; if a unit needs shared
//! state, capture an `Arc<...>` explicitly inside the closure.
//!
//! ## Example
//! ```rust
//! use tasklane::{Unit, UnitContext, UnitFn, UnitRef, UnitError, Value};
//!
//! let u: UnitRef = UnitFn::arc("answer", |_ctx: UnitContext| async move {
//!     Ok::<_, UnitError>(Value::Int(42))
//! });
//!
//! assert_eq!(u.name(), "answer");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::UnitError;
use crate::state::Value;
use crate::units::unit::{Unit, UnitContext};

/// Function-backed unit implementation.
#[derive(Debug)]
pub struct UnitFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> UnitFn<F> {
    /// Creates a new function-backed unit.
    ///
    /// Prefer [`UnitFn::arc`] when you immediately need a [`UnitRef`](crate::UnitRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the unit and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Unit for UnitFn<F>
where
    F: Fn(UnitContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, UnitError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: UnitContext) -> Result<Value, UnitError> {
        (self.f)(ctx).await
    }
}
