//! # Callback-to-future bridging.
//!
//! Adapts a completion-handler API (something that calls you back once, later,
//! from wherever it likes) into a value you can `.await`.
//!
//! ```text
//! bridge::<T>() ──► (Resolver<T>, Bridged<T>)
//!                       │             │
//!   legacy_api(move |v| resolver.resolve(v))      bridged.await ──► Ok(v)
//!                       │                                       ├─► Err(Dropped)  every resolver dropped
//!                       └── fires at most once                  └─► Err(TimedOut) with_timeout elapsed
//! ```
//!
//! ## Rules
//! - A bridge resolves **exactly once**; later `resolve` calls return `false`.
//! - Each call to [`bridge`] / [`bridged`] is independent; there is no shared
//!   or cached result between invocations.

mod resolver;

pub use resolver::{Bridged, Resolver, bridge, bridged};
