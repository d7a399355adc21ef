//! Core types for reducest
//!
//! A reducer-driven state container for interactive hosts, with a middleware
//! pipeline in front of the reducer.
//!
//! # Core Concepts
//!
//! - **Action**: Transient message describing an intended state change
//! - **Reducer**: Pure `(state, action) -> state` transition
//! - **StateCell**: Authoritative state, mirrored into a render-visible snapshot
//! - **Middleware**: Wraps the next link; may forward, transform, stop, or
//!   re-dispatch from the top through its [`StoreView`]
//! - **Reducest**: Per-instance store returning `(state, dispatch)` on each render
//!
//! # Basic Example
//!
//! ```
//! use reducest_core::middleware::from_fn;
//! use reducest_core::{MiddlewareRef, Reducer, Reducest};
//!
//! let reducer = Reducer::new(|state: &Vec<&'static str>, action: &&'static str| {
//!     let mut next = state.clone();
//!     next.push(*action);
//!     next
//! });
//! let blocker: MiddlewareRef<Vec<&'static str>, &'static str> =
//!     from_fn("blocker", |_store, next, action| {
//!         if action == "drop" {
//!             return Ok(None);
//!         }
//!         next.call(action)
//!     });
//!
//! let mut store = Reducest::new(Vec::new());
//! let middlewares = vec![blocker];
//! let (_, dispatch) = store.render(&reducer, &middlewares);
//!
//! dispatch.call("x").unwrap();
//! dispatch.call("drop").unwrap();
//! dispatch.call("y").unwrap();
//!
//! let (state, _) = store.render(&reducer, &middlewares);
//! assert_eq!(state, vec!["x", "y"]);
//! ```
//!
//! # Deferred work
//!
//! Everything here is single-threaded (`Rc`, `RefCell`). A middleware that
//! schedules work for later (for instance with `tokio::task::spawn_local`)
//! can keep its [`StoreView`] and dispatch when the work completes; such
//! late dispatches apply in the order they reach the reducer.

pub mod action;
pub mod cell;
pub mod compose;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod middleware;
pub mod store;
pub mod testing;

pub use action::Action;
pub use cell::{RenderSignal, Snapshot, StateCell};
pub use compose::{compose, DispatchCache};
pub use config::TraceConfig;
pub use dispatch::{Dispatch, Dispatched};
pub use error::DispatchError;
pub use middleware::{from_fn, FnMiddleware, Middleware, MiddlewareRef, StoreView};
pub use store::{Reducer, Reducest, ReducestBuilder};

pub use testing::{recording, Recorder, RenderCounter, TestHarness};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::Action;
    pub use crate::cell::RenderSignal;
    pub use crate::dispatch::{Dispatch, Dispatched};
    pub use crate::error::DispatchError;
    pub use crate::middleware::{from_fn, Middleware, MiddlewareRef, StoreView};
    pub use crate::store::{Reducer, Reducest, ReducestBuilder};
}
