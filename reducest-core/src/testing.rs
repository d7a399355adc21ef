//! Test utilities for reducest stores and middleware
//!
//! - [`Recorder`]: cloneable sink collecting what middleware observed
//! - [`recording`]: middleware that records each action and forwards it
//! - [`RenderCounter`]: a [`RenderSignal`] counting render requests
//! - [`TestHarness`]: a host stand-in that re-renders when signaled
//! - Assertion macros for recorded actions
//!
//! # Example
//!
//! ```
//! use reducest_core::testing::{recording, Recorder, TestHarness};
//! use reducest_core::Reducer;
//!
//! let recorder = Recorder::new();
//! let reducer = Reducer::new(|state: &i32, action: &i32| state + action);
//! let mut harness = TestHarness::new(0, reducer)
//!     .with_middlewares(vec![recording("logger", recorder.clone())]);
//!
//! harness.dispatch(5).unwrap();
//! harness.dispatch(3).unwrap();
//!
//! assert_eq!(harness.state(), 8);
//! assert_eq!(recorder.drain(), vec![("logger", 5), ("logger", 3)]);
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tokio::sync::mpsc;

use crate::action::Action;
use crate::cell::RenderSignal;
use crate::dispatch::{Dispatch, Dispatched};
use crate::middleware::{from_fn, MiddlewareRef};
use crate::store::{Reducer, Reducest, ReducestBuilder};

/// Cloneable, single-threaded sink for values observed during a test.
///
/// Clones share one channel, so a clone moved into a middleware feeds the
/// original held by the test.
pub struct Recorder<T> {
    tx: mpsc::UnboundedSender<T>,
    rx: Rc<RefCell<mpsc::UnboundedReceiver<T>>>,
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: Rc::clone(&self.rx),
        }
    }
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Recorder<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Rc::new(RefCell::new(rx)),
        }
    }

    pub fn record(&self, value: T) {
        let _ = self.tx.send(value);
    }

    /// Take everything recorded so far, oldest first.
    pub fn drain(&self) -> Vec<T> {
        let mut rx = self.rx.borrow_mut();
        let mut values = Vec::new();
        while let Ok(value) = rx.try_recv() {
            values.push(value);
        }
        values
    }
}

/// Middleware that records `(name, action)` and forwards the action.
pub fn recording<S, A>(name: &'static str, recorder: Recorder<(&'static str, A)>) -> MiddlewareRef<S, A>
where
    S: 'static,
    A: Action,
{
    from_fn(name, move |_store, next: &Dispatch<A>, action: A| {
        recorder.record((name, action.clone()));
        next.call(action)
    })
}

/// Render signal that counts how often a render was requested.
#[derive(Debug, Clone, Default)]
pub struct RenderCounter {
    count: Rc<Cell<usize>>,
}

impl RenderCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.get()
    }
}

impl RenderSignal for RenderCounter {
    fn request_render(&self) {
        self.count.set(self.count.get() + 1);
    }
}

/// Stand-in host component for tests.
///
/// Holds a [`Reducest`] plus the reducer and middleware list the "component"
/// currently renders with, and re-renders whenever the store signals.
pub struct TestHarness<S, A: Action> {
    store: Reducest<S, A>,
    reducer: Reducer<S, A>,
    middlewares: Vec<MiddlewareRef<S, A>>,
    renders: RenderCounter,
    rendered: usize,
    state: S,
    dispatch: Dispatch<A>,
}

impl<S: Clone + 'static, A: Action> TestHarness<S, A> {
    /// Harness seeded with `initial` and rendered once.
    pub fn new(initial: S, reducer: Reducer<S, A>) -> Self {
        let renders = RenderCounter::new();
        let mut store = ReducestBuilder::new(initial)
            .render_signal(renders.clone())
            .build();
        let (state, dispatch) = store.render(&reducer, &[]);
        Self {
            store,
            reducer,
            middlewares: Vec::new(),
            renders,
            rendered: 0,
            state,
            dispatch,
        }
    }

    /// Replace the middleware list and re-render.
    pub fn with_middlewares(mut self, middlewares: Vec<MiddlewareRef<S, A>>) -> Self {
        self.set_middlewares(middlewares);
        self
    }

    /// Dispatch through the current chain, then re-render if the store asked.
    pub fn dispatch(&mut self, action: A) -> Dispatched<A> {
        let result = self.dispatcher().call(action);
        if self.renders.count() != self.rendered {
            self.rendered = self.renders.count();
            self.rerender();
        }
        result
    }

    /// Run a render pass with the current reducer and middleware.
    pub fn rerender(&mut self) -> Dispatch<A> {
        let (state, dispatch) = self.store.render(&self.reducer, &self.middlewares);
        self.state = state;
        self.dispatch = dispatch.clone();
        dispatch
    }

    pub fn set_middlewares(&mut self, middlewares: Vec<MiddlewareRef<S, A>>) {
        self.middlewares = middlewares;
        self.rerender();
    }

    pub fn set_reducer(&mut self, reducer: Reducer<S, A>) {
        self.reducer = reducer;
        self.rerender();
    }

    /// State as of the last render
    pub fn state(&self) -> S {
        self.state.clone()
    }

    /// Dispatch handle from the last render
    pub fn dispatcher(&self) -> Dispatch<A> {
        self.dispatch.clone()
    }

    /// Number of render requests the store made
    pub fn render_count(&self) -> usize {
        self.renders.count()
    }

    pub fn store(&self) -> &Reducest<S, A> {
        &self.store
    }
}

/// Assert that an action matching a pattern was recorded.
///
/// ```ignore
/// let seen = recorder.drain();
/// assert_emitted!(seen, ("logger", Action::Increment));
/// ```
#[macro_export]
macro_rules! assert_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            $actions.iter().any(|a| matches!(a, $pattern $(if $guard)?)),
            "Expected an entry matching `{}`, got: {:?}",
            stringify!($pattern),
            $actions
        );
    };
}

/// Assert that no recorded action matches a pattern.
#[macro_export]
macro_rules! assert_not_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            !$actions.iter().any(|a| matches!(a, $pattern $(if $guard)?)),
            "Expected no entry matching `{}`, got: {:?}",
            stringify!($pattern),
            $actions
        );
    };
}

/// Count recorded actions matching a pattern.
#[macro_export]
macro_rules! count_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        $actions.iter().filter(|a| matches!(a, $pattern $(if $guard)?)).count()
    };
}
