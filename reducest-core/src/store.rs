//! Reducer-driven state with a middleware pipeline
//!
//! [`Reducest`] is the per-instance store a host component keeps across
//! renders. It owns the [`StateCell`], rebuilds the base updater when the
//! reducer changes, and recomposes the middleware chain only when its inputs
//! change identity.

use std::fmt;
use std::rc::Rc;

use crate::action::Action;
use crate::cell::{RenderSignal, Snapshot, StateCell};
use crate::compose::DispatchCache;
use crate::config::TraceConfig;
use crate::dispatch::Dispatch;
use crate::middleware::MiddlewareRef;

/// A pure transition function `(state, action) -> new state`.
///
/// Identity is the wrapped allocation: clones of one `Reducer` are the same
/// reducer, two `Reducer::new` calls are different reducers even for the
/// same closure body. Keep one instance alive across renders to avoid
/// rebuilding the chain.
pub struct Reducer<S, A> {
    inner: Rc<dyn Fn(&S, &A) -> S>,
}

impl<S, A> Clone for Reducer<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S, A> fmt::Debug for Reducer<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reducer")
            .field(&Rc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

impl<S, A> Reducer<S, A> {
    pub fn new(f: impl Fn(&S, &A) -> S + 'static) -> Self {
        Self { inner: Rc::new(f) }
    }

    /// Compute the next state. Never touches any store.
    pub fn reduce(&self, state: &S, action: &A) -> S {
        (self.inner)(state, action)
    }

    /// Whether both handles wrap the same function instance.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&a.inner), Rc::as_ptr(&b.inner))
    }
}

/// Innermost link: applies `reducer` to `cell` and hands the action back.
pub(crate) fn base_updater<S, A>(
    cell: &Rc<StateCell<S>>,
    reducer: &Reducer<S, A>,
    trace: Rc<TraceConfig>,
) -> Dispatch<A>
where
    S: Clone + 'static,
    A: Action,
{
    let cell = Rc::clone(cell);
    let reducer = reducer.clone();
    Dispatch::new(move |action: A| {
        let version = cell.apply(&reducer, &action)?;
        if trace.should_trace(action.name()) {
            tracing::debug!(action = %action.name(), version, "action applied");
        }
        Ok(Some(action))
    })
}

/// Builder for [`Reducest`] when the defaults are not enough.
///
/// ```
/// use reducest_core::{Reducer, Reducest, ReducestBuilder, TraceConfig};
///
/// let reducer = Reducer::new(|state: &Vec<String>, action: &String| {
///     let mut next = state.clone();
///     next.push(action.clone());
///     next
/// });
/// let mut store: Reducest<Vec<String>, String> = ReducestBuilder::with_initializer(3, |n| {
///     (0..n).map(|i| i.to_string()).collect()
/// })
/// .trace_config(TraceConfig::trace_all())
/// .build();
///
/// let (state, _) = store.render(&reducer, &[]);
/// assert_eq!(state, vec!["0", "1", "2"]);
/// ```
pub struct ReducestBuilder<S> {
    initial: S,
    signal: Box<dyn RenderSignal>,
    trace: TraceConfig,
}

impl<S> fmt::Debug for ReducestBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReducestBuilder")
            .field("trace", &self.trace)
            .finish_non_exhaustive()
    }
}

impl<S: Clone + 'static> ReducestBuilder<S> {
    /// Start configuring a store seeded with `initial`.
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            signal: Box::new(()),
            trace: TraceConfig::default(),
        }
    }

    /// Start configuring a store seeded with `initializer(arg)`.
    ///
    /// `initializer` runs here, once, and is never kept.
    pub fn with_initializer<I>(arg: I, initializer: impl FnOnce(I) -> S) -> Self {
        Self::new(initializer(arg))
    }

    /// Signal fired after every state write. Defaults to a no-op.
    pub fn render_signal(mut self, signal: impl RenderSignal + 'static) -> Self {
        self.signal = Box::new(signal);
        self
    }

    /// Which actions the base updater traces. Defaults to [`TraceConfig::default`].
    pub fn trace_config(mut self, trace: TraceConfig) -> Self {
        self.trace = trace;
        self
    }

    pub fn build<A: Action>(self) -> Reducest<S, A> {
        Reducest {
            cell: Rc::new(StateCell::new(self.initial, self.signal)),
            trace: Rc::new(self.trace),
            base: None,
            cache: DispatchCache::new(),
        }
    }
}

/// Reducer store with a composable middleware chain.
///
/// The host keeps one `Reducest` per component instance and calls
/// [`render`](Self::render) on every render pass with the reducer and
/// middleware it currently wants. The state is initialized exactly once, in
/// the constructor.
///
/// # Type Parameters
/// * `S` - The state type
/// * `A` - The action type (must implement `Action`)
///
/// # Example
/// ```
/// use reducest_core::{Reducer, Reducest};
///
/// let reducer = Reducer::new(|state: &i32, action: &i32| state + action);
/// let mut store: Reducest<i32, i32> = Reducest::new(0);
///
/// let (state, dispatch) = store.render(&reducer, &[]);
/// assert_eq!(state, 0);
///
/// dispatch.call(5).unwrap();
/// dispatch.call(3).unwrap();
///
/// let (state, _) = store.render(&reducer, &[]);
/// assert_eq!(state, 8);
/// ```
pub struct Reducest<S, A: Action> {
    cell: Rc<StateCell<S>>,
    trace: Rc<TraceConfig>,
    base: Option<(Reducer<S, A>, Dispatch<A>)>,
    cache: DispatchCache<S, A>,
}

impl<S: fmt::Debug, A: Action> fmt::Debug for Reducest<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reducest")
            .field("cell", &self.cell)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl<S: Clone + 'static, A: Action> Reducest<S, A> {
    /// Store whose initial state is `initial` itself.
    pub fn new(initial: S) -> Self {
        ReducestBuilder::new(initial).build()
    }

    /// Store whose initial state is `initializer(arg)`.
    ///
    /// `initializer` runs here, once, and is never kept.
    pub fn with_initializer<I>(arg: I, initializer: impl FnOnce(I) -> S) -> Self {
        ReducestBuilder::with_initializer(arg, initializer).build()
    }

    /// Render pass: current state plus the composed dispatch.
    ///
    /// The returned dispatch is the same handle as last time unless
    /// `reducer` or any entry of `middlewares` is a different instance, or
    /// the list length changed.
    pub fn render(
        &mut self,
        reducer: &Reducer<S, A>,
        middlewares: &[MiddlewareRef<S, A>],
    ) -> (S, Dispatch<A>) {
        let base = self.base_updater(reducer);
        let dispatch = self.cache.get_or_compose(&self.cell, &base, middlewares);
        (self.cell.get(), dispatch)
    }

    fn base_updater(&mut self, reducer: &Reducer<S, A>) -> Dispatch<A> {
        if let Some((cached, base)) = &self.base {
            if Reducer::ptr_eq(cached, reducer) {
                return base.clone();
            }
        }

        let base = base_updater(&self.cell, reducer, Rc::clone(&self.trace));
        self.base = Some((reducer.clone(), base.clone()));
        base
    }

    /// Current state, including writes the host has not rendered yet.
    pub fn state(&self) -> S {
        self.cell.get()
    }

    /// The render-visible snapshot
    pub fn snapshot(&self) -> &Snapshot<S> {
        self.cell.snapshot()
    }

    /// How many times the middleware chain has been composed
    pub fn compositions(&self) -> u64 {
        self.cache.compositions()
    }
}
