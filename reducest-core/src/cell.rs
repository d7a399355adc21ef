//! State cell and its render-visible snapshot
//!
//! The [`StateCell`] holds the authoritative state outside the host's render
//! cycle so that middleware can read the value written a moment ago within
//! the same call stack. Every write is mirrored into a [`Snapshot`] and
//! announced to the host through a [`RenderSignal`].

use std::cell::{Cell, RefCell};

use crate::action::Action;
use crate::error::DispatchError;
use crate::store::Reducer;

/// Host hook that schedules a re-render after the state changed.
///
/// Implemented for `()` (no host, nothing to schedule) and for any `Fn()`.
pub trait RenderSignal {
    /// Ask the host to render again. Called once per applied action.
    fn request_render(&self);
}

impl RenderSignal for () {
    fn request_render(&self) {}
}

impl<F: Fn()> RenderSignal for F {
    fn request_render(&self) {
        self()
    }
}

/// The value the host observes between renders.
#[derive(Debug)]
pub struct Snapshot<S> {
    value: RefCell<S>,
    version: Cell<u64>,
}

impl<S: Clone> Snapshot<S> {
    fn new(value: S) -> Self {
        Self {
            value: RefCell::new(value),
            version: Cell::new(0),
        }
    }

    /// Last published state
    pub fn get(&self) -> S {
        self.value.borrow().clone()
    }

    /// Number of publishes since construction
    pub fn version(&self) -> u64 {
        self.version.get()
    }

    fn publish(&self, value: S) -> u64 {
        *self.value.borrow_mut() = value;
        let version = self.version.get() + 1;
        self.version.set(version);
        version
    }
}

/// Authoritative state, mutated only by the base updater.
pub struct StateCell<S> {
    current: RefCell<S>,
    snapshot: Snapshot<S>,
    signal: Box<dyn RenderSignal>,
}

impl<S> std::fmt::Debug for StateCell<S>
where
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCell")
            .field("current", &self.current)
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

impl<S: Clone> StateCell<S> {
    /// Seed both the cell and the snapshot with `initial`.
    pub fn new(initial: S, signal: Box<dyn RenderSignal>) -> Self {
        Self {
            snapshot: Snapshot::new(initial.clone()),
            current: RefCell::new(initial),
            signal,
        }
    }

    /// Current value, even if the host has not re-rendered yet.
    pub fn get(&self) -> S {
        self.current.borrow().clone()
    }

    /// Borrow the current value without cloning it.
    ///
    /// Dispatching from inside `f` fails with [`DispatchError::StateBorrowed`].
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.current.borrow())
    }

    /// The render-visible mirror of the current value.
    pub fn snapshot(&self) -> &Snapshot<S> {
        &self.snapshot
    }

    /// Run `reducer` over the current value and commit the result.
    ///
    /// The cell keeps its previous value if the reducer panics, because the
    /// write happens only after the reducer returned. Returns the snapshot
    /// version published by this write.
    pub(crate) fn apply<A: Action>(
        &self,
        reducer: &Reducer<S, A>,
        action: &A,
    ) -> Result<u64, DispatchError> {
        let borrowed = || DispatchError::StateBorrowed {
            action: action.name(),
        };

        // A live borrow here means we were called from inside the reducer
        // or from a `with` closure further up the stack.
        if self.current.try_borrow_mut().is_err() {
            tracing::warn!(action = %action.name(), "dispatch while state is borrowed");
            return Err(borrowed());
        }

        let next = reducer.reduce(&self.current.borrow(), action);

        let published = {
            let mut current = self.current.try_borrow_mut().map_err(|_| borrowed())?;
            *current = next;
            current.clone()
        };
        let version = self.snapshot.publish(published);
        self.signal.request_render();
        Ok(version)
    }
}
