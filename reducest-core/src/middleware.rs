//! Middleware and the store view they receive
//!
//! A middleware wraps the next link of the chain and returns a new link. It
//! is the Rust shape of the classic `store => next => action => ...`
//! signature: [`Middleware::wrap`] receives the store view and `next`, and the
//! returned [`Dispatch`] receives the action.
//!
//! # Example
//!
//! ```
//! use reducest_core::middleware::from_fn;
//! use reducest_core::{Dispatch, MiddlewareRef};
//!
//! // Drop every action equal to "drop", forward the rest
//! let blocker: MiddlewareRef<Vec<&'static str>, &'static str> =
//!     from_fn("blocker", |_store, next: &Dispatch<&'static str>, action| {
//!         if action == "drop" {
//!             return Ok(None);
//!         }
//!         next.call(action)
//!     });
//! # let _ = blocker;
//! ```

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use crate::action::Action;
use crate::cell::StateCell;
use crate::dispatch::{Dispatch, Dispatched, WeakDispatch};
use crate::error::DispatchError;

/// Intercepts actions on their way to the reducer.
///
/// `wrap` runs once per composition. The returned link runs once per action
/// and decides whether to forward to `next`, re-enter the chain through
/// [`StoreView::dispatch`], or stop.
pub trait Middleware<S, A: Action> {
    /// Name used in traces and rejection errors
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Build the link that sits in front of `next`.
    fn wrap(&self, store: StoreView<S, A>, next: Dispatch<A>) -> Dispatch<A>;
}

/// Shared middleware handle. Identity is the allocation, so keep the same
/// `Rc` across renders to keep the composed dispatch stable.
pub type MiddlewareRef<S, A> = Rc<dyn Middleware<S, A>>;

/// Whether two middleware handles are the same instance.
pub fn same_middleware<S, A: Action>(a: &MiddlewareRef<S, A>, b: &MiddlewareRef<S, A>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Middleware built from a three-argument closure, see [`from_fn`].
pub struct FnMiddleware<F> {
    name: &'static str,
    handler: Rc<F>,
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<S, A, F> Middleware<S, A> for FnMiddleware<F>
where
    S: 'static,
    A: Action,
    F: Fn(&StoreView<S, A>, &Dispatch<A>, A) -> Dispatched<A> + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn wrap(&self, store: StoreView<S, A>, next: Dispatch<A>) -> Dispatch<A> {
        let handler = Rc::clone(&self.handler);
        Dispatch::new(move |action| handler(&store, &next, action))
    }
}

/// Turn `|store, next, action| ...` into a middleware.
pub fn from_fn<S, A, F>(name: &'static str, handler: F) -> MiddlewareRef<S, A>
where
    S: 'static,
    A: Action,
    F: Fn(&StoreView<S, A>, &Dispatch<A>, A) -> Dispatched<A> + 'static,
{
    Rc::new(FnMiddleware {
        name,
        handler: Rc::new(handler),
    })
}

/// The read/dispatch handle each middleware receives at composition.
///
/// All middleware of one composition share the same view: reads go to the
/// live state cell, and [`dispatch`](Self::dispatch) enters the composed
/// chain from the top rather than at `next`.
///
/// The view handed to `wrap` only refers weakly to its chain, so links that
/// capture it do not keep themselves alive. Cloning it once the chain exists
/// yields an owning view: a continuation that stashes `store.clone()` keeps
/// its chain alive until it is done with it, even after the host composed a
/// newer one.
pub struct StoreView<S, A> {
    cell: Rc<StateCell<S>>,
    chain: ChainRef<A>,
}

enum ChainRef<A> {
    /// Held by the chain's own links; filled in once composition finishes
    Slot(Rc<OnceCell<WeakDispatch<A>>>),
    Owned(Dispatch<A>),
}

impl<A> ChainRef<A> {
    fn current(&self) -> Option<Dispatch<A>> {
        match self {
            Self::Slot(slot) => slot.get().and_then(WeakDispatch::upgrade),
            Self::Owned(composed) => Some(composed.clone()),
        }
    }
}

impl<S, A> Clone for StoreView<S, A> {
    fn clone(&self) -> Self {
        let chain = match &self.chain {
            ChainRef::Owned(composed) => ChainRef::Owned(composed.clone()),
            ChainRef::Slot(slot) => match slot.get().and_then(WeakDispatch::upgrade) {
                Some(composed) => ChainRef::Owned(composed),
                // Still composing: stay on the shared slot
                None => ChainRef::Slot(Rc::clone(slot)),
            },
        };
        Self {
            cell: Rc::clone(&self.cell),
            chain,
        }
    }
}

impl<S, A> fmt::Debug for StoreView<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreView")
            .field("attached", &self.chain.current().is_some())
            .field("owned", &matches!(self.chain, ChainRef::Owned(_)))
            .finish_non_exhaustive()
    }
}

impl<S, A> StoreView<S, A> {
    pub(crate) fn new(cell: Rc<StateCell<S>>, slot: Rc<OnceCell<WeakDispatch<A>>>) -> Self {
        Self {
            cell,
            chain: ChainRef::Slot(slot),
        }
    }
}

impl<S: Clone, A: Action> StoreView<S, A> {
    /// State as of this call, including writes made earlier in the same dispatch.
    pub fn get_state(&self) -> S {
        self.cell.get()
    }

    /// Borrow the state without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        self.cell.with(f)
    }

    /// Dispatch `action` through the whole composed chain, starting at the
    /// outermost middleware.
    ///
    /// Fails with [`DispatchError::Detached`] when called from `wrap`, before
    /// the chain it belongs to has been composed.
    pub fn dispatch(&self, action: A) -> Dispatched<A> {
        match self.chain.current() {
            Some(composed) => composed.call(action),
            None => {
                tracing::warn!(action = %action.name(), "store view is detached from its chain");
                Err(DispatchError::Detached {
                    action: action.name(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Reducer;
    use std::cell::RefCell;

    fn view_over(value: i32) -> (Rc<StateCell<i32>>, StoreView<i32, i32>) {
        let cell = Rc::new(StateCell::new(value, Box::new(())));
        let view = StoreView::new(Rc::clone(&cell), Rc::new(OnceCell::new()));
        (cell, view)
    }

    #[test]
    fn test_view_reads_live_state() {
        let (cell, view) = view_over(1);
        let add = Reducer::new(|s: &i32, a: &i32| s + a);

        cell.apply(&add, &41).unwrap();
        assert_eq!(view.get_state(), 42);
        assert_eq!(view.with_state(|s| s * 2), 84);
    }

    #[test]
    fn test_unattached_view_is_detached() {
        let (_cell, view) = view_over(0);
        assert_eq!(
            view.dispatch(3),
            Err(DispatchError::Detached { action: "i32" })
        );
    }

    #[test]
    fn test_clone_of_attached_view_owns_its_chain() {
        let (cell, view) = view_over(0);
        let slot = match &view.chain {
            ChainRef::Slot(slot) => Rc::clone(slot),
            ChainRef::Owned(_) => unreachable!("fresh views use the slot"),
        };
        let add = Reducer::new(|s: &i32, a: &i32| s + a);
        let apply_cell = Rc::clone(&cell);
        let composed = Dispatch::new(move |a: i32| {
            apply_cell.apply(&add, &a)?;
            Ok(Some(a))
        });
        assert!(slot.set(composed.downgrade()).is_ok());

        let kept = view.clone();
        drop(composed);

        assert_eq!(kept.dispatch(5), Ok(Some(5)));
        assert_eq!(cell.get(), 5);
        assert_eq!(view.dispatch(1), Err(DispatchError::Detached { action: "i32" }));
    }

    #[test]
    fn test_from_fn_wraps_next() {
        let (_cell, view) = view_over(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);

        let tap: MiddlewareRef<i32, i32> = from_fn("tap", move |_store, next, action| {
            log.borrow_mut().push(action);
            next.call(action + 1)
        });
        assert_eq!(tap.name(), "tap");

        let link = tap.wrap(view, Dispatch::new(|a| Ok(Some(a))));
        assert_eq!(link.call(1), Ok(Some(2)));
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn test_same_middleware_compares_instances() {
        let a: MiddlewareRef<i32, i32> = from_fn("a", |_, next, action| next.call(action));
        let b: MiddlewareRef<i32, i32> = from_fn("a", |_, next, action| next.call(action));

        assert!(same_middleware(&a, &Rc::clone(&a)));
        assert!(!same_middleware(&a, &b));
    }
}
