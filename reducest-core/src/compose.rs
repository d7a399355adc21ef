//! Middleware chain composition
//!
//! [`compose`] folds a middleware list right to left around a base link, so
//! index 0 ends up outermost and runs first. [`DispatchCache`] keeps the
//! composed handle stable until one of its inputs changes identity.

use std::cell::OnceCell;
use std::rc::Rc;

use crate::action::Action;
use crate::cell::StateCell;
use crate::dispatch::Dispatch;
use crate::middleware::{same_middleware, MiddlewareRef, StoreView};

/// Build the composed dispatch for `middlewares` around `base`.
///
/// Every middleware receives the same [`StoreView`]; its `dispatch` points
/// at the returned handle, and clones taken after this returns keep it alive. With no middleware the result is `base` itself.
pub fn compose<S, A>(
    cell: &Rc<StateCell<S>>,
    base: &Dispatch<A>,
    middlewares: &[MiddlewareRef<S, A>],
) -> Dispatch<A>
where
    S: Clone + 'static,
    A: Action,
{
    let slot = Rc::new(OnceCell::new());
    let store = StoreView::new(Rc::clone(cell), Rc::clone(&slot));

    let composed = middlewares
        .iter()
        .rev()
        .fold(base.clone(), |next, middleware| {
            middleware.wrap(store.clone(), next)
        });

    // Weak, so the chain does not keep itself alive through its own view
    let attached = slot.set(composed.downgrade()).is_ok();
    debug_assert!(attached, "store view slot filled twice");
    composed
}

struct CacheEntry<S, A: Action> {
    base: Dispatch<A>,
    middlewares: Vec<MiddlewareRef<S, A>>,
    composed: Dispatch<A>,
}

impl<S, A: Action> CacheEntry<S, A> {
    fn stale_reason(&self, base: &Dispatch<A>, middlewares: &[MiddlewareRef<S, A>]) -> Option<&'static str> {
        if !Dispatch::ptr_eq(&self.base, base) {
            Some("reducer changed")
        } else if self.middlewares.len() != middlewares.len() {
            Some("middleware count changed")
        } else if self
            .middlewares
            .iter()
            .zip(middlewares)
            .any(|(cached, given)| !same_middleware(cached, given))
        {
            Some("middleware changed")
        } else {
            None
        }
    }
}

/// Memoized composition keyed on the base link and each middleware's identity.
///
/// The cache holds strong handles to its keys, so a freed allocation can
/// never be mistaken for a key still in use.
pub struct DispatchCache<S, A: Action> {
    entry: Option<CacheEntry<S, A>>,
    compositions: u64,
}

impl<S, A: Action> Default for DispatchCache<S, A> {
    fn default() -> Self {
        Self {
            entry: None,
            compositions: 0,
        }
    }
}

impl<S, A: Action> std::fmt::Debug for DispatchCache<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchCache")
            .field("cached", &self.entry.is_some())
            .field("compositions", &self.compositions)
            .finish()
    }
}

impl<S, A> DispatchCache<S, A>
where
    S: Clone + 'static,
    A: Action,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached chain, or compose and cache a new one if `base` or
    /// any middleware differs from the last call.
    pub fn get_or_compose(
        &mut self,
        cell: &Rc<StateCell<S>>,
        base: &Dispatch<A>,
        middlewares: &[MiddlewareRef<S, A>],
    ) -> Dispatch<A> {
        let reason = match &self.entry {
            None => "initial",
            Some(entry) => match entry.stale_reason(base, middlewares) {
                None => return entry.composed.clone(),
                Some(reason) => reason,
            },
        };

        tracing::trace!(middlewares = middlewares.len(), reason, "composing dispatch chain");
        let composed = compose(cell, base, middlewares);
        self.compositions += 1;
        self.entry = Some(CacheEntry {
            base: base.clone(),
            middlewares: middlewares.to_vec(),
            composed: composed.clone(),
        });
        composed
    }

    /// Number of times a chain was actually composed
    pub fn compositions(&self) -> u64 {
        self.compositions
    }

    /// Drop the cached chain; the next call composes again.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatched;
    use crate::error::DispatchError;
    use crate::middleware::{from_fn, Middleware};
    use crate::store::{base_updater, Reducer};
    use crate::TraceConfig;
    use std::cell::RefCell;

    type Log = Rc<RefCell<Vec<String>>>;

    fn setup() -> (Rc<StateCell<i32>>, Dispatch<i32>) {
        let cell = Rc::new(StateCell::new(0, Box::new(())));
        let reducer = Reducer::new(|s: &i32, a: &i32| s + a);
        let base = base_updater(&cell, &reducer, Rc::new(TraceConfig::default()));
        (cell, base)
    }

    fn tagged(tag: &'static str, log: &Log) -> MiddlewareRef<i32, i32> {
        let log = Rc::clone(log);
        from_fn(tag, move |_store, next, action| {
            log.borrow_mut().push(format!("{tag}:{action}"));
            next.call(action)
        })
    }

    #[test]
    fn test_empty_list_is_base_updater() {
        let (cell, base) = setup();
        let composed = compose(&cell, &base, &[]);
        assert!(Dispatch::ptr_eq(&composed, &base));
    }

    #[test]
    fn test_first_middleware_runs_first() {
        let (cell, base) = setup();
        let log = Log::default();
        let composed = compose(&cell, &base, &[tagged("a", &log), tagged("b", &log)]);

        assert_eq!(composed.call(2), Ok(Some(2)));
        assert_eq!(*log.borrow(), vec!["a:2", "b:2"]);
        assert_eq!(cell.get(), 2);
    }

    #[test]
    fn test_store_dispatch_restarts_at_top() {
        let (cell, base) = setup();
        let log = Log::default();

        // Turns 10 into two separate 5s, each going through the whole chain
        let splitter: MiddlewareRef<i32, i32> = from_fn("split", |store, next, action| {
            if action == 10 {
                store.dispatch(5)?;
                return store.dispatch(5);
            }
            next.call(action)
        });

        let composed = compose(&cell, &base, &[tagged("outer", &log), splitter]);
        assert_eq!(composed.call(10), Ok(Some(5)));

        assert_eq!(*log.borrow(), vec!["outer:10", "outer:5", "outer:5"]);
        assert_eq!(cell.get(), 10);
    }

    #[test]
    fn test_error_aborts_rest_of_chain() {
        let (cell, base) = setup();
        let log = Log::default();
        let guard: MiddlewareRef<i32, i32> =
            from_fn("guard", |_store, next, action: i32| -> Dispatched<i32> {
                if action < 0 {
                    return Err(DispatchError::rejected("guard", &action, "negative"));
                }
                next.call(action)
            });

        let composed = compose(&cell, &base, &[guard, tagged("inner", &log)]);
        assert!(matches!(
            composed.call(-1),
            Err(DispatchError::Rejected { middleware: "guard", .. })
        ));
        assert!(log.borrow().is_empty());
        assert_eq!(cell.get(), 0);
    }

    #[test]
    fn test_cache_reuses_until_inputs_change() {
        let (cell, base) = setup();
        let log = Log::default();
        let a = tagged("a", &log);
        let b = tagged("b", &log);
        let mut cache = DispatchCache::new();

        let first = cache.get_or_compose(&cell, &base, &[a.clone(), b.clone()]);
        let again = cache.get_or_compose(&cell, &base, &[a.clone(), b.clone()]);
        assert!(Dispatch::ptr_eq(&first, &again));
        assert_eq!(cache.compositions(), 1);

        let swapped = cache.get_or_compose(&cell, &base, &[b.clone(), a.clone()]);
        assert!(!Dispatch::ptr_eq(&first, &swapped));

        let shorter = cache.get_or_compose(&cell, &base, &[b.clone()]);
        assert!(!Dispatch::ptr_eq(&swapped, &shorter));

        let (_, other_base) = setup();
        let rebased = cache.get_or_compose(&cell, &other_base, &[b.clone()]);
        assert!(!Dispatch::ptr_eq(&shorter, &rebased));
        assert_eq!(cache.compositions(), 4);

        cache.invalidate();
        let fresh = cache.get_or_compose(&cell, &other_base, &[b]);
        assert!(!Dispatch::ptr_eq(&rebased, &fresh));
    }

    #[test]
    fn test_stashed_view_outlives_released_chain() {
        let (cell, base) = setup();
        let log = Log::default();
        let stash: Rc<RefCell<Option<StoreView<i32, i32>>>> = Rc::default();
        let keep = Rc::clone(&stash);
        let capture: MiddlewareRef<i32, i32> = from_fn("capture", move |store, next, action| {
            keep.borrow_mut().replace(store.clone());
            next.call(action)
        });

        let composed = compose(&cell, &base, &[capture, tagged("old", &log)]);
        composed.call(1).unwrap();
        drop(composed);

        // A newer chain takes over, the stashed view still routes through the old one
        let newer = compose(&cell, &base, &[tagged("new", &log)]);
        newer.call(2).unwrap();

        let view = stash.borrow_mut().take().unwrap();
        assert_eq!(view.get_state(), 3);
        assert_eq!(view.dispatch(10), Ok(Some(10)));
        assert_eq!(cell.get(), 13);
        assert_eq!(*log.borrow(), vec!["old:1", "new:2", "old:10"]);
    }

    #[test]
    fn test_dispatch_during_wrap_is_detached() {
        struct Eager(Rc<RefCell<Option<Dispatched<i32>>>>);

        impl Middleware<i32, i32> for Eager {
            fn wrap(&self, store: StoreView<i32, i32>, next: Dispatch<i32>) -> Dispatch<i32> {
                self.0.replace(Some(store.dispatch(1)));
                next
            }
        }

        let (cell, base) = setup();
        let outcome = Rc::default();
        let eager: MiddlewareRef<i32, i32> = Rc::new(Eager(Rc::clone(&outcome)));

        let composed = compose(&cell, &base, &[eager]);
        assert_eq!(
            outcome.borrow_mut().take(),
            Some(Err(DispatchError::Detached { action: "i32" }))
        );
        assert_eq!(composed.call(4), Ok(Some(4)));
        assert_eq!(cell.get(), 4);
    }
}
