//! Dispatch handles
//!
//! A [`Dispatch`] is one link of the middleware chain: the base updater, a
//! middleware wrapped around the next link, or the fully composed chain the
//! caller receives. Handles are cheap to clone and compare by identity.

use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::DispatchError;

/// Outcome of sending an action down a chain.
///
/// `Ok(Some(action))` is the action the base updater applied, handed back
/// unchanged; `Ok(None)` means a link declined to forward it.
pub type Dispatched<A> = Result<Option<A>, DispatchError>;

type DispatchFn<A> = dyn Fn(A) -> Dispatched<A>;

/// Callable handle to a dispatch link.
pub struct Dispatch<A> {
    inner: Rc<DispatchFn<A>>,
}

impl<A> Clone for Dispatch<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A> fmt::Debug for Dispatch<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Dispatch")
            .field(&Rc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

impl<A> Dispatch<A> {
    /// Wrap a closure as a dispatch link.
    pub fn new(f: impl Fn(A) -> Dispatched<A> + 'static) -> Self {
        Self { inner: Rc::new(f) }
    }

    /// Send `action` into this link.
    pub fn call(&self, action: A) -> Dispatched<A> {
        (self.inner)(action)
    }

    /// Whether both handles refer to the same link.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&a.inner), Rc::as_ptr(&b.inner))
    }

    pub(crate) fn downgrade(&self) -> WeakDispatch<A> {
        WeakDispatch(Rc::downgrade(&self.inner))
    }
}

/// Non-owning reference to a composed chain, held by its own store view.
pub(crate) struct WeakDispatch<A>(Weak<DispatchFn<A>>);

impl<A> WeakDispatch<A> {
    pub(crate) fn upgrade(&self) -> Option<Dispatch<A>> {
        self.0.upgrade().map(|inner| Dispatch { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_returns_closure_result() {
        let double = Dispatch::new(|n: i32| Ok(Some(n * 2)));
        assert_eq!(double.call(4), Ok(Some(8)));
    }

    #[test]
    fn test_identity_follows_allocation() {
        let a = Dispatch::new(|n: i32| Ok(Some(n)));
        let b = Dispatch::new(|n: i32| Ok(Some(n)));

        assert!(Dispatch::ptr_eq(&a, &a.clone()));
        assert!(!Dispatch::ptr_eq(&a, &b));
    }

    #[test]
    fn test_weak_handle_dies_with_last_owner() {
        let link = Dispatch::new(|n: i32| Ok(Some(n)));
        let weak = link.downgrade();

        let upgraded = weak.upgrade().unwrap();
        assert!(Dispatch::ptr_eq(&link, &upgraded));

        drop(upgraded);
        drop(link);
        assert!(weak.upgrade().is_none());
    }
}
