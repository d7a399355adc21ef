//! reducest: reducer-driven state with a composable middleware pipeline
//!
//! Hold evolving state in a host component, change it only through actions
//! handled by a pure reducer, and put an ordered chain of middleware
//! (logging, validation, async side effects) in front of every action.
//!
//! # Example
//! ```
//! use reducest::prelude::*;
//!
//! #[derive(Action, Clone, Debug)]
//! enum CounterAction {
//!     Add(i32),
//!     Reset,
//! }
//!
//! let reducer = Reducer::new(|count: &i32, action: &CounterAction| match action {
//!     CounterAction::Add(n) => count + n,
//!     CounterAction::Reset => 0,
//! });
//!
//! let mut store = Reducest::new(0);
//! let (_, dispatch) = store.render(&reducer, &[]);
//! dispatch.call(CounterAction::Add(5)).unwrap();
//! dispatch.call(CounterAction::Add(3)).unwrap();
//!
//! assert_eq!(store.state(), 8);
//! ```

// Re-export everything from core
pub use reducest_core::*;

// Re-export derive macros
pub use reducest_macros::Action;

/// Prelude for convenient imports
pub mod prelude {
    pub use reducest_core::prelude::*;

    // Derive macros
    pub use reducest_macros::Action;
}
