//! Errors surfaced by dispatch

use thiserror::Error;

use crate::action::Action;

/// Why a dispatched action did not complete.
///
/// Errors are never swallowed by the chain: they travel back through `?` to
/// whoever invoked the failing link, aborting the rest of the chain for that
/// action. Reducer panics are not converted into errors; they unwind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DispatchError {
    /// The state cell was borrowed when the base updater tried to write it,
    /// which happens when the reducer (or a `with_state` closure) dispatches.
    #[error("`{action}` was dispatched while the state was borrowed")]
    StateBorrowed { action: &'static str },

    /// A store view dispatched after every handle to its chain was dropped.
    #[error("`{action}` was dispatched through a store view whose chain was released")]
    Detached { action: &'static str },

    /// A middleware refused to forward the action and reported why.
    #[error("middleware `{middleware}` rejected `{action}`: {reason}")]
    Rejected {
        middleware: &'static str,
        action: &'static str,
        reason: String,
    },
}

impl DispatchError {
    /// Build a [`DispatchError::Rejected`] for `action`.
    pub fn rejected<A: Action>(
        middleware: &'static str,
        action: &A,
        reason: impl Into<String>,
    ) -> Self {
        Self::Rejected {
            middleware,
            action: action.name(),
            reason: reason.into(),
        }
    }

    /// Name of the action that failed.
    pub fn action(&self) -> &'static str {
        match self {
            Self::StateBorrowed { action }
            | Self::Detached { action }
            | Self::Rejected { action, .. } => action,
        }
    }
}
