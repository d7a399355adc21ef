//! Action trait for type-safe state transitions

use std::fmt::Debug;

/// Marker trait for actions that can be dispatched through the middleware chain
///
/// Actions describe an intended state change. They are transient: produced
/// by a caller, consumed by the chain, never stored by the store itself.
/// They should be:
/// - Clone: middleware may keep a copy while forwarding the original
/// - Debug: for tracing and test assertions
///
/// Use `#[derive(Action)]` from `reducest-macros` to auto-implement this trait.
pub trait Action: Clone + Debug + 'static {
    /// Get the action name for logging and filtering
    fn name(&self) -> &'static str;
}

/// String literal actions are named by their own text.
impl Action for &'static str {
    fn name(&self) -> &'static str {
        self
    }
}

macro_rules! impl_action_for_primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Action for $ty {
                fn name(&self) -> &'static str {
                    stringify!($ty)
                }
            }
        )*
    };
}

impl_action_for_primitive!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, bool, char, String);
