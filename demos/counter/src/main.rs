//! Counter - Minimal reducest host
//!
//! A tiny "component" that keeps a `Reducest` across renders:
//! - State: What the app knows
//! - Actions: What can happen
//! - Reducer: How state changes
//! - Middleware: What happens on the way to the reducer
//! - Main loop: Input -> Dispatch -> Render signal -> Render
//!
//! Input (one per line): + / k = increment, - / j = decrement,
//! d = double, r = reset, q = quit

use std::cell::Cell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use clap::Parser;
use reducest::prelude::*;
use reducest::TraceConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "counter", about = "Reducer + middleware counter")]
struct Args {
    /// Initial count
    #[arg(long, default_value_t = 0)]
    start: i32,

    /// Lowest value the counter may reach
    #[arg(long, default_value_t = i32::MIN)]
    min: i32,

    /// Comma-separated action patterns to trace (e.g. "Add*,Reset")
    #[arg(long)]
    trace_include: Option<String>,
}

// ============================================================================
// Actions - What can happen
// ============================================================================

#[derive(Action, Clone, Debug, PartialEq)]
enum CounterAction {
    Add(i32),
    Double,
    Reset,
}

// ============================================================================
// Reducer - How state changes (pure)
// ============================================================================

fn reducer(count: &i32, action: &CounterAction) -> i32 {
    match action {
        CounterAction::Add(n) => count.saturating_add(*n),
        CounterAction::Double => count.saturating_mul(2),
        CounterAction::Reset => 0,
    }
}

// ============================================================================
// Middleware
// ============================================================================

fn logger() -> MiddlewareRef<i32, CounterAction> {
    from_fn::<i32, CounterAction, _>("logger", |store, next, action| {
        let before = store.get_state();
        tracing::info!(action = ?action, before, "dispatch");
        let result = next.call(action);
        tracing::info!(after = store.get_state(), forwarded = matches!(result, Ok(Some(_))), "done");
        result
    })
}

/// Rejects any `Add` that would take the count below `min`.
fn floor(min: i32) -> MiddlewareRef<i32, CounterAction> {
    from_fn::<i32, CounterAction, _>("floor", move |store, next, action| {
        if let CounterAction::Add(n) = action {
            if store.get_state().saturating_add(n) < min {
                return Err(DispatchError::rejected("floor", &action, format!("below {min}")));
            }
        }
        next.call(action)
    })
}

/// Rewrites `Double` as `Add(current)` and sends it through the whole chain,
/// so the logger and the floor see it too.
fn doubler() -> MiddlewareRef<i32, CounterAction> {
    from_fn::<i32, CounterAction, _>("doubler", |store, next, action| match action {
        CounterAction::Double => store.dispatch(CounterAction::Add(store.get_state())),
        other => next.call(other),
    })
}

fn parse_input(line: &str) -> Option<CounterAction> {
    match line.trim() {
        "+" | "k" => Some(CounterAction::Add(1)),
        "-" | "j" => Some(CounterAction::Add(-1)),
        "d" => Some(CounterAction::Double),
        "r" => Some(CounterAction::Reset),
        _ => None,
    }
}

// ============================================================================
// Main - Host loop
// ============================================================================

fn main() -> io::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let trace = match args.trace_include.as_deref() {
        Some(include) => TraceConfig::new(Some(include), None),
        None => TraceConfig::from_env(),
    };

    // Render signal: the host only marks itself dirty, rendering happens in the loop
    let dirty = Rc::new(Cell::new(true));
    let mark_dirty = Rc::clone(&dirty);

    let mut store = ReducestBuilder::new(args.start)
        .render_signal(move || mark_dirty.set(true))
        .trace_config(trace)
        .build();

    // Kept alive across renders so the composed dispatch stays the same
    let reducer = Reducer::new(reducer);
    let middlewares = vec![logger(), floor(args.min), doubler()];

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();

    loop {
        let (count, dispatch) = store.render(&reducer, &middlewares);
        if dirty.replace(false) {
            writeln!(stdout, "count: {count}")?;
        }
        write!(stdout, "> ")?;
        stdout.flush()?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };
        if line.trim() == "q" {
            break;
        }

        match parse_input(&line) {
            Some(action) => {
                if let Err(err) = dispatch.call(action) {
                    tracing::warn!(%err, "action failed");
                }
            }
            None => writeln!(stdout, "keys: + - d r q")?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reducest::testing::TestHarness;

    fn harness(start: i32, min: i32) -> TestHarness<i32, CounterAction> {
        TestHarness::new(start, Reducer::new(reducer))
            .with_middlewares(vec![logger(), floor(min), doubler()])
    }

    #[test]
    fn test_floor_rejects_adds_below_min() {
        let mut harness = harness(1, 0);

        let err = harness.dispatch(CounterAction::Add(-2)).unwrap_err();
        assert!(matches!(err, DispatchError::Rejected { middleware: "floor", action: "Add", .. }));
        assert_eq!(harness.state(), 1);

        harness.dispatch(CounterAction::Add(-1)).unwrap();
        assert_eq!(harness.state(), 0);
    }

    #[test]
    fn test_double_goes_through_the_whole_chain() {
        let mut harness = harness(3, 0);

        assert_eq!(harness.dispatch(CounterAction::Double), Ok(Some(CounterAction::Add(3))));
        assert_eq!(harness.state(), 6);
    }
}
