// ============================================================================
// spark-map-state - Batching
// Group several publishes into a single notification round
// ============================================================================

use crate::core::context::with_context;
use crate::reactivity::scheduling::flush_sync;

/// Run `f` with effects deferred until the outermost batch exits.
///
/// Several actions issued in one batch still apply in call order (each reads
/// the latest snapshot), but dependents re-render once.
///
/// # Example
///
/// ```
/// use spark_map_state::{batch, create_container, effect};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let state = create_container::<u32, &str>(None);
/// let renders = Rc::new(Cell::new(0));
///
/// let _dispose = effect({
///     let state = state.clone();
///     let renders = renders.clone();
///     move || {
///         let _ = state.snapshot();
///         renders.set(renders.get() + 1);
///     }
/// });
/// assert_eq!(renders.get(), 1);
///
/// batch(|| {
///     state.actions().set(1, "a");
///     state.actions().set(2, "b");
/// });
///
/// assert_eq!(renders.get(), 2);
/// assert_eq!(state.snapshot().len(), 2);
/// ```
pub fn batch<T>(f: impl FnOnce() -> T) -> T {
    with_context(|ctx| ctx.enter_batch());

    // Exit the batch even if `f` panics
    struct BatchGuard;

    impl Drop for BatchGuard {
        fn drop(&mut self) {
            let depth = with_context(|ctx| ctx.exit_batch());
            if depth == 0 && !std::thread::panicking() {
                flush_sync();
            }
        }
    }

    let _guard = BatchGuard;
    f()
}

/// Read signals without creating dependencies.
pub fn untrack<T>(f: impl FnOnce() -> T) -> T {
    let prev = with_context(|ctx| ctx.set_untracking(true));

    struct UntrackGuard {
        prev: bool,
    }

    impl Drop for UntrackGuard {
        fn drop(&mut self) {
            let prev = self.prev;
            with_context(|ctx| ctx.set_untracking(prev));
        }
    }

    let _guard = UntrackGuard { prev };
    f()
}

/// Alias for [`untrack`].
pub fn peek<T>(f: impl FnOnce() -> T) -> T {
    untrack(f)
}

/// Drain pending effects now.
pub fn tick() {
    flush_sync();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::is_batching;
    use crate::{effect, signal};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn batch_defers_effects() {
        let a = signal(1);
        let b = signal(2);
        let run_count = Rc::new(Cell::new(0));

        let _dispose = effect({
            let (a, b, run_count) = (a.clone(), b.clone(), run_count.clone());
            move || {
                let _ = a.get() + b.get();
                run_count.set(run_count.get() + 1);
            }
        });
        assert_eq!(run_count.get(), 1);

        batch(|| {
            a.set(10);
            b.set(20);
            assert_eq!(run_count.get(), 1);
        });

        assert_eq!(run_count.get(), 2);
    }

    #[test]
    fn nested_batches_flush_once() {
        let a = signal(0);
        let run_count = Rc::new(Cell::new(0));

        let _dispose = effect({
            let (a, run_count) = (a.clone(), run_count.clone());
            move || {
                let _ = a.get();
                run_count.set(run_count.get() + 1);
            }
        });

        batch(|| {
            a.set(1);
            batch(|| a.set(2));
            assert!(is_batching());
            assert_eq!(run_count.get(), 1);
        });

        assert!(!is_batching());
        assert_eq!(run_count.get(), 2);
    }

    #[test]
    fn batch_returns_value() {
        assert_eq!(batch(|| 42), 42);
    }

    #[test]
    fn untrack_skips_dependency() {
        let a = signal(1);
        let b = signal(2);
        let run_count = Rc::new(Cell::new(0));

        let _dispose = effect({
            let (a, b, run_count) = (a.clone(), b.clone(), run_count.clone());
            move || {
                let _ = a.get();
                let _ = untrack(|| b.get());
                run_count.set(run_count.get() + 1);
            }
        });

        b.set(20);
        assert_eq!(run_count.get(), 1);

        a.set(10);
        assert_eq!(run_count.get(), 2);
    }

    #[test]
    fn tick_flushes_deferred_effects() {
        let count = signal(0);
        let seen = Rc::new(Cell::new(0));

        let _dispose = effect({
            let (count, seen) = (count.clone(), seen.clone());
            move || seen.set(count.get())
        });

        batch(|| count.set(42));
        tick();
        assert_eq!(seen.get(), 42);
    }
}
