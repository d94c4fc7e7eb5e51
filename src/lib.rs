// ============================================================================
// spark-map-state - Reactive Key-Value State for Rust
// ============================================================================
//
// A container holds an immutable, insertion-ordered Snapshot and a stable set
// of actions (set / delete / initialize / clear). Every mutation publishes a
// new Snapshot instance, so "did it change?" is a pointer comparison, while
// the actions stay the same objects for the container's whole life.
//
// The container sits on a small fine-grained signal graph (signals, effects,
// batching) and a render boundary that re-runs a render function whenever a
// snapshot it read is replaced.
// ============================================================================

pub mod collections;
pub mod core;
pub mod error;
pub mod primitives;
pub mod reactivity;
pub mod render;
pub mod state;

// Re-export core items at crate root for ergonomic access
pub use core::constants;
pub use core::context::{is_batching, is_tracking, with_context, ReactiveContext};
pub use core::types::{default_equals, AnyReaction, AnySource, EqualsFn, SourceInner};

// Reactive primitives
pub use primitives::effect::{
    effect, effect_sync, effect_tracking, effect_with_cleanup, CleanupFn, EffectFn,
};
pub use primitives::signal::{signal, signal_with_equals, Signal};

pub use reactivity::batching::{batch, peek, tick, untrack};
pub use reactivity::scheduling::flush_sync;

// The container
pub use collections::Snapshot;
pub use error::{MapStateError, Result};
pub use state::{
    create_container, ClearFn, DeleteFn, InitSource, InitializeFn, MapActions, MapState,
    MapStateOptions, PublishPolicy, SetFn, SnapshotStore, Subscription,
};

// Render boundary
pub use render::{act, render_root, Hooks, RenderRoot};

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    // =========================================================================
    // Container lifecycle
    // =========================================================================

    #[test]
    fn container_scenario_set_then_read() {
        let state = create_container::<u32, &str>(None);
        let (empty, actions) = state.parts();

        assert_eq!(empty.get(&1), None);
        actions.set(1, "added");

        assert_eq!(state.snapshot().get(&1), Some(&"added"));
        assert_eq!(empty.get(&1), None);
    }

    #[test]
    fn container_scenario_every_action_changes_identity() {
        let state = create_container::<u32, u32>(Some(vec![(1, 1)].into()));
        let actions = state.actions().clone();
        let mut seen = vec![state.snapshot()];

        actions.set(2, 2);
        seen.push(state.snapshot());
        actions.delete(&1);
        seen.push(state.snapshot());
        actions.initialize(vec![(9, 9)]);
        seen.push(state.snapshot());
        actions.clear();
        seen.push(state.snapshot());

        for pair in seen.windows(2) {
            assert!(!Snapshot::ptr_eq(&pair[0], &pair[1]));
        }
        assert!(MapActions::ptr_eq(&actions, state.actions()));
    }

    #[test]
    fn container_scenario_delete_keeps_relative_order() {
        let state = create_container::<u32, char>(Some(vec![(1, 'a'), (2, 'b'), (3, 'c')].into()));
        state.actions().delete(&2);
        assert_eq!(state.snapshot().to_vec(), vec![(1, 'a'), (3, 'c')]);
    }

    // =========================================================================
    // Substrate integration
    // =========================================================================

    #[test]
    fn effect_observes_container_publishes() {
        let state = create_container::<&str, u32>(None);
        let totals = Rc::new(RefCell::new(Vec::new()));

        let dispose = effect({
            let (state, totals) = (state.clone(), totals.clone());
            move || totals.borrow_mut().push(state.snapshot().values().sum::<u32>())
        });

        state.actions().set("a", 1);
        state.actions().set("b", 2);
        dispose();
        state.actions().clear();

        assert_eq!(*totals.borrow(), vec![0, 1, 3]);
    }

    #[test]
    fn batch_coalesces_container_publishes() {
        let state = create_container::<u32, u32>(None);
        let runs = Rc::new(RefCell::new(0));

        let _dispose = effect({
            let (state, runs) = (state.clone(), runs.clone());
            move || {
                let _ = state.snapshot();
                *runs.borrow_mut() += 1;
            }
        });

        batch(|| {
            for i in 0..10 {
                state.actions().set(i, i);
            }
        });

        assert_eq!(*runs.borrow(), 2);
        assert_eq!(state.snapshot().len(), 10);
        assert_eq!(state.store().publish_count(), 10);
    }

    #[test]
    fn untracked_read_does_not_subscribe() {
        let state = create_container::<u32, u32>(None);
        let runs = Rc::new(RefCell::new(0));

        let _dispose = effect({
            let (state, runs) = (state.clone(), runs.clone());
            move || {
                let _ = untrack(|| state.snapshot());
                *runs.borrow_mut() += 1;
            }
        });

        state.actions().set(1, 1);
        assert_eq!(*runs.borrow(), 1);
        assert!(!is_tracking());
    }

    // =========================================================================
    // Render boundary
    // =========================================================================

    #[test]
    fn render_root_sees_latest_snapshot_and_stable_actions() {
        let root = render_root(|hooks| hooks.use_map::<u32, u32>(|| None).parts());
        let (first, first_actions) = root.current();

        act(|| first_actions.set(1, 1));

        let (second, second_actions) = root.current();
        assert!(!Snapshot::ptr_eq(&first, &second));
        assert_eq!(first.get(&1), None);
        assert_eq!(second.get(&1), Some(&1));
        assert!(MapActions::ptr_eq(&first_actions, &second_actions));
    }
}
