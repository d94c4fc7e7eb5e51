// ============================================================================
// spark-map-state - Dependency Tracking
// Registering reads and propagating writes through the graph
// ============================================================================
//
// RefCell borrows must be released before mutating neighbours, so every walk
// here follows collect-then-mutate: gather Rcs into a Vec, drop the borrow,
// then touch the collected nodes.
// ============================================================================

use std::rc::Rc;

use crate::core::constants::*;
use crate::core::context::with_context;
use crate::core::types::{AnyReaction, AnySource};
use crate::reactivity::scheduling::schedule_effect;

// =============================================================================
// TRACK READ
// =============================================================================

/// Register `source` as a dependency of the active reaction, if any.
///
/// Called by `Signal::get()` / `Signal::with()` and therefore by
/// `SnapshotStore::read()`.
pub fn track_read(source: Rc<dyn AnySource>) {
    with_context(|ctx| {
        if !ctx.has_active_reaction() || ctx.is_untracking() {
            return;
        }

        let Some(reaction) = ctx.get_active_reaction().and_then(|w| w.upgrade()) else {
            return;
        };

        if (reaction.flags() & REACTION_IS_UPDATING) != 0 {
            // Dedupe repeated reads of the same source within one run
            let read_version = ctx.get_read_version();
            if source.read_version() < read_version {
                source.set_read_version(read_version);
                ctx.add_new_dep(source);
            }
        } else {
            reaction.add_dep(source.clone());
            source.add_reaction(Rc::downgrade(&reaction));
        }
    });
}

// =============================================================================
// NOTIFY WRITE
// =============================================================================

/// Notify the graph that `source` has a new value.
pub fn notify_write(source: Rc<dyn AnySource>) {
    mark_reactions(source, DIRTY);
}

// =============================================================================
// MARK REACTIONS
// =============================================================================

/// Mark every reaction of `source` with `status` and schedule dirty effects.
pub fn mark_reactions(source: Rc<dyn AnySource>, status: u32) {
    source.cleanup_dead_reactions();

    let reactions: Vec<Rc<dyn AnyReaction>> = {
        let mut collected = Vec::new();
        source.for_each_reaction(&mut |reaction| {
            collected.push(reaction);
            true
        });
        collected
    };

    let mut effects_to_schedule = Vec::new();
    for reaction in reactions {
        let flags = reaction.flags();
        if (flags & DESTROYED) != 0 {
            continue;
        }

        if (flags & DIRTY) == 0 {
            set_signal_status(&*reaction, status);
        }

        // Queue even when already dirty: a flush that unwound may have
        // dropped the earlier entry. The flush skips clean duplicates.
        if (flags & EFFECT) != 0 {
            effects_to_schedule.push(reaction);
        }
    }

    for effect in effects_to_schedule {
        schedule_effect(effect);
    }
}

/// Replace the status bits (CLEAN, DIRTY) of a reaction.
pub fn set_signal_status(target: &dyn AnyReaction, status: u32) {
    let new_flags = (target.flags() & STATUS_MASK) | status;
    target.set_flags(new_flags);
}

/// Check if a reaction needs to run.
pub fn is_dirty(reaction: &dyn AnyReaction) -> bool {
    (reaction.flags() & DIRTY) != 0
}

// =============================================================================
// DEPENDENCY CLEANUP
// =============================================================================

/// Detach `reaction` from its dependencies at index `start` and beyond.
pub fn remove_reactions(reaction: Rc<dyn AnyReaction>, start: usize) {
    let deps_to_remove: Vec<Rc<dyn AnySource>> = {
        let mut collected = Vec::new();
        let mut idx = 0;
        reaction.for_each_dep(&mut |dep| {
            if idx >= start {
                collected.push(dep.clone());
            }
            idx += 1;
            true
        });
        collected
    };

    for dep in deps_to_remove {
        dep.remove_reaction(&reaction);
    }

    reaction.remove_deps_from(start);
}

/// Swap the dependencies of `reaction` for those collected during its last run.
pub fn install_dependencies(reaction: Rc<dyn AnyReaction>, new_deps: Vec<Rc<dyn AnySource>>) {
    remove_reactions(reaction.clone(), 0);

    for dep in new_deps {
        reaction.add_dep(dep.clone());
        dep.add_reaction(Rc::downgrade(&reaction));
    }
}
