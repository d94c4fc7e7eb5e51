// ============================================================================
// spark-map-state - Effect Scheduling
// Queueing dirty effects and draining the queue synchronously
// ============================================================================
//
// There is no microtask queue in a render loop, so a write outside a batch
// drains pending effects before returning. Inside a batch the queue is left
// for the outermost batch exit.
// ============================================================================

use std::rc::Rc;

use crate::core::constants::*;
use crate::core::context::with_context;
use crate::core::types::AnyReaction;
use crate::reactivity::tracking::is_dirty;

/// Maximum flush iterations before we consider it an infinite loop
pub(crate) const MAX_FLUSH_COUNT: u32 = 1000;

/// Queue an effect and flush right away unless batching or already flushing.
pub fn schedule_effect(effect: Rc<dyn AnyReaction>) {
    let should_flush = with_context(|ctx| {
        ctx.add_pending_reaction(Rc::downgrade(&effect));
        !ctx.is_batching() && !ctx.is_flushing_sync()
    });

    if should_flush {
        flush_sync();
    }
}

/// Holds the flushing flag; the previous value is restored on drop, unwinding
/// included.
pub(crate) struct FlushGuard {
    was_flushing: bool,
}

impl FlushGuard {
    pub(crate) fn enter() -> Self {
        let was_flushing = with_context(|ctx| ctx.set_flushing_sync(true));
        Self { was_flushing }
    }

    pub(crate) fn was_flushing(&self) -> bool {
        self.was_flushing
    }
}

impl Drop for FlushGuard {
    fn drop(&mut self) {
        let was = self.was_flushing;
        with_context(|ctx| ctx.set_flushing_sync(was));
    }
}

/// Synchronously run every pending effect, including effects that become
/// dirty while the queue is being drained.
///
/// # Panics
///
/// Panics with "Maximum update depth exceeded" when effects keep
/// re-triggering each other for more than `MAX_FLUSH_COUNT` rounds.
pub fn flush_sync() {
    let _guard = FlushGuard::enter();

    let mut flush_count = 0u32;
    loop {
        let pending = with_context(|ctx| ctx.take_pending_reactions());
        if pending.is_empty() {
            break;
        }

        flush_count += 1;
        if flush_count > MAX_FLUSH_COUNT {
            tracing::warn!(rounds = flush_count, "effect flush did not settle");
            panic!(
                "Maximum update depth exceeded. This can happen when an effect \
                 continuously triggers itself, e.g. a subscriber that publishes \
                 on every notification."
            );
        }

        for reaction_weak in pending {
            let Some(reaction) = reaction_weak.upgrade() else {
                continue;
            };

            let flags = reaction.flags();
            if (flags & DESTROYED) != 0 || (flags & EFFECT) == 0 {
                continue;
            }

            if is_dirty(&*reaction) {
                reaction.update();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::effect::EffectInner;
    use std::cell::Cell;

    fn counting_effect(count: Rc<Cell<u32>>) -> Rc<EffectInner> {
        EffectInner::new(
            EFFECT,
            Some(Box::new(move || {
                count.set(count.get() + 1);
                None
            })),
        )
    }

    #[test]
    fn flush_sync_runs_pending_effects() {
        let run_count = Rc::new(Cell::new(0));
        let effect = counting_effect(run_count.clone());

        with_context(|ctx| {
            ctx.add_pending_reaction(Rc::downgrade(&(effect.clone() as Rc<dyn AnyReaction>)));
        });
        assert_eq!(run_count.get(), 0);

        flush_sync();
        assert_eq!(run_count.get(), 1);
    }

    #[test]
    fn schedule_inside_batch_waits_for_flush() {
        let run_count = Rc::new(Cell::new(0));
        let effect = counting_effect(run_count.clone());

        with_context(|ctx| ctx.enter_batch());
        schedule_effect(effect.clone());
        assert_eq!(run_count.get(), 0);

        with_context(|ctx| ctx.exit_batch());
        flush_sync();
        assert_eq!(run_count.get(), 1);
    }

    #[test]
    fn flush_guard_restores_flag_on_panic() {
        let result = std::panic::catch_unwind(|| {
            let _guard = FlushGuard::enter();
            panic!("effect failed");
        });

        assert!(result.is_err());
        assert!(!with_context(|ctx| ctx.is_flushing_sync()));
    }

    #[test]
    fn destroyed_effects_are_skipped() {
        let run_count = Rc::new(Cell::new(0));
        let effect = counting_effect(run_count.clone());
        effect.set_flags(effect.flags() | DESTROYED);

        schedule_effect(effect.clone());
        assert_eq!(run_count.get(), 0);
    }
}
