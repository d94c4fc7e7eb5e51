// ============================================================================
// spark-map-state - Reactive Context
// Per-thread bookkeeping for the running effect, batches and the flush queue
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::types::{AnyReaction, AnySource};

/// What the signal graph needs to know about "now" on this thread.
///
/// Containers, effects and render roots are `!Send`; each thread gets its
/// own context and its own graph.
pub struct ReactiveContext {
    /// The effect whose reads are being recorded, if any
    pub active_reaction: RefCell<Option<Weak<dyn AnyReaction>>>,
    pub untracking: Cell<bool>,
    /// Bumped once per effect run; a source read twice in one run is
    /// recorded once
    pub read_version: Cell<u32>,
    pub new_deps: RefCell<Vec<Rc<dyn AnySource>>>,
    pub batch_depth: Cell<u32>,
    /// Effects marked dirty and waiting for the next flush
    pub pending_reactions: RefCell<Vec<Weak<dyn AnyReaction>>>,
    pub is_flushing_sync: Cell<bool>,
}

impl ReactiveContext {
    pub fn new() -> Self {
        Self {
            active_reaction: RefCell::new(None),
            untracking: Cell::new(false),
            read_version: Cell::new(0),
            new_deps: RefCell::new(Vec::new()),
            batch_depth: Cell::new(0),
            pending_reactions: RefCell::new(Vec::new()),
            is_flushing_sync: Cell::new(false),
        }
    }

    /// Install `reaction` as the recording effect, handing back the previous one.
    pub fn set_active_reaction(
        &self,
        reaction: Option<Weak<dyn AnyReaction>>,
    ) -> Option<Weak<dyn AnyReaction>> {
        self.active_reaction.replace(reaction)
    }

    pub fn get_active_reaction(&self) -> Option<Weak<dyn AnyReaction>> {
        self.active_reaction.borrow().clone()
    }

    pub fn has_active_reaction(&self) -> bool {
        self.active_reaction.borrow().is_some()
    }

    pub fn set_untracking(&self, value: bool) -> bool {
        self.untracking.replace(value)
    }

    pub fn is_untracking(&self) -> bool {
        self.untracking.get()
    }

    pub fn increment_read_version(&self) -> u32 {
        let v = self.read_version.get() + 1;
        self.read_version.set(v);
        v
    }

    pub fn get_read_version(&self) -> u32 {
        self.read_version.get()
    }

    pub fn swap_new_deps(&self, deps: Vec<Rc<dyn AnySource>>) -> Vec<Rc<dyn AnySource>> {
        self.new_deps.replace(deps)
    }

    pub fn add_new_dep(&self, source: Rc<dyn AnySource>) {
        self.new_deps.borrow_mut().push(source);
    }

    /// Returns the depth after entering.
    pub fn enter_batch(&self) -> u32 {
        let depth = self.batch_depth.get() + 1;
        self.batch_depth.set(depth);
        depth
    }

    /// Returns the depth after leaving; never goes below zero.
    pub fn exit_batch(&self) -> u32 {
        let depth = self.batch_depth.get().saturating_sub(1);
        self.batch_depth.set(depth);
        depth
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth.get() > 0
    }

    pub fn add_pending_reaction(&self, reaction: Weak<dyn AnyReaction>) {
        self.pending_reactions.borrow_mut().push(reaction);
    }

    pub fn take_pending_reactions(&self) -> Vec<Weak<dyn AnyReaction>> {
        self.pending_reactions.take()
    }

    pub fn set_flushing_sync(&self, value: bool) -> bool {
        self.is_flushing_sync.replace(value)
    }

    pub fn is_flushing_sync(&self) -> bool {
        self.is_flushing_sync.get()
    }
}

impl Default for ReactiveContext {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static CONTEXT: ReactiveContext = ReactiveContext::new();
}

pub fn with_context<R>(f: impl FnOnce(&ReactiveContext) -> R) -> R {
    CONTEXT.with(f)
}

/// True inside a running effect, outside any `untrack`.
pub fn is_tracking() -> bool {
    with_context(|ctx| ctx.has_active_reaction() && !ctx.is_untracking())
}

pub fn is_batching() -> bool {
    with_context(|ctx| ctx.is_batching())
}
