// ============================================================================
// spark-map-state - Effect System
// Side effects that re-run when the sources they read change
// ============================================================================
//
// Effects are the consumers of the graph. A render root is one effect; a
// store subscription is another. Each run rebuilds the dependency list from
// scratch, so a render that stops reading a store stops being notified by it.
// ============================================================================

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::core::constants::*;
use crate::core::context::{is_batching, with_context};
use crate::core::types::{AnyReaction, AnySource};
use crate::reactivity::scheduling::{flush_sync, schedule_effect, FlushGuard};
use crate::reactivity::tracking::{install_dependencies, remove_reactions, set_signal_status};

/// Cleanup function returned by effects, runs before next execution
pub type CleanupFn = Box<dyn FnOnce()>;

/// Effect function signature - returns optional cleanup
pub type EffectFn = Box<dyn FnMut() -> Option<CleanupFn>>;

// =============================================================================
// EFFECT INNER
// =============================================================================

/// The node behind every effect.
///
/// Implements `AnyReaction` only; effects have no value and no dependents.
pub struct EffectInner {
    flags: Cell<u32>,

    func: RefCell<Option<EffectFn>>,

    deps: RefCell<Vec<Rc<dyn AnySource>>>,

    /// Cleanup from the last run
    teardown: RefCell<Option<CleanupFn>>,

    /// Set right after the Rc is created
    self_weak: RefCell<Weak<EffectInner>>,
}

impl EffectInner {
    pub fn new(effect_type: u32, func: Option<EffectFn>) -> Rc<Self> {
        let effect = Rc::new(Self {
            flags: Cell::new(effect_type | DIRTY),
            func: RefCell::new(func),
            deps: RefCell::new(Vec::new()),
            teardown: RefCell::new(None),
            self_weak: RefCell::new(Weak::new()),
        });

        *effect.self_weak.borrow_mut() = Rc::downgrade(&effect);

        effect
    }

    /// This effect as a weak trait object, for the active-reaction slot
    pub fn as_weak_reaction(&self) -> Weak<dyn AnyReaction> {
        match self.self_weak.borrow().upgrade() {
            Some(rc) => Rc::downgrade(&(rc as Rc<dyn AnyReaction>)),
            None => Weak::<EffectInner>::new() as Weak<dyn AnyReaction>,
        }
    }
}

impl Drop for EffectInner {
    fn drop(&mut self) {
        if let Some(cleanup) = self.teardown.get_mut().take() {
            cleanup();
        }
    }
}

impl AnyReaction for EffectInner {
    fn flags(&self) -> u32 {
        self.flags.get()
    }

    fn set_flags(&self, flags: u32) {
        self.flags.set(flags);
    }

    fn dep_count(&self) -> usize {
        self.deps.borrow().len()
    }

    fn add_dep(&self, source: Rc<dyn AnySource>) {
        self.deps.borrow_mut().push(source);
    }

    fn remove_deps_from(&self, start: usize) {
        self.deps.borrow_mut().truncate(start);
    }

    fn for_each_dep(&self, f: &mut dyn FnMut(&Rc<dyn AnySource>) -> bool) {
        for dep in self.deps.borrow().iter() {
            if !f(dep) {
                break;
            }
        }
    }

    fn update(&self) {
        if (self.flags.get() & DESTROYED) != 0 {
            return;
        }

        let rc_self = self.self_weak.borrow().upgrade();
        if let Some(rc_self) = rc_self {
            update_effect(&rc_self);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// RUN / DESTROY
// =============================================================================

/// Run an effect's teardown function
pub(crate) fn execute_teardown(effect: &EffectInner) {
    let teardown = effect.teardown.borrow_mut().take();
    if let Some(cleanup) = teardown {
        cleanup();
    }
}

/// Destroy an effect: detach from sources, run teardown, drop the closure.
pub fn destroy_effect(effect: Rc<EffectInner>) {
    if (effect.flags.get() & DESTROYED) != 0 {
        return;
    }

    remove_reactions(effect.clone() as Rc<dyn AnyReaction>, 0);
    effect.set_flags(effect.flags() | DESTROYED);
    execute_teardown(&effect);

    *effect.func.borrow_mut() = None;
    effect.deps.borrow_mut().clear();
}

/// The active-reaction slot and dependency buffer for one effect run.
///
/// `finish` hands back the collected dependencies; dropping the scope without
/// finishing (the effect panicked) discards them. Either way the context is
/// left as it was before the run.
struct RunScope<'a> {
    effect: &'a EffectInner,
    prev_reaction: Option<Weak<dyn AnyReaction>>,
    prev_deps: Option<Vec<Rc<dyn AnySource>>>,
}

impl<'a> RunScope<'a> {
    fn enter(effect: &'a EffectInner) -> Self {
        let (prev_reaction, prev_deps) = with_context(|ctx| {
            let prev_reaction = ctx.set_active_reaction(Some(effect.as_weak_reaction()));
            ctx.increment_read_version();
            (prev_reaction, ctx.swap_new_deps(Vec::new()))
        });
        effect.set_flags(effect.flags() | REACTION_IS_UPDATING);

        Self {
            effect,
            prev_reaction,
            prev_deps: Some(prev_deps),
        }
    }

    fn restore(&mut self) -> Vec<Rc<dyn AnySource>> {
        self.effect
            .set_flags(self.effect.flags() & !REACTION_IS_UPDATING);
        let prev_deps = self.prev_deps.take().unwrap_or_default();
        let prev_reaction = self.prev_reaction.take();
        with_context(|ctx| {
            ctx.set_active_reaction(prev_reaction);
            ctx.swap_new_deps(prev_deps)
        })
    }

    fn finish(mut self) -> Vec<Rc<dyn AnySource>> {
        self.restore()
    }
}

impl Drop for RunScope<'_> {
    fn drop(&mut self) {
        if self.prev_deps.is_some() {
            self.restore();
        }
    }
}

/// Run an effect and rebuild its dependency list.
pub fn update_effect(effect: &Rc<EffectInner>) {
    if (effect.flags.get() & DESTROYED) != 0 {
        return;
    }

    set_signal_status(&**effect, CLEAN);
    execute_teardown(effect);

    let scope = RunScope::enter(effect);
    let teardown = {
        let mut func_borrow = effect.func.borrow_mut();
        match func_borrow.as_mut() {
            Some(func) => func(),
            None => None,
        }
    };
    let new_deps = scope.finish();

    install_dependencies(effect.clone() as Rc<dyn AnyReaction>, new_deps);
    *effect.teardown.borrow_mut() = teardown;
}

/// Run an effect immediately with the flush flag held, then drain whatever
/// it queued.
fn run_now(effect: &Rc<EffectInner>) {
    let was_flushing = {
        let guard = FlushGuard::enter();
        update_effect(effect);
        guard.was_flushing()
    };

    if !was_flushing && !is_batching() {
        flush_sync();
    }
}

/// Create an effect node.
///
/// `sync` effects run before this returns; others are scheduled and run
/// right away unless a batch is open.
pub(crate) fn create_effect(effect_type: u32, func: EffectFn, sync: bool) -> Rc<EffectInner> {
    let effect = EffectInner::new(effect_type, Some(func));

    if sync {
        run_now(&effect);
    } else {
        schedule_effect(effect.clone());
    }

    effect
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Create an effect that re-runs whenever a source it read changes.
///
/// Returns a dispose function.
///
/// # Example
///
/// ```
/// use spark_map_state::{effect, signal};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let count = signal(0);
/// let seen = Rc::new(Cell::new(-1));
///
/// let dispose = effect({
///     let (count, seen) = (count.clone(), seen.clone());
///     move || seen.set(count.get())
/// });
/// assert_eq!(seen.get(), 0);
///
/// count.set(3);
/// assert_eq!(seen.get(), 3);
///
/// dispose();
/// count.set(4);
/// assert_eq!(seen.get(), 3);
/// ```
pub fn effect<F>(mut f: F) -> impl FnOnce()
where
    F: FnMut() + 'static,
{
    effect_with_cleanup(move || {
        f();
        None
    })
}

/// Create an effect whose run may return a cleanup.
///
/// The cleanup runs before the next run and on dispose.
pub fn effect_with_cleanup<F>(f: F) -> impl FnOnce()
where
    F: FnMut() -> Option<CleanupFn> + 'static,
{
    let effect = create_effect(EFFECT, Box::new(f), false);
    move || destroy_effect(effect)
}

/// Create an effect that runs before this call returns, even inside a batch.
pub fn effect_sync<F>(mut f: F) -> impl FnOnce()
where
    F: FnMut() + 'static,
{
    let effect = create_effect(
        EFFECT,
        Box::new(move || {
            f();
            None
        }),
        true,
    );
    move || destroy_effect(effect)
}

/// Check if we're currently inside a running effect.
pub fn effect_tracking() -> bool {
    with_context(|ctx| ctx.has_active_reaction())
}
