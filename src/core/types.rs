// ============================================================================
// spark-map-state - Type Definitions
// Type-erased graph traits and the source cell behind Signal<T>
// ============================================================================

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::constants::*;

// =============================================================================
// TYPE-ERASED TRAITS
// =============================================================================
//
// Graph bookkeeping (dirty marking, version checks, dependency lists) never
// needs the value type. A store holding Snapshot<u32, String> and a signal
// holding a bool can sit in the same Vec<Rc<dyn AnySource>>.
// =============================================================================

/// Type-erased source interface for graph operations.
pub trait AnySource: Any {
    fn flags(&self) -> u32;

    fn set_flags(&self, flags: u32);

    /// Write version (bumped whenever the value is replaced)
    fn write_version(&self) -> u32;

    /// Read version (dedupes repeated reads within one reaction run)
    fn read_version(&self) -> u32;

    fn set_read_version(&self, version: u32);

    /// Number of reactions depending on this source
    fn reaction_count(&self) -> usize;

    fn add_reaction(&self, reaction: Weak<dyn AnyReaction>);

    /// Drop weak entries whose reaction is gone
    fn cleanup_dead_reactions(&self);

    /// Visit live reactions; the callback returns false to stop.
    fn for_each_reaction(&self, f: &mut dyn FnMut(Rc<dyn AnyReaction>) -> bool);

    /// Remove a specific reaction (pointer identity)
    fn remove_reaction(&self, reaction: &Rc<dyn AnyReaction>);

    fn is_dirty(&self) -> bool {
        self.flags() & DIRTY != 0
    }

    fn is_clean(&self) -> bool {
        self.flags() & CLEAN != 0
    }

    fn mark_dirty(&self) {
        self.set_flags((self.flags() & STATUS_MASK) | DIRTY);
    }

    fn mark_clean(&self) {
        self.set_flags((self.flags() & STATUS_MASK) | CLEAN);
    }

    fn as_any(&self) -> &dyn Any;
}

/// Type-erased reaction interface for scheduling and updates.
///
/// Implemented by `EffectInner`, which backs render effects and store
/// subscriptions.
pub trait AnyReaction: Any {
    fn flags(&self) -> u32;

    fn set_flags(&self, flags: u32);

    fn dep_count(&self) -> usize;

    /// Add a dependency (a source this reaction reads from)
    fn add_dep(&self, source: Rc<dyn AnySource>);

    /// Remove dependencies starting from index
    fn remove_deps_from(&self, start: usize);

    fn for_each_dep(&self, f: &mut dyn FnMut(&Rc<dyn AnySource>) -> bool);

    /// Run the reaction
    fn update(&self);

    fn is_effect(&self) -> bool {
        self.flags() & EFFECT != 0
    }

    fn is_dirty(&self) -> bool {
        self.flags() & DIRTY != 0
    }

    fn is_clean(&self) -> bool {
        self.flags() & CLEAN != 0
    }

    fn is_destroyed(&self) -> bool {
        self.flags() & DESTROYED != 0
    }

    fn mark_dirty(&self) {
        self.set_flags((self.flags() & STATUS_MASK) | DIRTY);
    }

    fn mark_clean(&self) {
        self.set_flags((self.flags() & STATUS_MASK) | CLEAN);
    }

    fn as_any(&self) -> &dyn Any;
}

// =============================================================================
// SOURCE INNER (the data behind Signal<T>)
// =============================================================================

/// Equality function deciding whether a write is a change
pub type EqualsFn<T> = fn(&T, &T) -> bool;

/// Default equality using PartialEq
pub fn default_equals<T: PartialEq>(a: &T, b: &T) -> bool {
    a == b
}

/// The value cell of a signal.
///
/// Kept separate from `Signal<T>` so `Rc<SourceInner<T>>` can be stored as
/// `Rc<dyn AnySource>`.
pub struct SourceInner<T> {
    flags: Cell<u32>,

    value: RefCell<T>,

    write_version: Cell<u32>,

    read_version: Cell<u32>,

    /// Weak refs so a dropped render root does not leak through the store
    reactions: RefCell<Vec<Weak<dyn AnyReaction>>>,

    equals: EqualsFn<T>,
}

impl<T> SourceInner<T> {
    pub fn new(value: T) -> Self
    where
        T: PartialEq,
    {
        Self::new_with_equals(value, default_equals)
    }

    pub fn new_with_equals(value: T, equals: EqualsFn<T>) -> Self {
        Self {
            flags: Cell::new(SOURCE | CLEAN),
            value: RefCell::new(value),
            write_version: Cell::new(0),
            read_version: Cell::new(0),
            reactions: RefCell::new(Vec::new()),
            equals,
        }
    }

    /// Get the current value (cloning)
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Replace the value, returning true if it changed
    pub fn set(&self, value: T) -> bool {
        let changed = {
            let current = self.value.borrow();
            !(self.equals)(&current, &value)
        };

        if changed {
            *self.value.borrow_mut() = value;
            self.write_version.set(self.write_version.get() + 1);
        }

        changed
    }

    /// Mutate in place. Returns true if anything is listening.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        {
            let mut current = self.value.borrow_mut();
            f(&mut current);
        }

        let has_reactions = !self.reactions.borrow().is_empty();
        if has_reactions {
            self.write_version.set(self.write_version.get() + 1);
        }
        has_reactions
    }
}

impl<T: 'static> AnySource for SourceInner<T> {
    fn flags(&self) -> u32 {
        self.flags.get()
    }

    fn set_flags(&self, flags: u32) {
        self.flags.set(flags);
    }

    fn write_version(&self) -> u32 {
        self.write_version.get()
    }

    fn read_version(&self) -> u32 {
        self.read_version.get()
    }

    fn set_read_version(&self, version: u32) {
        self.read_version.set(version);
    }

    fn reaction_count(&self) -> usize {
        self.reactions.borrow().len()
    }

    fn add_reaction(&self, reaction: Weak<dyn AnyReaction>) {
        self.reactions.borrow_mut().push(reaction);
    }

    fn cleanup_dead_reactions(&self) {
        self.reactions.borrow_mut().retain(|w| w.strong_count() > 0);
    }

    fn for_each_reaction(&self, f: &mut dyn FnMut(Rc<dyn AnyReaction>) -> bool) {
        let reactions = self.reactions.borrow();
        for weak in reactions.iter() {
            if let Some(rc) = weak.upgrade() {
                if !f(rc) {
                    break;
                }
            }
        }
    }

    fn remove_reaction(&self, reaction: &Rc<dyn AnyReaction>) {
        let target = Rc::as_ptr(reaction) as *const ();
        self.reactions.borrow_mut().retain(|weak| match weak.upgrade() {
            Some(rc) => Rc::as_ptr(&rc) as *const () != target,
            None => false,
        });
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
