// ============================================================================
// spark-map-state - Hooks
// Per-root state slots, matched to call order
// ============================================================================

use std::any::{type_name, Any};
use std::hash::Hash;

use crate::primitives::signal::Signal;
use crate::reactivity::batching::untrack;
use crate::state::{InitSource, MapState, MapStateOptions};

/// State slots for one render root.
///
/// The n-th `use_*` call of a render always gets the n-th slot, so hooks must
/// be called in the same order on every render. Calling them in a different
/// order, or fewer of them, panics.
pub struct Hooks {
    slots: Vec<Box<dyn Any>>,
    cursor: usize,
    renders: u64,
}

impl Hooks {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            cursor: 0,
            renders: 0,
        }
    }

    pub(crate) fn begin(&mut self) {
        self.cursor = 0;
    }

    pub(crate) fn finish(&mut self) {
        self.renders += 1;
        if self.cursor != self.slots.len() {
            panic!(
                "render called {} hooks but a previous render called {}; hooks must be called in the same order on every render",
                self.cursor,
                self.slots.len()
            );
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.cursor = 0;
    }

    /// Number of slots allocated so far.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn use_slot<T: 'static>(&mut self, init: impl FnOnce() -> T) -> &T {
        let index = self.cursor;
        self.cursor += 1;

        if index == self.slots.len() {
            if self.renders > 0 {
                panic!(
                    "hook {index} was not called on the first render; hooks must be called in the same order on every render"
                );
            }
            // Slot initializers must not subscribe the render to anything
            let value = untrack(init);
            self.slots.push(Box::new(value));
        }

        match self.slots[index].downcast_ref::<T>() {
            Some(value) => value,
            None => panic!(
                "hook {index} changed to {} between renders; hooks must be called in the same order on every render",
                type_name::<T>()
            ),
        }
    }

    /// A key-value container owned by this root.
    ///
    /// `init` runs on the first render only. Every later render returns the
    /// same container; its snapshot is whatever was last published.
    pub fn use_map<K, V>(&mut self, init: impl FnOnce() -> Option<InitSource<K, V>>) -> MapState<K, V>
    where
        K: Hash + Eq + Clone + 'static,
        V: Clone + 'static,
    {
        self.use_map_with_options(init, MapStateOptions::default)
    }

    /// [`use_map`](Self::use_map) with explicit options, built on the first
    /// render only.
    pub fn use_map_with_options<K, V>(
        &mut self,
        init: impl FnOnce() -> Option<InitSource<K, V>>,
        options: impl FnOnce() -> MapStateOptions,
    ) -> MapState<K, V>
    where
        K: Hash + Eq + Clone + 'static,
        V: Clone + 'static,
    {
        self.use_slot(|| MapState::with_options(init(), options()))
            .clone()
    }

    /// A plain signal owned by this root.
    pub fn use_signal<T: PartialEq + 'static>(&mut self, init: impl FnOnce() -> T) -> Signal<T> {
        self.use_slot(|| Signal::new(init())).clone()
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("slots", &self.slots.len())
            .field("renders", &self.renders)
            .finish()
    }
}
