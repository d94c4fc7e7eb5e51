// ============================================================================
// spark-map-state - Snapshot Store
// Owns the current snapshot and republishes on demand
// ============================================================================
//
// The store is a signal whose equality is snapshot identity. Publishing a new
// instance is always a change, even when its content matches; publishing the
// instance already held is not, and notifies nobody.
// ============================================================================

use std::cell::Cell;
use std::rc::Rc;

use crate::collections::Snapshot;
use crate::core::constants::*;
use crate::primitives::effect::{create_effect, destroy_effect, EffectInner};
use crate::primitives::signal::Signal;
use crate::reactivity::batching::untrack;
use crate::state::options::MapStateOptions;

struct StoreInner<K, V> {
    current: Signal<Snapshot<K, V>>,
    publishes: Cell<u64>,
    options: MapStateOptions,
}

/// Holder of the latest published [`Snapshot`].
///
/// Handles are cheap to clone and all clones address the same store.
pub struct SnapshotStore<K, V> {
    inner: Rc<StoreInner<K, V>>,
}

impl<K, V> Clone for SnapshotStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K: 'static, V: 'static> SnapshotStore<K, V> {
    pub fn new(initial: Snapshot<K, V>, options: MapStateOptions) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                current: Signal::new_with_equals(initial, Snapshot::ptr_eq),
                publishes: Cell::new(0),
                options,
            }),
        }
    }

    /// The latest published snapshot.
    ///
    /// Inside an effect (a render, a subscription) this registers the effect
    /// as a dependent, so the next publish re-runs it.
    pub fn read(&self) -> Snapshot<K, V> {
        self.inner.current.get()
    }

    /// The latest published snapshot, without registering a dependency.
    pub fn peek(&self) -> Snapshot<K, V> {
        self.inner.current.peek()
    }

    /// Replace the current snapshot and notify dependents.
    ///
    /// Returns false (and notifies nobody) when `next` is the instance
    /// already held.
    pub fn publish(&self, next: Snapshot<K, V>) -> bool {
        let len = next.len();
        let accepted = self.inner.current.set(next);

        if accepted {
            let publishes = self.inner.publishes.get() + 1;
            self.inner.publishes.set(publishes);
            tracing::trace!(
                label = self.inner.options.label_str(),
                len,
                publishes,
                "snapshot published"
            );
        } else {
            tracing::trace!(
                label = self.inner.options.label_str(),
                "identical snapshot, publish skipped"
            );
        }

        accepted
    }

    /// Number of accepted publishes since creation.
    pub fn publish_count(&self) -> u64 {
        self.inner.publishes.get()
    }

    pub fn options(&self) -> &MapStateOptions {
        &self.inner.options
    }

    /// Call `callback` with every snapshot published from now on.
    ///
    /// The callback is not called for the snapshot current at subscription
    /// time. Publishes inside a batch are delivered once, with the last
    /// snapshot, when the batch ends.
    ///
    /// A callback that publishes to the same store on every call never
    /// settles and trips the runaway-effect check.
    ///
    /// # Example
    ///
    /// ```
    /// use spark_map_state::create_container;
    /// use std::cell::RefCell;
    /// use std::rc::Rc;
    ///
    /// let state = create_container::<&str, u32>(None);
    /// let sizes = Rc::new(RefCell::new(Vec::new()));
    ///
    /// let subscription = state.store().subscribe({
    ///     let sizes = sizes.clone();
    ///     move |snapshot| sizes.borrow_mut().push(snapshot.len())
    /// });
    ///
    /// state.actions().set("apples", 3);
    /// state.actions().set("pears", 1);
    /// drop(subscription);
    /// state.actions().clear();
    ///
    /// assert_eq!(*sizes.borrow(), vec![1, 2]);
    /// ```
    pub fn subscribe<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(&Snapshot<K, V>) + 'static,
    {
        let store = self.clone();
        let mut primed = false;

        let effect = create_effect(
            EFFECT,
            Box::new(move || {
                let snapshot = store.read();
                if primed {
                    untrack(|| callback(&snapshot));
                } else {
                    primed = true;
                }
                None
            }),
            true,
        );

        tracing::debug!(label = self.inner.options.label_str(), "store subscription attached");
        Subscription {
            effect: Some(effect),
        }
    }
}

impl<K, V> SnapshotStore<K, V> {
    /// True if both handles address the same store.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Guard for a store observer; dropping it detaches the observer.
pub struct Subscription {
    effect: Option<Rc<EffectInner>>,
}

impl Subscription {
    /// Detach now.
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    pub fn is_active(&self) -> bool {
        self.effect.is_some()
    }

    fn detach(&mut self) {
        if let Some(effect) = self.effect.take() {
            destroy_effect(effect);
            tracing::debug!("store subscription detached");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
