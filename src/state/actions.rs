// ============================================================================
// spark-map-state - Action Set
// The four mutations, built once per container
// ============================================================================
//
// Each action closes over the store handle, never over a snapshot. Reading
// `store.peek()` at call time is what lets two actions issued back to back
// compose: the second derives from the snapshot the first published.
// ============================================================================

use std::hash::Hash;
use std::rc::Rc;

use crate::collections::Snapshot;
use crate::state::options::PublishPolicy;
use crate::state::source::InitSource;
use crate::state::store::SnapshotStore;

pub type SetFn<K, V> = Rc<dyn Fn(K, V)>;
pub type DeleteFn<K> = Rc<dyn Fn(&K)>;
pub type InitializeFn<K, V> = Rc<dyn Fn(InitSource<K, V>)>;
pub type ClearFn = Rc<dyn Fn()>;

struct ActionsInner<K, V> {
    set: SetFn<K, V>,
    delete: DeleteFn<K>,
    initialize: InitializeFn<K, V>,
    clear: ClearFn,
}

/// The mutation half of a container.
///
/// Every clone of a container's `MapActions` is the same object, and the
/// function handles it hands out (`set_fn()` and friends) are the same
/// `Rc`s for the container's whole life. Pass them to memoized children
/// freely; they never look "changed".
pub struct MapActions<K, V> {
    inner: Rc<ActionsInner<K, V>>,
}

impl<K, V> Clone for MapActions<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> MapActions<K, V>
where
    K: Hash + Eq + Clone + 'static,
    V: Clone + 'static,
{
    /// Build the action set for `store`.
    pub fn new(store: SnapshotStore<K, V>) -> Self {
        let policy = store.options().publish_policy;

        let set: SetFn<K, V> = {
            let store = store.clone();
            Rc::new(move |key: K, value: V| {
                let next = store.peek().with_entry(key, value);
                store.publish(next);
            })
        };

        let delete: DeleteFn<K> = {
            let store = store.clone();
            Rc::new(move |key: &K| {
                let current = store.peek();
                if policy == PublishPolicy::SkipNoop && !current.contains_key(key) {
                    tracing::trace!(label = store.options().label_str(), "delete of absent key skipped");
                    return;
                }
                store.publish(current.without(key));
            })
        };

        let initialize: InitializeFn<K, V> = {
            let store = store.clone();
            Rc::new(move |source: InitSource<K, V>| {
                let next = source.into_snapshot();
                tracing::debug!(
                    label = store.options().label_str(),
                    len = next.len(),
                    "initializing from source"
                );
                store.publish(next);
            })
        };

        let clear: ClearFn = Rc::new(move || {
            if policy == PublishPolicy::SkipNoop && store.peek().is_empty() {
                tracing::trace!(label = store.options().label_str(), "clear of empty snapshot skipped");
                return;
            }
            store.publish(Snapshot::new());
        });

        Self {
            inner: Rc::new(ActionsInner {
                set,
                delete,
                initialize,
                clear,
            }),
        }
    }

    /// Bind `key` to `value`. An existing key keeps its position.
    pub fn set(&self, key: K, value: V) {
        (self.inner.set)(key, value)
    }

    /// Remove `key`. Deleting an absent key still publishes a fresh
    /// snapshot under [`PublishPolicy::Always`].
    pub fn delete(&self, key: &K) {
        (self.inner.delete)(key)
    }

    /// Replace all content with `source`, keeping its order.
    pub fn initialize(&self, source: impl Into<InitSource<K, V>>) {
        (self.inner.initialize)(source.into())
    }

    /// Remove every entry.
    pub fn clear(&self) {
        (self.inner.clear)()
    }

    /// Parse `value` as a source and initialize from it.
    ///
    /// # Errors
    ///
    /// [`MapStateError::InvalidArgument`](crate::MapStateError::InvalidArgument)
    /// when `value` is not an array of `[key, value]` pairs or an object, or an
    /// entry does not decode to `K`/`V`. The current snapshot is untouched.
    #[cfg(feature = "serde")]
    pub fn try_initialize_json(&self, value: serde_json::Value) -> crate::error::Result<()>
    where
        K: serde::de::DeserializeOwned,
        V: serde::de::DeserializeOwned,
    {
        let source = InitSource::try_from(value)?;
        self.initialize(source);
        Ok(())
    }
}

impl<K, V> MapActions<K, V> {
    pub fn set_fn(&self) -> SetFn<K, V> {
        self.inner.set.clone()
    }

    pub fn delete_fn(&self) -> DeleteFn<K> {
        self.inner.delete.clone()
    }

    pub fn initialize_fn(&self) -> InitializeFn<K, V> {
        self.inner.initialize.clone()
    }

    pub fn clear_fn(&self) -> ClearFn {
        self.inner.clear.clone()
    }

    /// True if both handles are the same action set.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }
}

impl<K, V> std::fmt::Debug for MapActions<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapActions")
            .field("id", &Rc::as_ptr(&self.inner))
            .finish_non_exhaustive()
    }
}
