// ============================================================================
// spark-map-state - Container
// The (snapshot, actions) handle a component holds
// ============================================================================

use std::hash::Hash;

use crate::collections::Snapshot;
use crate::state::actions::MapActions;
use crate::state::options::MapStateOptions;
use crate::state::source::InitSource;
use crate::state::store::{SnapshotStore, Subscription};

/// Reactive key-value state: a store of immutable snapshots plus a stable
/// action set.
///
/// Cloning a `MapState` clones the handle, not the state.
///
/// # Example
///
/// ```
/// use spark_map_state::{create_container, Snapshot};
///
/// let state = create_container::<u32, &str>(Some(vec![(1, "a")].into()));
/// let (before, actions) = state.parts();
///
/// actions.set(2, "b");
///
/// let after = state.snapshot();
/// assert!(!Snapshot::ptr_eq(&before, &after));
/// assert_eq!(before.len(), 1);
/// assert_eq!(after.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
/// ```
pub struct MapState<K, V> {
    store: SnapshotStore<K, V>,
    actions: MapActions<K, V>,
}

impl<K, V> Clone for MapState<K, V> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            actions: self.actions.clone(),
        }
    }
}

impl<K, V> MapState<K, V>
where
    K: Hash + Eq + Clone + 'static,
    V: Clone + 'static,
{
    /// An empty container with default options.
    pub fn new() -> Self {
        Self::with_options(None, MapStateOptions::default())
    }

    pub fn with_options(initial: Option<InitSource<K, V>>, options: MapStateOptions) -> Self {
        let snapshot = initial.map(InitSource::into_snapshot).unwrap_or_default();
        tracing::debug!(
            label = options.label_str(),
            len = snapshot.len(),
            "map state created"
        );

        let store = SnapshotStore::new(snapshot, options);
        let actions = MapActions::new(store.clone());
        Self { store, actions }
    }

    /// The current snapshot (tracked inside effects and renders).
    pub fn snapshot(&self) -> Snapshot<K, V> {
        self.store.read()
    }

    /// The action set; the same object for this container's lifetime.
    pub fn actions(&self) -> &MapActions<K, V> {
        &self.actions
    }

    /// The `(snapshot, actions)` pair.
    pub fn parts(&self) -> (Snapshot<K, V>, MapActions<K, V>) {
        (self.snapshot(), self.actions.clone())
    }

    pub fn store(&self) -> &SnapshotStore<K, V> {
        &self.store
    }

    /// Observe every future publish. See [`SnapshotStore::subscribe`].
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&Snapshot<K, V>) + 'static,
    {
        self.store.subscribe(callback)
    }
}

impl<K, V> Default for MapState<K, V>
where
    K: Hash + Eq + Clone + 'static,
    V: Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for MapState<K, V>
where
    K: std::fmt::Debug + 'static,
    V: std::fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapState")
            .field("snapshot", &self.store.peek())
            .field("actions", &self.actions)
            .finish()
    }
}

/// Create a container, empty when `initial` is `None`.
pub fn create_container<K, V>(initial: Option<InitSource<K, V>>) -> MapState<K, V>
where
    K: Hash + Eq + Clone + 'static,
    V: Clone + 'static,
{
    MapState::with_options(initial, MapStateOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_by_default() {
        let state = create_container::<u32, String>(None);
        assert!(state.snapshot().is_empty());
    }

    #[test]
    fn initial_snapshot_is_copied() {
        let seed: Snapshot<u32, &str> = [(1, "a")].into_iter().collect();
        let state = create_container(Some(InitSource::from(&seed)));

        assert_eq!(state.snapshot(), seed);
        assert!(!Snapshot::ptr_eq(&state.snapshot(), &seed));
    }

    #[test]
    fn reads_without_mutation_keep_identity() {
        let state = create_container::<u32, char>(Some(vec![(1, 'x')].into()));
        assert!(Snapshot::ptr_eq(&state.snapshot(), &state.snapshot()));
    }

    #[test]
    fn clones_share_store_and_actions() {
        let state = MapState::<u32, u32>::new();
        let copy = state.clone();

        copy.actions().set(1, 10);

        assert_eq!(state.snapshot().get(&1), Some(&10));
        assert!(SnapshotStore::ptr_eq(state.store(), copy.store()));
        assert!(MapActions::ptr_eq(state.actions(), copy.actions()));
    }

    #[test]
    fn debug_shows_snapshot() {
        let state = create_container::<u32, &str>(Some(vec![(1, "a")].into()));
        let rendered = format!("{:?}", state);
        assert!(rendered.starts_with(r#"MapState { snapshot: {1: "a"}"#));
    }
}
