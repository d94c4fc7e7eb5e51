// ============================================================================
// spark-map-state - Collections
// Immutable snapshot types published by the store
// ============================================================================

mod snapshot;

pub use snapshot::Snapshot;
