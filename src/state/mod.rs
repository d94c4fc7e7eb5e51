// ============================================================================
// spark-map-state - State Container
// Snapshot store + stable action set
// ============================================================================
//
// Control flow for every mutation:
//
//   action(..) -> store.peek() -> derive new Snapshot -> store.publish(next)
//              -> dependents marked dirty -> render / subscribers re-run
//              -> next store.read() returns `next`
// ============================================================================

pub mod actions;
pub mod container;
pub mod options;
pub mod source;
pub mod store;

pub use actions::{ClearFn, DeleteFn, InitializeFn, MapActions, SetFn};
pub use container::{create_container, MapState};
pub use options::{MapStateOptions, PublishPolicy};
pub use source::InitSource;
pub use store::{SnapshotStore, Subscription};
