// ============================================================================
// spark-map-state - Reactivity Module
// Dependency tracking, effect scheduling, and batching
// ============================================================================

pub mod batching;
pub mod scheduling;
pub mod tracking;

pub use batching::{batch, peek, tick, untrack};
pub use scheduling::{flush_sync, schedule_effect};
pub use tracking::{
    install_dependencies, is_dirty, mark_reactions, notify_write, remove_reactions,
    set_signal_status, track_read,
};
