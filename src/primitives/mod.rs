// ============================================================================
// spark-map-state - Primitives Module
// Signals and effects: the cells and consumers of the graph
// ============================================================================

pub mod effect;
pub mod signal;

pub use effect::{
    destroy_effect, effect, effect_sync, effect_tracking, effect_with_cleanup, update_effect,
    CleanupFn, EffectFn, EffectInner,
};
pub use signal::{signal, signal_with_equals, Signal};
