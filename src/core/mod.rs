// ============================================================================
// spark-map-state - Core Module
// Flags, graph traits, and the thread-local context
// ============================================================================

pub mod constants;
pub mod context;
pub mod types;

pub use constants::*;
pub use context::{is_batching, is_tracking, with_context, ReactiveContext};
pub use types::{default_equals, AnyReaction, AnySource, EqualsFn, SourceInner};
