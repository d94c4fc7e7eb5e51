// ============================================================================
// spark-map-state - Constants
// Flag bits for sources and reactions in the signal graph
// ============================================================================

/// Node holds a value (a signal or a store's snapshot cell)
pub const SOURCE: u32 = 1 << 0;

/// Node re-runs a closure when its sources change
pub const EFFECT: u32 = 1 << 2;

pub const CLEAN: u32 = 1 << 10;

/// A source changed since the last run; the effect is queued or about to be
pub const DIRTY: u32 = 1 << 11;

/// Set while an effect runs and collects its dependencies
pub const REACTION_IS_UPDATING: u32 = 1 << 13;

pub const DESTROYED: u32 = 1 << 14;

/// Clears CLEAN and DIRTY, keeping the type and lifecycle bits
pub const STATUS_MASK: u32 = !(DIRTY | CLEAN);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_do_not_overlap() {
        let flags = [SOURCE, EFFECT, CLEAN, DIRTY, REACTION_IS_UPDATING, DESTROYED];
        let combined = flags.iter().fold(0, |acc, f| {
            assert_eq!(acc & f, 0, "flag {f:#b} overlaps another");
            acc | f
        });
        assert_eq!(combined.count_ones() as usize, flags.len());
    }

    #[test]
    fn status_mask_keeps_lifecycle_bits() {
        let cleared = (EFFECT | DIRTY | DESTROYED) & STATUS_MASK;
        assert_eq!(cleared, EFFECT | DESTROYED);
    }
}
