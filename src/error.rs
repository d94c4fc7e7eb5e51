// ============================================================================
// spark-map-state - Errors
// ============================================================================

/// Errors surfaced by the container's fallible boundary.
///
/// Typed actions are total; only dynamically-typed input can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapStateError {
    /// The value given to `initialize` is neither a sequence of
    /// `[key, value]` pairs nor a key-value object.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },
}

impl MapStateError {
    #[cfg_attr(not(feature = "serde"), allow(dead_code))]
    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MapStateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_reason() {
        let err = MapStateError::invalid_argument("expected pairs, found a number");
        assert_eq!(
            err.to_string(),
            "invalid argument: expected pairs, found a number"
        );
    }
}
