// ============================================================================
// spark-map-state - Container Options
// ============================================================================

/// When an action whose result equals the current content still publishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PublishPolicy {
    /// Every action publishes a fresh snapshot instance, even deleting an
    /// absent key.
    #[default]
    Always,
    /// Deleting an absent key and clearing an empty snapshot publish nothing.
    SkipNoop,
}

/// Options for a [`MapState`](crate::MapState) container.
///
/// # Example
///
/// ```
/// use spark_map_state::{MapState, MapStateOptions, PublishPolicy};
///
/// let options = MapStateOptions::new()
///     .label("todos")
///     .publish_policy(PublishPolicy::SkipNoop);
///
/// let todos = MapState::<u32, String>::with_options(None, options);
/// let before = todos.snapshot();
/// todos.actions().delete(&7);
/// assert!(spark_map_state::Snapshot::ptr_eq(&before, &todos.snapshot()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MapStateOptions {
    /// Name attached to this container's tracing events
    pub label: Option<String>,
    pub publish_policy: PublishPolicy,
}

impl MapStateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn publish_policy(mut self, policy: PublishPolicy) -> Self {
        self.publish_policy = policy;
        self
    }

    pub(crate) fn label_str(&self) -> &str {
        self.label.as_deref().unwrap_or("map_state")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_always_publish() {
        let options = MapStateOptions::new();
        assert_eq!(options.publish_policy, PublishPolicy::Always);
        assert_eq!(options.label_str(), "map_state");
    }

    #[test]
    fn builder_sets_fields() {
        let options = MapStateOptions::new()
            .label("cart")
            .publish_policy(PublishPolicy::SkipNoop);
        assert_eq!(options.label.as_deref(), Some("cart"));
        assert_eq!(options.publish_policy, PublishPolicy::SkipNoop);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_partial_config() {
        let options: MapStateOptions =
            serde_json::from_str(r#"{ "publish_policy": "skip_noop" }"#).unwrap();
        assert_eq!(options.publish_policy, PublishPolicy::SkipNoop);
        assert_eq!(options.label, None);
    }
}
