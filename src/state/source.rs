// ============================================================================
// spark-map-state - Initial Sources
// What a container (or `initialize`) can be built from
// ============================================================================

use std::collections::BTreeMap;
use std::hash::Hash;

use indexmap::IndexMap;

use crate::collections::Snapshot;

/// Source for a container's initial content or for `initialize`.
///
/// Either an ordered list of pairs or an existing snapshot to copy. The
/// resulting snapshot is always a new instance; a source snapshot is never
/// adopted by the store.
#[derive(Debug, Clone)]
pub enum InitSource<K, V> {
    Pairs(Vec<(K, V)>),
    Snapshot(Snapshot<K, V>),
}

impl<K, V> InitSource<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Build a fresh snapshot holding exactly this source's entries, in order.
    pub fn into_snapshot(self) -> Snapshot<K, V> {
        match self {
            InitSource::Pairs(pairs) => pairs.into_iter().collect(),
            InitSource::Snapshot(snapshot) => snapshot.duplicate(),
        }
    }
}

impl<K, V> From<Vec<(K, V)>> for InitSource<K, V> {
    fn from(pairs: Vec<(K, V)>) -> Self {
        InitSource::Pairs(pairs)
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for InitSource<K, V> {
    fn from(pairs: [(K, V); N]) -> Self {
        InitSource::Pairs(pairs.into())
    }
}

impl<K, V> From<Snapshot<K, V>> for InitSource<K, V> {
    fn from(snapshot: Snapshot<K, V>) -> Self {
        InitSource::Snapshot(snapshot)
    }
}

impl<K, V> From<&Snapshot<K, V>> for InitSource<K, V> {
    fn from(snapshot: &Snapshot<K, V>) -> Self {
        InitSource::Snapshot(snapshot.clone())
    }
}

impl<K, V> From<IndexMap<K, V>> for InitSource<K, V> {
    fn from(map: IndexMap<K, V>) -> Self {
        InitSource::Pairs(map.into_iter().collect())
    }
}

impl<K, V> From<BTreeMap<K, V>> for InitSource<K, V> {
    fn from(map: BTreeMap<K, V>) -> Self {
        InitSource::Pairs(map.into_iter().collect())
    }
}

// =============================================================================
// JSON BOUNDARY
// =============================================================================

#[cfg(feature = "serde")]
mod json {
    use serde::de::DeserializeOwned;
    use serde_json::Value;

    use super::InitSource;
    use crate::error::{MapStateError, Result};

    fn kind(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Array(_) => "an array",
            Value::Object(_) => "an object",
        }
    }

    fn decode<T: DeserializeOwned>(value: Value, what: &str, index: usize) -> Result<T> {
        serde_json::from_value(value).map_err(|err| {
            MapStateError::invalid_argument(format!("{what} of entry {index} has the wrong type: {err}"))
        })
    }

    /// Object keys are always strings; a key type that is not a string gets
    /// a second try with the key read as a JSON number or bool, so
    /// `{ "1": .. }` fills a `u32`-keyed container.
    fn decode_key<K: DeserializeOwned>(key: String, index: usize) -> Result<K> {
        let as_string = serde_json::from_value::<K>(Value::String(key.clone()));
        let err = match as_string {
            Ok(key) => return Ok(key),
            Err(err) => err,
        };
        match serde_json::from_str::<Value>(&key) {
            Ok(scalar @ (Value::Number(_) | Value::Bool(_))) => decode(scalar, "key", index),
            _ => Err(MapStateError::invalid_argument(format!(
                "key of entry {index} has the wrong type: {err}"
            ))),
        }
    }

    impl<K, V> TryFrom<Value> for InitSource<K, V>
    where
        K: DeserializeOwned,
        V: DeserializeOwned,
    {
        type Error = MapStateError;

        /// Accepts `[[key, value], ...]` (order kept) or `{ "key": value }`
        /// (document order kept; keys decoded from their string form).
        fn try_from(value: Value) -> Result<Self> {
            match value {
                Value::Array(items) => {
                    let mut pairs = Vec::with_capacity(items.len());
                    for (index, item) in items.into_iter().enumerate() {
                        let pair = match item {
                            Value::Array(pair) => pair,
                            other => {
                                return Err(MapStateError::invalid_argument(format!(
                                    "entry {index} must be a [key, value] pair, found {}",
                                    kind(&other)
                                )));
                            }
                        };
                        let [key, value]: [Value; 2] = pair.try_into().map_err(|pair: Vec<Value>| {
                            MapStateError::invalid_argument(format!(
                                "entry {index} must have exactly 2 elements, found {}",
                                pair.len()
                            ))
                        })?;
                        pairs.push((decode(key, "key", index)?, decode(value, "value", index)?));
                    }
                    Ok(InitSource::Pairs(pairs))
                }
                Value::Object(map) => {
                    let mut pairs = Vec::with_capacity(map.len());
                    for (index, (key, value)) in map.into_iter().enumerate() {
                        pairs.push((
                            decode_key(key, index)?,
                            decode(value, "value", index)?,
                        ));
                    }
                    Ok(InitSource::Pairs(pairs))
                }
                other => Err(MapStateError::invalid_argument(format!(
                    "expected an array of [key, value] pairs or an object, found {}",
                    kind(&other)
                ))),
            }
        }
    }
}
