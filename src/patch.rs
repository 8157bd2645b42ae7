//! Helpers for partial (PATCH) updates.

use serde::{Deserialize, Deserializer};

/// Deserialize a field that may be absent, null, or set.
///
/// Use with `#[serde(default, deserialize_with = "deserialize_some")]` on an
/// `Option<Option<T>>` field: an absent field is `None`, `null` is `Some(None)`
/// and a value is `Some(Some(value))`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
