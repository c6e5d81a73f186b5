/*! Canonical record serialization.

The canonical form of a record is pretty-printed JSON with:
- two-space indentation and `": "` between keys and values,
- object keys sorted at every depth,
- non-ASCII characters written as-is,
- no trailing newline.

Both the recorder (when writing) and the auditor (when comparing) go through [to_canonical_string],
so there is exactly one way a record can look on disk.
!*/
use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Error;

/// Rebuild objects with their keys in lexicographic order.
///
/// [serde_json::Map] keeps insertion order when `preserve_order` is enabled somewhere in the
/// dependency graph, so the order is enforced here rather than assumed.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            Value::Object(sorted.into_iter().collect::<Map<String, Value>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Serialize anything to its canonical textual form.
pub fn to_canonical_string<T: Serialize>(value: &T) -> Result<String, Error> {
    let value = sort_keys(serde_json::to_value(value)?);
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Is `blob` exactly the canonical form of its own content?
///
/// Returns `false` for content that is not JSON at all.
pub fn is_canonical(blob: &str) -> bool {
    match serde_json::from_str::<Value>(blob) {
        Ok(value) => to_canonical_string(&value).map_or(false, |c| c == blob),
        Err(_) => false,
    }
}
