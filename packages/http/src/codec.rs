//! Parameter and header encoding.
//!
//! Request-scoped and endpoint-scoped sets are encoded independently into
//! records and merged with request-scoped values winning. Header names
//! collide regardless of ASCII case.

use netkit_value::{to_flat_string, to_record, Map};
use serde::Serialize;
use tracing::trace;

use crate::error::LocalError;

/// Encode a parameter or header set into a record.
pub fn encode_parameters<T: ?Sized + Serialize>(value: &T) -> Result<Map, LocalError> {
    Ok(to_record(value)?)
}

/// Key union of two records. On collision the request-scoped value is kept.
pub fn merge(request: Map, persistent: Map) -> Map {
    request.merged_over(persistent)
}

/// Encode both sets and merge them.
pub fn encode_merged<A, B>(request: &A, persistent: &B) -> Result<Map, LocalError>
where
    A: ?Sized + Serialize,
    B: ?Sized + Serialize,
{
    let request = encode_parameters(request)?;
    let persistent = encode_parameters(persistent)?;
    let merged = merge(request, persistent);
    trace!(keys = ?merged.keys().collect::<Vec<_>>(), "merged parameter set");
    Ok(merged)
}

/// Like [`merge`], but keys that differ only in ASCII case collide, as
/// header names do. The request-scoped spelling is the one kept.
pub fn merge_headers(request: Map, persistent: Map) -> Map {
    let persistent: Map = persistent
        .into_iter()
        .filter(|(name, _)| !request.keys().any(|key| key.eq_ignore_ascii_case(name)))
        .collect();
    request.merged_over(persistent)
}

/// Encode both header sets and merge them case-insensitively.
pub fn encode_merged_headers<A, B>(request: &A, persistent: &B) -> Result<Map, LocalError>
where
    A: ?Sized + Serialize,
    B: ?Sized + Serialize,
{
    let request = encode_parameters(request)?;
    let persistent = encode_parameters(persistent)?;
    let merged = merge_headers(request, persistent);
    trace!(names = ?merged.keys().collect::<Vec<_>>(), "merged header set");
    Ok(merged)
}

/// Render a record as flat string pairs for query items and headers.
/// Null entries are skipped.
pub fn flatten(map: &Map) -> Result<Vec<(String, String)>, LocalError> {
    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map.iter() {
        if let Some(text) = to_flat_string(value)? {
            pairs.push((key.to_string(), text));
        }
    }
    Ok(pairs)
}
