//! Cache key derivation.
//!
//! A key is `prefix + "_" + hex(sha256(canonical_json(params)))`. The
//! canonical form writes object keys in sorted order at every depth, so two
//! structurally equal parameter sets map to the same key however they were
//! built.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::StoreError;

/// Serialise `value` to JSON with object keys sorted at every level.
///
/// # Errors
/// `StoreError::Serialization` when `value` is not representable as JSON
/// (for instance a map with non-string keys).
///
/// # Examples
/// ```
/// use std::collections::HashMap;
/// use infra_store::canonical_json;
///
/// let mut params = HashMap::new();
/// params.insert("time_filter", vec!["09:15"]);
/// params.insert("r", vec!["0.05"]);
/// assert_eq!(
///     canonical_json(&params).unwrap(),
///     r#"{"r":["0.05"],"time_filter":["09:15"]}"#
/// );
/// ```
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, StoreError> {
    let value = serde_json::to_value(value)?;
    let mut out = String::new();
    write_canonical(&value, &mut out)?;
    Ok(out)
}

fn write_canonical(value: &Value, out: &mut String) -> Result<(), StoreError> {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (k, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(k)?);
                out.push(':');
                write_canonical(v, out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}

/// Derive a cache key from a logical prefix and a parameter structure.
///
/// # Errors
/// - `StoreError::InvalidPrefix` for an empty prefix
/// - `StoreError::Serialization` when `params` cannot be serialised
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
/// use infra_store::derive_key;
///
/// let a = derive_key("greeks", &BTreeMap::from([("r", 0.05)])).unwrap();
/// let b = derive_key("greeks", &BTreeMap::from([("r", 0.06)])).unwrap();
/// assert!(a.starts_with("greeks_"));
/// assert_eq!(a.len(), "greeks_".len() + 64);
/// assert_ne!(a, b);
/// ```
pub fn derive_key<T: Serialize + ?Sized>(prefix: &str, params: &T) -> Result<String, StoreError> {
    if prefix.is_empty() {
        return Err(StoreError::InvalidPrefix(prefix.to_string()));
    }
    let canonical = canonical_json(params)?;
    let digest = Sha256::digest(canonical.as_bytes());
    Ok(format!("{prefix}_{}", hex::encode(digest)))
}
