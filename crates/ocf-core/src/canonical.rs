//! # Canonical Serialization: JCS-Compatible Byte Production
//!
//! This module defines `CanonicalBytes`, the sole construction path for bytes
//! used in digest computation across the engine.
//!
//! ## Security Invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. The only way to
//! construct it is through `CanonicalBytes::new()`, which applies the number
//! normalization pipeline before JCS serialization. Any function that needs a
//! digest must accept `&CanonicalBytes`, so a digest over encoding-specific
//! bytes (pretty-printed JSON, XML, YAML) cannot be produced by accident.
//!
//! ## Normalization Rules
//!
//! 1. **Integral floats become integers**: `1.0` and `1` are the same value
//!    once a document has travelled through XML or YAML, so they must hash
//!    identically.
//! 2. **Fractional numbers** pass through and are rendered with the RFC 8785
//!    ECMAScript number format by `serde_jcs`.
//! 3. **Objects**: keys sorted by UTF-16 code units, compact separators.
//! 4. **Strings** are never altered; whitespace inside a string is content.
//!
//! After normalization, serialization uses `serde_jcs` for RFC 8785 (JSON
//! Canonicalization Scheme) compliant output.

use serde::Serialize;
use serde_json::{Number, Value};

use crate::digest::{sha256_digest, ContentDigest};
use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization with number
/// normalization.
///
/// # Invariants
///
/// - The only constructor is `CanonicalBytes::new()`.
/// - Integral numbers are serialized as integers regardless of how they were
///   parsed.
/// - Serialization uses sorted keys with compact separators (RFC 8785).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::SerializationFailed` if the value
    /// cannot be represented as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        let normalized = normalize_value(value);
        let bytes = serialize_canonical(&normalized)?;
        Ok(Self(bytes))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the wrapper and return the canonical byte vector.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Canonicalize a semantic tree and hash it.
///
/// This is the digest recorded in `ConversionRecord`s and `ValidationRun`s.
pub fn semantic_digest(value: &impl Serialize) -> Result<ContentDigest, CanonicalizationError> {
    Ok(sha256_digest(&CanonicalBytes::new(value)?))
}

/// Recursively normalize numbers so that integral floats become integers.
fn normalize_value(value: Value) -> Value {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => value,
        Value::Number(n) => Value::Number(normalize_number(n)),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                out.insert(k, normalize_value(v));
            }
            Value::Object(out)
        }
        Value::Array(arr) => Value::Array(arr.into_iter().map(normalize_value).collect()),
    }
}

fn normalize_number(n: Number) -> Number {
    if n.is_i64() || n.is_u64() {
        return n;
    }
    match n.as_f64() {
        // `i64::MAX as f64` rounds up to 2^63, which does not fit.
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Number::from(f as i64)
        }
        _ => n,
    }
}

/// Serialize a JSON value in JCS-canonical form (RFC 8785).
fn serialize_canonical(value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
    let s = serde_jcs::to_string(value)?;
    Ok(s.into_bytes())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            "[a-zA-Z0-9_ ]{0,30}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-z-]{1,10}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        /// Canonicalization is deterministic: same input always produces same bytes.
        #[test]
        fn canonical_bytes_deterministic(value in json_value()) {
            let a = CanonicalBytes::new(&value).unwrap();
            let b = CanonicalBytes::new(&value).unwrap();
            prop_assert_eq!(a.as_bytes(), b.as_bytes());
        }

        /// Canonical bytes re-parse to the same semantic tree.
        #[test]
        fn canonical_bytes_reparse(value in json_value()) {
            let cb = CanonicalBytes::new(&value).unwrap();
            let parsed: Value = serde_json::from_slice(cb.as_bytes()).unwrap();
            prop_assert_eq!(parsed, value);
        }
    }
}
