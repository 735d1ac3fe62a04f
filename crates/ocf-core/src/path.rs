//! # Field Paths
//!
//! A small path language for addressing fields inside a document tree.
//!
//! ```text
//! system-security-plan.metadata.roles[0].id
//! system-security-plan.metadata.parties[*].type      (pattern)
//! system-security-plan.*.remarks                     (pattern)
//! ["key.with.dots"].child                            (quoted key)
//! ```
//!
//! [`FieldPath`] is a concrete location. [`PathPattern`] adds `*` (any key)
//! and `[*]` (any index) and is used by registry entries to select fields.
//! The empty path renders as `$`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::IdentifierError;

/// One step of a concrete path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// Object member.
    Key(String),
    /// Array element.
    Index(usize),
}

/// A concrete location within a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Single-key path.
    pub fn from_key(key: impl Into<String>) -> Self {
        Self::root().key(key)
    }

    /// Extend with an object member.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Key(key.into()));
        next
    }

    /// Extend with an array index.
    pub fn index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Index(index));
        next
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Look up the value at this path.
    pub fn resolve<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        let mut current = doc;
        for seg in &self.segments {
            current = match (seg, current) {
                (PathSegment::Key(k), Value::Object(map)) => map.get(k)?,
                (PathSegment::Index(i), Value::Array(arr)) => arr.get(*i)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Convert an RFC 6901 JSON pointer into a path, using `doc` to decide
    /// whether a numeric token addresses an array element or an object key.
    ///
    /// Tokens that run past the end of the document are kept as keys.
    pub fn from_pointer(pointer: &str, doc: &Value) -> Self {
        let mut path = Self::root();
        let mut current = Some(doc);
        for raw in pointer.split('/').skip(1) {
            let token = raw.replace("~1", "/").replace("~0", "~");
            match current {
                Some(Value::Array(arr)) => match token.parse::<usize>() {
                    Ok(i) => {
                        current = arr.get(i);
                        path = path.index(i);
                    }
                    Err(_) => {
                        current = None;
                        path = path.key(token);
                    }
                },
                Some(Value::Object(map)) => {
                    current = map.get(&token);
                    path = path.key(token);
                }
                _ => {
                    current = None;
                    path = path.key(token);
                }
            }
        }
        path
    }
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty() && key != "*" && !key.chars().any(|c| matches!(c, '.' | '[' | ']' | '"') || c.is_whitespace())
}

fn write_key(f: &mut fmt::Formatter<'_>, key: &str, first: bool) -> fmt::Result {
    if is_plain_key(key) {
        if !first {
            f.write_str(".")?;
        }
        f.write_str(key)
    } else {
        let quoted = serde_json::to_string(key).map_err(|_| fmt::Error)?;
        write!(f, "[{quoted}]")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("$");
        }
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                PathSegment::Key(k) => write_key(f, k, i == 0)?,
                PathSegment::Index(n) => write!(f, "[{n}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = parse_raw(s)?
            .into_iter()
            .map(|raw| match raw {
                RawSegment::Key(k) => Ok(PathSegment::Key(k)),
                RawSegment::Index(i) => Ok(PathSegment::Index(i)),
                RawSegment::AnyKey | RawSegment::AnyIndex => Err(IdentifierError::InvalidPath {
                    input: s.to_string(),
                    reason: "wildcards are only allowed in patterns".to_string(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ─── Patterns ───────────────────────────────────────────────────────

/// One step of a path pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternSegment {
    Key(String),
    /// `*`
    AnyKey,
    Index(usize),
    /// `[*]`
    AnyIndex,
}

/// A path with wildcards, matched against concrete [`FieldPath`]s.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPattern {
    source: String,
    segments: Vec<PatternSegment>,
}

impl PathPattern {
    /// Parse a pattern such as `a.b[*].c`.
    pub fn parse(input: &str) -> Result<Self, IdentifierError> {
        let segments = parse_raw(input)?
            .into_iter()
            .map(|raw| match raw {
                RawSegment::Key(k) => PatternSegment::Key(k),
                RawSegment::AnyKey => PatternSegment::AnyKey,
                RawSegment::Index(i) => PatternSegment::Index(i),
                RawSegment::AnyIndex => PatternSegment::AnyIndex,
            })
            .collect();
        Ok(Self {
            source: input.trim().to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    /// True when `path` has the same length and every segment matches.
    pub fn matches(&self, path: &FieldPath) -> bool {
        self.segments.len() == path.segments.len()
            && self.segments.iter().zip(&path.segments).all(|(p, s)| match (p, s) {
                (PatternSegment::AnyKey, PathSegment::Key(_)) => true,
                (PatternSegment::Key(a), PathSegment::Key(b)) => a == b,
                (PatternSegment::AnyIndex, PathSegment::Index(_)) => true,
                (PatternSegment::Index(a), PathSegment::Index(b)) => a == b,
                _ => false,
            })
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for PathPattern {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PathPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for PathPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ─── Tree walking ───────────────────────────────────────────────────

/// Every scalar leaf of `doc` with its path, depth-first in key order.
///
/// Empty objects and arrays contribute no leaves.
pub fn leaves(doc: &Value) -> Vec<(FieldPath, &Value)> {
    let mut out = Vec::new();
    collect_leaves(doc, FieldPath::root(), &mut out);
    out
}

fn collect_leaves<'a>(value: &'a Value, at: FieldPath, out: &mut Vec<(FieldPath, &'a Value)>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                collect_leaves(v, at.key(k.as_str()), out);
            }
        }
        Value::Array(arr) => {
            for (i, v) in arr.iter().enumerate() {
                collect_leaves(v, at.index(i), out);
            }
        }
        _ => out.push((at, value)),
    }
}

// ─── Parser ─────────────────────────────────────────────────────────

enum RawSegment {
    Key(String),
    AnyKey,
    Index(usize),
    AnyIndex,
}

fn parse_raw(input: &str) -> Result<Vec<RawSegment>, IdentifierError> {
    let err = |reason: &str| IdentifierError::InvalidPath {
        input: input.to_string(),
        reason: reason.to_string(),
    };
    let s = input.trim();
    if s.is_empty() || s == "$" {
        return Ok(Vec::new());
    }

    let bytes = s.as_bytes();
    let mut pos = 0;
    let mut out = Vec::new();
    while pos < bytes.len() {
        match bytes[pos] {
            b'[' => {
                pos += 1;
                if bytes.get(pos) == Some(&b'"') {
                    let start = pos;
                    pos += 1;
                    while pos < bytes.len() && bytes[pos] != b'"' {
                        if bytes[pos] == b'\\' {
                            pos += 1;
                        }
                        pos += 1;
                    }
                    if pos >= bytes.len() {
                        return Err(err("unterminated quoted key"));
                    }
                    let key: String = serde_json::from_str(&s[start..=pos])
                        .map_err(|_| err("malformed quoted key"))?;
                    pos += 1;
                    if bytes.get(pos) != Some(&b']') {
                        return Err(err("expected ] after quoted key"));
                    }
                    pos += 1;
                    out.push(RawSegment::Key(key));
                } else {
                    let close = s[pos..].find(']').ok_or_else(|| err("unterminated index"))?;
                    let body = &s[pos..pos + close];
                    pos += close + 1;
                    if body == "*" {
                        out.push(RawSegment::AnyIndex);
                    } else {
                        let n = body.parse::<usize>().map_err(|_| err("index must be a number or *"))?;
                        out.push(RawSegment::Index(n));
                    }
                }
            }
            b'.' if out.is_empty() => return Err(err("path cannot start with .")),
            b'.' => {
                pos += 1;
                let (key, next) = read_key(s, pos);
                if key.is_empty() {
                    return Err(err("empty key"));
                }
                pos = next;
                out.push(key_segment(key));
            }
            _ if out.is_empty() => {
                let (key, next) = read_key(s, pos);
                if key.is_empty() {
                    return Err(err("unexpected character"));
                }
                pos = next;
                out.push(key_segment(key));
            }
            _ => return Err(err("expected . or [")),
        }
    }
    Ok(out)
}

fn read_key(s: &str, start: usize) -> (&str, usize) {
    let end = s[start..]
        .find(['.', '['])
        .map(|i| start + i)
        .unwrap_or(s.len());
    (&s[start..end], end)
}

fn key_segment(key: &str) -> RawSegment {
    if key == "*" {
        RawSegment::AnyKey
    } else {
        RawSegment::Key(key.to_string())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn segment() -> impl Strategy<Value = PathSegment> {
        prop_oneof![
            "[a-zA-Z0-9_.\\- ]{1,8}".prop_map(PathSegment::Key),
            (0usize..20).prop_map(PathSegment::Index),
        ]
    }

    proptest! {
        #[test]
        fn display_parse_roundtrip(segs in prop::collection::vec(segment(), 0..6)) {
            let path = FieldPath { segments: segs };
            let parsed: FieldPath = path.to_string().parse().unwrap();
            prop_assert_eq!(parsed, path);
        }
    }
}
