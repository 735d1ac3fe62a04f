//! # Identity Newtypes
//!
//! Domain identifiers for the engine. Each type validates its input at
//! construction so downstream code never sees a malformed identifier.
//!
//! - [`ControlId`]: a catalog control (`AC-2`, `ac-2(1)`, `ac-2.1`).
//!   Comparison is case-insensitive; ordering is natural so that
//!   `ac-2 < ac-2(1) < ac-10`. Display keeps the spelling it was created with.
//! - [`CatalogRef`], [`ProfileId`]: `name@version` references into content.
//! - [`RunId`]: UUID for a validation run.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IdentifierError;

// ─── ControlId ──────────────────────────────────────────────────────

/// Identifier of a control within a catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ControlId {
    raw: String,
    key: String,
}

impl ControlId {
    /// Create a validated control identifier.
    ///
    /// Accepts ASCII letters, digits and `.`, `_`, `-`, `(`, `)`.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || !trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '(' | ')'))
        {
            return Err(IdentifierError::InvalidControlId(raw));
        }
        let raw = trimmed.to_string();
        let key = raw.to_ascii_lowercase();
        Ok(Self { raw, key })
    }

    /// The identifier as originally spelled.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Lowercased comparison key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns true if this identifier names an enhancement (`ac-2(1)`, `ac-2.1`).
    pub fn is_enhancement(&self) -> bool {
        self.key.contains('(') || self.key.contains('.')
    }
}

impl PartialEq for ControlId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ControlId {}

impl Hash for ControlId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for ControlId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ControlId {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.key, &other.key)
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for ControlId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ControlId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ControlId> for String {
    fn from(id: ControlId) -> Self {
        id.raw
    }
}

/// Compare two strings treating runs of ASCII digits as numbers.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ta = tokens(a);
    let mut tb = tokens(b);
    loop {
        match (ta.next(), tb.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x, y) {
                    (Token::Num(x), Token::Num(y)) => {
                        let xs = x.trim_start_matches('0');
                        let ys = y.trim_start_matches('0');
                        xs.len().cmp(&ys.len()).then_with(|| xs.cmp(ys)).then_with(|| x.len().cmp(&y.len()))
                    }
                    (Token::Text(x), Token::Text(y)) => x.cmp(y),
                    (Token::Num(_), Token::Text(_)) => Ordering::Less,
                    (Token::Text(_), Token::Num(_)) => Ordering::Greater,
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

enum Token<'a> {
    Num(&'a str),
    Text(&'a str),
}

fn tokens(s: &str) -> impl Iterator<Item = Token<'_>> {
    let bytes = s.as_bytes();
    let mut pos = 0;
    std::iter::from_fn(move || {
        if pos >= bytes.len() {
            return None;
        }
        let start = pos;
        let digit = bytes[pos].is_ascii_digit();
        while pos < bytes.len() && bytes[pos].is_ascii_digit() == digit {
            pos += 1;
        }
        let slice = &s[start..pos];
        Some(if digit { Token::Num(slice) } else { Token::Text(slice) })
    })
}

// ─── Content references ─────────────────────────────────────────────

fn split_ref(input: &str) -> Result<(String, String), IdentifierError> {
    let err = |reason: &str| IdentifierError::InvalidContentRef {
        input: input.to_string(),
        reason: reason.to_string(),
    };
    let (name, version) = input.split_once('@').ok_or_else(|| err("missing @version"))?;
    if name.trim().is_empty() {
        return Err(err("empty name"));
    }
    if version.trim().is_empty() {
        return Err(err("empty version"));
    }
    if version.contains('@') {
        return Err(err("more than one @"));
    }
    Ok((name.trim().to_string(), version.trim().to_string()))
}

/// Reference to a catalog by name and version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CatalogRef {
    /// Catalog name, e.g. `nist-800-53`.
    pub name: String,
    /// Catalog version, e.g. `rev5`.
    pub version: String,
}

impl CatalogRef {
    /// Create a catalog reference from its parts.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for CatalogRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

impl TryFrom<String> for CatalogRef {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CatalogRef> for String {
    fn from(r: CatalogRef) -> Self {
        r.to_string()
    }
}

impl FromStr for CatalogRef {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, version) = split_ref(s)?;
        Ok(Self { name, version })
    }
}

/// Identifier of a profile (baseline definition) by name and version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProfileId {
    /// Profile name, e.g. `fedramp-moderate`.
    pub name: String,
    /// Profile version.
    pub version: String,
}

impl ProfileId {
    /// Create a profile identifier from its parts.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

impl TryFrom<String> for ProfileId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProfileId> for String {
    fn from(r: ProfileId) -> Self {
        r.to_string()
    }
}

impl FromStr for ProfileId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, version) = split_ref(s)?;
        Ok(Self { name, version })
    }
}

// ─── RunId ──────────────────────────────────────────────────────────

/// Unique identifier for a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generate a new random run identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn natural_order_is_consistent_with_numbers(a in 0u32..500, b in 0u32..500) {
            let x = ControlId::new(format!("ac-{a}")).unwrap();
            let y = ControlId::new(format!("ac-{b}")).unwrap();
            prop_assert_eq!(x.cmp(&y), a.cmp(&b));
        }

        #[test]
        fn case_never_affects_ordering(s in "[a-z]{2}-[0-9]{1,3}") {
            let lower = ControlId::new(s.clone()).unwrap();
            let upper = ControlId::new(s.to_ascii_uppercase()).unwrap();
            prop_assert_eq!(lower.cmp(&upper), Ordering::Equal);
        }
    }
}
