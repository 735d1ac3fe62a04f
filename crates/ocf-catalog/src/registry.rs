//! # Value Registry
//!
//! A versioned table of permitted literal values keyed by field-path
//! pattern. Each entry may be limited to particular baselines; an entry with
//! no `baselines` list applies everywhere.
//!
//! ```yaml
//! version: "2024.1"
//! entries:
//!   - pattern: system-security-plan.metadata.parties[*].type
//!     allowed: [person, organization]
//!   - pattern: system-security-plan.system-characteristics.security-sensitivity-level
//!     allowed: [fips-199-low, fips-199-moderate]
//!     baselines: [moderate]
//! ```

use ocf_core::{FieldPath, PathPattern, ProfileId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One registry row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub pattern: PathPattern,
    pub allowed: Vec<String>,
    /// Baseline names (or `name@version`) this entry applies to. Empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub baselines: Vec<String>,
}

impl RegistryEntry {
    pub fn applies_to(&self, baseline: &ProfileId) -> bool {
        self.baselines.is_empty()
            || self
                .baselines
                .iter()
                .any(|b| *b == baseline.name || *b == baseline.to_string())
    }

    /// True if `value` is one of the permitted literals.
    ///
    /// Strings compare verbatim; other scalars compare by their JSON text.
    pub fn permits(&self, value: &Value) -> bool {
        let literal = scalar_literal(value);
        self.allowed.iter().any(|a| *a == literal)
    }
}

/// The text a scalar is compared as.
pub fn scalar_literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Immutable, versioned registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub version: String,
    #[serde(default)]
    pub entries: Vec<RegistryEntry>,
}

impl Registry {
    /// Entries applicable to a baseline, in declaration order.
    pub fn entries_for<'a>(&'a self, baseline: &'a ProfileId) -> impl Iterator<Item = &'a RegistryEntry> + 'a {
        self.entries.iter().filter(move |e| e.applies_to(baseline))
    }

    /// First applicable entry whose pattern matches `path`.
    pub fn entry_for_path<'a>(&'a self, baseline: &'a ProfileId, path: &FieldPath) -> Option<&'a RegistryEntry> {
        self.entries_for(baseline).find(|e| e.pattern.matches(path))
    }
}
