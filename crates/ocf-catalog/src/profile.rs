//! # Baseline Profiles
//!
//! A profile is a small program: an ordered list of [`ProfileOp`]s that the
//! resolver interprets against loaded catalogs. Operations are a tagged
//! enum on the wire:
//!
//! ```yaml
//! name: fedramp-moderate
//! version: "1.0"
//! required-roles: [system-owner]
//! data-flow: recommended
//! required-artifacts: [rules-of-behavior, contingency-plan]
//! operations:
//!   - op: import
//!     catalog: nist-800-53@rev5
//!     include: [ac-1, ac-2]
//!   - op: merge
//!     strategy: keep-first
//!   - op: exclude
//!     controls: [ac-2(1)]
//!   - op: add
//!     controls: [{ id: ORG-1, title: Organization control }]
//!   - op: alter
//!     control: ac-2
//!     params: [{ id: ac-02_odp.01, values: [30 days] }]
//! ```

use std::fmt;
use std::str::FromStr;

use ocf_core::{CatalogRef, ControlId, ProfileId};
use serde::{Deserialize, Serialize};

use crate::catalog::ControlSource;

/// How a later import treats a control identifier already imported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// The earlier definition stays.
    KeepFirst,
    /// The later definition replaces the earlier one.
    KeepLast,
    /// Fail resolution with `MergeConflict`.
    #[default]
    ErrorOnConflict,
}

impl MergeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeepFirst => "keep-first",
            Self::KeepLast => "keep-last",
            Self::ErrorOnConflict => "error-on-conflict",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep-first" => Ok(Self::KeepFirst),
            "keep-last" => Ok(Self::KeepLast),
            "error-on-conflict" | "error" => Ok(Self::ErrorOnConflict),
            other => Err(format!(
                "unknown merge strategy {other:?} (expected keep-first, keep-last or error-on-conflict)"
            )),
        }
    }
}

/// How strongly a baseline asks for `system-characteristics.data-flow`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataFlowRequirement {
    /// Not checked.
    #[default]
    Optional,
    Recommended,
    Required,
}

impl DataFlowRequirement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Optional => "optional",
            Self::Recommended => "recommended",
            Self::Required => "required",
        }
    }
}

impl fmt::Display for DataFlowRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Override applied to one parameter by an `alter` operation.
///
/// Absent fields leave the parameter attribute untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterOverride {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
}

/// One step of a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum ProfileOp {
    /// Copy controls from a catalog. `include` narrows the copy.
    Import {
        catalog: CatalogRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        include: Option<Vec<ControlId>>,
    },
    /// Set the strategy for identifier collisions between later imports.
    Merge { strategy: MergeStrategy },
    /// Remove controls. Absent identifiers are ignored.
    Exclude { controls: Vec<ControlId> },
    /// Insert organization-specific controls.
    Add { controls: Vec<ControlSource> },
    /// Override parameters of an existing control.
    Alter {
        control: ControlId,
        #[serde(default)]
        params: Vec<ParameterOverride>,
    },
}

impl ProfileOp {
    /// Operation name as written in profile files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Import { .. } => "import",
            Self::Merge { .. } => "merge",
            Self::Exclude { .. } => "exclude",
            Self::Add { .. } => "add",
            Self::Alter { .. } => "alter",
        }
    }
}

/// An immutable baseline definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Profile {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Roles a conforming document must assign to at least one party.
    #[serde(default)]
    pub required_roles: Vec<String>,
    #[serde(default)]
    pub data_flow: DataFlowRequirement,
    /// Back-matter resources expected by title or `document-type` prop.
    #[serde(default)]
    pub required_artifacts: Vec<String>,
    #[serde(default)]
    pub operations: Vec<ProfileOp>,
}

impl Profile {
    pub fn id(&self) -> ProfileId {
        ProfileId::new(self.name.clone(), self.version.clone())
    }

    /// Catalogs referenced by `import` operations, in order, without repeats.
    pub fn imported_catalogs(&self) -> Vec<CatalogRef> {
        let mut out: Vec<CatalogRef> = Vec::new();
        for op in &self.operations {
            if let ProfileOp::Import { catalog, .. } = op {
                if !out.contains(catalog) {
                    out.push(catalog.clone());
                }
            }
        }
        out
    }
}
