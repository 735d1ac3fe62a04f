//! # Profile Resolution
//!
//! A single interpreter walks a profile's operations in declared order over
//! a working set that starts empty. The working set is a `BTreeMap` keyed by
//! [`ControlId`], so every traversal is in natural identifier order and the
//! output is a pure function of its inputs.
//!
//! ## Collision rules
//!
//! | Incoming | Already present from | Result |
//! |----------|----------------------|--------|
//! | import   | import               | current merge strategy |
//! | import   | add                  | `DuplicateControl` |
//! | add      | anything             | `DuplicateControl` |
//!
//! The merge strategy starts at [`ResolveOptions::default_merge_strategy`]
//! and is replaced by each `merge` operation for the imports that follow it.

use std::collections::BTreeMap;

use ocf_core::{semantic_digest, CanonicalizationError, CatalogRef, ContentDigest, ControlId, ProfileId};
use serde::{Deserialize, Serialize};

use crate::catalog::{flatten_controls, Catalog, Control};
use crate::error::ProfileResolutionError;
use crate::profile::{DataFlowRequirement, MergeStrategy, ParameterOverride, Profile, ProfileOp};
use crate::registry::Registry;

/// Knobs that are configuration rather than profile content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Strategy in force before the first `merge` operation.
    pub default_merge_strategy: MergeStrategy,
}

/// Where a resolved control came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "catalog", rename_all = "kebab-case")]
pub enum ControlOrigin {
    Catalog(CatalogRef),
    Added,
}

/// A control in its final, parameterized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedControl {
    pub origin: ControlOrigin,
    #[serde(flatten)]
    pub control: Control,
}

/// The flattened requirement set for one baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedBaseline {
    pub profile: ProfileId,
    /// Catalogs imported, in first-import order.
    pub catalogs: Vec<CatalogRef>,
    pub registry_version: String,
    /// Declaration order, duplicates removed.
    pub required_roles: Vec<String>,
    pub data_flow: DataFlowRequirement,
    /// Declaration order, duplicates removed.
    pub required_artifacts: Vec<String>,
    pub controls: BTreeMap<ControlId, ResolvedControl>,
}

impl ResolvedBaseline {
    pub fn control_ids(&self) -> impl Iterator<Item = &ControlId> {
        self.controls.keys()
    }

    pub fn contains(&self, id: &ControlId) -> bool {
        self.controls.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Semantic digest of the whole baseline, for pinning evidence.
    pub fn digest(&self) -> Result<ContentDigest, CanonicalizationError> {
        semantic_digest(self)
    }
}

/// Apply `profile`'s operations against `catalogs`.
///
/// The registry contributes its version to the result so that a baseline is
/// always traceable to the value table it was validated with.
pub fn resolve(
    profile: &Profile,
    catalogs: &[Catalog],
    registry: &Registry,
    options: &ResolveOptions,
) -> Result<ResolvedBaseline, ProfileResolutionError> {
    let profile_id = profile.id();
    let mut strategy = options.default_merge_strategy;
    let mut working: BTreeMap<ControlId, ResolvedControl> = BTreeMap::new();
    let mut imported: Vec<CatalogRef> = Vec::new();

    for op in &profile.operations {
        tracing::debug!(profile = %profile_id, op = op.name(), controls = working.len(), "applying profile operation");
        match op {
            ProfileOp::Import { catalog, include } => {
                let source = catalogs
                    .iter()
                    .find(|c| c.reference() == catalog)
                    .ok_or_else(|| ProfileResolutionError::MissingCatalog {
                        profile: profile_id.clone(),
                        catalog: catalog.clone(),
                    })?;
                import(&mut working, source, include.as_deref(), strategy)?;
                if !imported.contains(catalog) {
                    imported.push(catalog.clone());
                }
            }
            ProfileOp::Merge { strategy: next } => strategy = *next,
            ProfileOp::Exclude { controls } => {
                for id in controls {
                    working.remove(id);
                }
            }
            ProfileOp::Add { controls } => {
                for control in flatten_controls(controls) {
                    if working.contains_key(&control.id) {
                        return Err(ProfileResolutionError::DuplicateControl { control: control.id });
                    }
                    working.insert(
                        control.id.clone(),
                        ResolvedControl {
                            origin: ControlOrigin::Added,
                            control,
                        },
                    );
                }
            }
            ProfileOp::Alter { control, params } => {
                let target = working
                    .get_mut(control)
                    .ok_or_else(|| ProfileResolutionError::UnknownControl {
                        operation: "alter".to_string(),
                        control: control.clone(),
                    })?;
                alter(&mut target.control, params)?;
            }
        }
    }

    let mut required_roles: Vec<String> = Vec::new();
    for role in &profile.required_roles {
        if !required_roles.contains(role) {
            required_roles.push(role.clone());
        }
    }

    let mut required_artifacts: Vec<String> = Vec::new();
    for artifact in &profile.required_artifacts {
        if !required_artifacts.contains(artifact) {
            required_artifacts.push(artifact.clone());
        }
    }

    tracing::info!(
        profile = %profile_id,
        controls = working.len(),
        catalogs = imported.len(),
        "profile resolved"
    );

    Ok(ResolvedBaseline {
        profile: profile_id,
        catalogs: imported,
        registry_version: registry.version.clone(),
        required_roles,
        data_flow: profile.data_flow,
        required_artifacts,
        controls: working,
    })
}

fn import(
    working: &mut BTreeMap<ControlId, ResolvedControl>,
    catalog: &Catalog,
    include: Option<&[ControlId]>,
    strategy: MergeStrategy,
) -> Result<(), ProfileResolutionError> {
    let selected: Vec<&Control> = match include {
        None => catalog.controls().iter().collect(),
        Some(ids) => ids
            .iter()
            .map(|id| {
                catalog.control(id).ok_or_else(|| ProfileResolutionError::UnknownControl {
                    operation: format!("import of {}", catalog.reference()),
                    control: id.clone(),
                })
            })
            .collect::<Result<_, _>>()?,
    };

    let origin = ControlOrigin::Catalog(catalog.reference().clone());
    for control in selected {
        let incoming = ResolvedControl {
            origin: origin.clone(),
            control: control.clone(),
        };
        match working.get(&control.id).map(|existing| existing.origin.clone()) {
            None => {
                working.insert(control.id.clone(), incoming);
            }
            Some(ControlOrigin::Added) => {
                return Err(ProfileResolutionError::DuplicateControl {
                    control: control.id.clone(),
                });
            }
            Some(ControlOrigin::Catalog(first)) => match strategy {
                MergeStrategy::KeepFirst => {}
                MergeStrategy::KeepLast => {
                    working.insert(control.id.clone(), incoming);
                }
                MergeStrategy::ErrorOnConflict => {
                    return Err(ProfileResolutionError::MergeConflict {
                        control: control.id.clone(),
                        first,
                        second: catalog.reference().clone(),
                    });
                }
            },
        }
    }
    Ok(())
}

fn alter(control: &mut Control, overrides: &[ParameterOverride]) -> Result<(), ProfileResolutionError> {
    for ov in overrides {
        let id = control.id.clone();
        let param = control
            .param_mut(&ov.id)
            .ok_or_else(|| ProfileResolutionError::UnknownParameter {
                control: id.clone(),
                param: ov.id.clone(),
            })?;
        if let Some(label) = &ov.label {
            param.label = Some(label.clone());
        }
        if let Some(select) = &ov.select {
            param.select = Some(select.clone());
        }
        if let Some(values) = &ov.values {
            param.values = values.clone();
        }
        if let Some(value) = param.values_outside_select().first() {
            return Err(ProfileResolutionError::ParameterConstraint {
                control: id,
                param: param.id.clone(),
                value: (*value).to_string(),
                allowed: param.select.clone().unwrap_or_default(),
            });
        }
    }
    Ok(())
}
