//! # Control Catalogs
//!
//! A catalog is authored as a tree of groups, controls and enhancement
//! controls ([`CatalogSource`]). On load it is flattened into an arena:
//! every control lives in one `Vec` in depth-first document order, groups
//! refer to their members by index, and a lookup table maps each
//! [`ControlId`] to its slot. Nothing holds a pointer into another node, so
//! a catalog can be shared across threads behind an `Arc` as-is.
//!
//! Flattening order: catalog-level controls first, then each group in
//! order. Inside a group, its controls (each followed by its enhancements)
//! come before its subgroups.

use std::collections::BTreeMap;

use ocf_core::{CatalogRef, ControlId};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// A typed parameter slot on a control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Parameter {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Assigned (default) values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    /// Allowed choices. `None` means unconstrained.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
}

impl Parameter {
    /// Values that fall outside `select`, if a select list exists.
    pub fn values_outside_select(&self) -> Vec<&str> {
        match &self.select {
            Some(allowed) => self
                .values
                .iter()
                .filter(|v| !allowed.contains(v))
                .map(String::as_str)
                .collect(),
            None => Vec::new(),
        }
    }
}

/// A prose sub-section of a control (statement, guidance, objective).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prose: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<Part>,
}

/// A control as authored, possibly with nested enhancements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ControlSource {
    pub id: ControlId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default)]
    pub params: Vec<Parameter>,
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default)]
    pub controls: Vec<ControlSource>,
}

/// A group as authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSource {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub controls: Vec<ControlSource>,
    #[serde(default)]
    pub groups: Vec<GroupSource>,
}

/// A catalog file as authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSource {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub groups: Vec<GroupSource>,
    #[serde(default)]
    pub controls: Vec<ControlSource>,
}

/// A flattened control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Control {
    pub id: ControlId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Enclosing group id, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Base control for an enhancement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ControlId>,
    #[serde(default)]
    pub params: Vec<Parameter>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Control {
    pub fn param(&self, id: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.id == id)
    }

    pub fn param_mut(&mut self, id: &str) -> Option<&mut Parameter> {
        self.params.iter_mut().find(|p| p.id == id)
    }
}

/// A group node in the arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub id: String,
    pub title: String,
    /// Index of the enclosing group in [`Catalog::groups`].
    pub parent: Option<usize>,
    /// Indices into [`Catalog::controls`] of controls directly in this group
    /// (enhancements included).
    pub members: Vec<usize>,
}

/// An immutable, flattened control catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    reference: CatalogRef,
    title: Option<String>,
    groups: Vec<Group>,
    controls: Vec<Control>,
    #[serde(skip)]
    index: BTreeMap<ControlId, usize>,
}

impl Catalog {
    /// Flatten an authored catalog.
    ///
    /// Fails with [`CatalogError::DuplicateControl`] if an identifier appears
    /// twice anywhere in the tree (case-insensitive).
    pub fn from_source(source: CatalogSource) -> CatalogResult<Self> {
        let reference = CatalogRef::new(source.name, source.version);
        let mut builder = Builder {
            reference: reference.clone(),
            groups: Vec::new(),
            controls: Vec::new(),
            index: BTreeMap::new(),
        };
        for control in source.controls {
            builder.push_control(control, None, None)?;
        }
        for group in source.groups {
            builder.push_group(group, None)?;
        }
        Ok(Self {
            reference,
            title: source.title,
            groups: builder.groups,
            controls: builder.controls,
            index: builder.index,
        })
    }

    pub fn reference(&self) -> &CatalogRef {
        &self.reference
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// All controls in depth-first document order.
    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn control(&self, id: &ControlId) -> Option<&Control> {
        self.index.get(id).map(|&i| &self.controls[i])
    }

    pub fn contains(&self, id: &ControlId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }
}

struct Builder {
    reference: CatalogRef,
    groups: Vec<Group>,
    controls: Vec<Control>,
    index: BTreeMap<ControlId, usize>,
}

impl Builder {
    fn push_group(&mut self, group: GroupSource, parent: Option<usize>) -> CatalogResult<()> {
        let slot = self.groups.len();
        self.groups.push(Group {
            id: group.id.clone(),
            title: group.title,
            parent,
            members: Vec::new(),
        });
        for control in group.controls {
            self.push_control(control, Some(slot), None)?;
        }
        for sub in group.groups {
            self.push_group(sub, Some(slot))?;
        }
        Ok(())
    }

    fn push_control(
        &mut self,
        control: ControlSource,
        group: Option<usize>,
        parent: Option<ControlId>,
    ) -> CatalogResult<()> {
        if self.index.contains_key(&control.id) {
            return Err(CatalogError::DuplicateControl {
                catalog: self.reference.clone(),
                control: control.id,
            });
        }
        let slot = self.controls.len();
        self.index.insert(control.id.clone(), slot);
        if let Some(g) = group {
            self.groups[g].members.push(slot);
        }
        let id = control.id.clone();
        let group_id = group.map(|g| self.groups[g].id.clone());
        self.controls.push(Control {
            id: control.id,
            title: control.title,
            class: control.class,
            group: group_id,
            parent,
            params: control.params,
            parts: control.parts,
        });
        for child in control.controls {
            self.push_control(child, group, Some(id.clone()))?;
        }
        Ok(())
    }
}

/// Flatten a list of authored controls (used by profile `add` operations).
///
/// Order is depth-first; enhancements record their parent.
pub fn flatten_controls(sources: &[ControlSource]) -> Vec<Control> {
    fn walk(src: &ControlSource, parent: Option<&ControlId>, out: &mut Vec<Control>) {
        out.push(Control {
            id: src.id.clone(),
            title: src.title.clone(),
            class: src.class.clone(),
            group: None,
            parent: parent.cloned(),
            params: src.params.clone(),
            parts: src.parts.clone(),
        });
        for child in &src.controls {
            walk(child, Some(&src.id), out);
        }
    }
    let mut out = Vec::new();
    for src in sources {
        walk(src, None, &mut out);
    }
    out
}
