//! Read-only view over a system security plan.
//!
//! The constraint rules only run on structurally valid documents, but the
//! accessors here still tolerate missing or mistyped sections by treating
//! them as empty.

use std::collections::BTreeSet;

use ocf_core::FieldPath;
use serde_json::{Map, Value};

const ROOT: &str = "system-security-plan";

/// An SSP document tree with path-aware accessors.
#[derive(Debug, Clone, Copy)]
pub struct SspDocument<'a> {
    doc: &'a Value,
    ssp: &'a Value,
}

impl<'a> SspDocument<'a> {
    /// View `doc`, or `None` if it has no `system-security-plan` object.
    pub fn new(doc: &'a Value) -> Option<Self> {
        let ssp = doc.get(ROOT).filter(|v| v.is_object())?;
        Some(Self { doc, ssp })
    }

    /// The whole document, including the root key.
    pub fn tree(&self) -> &'a Value {
        self.doc
    }

    /// Path of a section below the SSP root.
    pub fn path(&self, keys: &[&str]) -> FieldPath {
        keys.iter().fold(FieldPath::from_key(ROOT), |p, k| p.key(*k))
    }

    /// Value below the SSP root.
    pub fn get(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter().try_fold(self.ssp, |v, k| v.get(*k))
    }

    pub fn metadata(&self) -> Option<&'a Map<String, Value>> {
        self.get(&["metadata"]).and_then(Value::as_object)
    }

    /// Elements of the array at `keys`, each with its path.
    pub fn items(&self, keys: &[&str]) -> Vec<(FieldPath, &'a Value)> {
        let base = self.path(keys);
        items_at(&base, self.get(keys))
    }

    /// Ids of `metadata.roles`.
    pub fn role_ids(&self) -> BTreeSet<&'a str> {
        self.string_fields(&["metadata", "roles"], "id")
    }

    /// Uuids of `metadata.parties`.
    pub fn party_uuids(&self) -> BTreeSet<&'a str> {
        self.string_fields(&["metadata", "parties"], "uuid")
    }

    /// Uuids of `system-implementation.components`.
    pub fn component_uuids(&self) -> BTreeSet<&'a str> {
        self.string_fields(&["system-implementation", "components"], "uuid")
    }

    pub fn responsible_parties(&self) -> Vec<(FieldPath, &'a Value)> {
        self.items(&["metadata", "responsible-parties"])
    }

    pub fn implemented_requirements(&self) -> Vec<(FieldPath, &'a Value)> {
        self.items(&["control-implementation", "implemented-requirements"])
    }

    /// The `control-id` of every implemented requirement, in document order.
    pub fn implemented_control_ids(&self) -> Vec<(FieldPath, &'a str)> {
        self.implemented_requirements()
            .into_iter()
            .filter_map(|(path, req)| {
                let id = req.get("control-id")?.as_str()?;
                Some((path.key("control-id"), id))
            })
            .collect()
    }

    fn string_fields(&self, keys: &[&str], field: &str) -> BTreeSet<&'a str> {
        self.get(keys)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|item| item.get(field).and_then(Value::as_str))
            .collect()
    }
}

/// Elements of an optional array value, each with its path under `base`.
pub fn items_at<'a>(base: &FieldPath, value: Option<&'a Value>) -> Vec<(FieldPath, &'a Value)> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(i, v)| (base.index(i), v))
        .collect()
}
