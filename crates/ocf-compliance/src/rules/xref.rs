//! Cross-reference integrity.
//!
//! | Referring field | Must name |
//! |-----------------|-----------|
//! | `metadata.responsible-parties[*].role-id` | a role |
//! | `metadata.responsible-parties[*].party-uuids[*]` | a party |
//! | `metadata.parties[*].member-of-organizations[*]` | a party |
//! | `system-implementation.users[*].role-ids[*]` | a role |
//! | `system-implementation.components[*].responsible-roles[*].role-id` | a role |
//! | `...implemented-requirements[*].responsible-roles[*].role-id` | a role |
//! | `...responsible-roles[*].party-uuids[*]` | a party |
//! | `...implemented-requirements[*].by-components[*].component-uuid` | a component |
//! | `...implemented-requirements[*].statements[*].by-components[*].component-uuid` | a component |
//!
//! Dangling references are reported at the referring path.

use std::collections::BTreeSet;

use ocf_core::{codes, Expected, FieldPath, RuleClass, Severity, ValidationError};
use serde_json::Value;

use crate::document::{items_at, SspDocument};

#[derive(Debug, Clone, Copy)]
enum Target {
    Role,
    Party,
    Component,
}

impl Target {
    fn describe(self) -> &'static str {
        match self {
            Self::Role => "a role id defined in metadata.roles",
            Self::Party => "a party uuid defined in metadata.parties",
            Self::Component => "a component uuid defined in system-implementation.components",
        }
    }
}

struct Targets<'a> {
    roles: BTreeSet<&'a str>,
    parties: BTreeSet<&'a str>,
    components: BTreeSet<&'a str>,
}

impl Targets<'_> {
    fn contains(&self, target: Target, value: &str) -> bool {
        match target {
            Target::Role => self.roles.contains(value),
            Target::Party => self.parties.contains(value),
            Target::Component => self.components.contains(value),
        }
    }
}

struct Checker<'a> {
    targets: Targets<'a>,
    errors: Vec<ValidationError>,
}

impl Checker<'_> {
    /// Check one reference field holding a string.
    fn reference(&mut self, path: FieldPath, value: Option<&Value>, target: Target) {
        let Some(Value::String(s)) = value else {
            return;
        };
        if !self.targets.contains(target, s) {
            self.errors.push(
                ValidationError::new(
                    Severity::Constraint,
                    RuleClass::CrossReference,
                    codes::DANGLING_REFERENCE,
                    path,
                    format!("reference {s:?} does not resolve to {}", target.describe()),
                )
                .with_value(Value::String(s.clone()))
                .with_expected(Expected::Rule(target.describe().to_string())),
            );
        }
    }

    /// Check a field holding an array of references.
    fn references(&mut self, path: FieldPath, value: Option<&Value>, target: Target) {
        for (item_path, item) in items_at(&path, value) {
            self.reference(item_path, Some(item), target);
        }
    }

    fn responsible_roles(&mut self, owner: &FieldPath, owner_value: &Value) {
        let base = owner.key("responsible-roles");
        for (path, rr) in items_at(&base, owner_value.get("responsible-roles")) {
            self.reference(path.key("role-id"), rr.get("role-id"), Target::Role);
            self.references(path.key("party-uuids"), rr.get("party-uuids"), Target::Party);
        }
    }

    fn by_components(&mut self, owner: &FieldPath, owner_value: &Value) {
        let base = owner.key("by-components");
        for (path, bc) in items_at(&base, owner_value.get("by-components")) {
            self.reference(path.key("component-uuid"), bc.get("component-uuid"), Target::Component);
        }
    }
}

pub fn check(doc: &SspDocument<'_>) -> Vec<ValidationError> {
    let mut checker = Checker {
        targets: Targets {
            roles: doc.role_ids(),
            parties: doc.party_uuids(),
            components: doc.component_uuids(),
        },
        errors: Vec::new(),
    };

    for (path, rp) in doc.responsible_parties() {
        checker.reference(path.key("role-id"), rp.get("role-id"), Target::Role);
        checker.references(path.key("party-uuids"), rp.get("party-uuids"), Target::Party);
    }
    for (path, party) in doc.items(&["metadata", "parties"]) {
        checker.references(
            path.key("member-of-organizations"),
            party.get("member-of-organizations"),
            Target::Party,
        );
    }
    for (path, user) in doc.items(&["system-implementation", "users"]) {
        checker.references(path.key("role-ids"), user.get("role-ids"), Target::Role);
    }
    for (path, component) in doc.items(&["system-implementation", "components"]) {
        checker.responsible_roles(&path, component);
    }
    for (path, req) in doc.implemented_requirements() {
        checker.responsible_roles(&path, req);
        checker.by_components(&path, req);
        for (stmt_path, stmt) in items_at(&path.key("statements"), req.get("statements")) {
            checker.responsible_roles(&stmt_path, stmt);
            checker.by_components(&stmt_path, stmt);
        }
    }
    checker.errors
}
