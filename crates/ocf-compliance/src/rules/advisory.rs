//! Advisories: observations that never affect the outcome of a run.
//!
//! [`check`] looks at the document alone and runs whenever the document is
//! an SSP. [`check_baseline`] applies the documentation requirements a
//! profile declares (`data-flow`, `required-artifacts`) and runs once the
//! baseline has resolved.

use std::collections::BTreeSet;

use ocf_catalog::{DataFlowRequirement, ResolvedBaseline};
use ocf_core::{codes, Advisory};
use serde_json::Value;

use crate::document::SspDocument;

/// Shortest authorization-boundary description, in characters, that is not
/// flagged as too brief.
pub const MIN_BOUNDARY_DESCRIPTION: usize = 50;

pub fn check(doc: &SspDocument<'_>) -> Vec<Advisory> {
    let mut out = metadata(doc);
    out.extend(authorization_boundary(doc));
    out.extend(requirement_details(doc));
    out
}

pub fn check_baseline(doc: &SspDocument<'_>, baseline: &ResolvedBaseline) -> Vec<Advisory> {
    let mut out = data_flow(doc, baseline);
    out.extend(required_artifacts(doc, baseline));
    out
}

/// Absent, null and empty values all count as missing.
fn documented(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Object(m)) => !m.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

fn metadata(doc: &SspDocument<'_>) -> Vec<Advisory> {
    let mut out = Vec::new();
    let metadata = doc.metadata();
    let has = |key: &str| metadata.and_then(|m| m.get(key)).is_some_and(|v| !v.is_null());

    if !has("version") {
        out.push(Advisory::new(
            codes::MISSING_VERSION,
            doc.path(&["metadata", "version"]),
            "document has no metadata.version",
        ));
    }
    if !has("last-modified") {
        out.push(Advisory::new(
            codes::MISSING_LAST_MODIFIED,
            doc.path(&["metadata", "last-modified"]),
            "document has no metadata.last-modified",
        ));
    }
    for (path, rp) in doc.responsible_parties() {
        let empty = rp
            .get("party-uuids")
            .and_then(Value::as_array)
            .map_or(true, |uuids| uuids.is_empty());
        if empty {
            let role = rp.get("role-id").and_then(Value::as_str).unwrap_or("?");
            out.push(Advisory::new(
                codes::NO_PARTIES,
                path.key("party-uuids"),
                format!("responsible party for role {role} names no parties"),
            ));
        }
    }
    out
}

fn authorization_boundary(doc: &SspDocument<'_>) -> Vec<Advisory> {
    let mut out = Vec::new();
    let boundary_keys = ["system-characteristics", "authorization-boundary"];
    let boundary = doc.get(&boundary_keys);
    if !documented(boundary) {
        out.push(Advisory::new(
            codes::MISSING_AUTHORIZATION_BOUNDARY,
            doc.path(&boundary_keys),
            "system has no authorization boundary description",
        ));
    } else {
        let description = boundary
            .and_then(|b| b.get("description"))
            .and_then(Value::as_str)
            .map_or(0, |d| d.trim().chars().count());
        if description < MIN_BOUNDARY_DESCRIPTION {
            out.push(Advisory::new(
                codes::BRIEF_AUTHORIZATION_BOUNDARY,
                doc.path(&["system-characteristics", "authorization-boundary", "description"]),
                format!(
                    "authorization boundary description has {description} characters, \
                     at least {MIN_BOUNDARY_DESCRIPTION} expected"
                ),
            ));
        }
    }

    let network_keys = ["system-characteristics", "network-architecture"];
    if !documented(doc.get(&network_keys)) {
        out.push(Advisory::new(
            codes::MISSING_NETWORK_ARCHITECTURE,
            doc.path(&network_keys),
            "system has no network architecture description",
        ));
    }
    out
}

fn requirement_details(doc: &SspDocument<'_>) -> Vec<Advisory> {
    let mut out = Vec::new();
    for (path, req) in doc.implemented_requirements() {
        let Some(control) = req.get("control-id").and_then(Value::as_str) else {
            continue;
        };
        if !documented(req.get("statements")) {
            out.push(Advisory::new(
                codes::MISSING_STATEMENTS,
                path.key("statements"),
                format!("implementation of {} has no statements", control.to_ascii_uppercase()),
            ));
        }
        if !documented(req.get("responsible-roles")) {
            out.push(Advisory::new(
                codes::MISSING_RESPONSIBLE_ROLES,
                path.key("responsible-roles"),
                format!("implementation of {} names no responsible roles", control.to_ascii_uppercase()),
            ));
        }
    }
    out
}

fn data_flow(doc: &SspDocument<'_>, baseline: &ResolvedBaseline) -> Vec<Advisory> {
    let keys = ["system-characteristics", "data-flow"];
    let level = baseline.data_flow;
    if level == DataFlowRequirement::Optional || documented(doc.get(&keys)) {
        return Vec::new();
    }
    vec![Advisory::new(
        codes::MISSING_DATA_FLOW,
        doc.path(&keys),
        format!("data flow description is {level} for baseline {}", baseline.profile),
    )]
}

/// Lowercased resource titles and `document-type` prop values.
fn resource_labels(doc: &SspDocument<'_>) -> BTreeSet<String> {
    let mut labels = BTreeSet::new();
    for (_, resource) in doc.items(&["back-matter", "resources"]) {
        if let Some(title) = resource.get("title").and_then(Value::as_str) {
            labels.insert(title.to_lowercase());
        }
        let props = resource.get("props").and_then(Value::as_array).into_iter().flatten();
        for prop in props {
            if prop.get("name").and_then(Value::as_str) == Some("document-type") {
                if let Some(value) = prop.get("value").and_then(Value::as_str) {
                    labels.insert(value.to_lowercase());
                }
            }
        }
    }
    labels
}

fn required_artifacts(doc: &SspDocument<'_>, baseline: &ResolvedBaseline) -> Vec<Advisory> {
    if baseline.required_artifacts.is_empty() {
        return Vec::new();
    }
    let labels = resource_labels(doc);
    baseline
        .required_artifacts
        .iter()
        .filter(|artifact| {
            let wanted = artifact.to_lowercase();
            !labels.iter().any(|label| label.contains(&wanted))
        })
        .map(|artifact| {
            Advisory::new(
                codes::MISSING_ARTIFACT,
                doc.path(&["back-matter", "resources"]),
                format!(
                    "artifact {artifact:?} required by baseline {} is not among the back-matter resources",
                    baseline.profile
                ),
            )
        })
        .collect()
}
