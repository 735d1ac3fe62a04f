//! Role presence: each role the baseline requires must be held by a party.

use ocf_catalog::ResolvedBaseline;
use ocf_core::{codes, Expected, RuleClass, Severity, ValidationError};
use serde_json::Value;

use crate::document::SspDocument;

/// A required role is satisfied when some `metadata.responsible-parties`
/// entry with that `role-id` names at least one party defined in
/// `metadata.parties`.
pub fn check(doc: &SspDocument<'_>, baseline: &ResolvedBaseline) -> Vec<ValidationError> {
    let parties = doc.party_uuids();
    let assignments = doc.responsible_parties();
    let path = doc.path(&["metadata", "responsible-parties"]);

    baseline
        .required_roles
        .iter()
        .filter(|role| {
            !assignments.iter().any(|(_, rp)| {
                rp.get("role-id").and_then(Value::as_str) == Some(role.as_str())
                    && rp
                        .get("party-uuids")
                        .and_then(Value::as_array)
                        .into_iter()
                        .flatten()
                        .filter_map(Value::as_str)
                        .any(|uuid| parties.contains(uuid))
            })
        })
        .map(|role| {
            ValidationError::new(
                Severity::Constraint,
                RuleClass::Role,
                codes::MISSING_ROLE,
                path.clone(),
                format!("required role {role} is not assigned to any party"),
            )
            .with_value(Value::String(role.clone()))
            .with_expected(Expected::Rule(format!(
                "a responsible-party with role-id {role} naming a party in metadata.parties"
            )))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures::{baseline, ssp};
    use serde_json::json;

    fn run(doc: &Value, roles: &[&str]) -> Vec<ValidationError> {
        check(&SspDocument::new(doc).unwrap(), &baseline(&[], roles))
    }

    #[test]
    fn assigned_role_passes() {
        assert!(run(&ssp(&[]), &["system-owner"]).is_empty());
    }

    #[test]
    fn unassigned_role_reported_once() {
        let errors = run(&ssp(&[]), &["system-owner", "isso"]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].offending_value, Some(json!("isso")));
        assert_eq!(errors[0].code, codes::MISSING_ROLE);
        assert_eq!(
            errors[0].path.to_string(),
            "system-security-plan.metadata.responsible-parties"
        );
    }

    #[test]
    fn assignment_to_unknown_party_does_not_count() {
        let mut doc = ssp(&[]);
        doc["system-security-plan"]["metadata"]["responsible-parties"][0]["party-uuids"] =
            json!(["99999999-9999-4999-8999-999999999999"]);
        assert_eq!(run(&doc, &["system-owner"]).len(), 1);
    }

    #[test]
    fn empty_assignment_does_not_count() {
        let mut doc = ssp(&[]);
        doc["system-security-plan"]["metadata"]["responsible-parties"][0]["party-uuids"] = json!([]);
        assert_eq!(run(&doc, &["system-owner"]).len(), 1);
    }
}
