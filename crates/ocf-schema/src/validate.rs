//! # Structural Validation
//!
//! Checks a candidate document against the bundled JSON Schema (Draft
//! 2020-12) for a given document-model version. The SSP schema references
//! shared definitions by relative `$ref`; those URIs are served from the
//! bundled set by a local retriever, never fetched.
//!
//! The checks are independent of any baseline or registry: the same
//! document yields the same findings whatever it is later validated
//! against. Findings come back as [`ValidationError`]s with
//! `Severity::Structural`, sorted by path for a stable report.

use std::collections::HashMap;

use ocf_core::{codes, Expected, FieldPath, RuleClass, Severity, ValidationError};
use serde_json::Value;

use crate::error::SchemaError;
use crate::kind::DocumentKind;

/// Version used when callers do not ask for one.
pub const DEFAULT_SCHEMA_VERSION: &str = "1.1.2";

const SCHEMA_URI_PREFIX: &str = "https://schemas.ocf.dev/oscal/";

/// (version, file name, contents). The SSP schema is the entry point.
const BUNDLED: &[(&str, &str, &str)] = &[
    (
        "1.1.2",
        "common.schema.json",
        include_str!("../schemas/oscal-common-1.1.2.schema.json"),
    ),
    (
        "1.1.2",
        "ssp.schema.json",
        include_str!("../schemas/oscal-ssp-1.1.2.schema.json"),
    ),
];

/// Sections permitted directly under `system-security-plan`.
pub const KNOWN_SECTIONS: &[&str] = &[
    "uuid",
    "metadata",
    "import-profile",
    "system-characteristics",
    "system-implementation",
    "control-implementation",
    "back-matter",
];

struct LocalSchemaRetriever {
    schemas: HashMap<String, Value>,
}

impl jsonschema::Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &jsonschema::Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        let key = uri_str.split('#').next().unwrap_or(uri_str);
        self.schemas
            .get(key)
            .cloned()
            .ok_or_else(|| format!("schema not found for URI: {uri_str}").into())
    }
}

/// Compiled validators for every bundled document-model version.
pub struct StructureValidator {
    versions: Vec<(String, jsonschema::Validator)>,
}

impl std::fmt::Debug for StructureValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructureValidator")
            .field("versions", &self.versions())
            .finish()
    }
}

impl StructureValidator {
    /// Compile all bundled schemas.
    pub fn bundled() -> Result<Self, SchemaError> {
        let mut by_version: Vec<(&str, HashMap<String, Value>)> = Vec::new();
        for (version, file, text) in BUNDLED {
            let uri = format!("{SCHEMA_URI_PREFIX}{version}/{file}");
            let value: Value = serde_json::from_str(text).map_err(|e| SchemaError::SchemaLoad {
                schema_id: uri.clone(),
                reason: e.to_string(),
            })?;
            match by_version.iter_mut().find(|(v, _)| v == version) {
                Some((_, map)) => {
                    map.insert(uri, value);
                }
                None => by_version.push((*version, HashMap::from([(uri, value)]))),
            }
        }

        let mut versions = Vec::new();
        for (version, schemas) in by_version {
            let entry_uri = format!("{SCHEMA_URI_PREFIX}{version}/ssp.schema.json");
            let entry = schemas.get(&entry_uri).cloned().ok_or_else(|| SchemaError::SchemaLoad {
                schema_id: entry_uri.clone(),
                reason: "entry schema missing from bundle".to_string(),
            })?;
            let validator = jsonschema::options()
                .with_draft(jsonschema::Draft::Draft202012)
                .with_retriever(LocalSchemaRetriever { schemas })
                .build(&entry)
                .map_err(|e| SchemaError::SchemaCompile {
                    schema_id: entry_uri.clone(),
                    reason: e.to_string(),
                })?;
            tracing::debug!(version, "compiled document schema");
            versions.push((version.to_string(), validator));
        }
        Ok(Self { versions })
    }

    /// Available document-model versions.
    pub fn versions(&self) -> Vec<&str> {
        self.versions.iter().map(|(v, _)| v.as_str()).collect()
    }

    pub fn supports(&self, version: &str) -> bool {
        self.versions.iter().any(|(v, _)| v == version)
    }

    /// Structural findings for `doc` under `schema_version`.
    ///
    /// In strict mode, sections under `system-security-plan` that the model
    /// does not define are reported as well. An empty list means the
    /// document is structurally valid.
    pub fn check_structure(
        &self,
        doc: &Value,
        schema_version: &str,
        strict: bool,
    ) -> Result<Vec<ValidationError>, SchemaError> {
        let validator = self
            .versions
            .iter()
            .find(|(v, _)| v == schema_version)
            .map(|(_, validator)| validator)
            .ok_or_else(|| SchemaError::UnknownVersion {
                requested: schema_version.to_string(),
                available: self.versions().join(", "),
            })?;

        let kind = DocumentKind::detect(doc);
        if kind != DocumentKind::SystemSecurityPlan {
            return Ok(vec![ValidationError::new(
                Severity::Structural,
                RuleClass::Schema,
                codes::SCHEMA_VIOLATION,
                FieldPath::root(),
                format!("expected a system-security-plan document, found {kind}"),
            )
            .with_expected(Expected::Rule("single top-level key system-security-plan".to_string()))]);
        }

        let mut findings: Vec<ValidationError> = validator
            .iter_errors(doc)
            .map(|err| {
                let path = FieldPath::from_pointer(&err.instance_path.to_string(), doc);
                let instance: &Value = &err.instance;
                let mut finding = ValidationError::new(
                    Severity::Structural,
                    RuleClass::Schema,
                    codes::SCHEMA_VIOLATION,
                    path,
                    err.to_string(),
                )
                .with_expected(Expected::Rule(err.schema_path.to_string()));
                if !instance.is_object() && !instance.is_array() {
                    finding = finding.with_value(instance.clone());
                }
                finding
            })
            .collect();

        if strict {
            findings.extend(unknown_sections(doc));
        }

        findings.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then_with(|| a.code.cmp(&b.code))
                .then_with(|| a.message.cmp(&b.message))
        });
        findings.dedup();
        Ok(findings)
    }
}

fn unknown_sections(doc: &Value) -> Vec<ValidationError> {
    let root = DocumentKind::SystemSecurityPlan.root_key();
    let Some(ssp) = doc.get(root).and_then(Value::as_object) else {
        return Vec::new();
    };
    ssp.keys()
        .filter(|k| !KNOWN_SECTIONS.contains(&k.as_str()))
        .map(|k| {
            ValidationError::new(
                Severity::Structural,
                RuleClass::Schema,
                codes::UNKNOWN_SECTION,
                FieldPath::from_key(root).key(k.as_str()),
                format!("unknown section {k:?} is not allowed in strict mode"),
            )
            .with_expected(Expected::OneOf(KNOWN_SECTIONS.iter().map(|s| s.to_string()).collect()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_ssp() -> Value {
        json!({
            "system-security-plan": {
                "uuid": "11111111-1111-4111-8111-111111111111",
                "metadata": {
                    "title": "Test SSP",
                    "oscal-version": "1.1.2",
                    "roles": [{"id": "system-owner", "title": "System Owner"}],
                    "parties": [{"uuid": "22222222-2222-4222-8222-222222222222", "type": "person"}]
                },
                "import-profile": {"href": "#moderate"},
                "system-characteristics": {
                    "system-name": "Test",
                    "status": {"state": "operational"}
                },
                "system-implementation": {
                    "components": [{
                        "uuid": "33333333-3333-4333-8333-333333333333",
                        "type": "this-system",
                        "title": "The System",
                        "status": {"state": "operational"}
                    }]
                },
                "control-implementation": {
                    "implemented-requirements": [{
                        "uuid": "44444444-4444-4444-8444-444444444444",
                        "control-id": "ac-1"
                    }]
                }
            }
        })
    }

    fn validator() -> StructureValidator {
        StructureValidator::bundled().expect("bundled schemas compile")
    }

    #[test]
    fn bundled_versions() {
        let v = validator();
        assert!(v.supports(DEFAULT_SCHEMA_VERSION));
        assert!(!v.supports("0.9"));
    }

    #[test]
    fn valid_document_has_no_findings() {
        let findings = validator().check_structure(&valid_ssp(), DEFAULT_SCHEMA_VERSION, true).unwrap();
        assert!(findings.is_empty(), "{findings:?}");
    }

    #[test]
    fn missing_required_section_reported_at_parent() {
        let mut doc = valid_ssp();
        doc["system-security-plan"]
            .as_object_mut()
            .unwrap()
            .remove("control-implementation");
        let findings = validator().check_structure(&doc, DEFAULT_SCHEMA_VERSION, false).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].path.to_string(), "system-security-plan");
        assert!(findings[0].message.contains("control-implementation"));
        assert_eq!(findings[0].severity, Severity::Structural);
    }

    #[test]
    fn wrong_type_carries_offending_value() {
        let mut doc = valid_ssp();
        doc["system-security-plan"]["metadata"]["roles"][0]["id"] = json!(42);
        let findings = validator().check_structure(&doc, DEFAULT_SCHEMA_VERSION, false).unwrap();
        assert!(!findings.is_empty());
        let f = &findings[0];
        assert_eq!(f.path.to_string(), "system-security-plan.metadata.roles[0].id");
        assert_eq!(f.offending_value, Some(json!(42)));
    }

    #[test]
    fn bad_uuid_resolved_through_shared_definitions() {
        let mut doc = valid_ssp();
        doc["system-security-plan"]["uuid"] = json!("not-a-uuid");
        let findings = validator().check_structure(&doc, DEFAULT_SCHEMA_VERSION, false).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].path.to_string(), "system-security-plan.uuid");
    }

    #[test]
    fn empty_components_violates_cardinality() {
        let mut doc = valid_ssp();
        doc["system-security-plan"]["system-implementation"]["components"] = json!([]);
        let findings = validator().check_structure(&doc, DEFAULT_SCHEMA_VERSION, false).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].path.to_string(),
            "system-security-plan.system-implementation.components"
        );
    }

    #[test]
    fn unknown_sections_only_in_strict_mode() {
        let mut doc = valid_ssp();
        doc["system-security-plan"]["extras"] = json!({});
        let v = validator();
        assert!(v.check_structure(&doc, DEFAULT_SCHEMA_VERSION, false).unwrap().is_empty());
        let strict = v.check_structure(&doc, DEFAULT_SCHEMA_VERSION, true).unwrap();
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0].code, codes::UNKNOWN_SECTION);
        assert_eq!(strict[0].path.to_string(), "system-security-plan.extras");
    }

    #[test]
    fn other_document_kinds_rejected_at_root() {
        let findings = validator()
            .check_structure(&json!({"catalog": {}}), DEFAULT_SCHEMA_VERSION, false)
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].path.is_root());
        assert!(findings[0].message.contains("catalog"));
    }

    #[test]
    fn unknown_version_is_an_error() {
        let err = validator().check_structure(&valid_ssp(), "7.0", false).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownVersion { .. }));
    }

    #[test]
    fn findings_are_sorted_by_path() {
        let mut doc = valid_ssp();
        doc["system-security-plan"]["uuid"] = json!("x");
        doc["system-security-plan"]["metadata"]["title"] = json!("");
        let findings = validator().check_structure(&doc, DEFAULT_SCHEMA_VERSION, false).unwrap();
        let paths: Vec<_> = findings.iter().map(|f| f.path.clone()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
        assert_eq!(findings.len(), 2);
    }
}
